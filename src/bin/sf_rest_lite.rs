//! Command-line access to the four REST operations.
//!
//! ```sh
//! export SF_INSTANCE_URL='https://myorg.my.salesforce.com'
//! export SF_ACCESS_TOKEN='00D...'
//! cargo run --bin sf-rest-lite -- query "SELECT Id, Name FROM Account LIMIT 5"
//! ```
//!
//! Optional: `SF_API_VERSION`, `SF_RESPONSE_TIMEOUT_MS`, `SF_PROXY_URL`,
//! `SF_HTTP_PROTOCOL` (`h2-http1.1`, `http1.1`, `h2-prior-knowledge`) and
//! `SF_CA_BUNDLE` (PEM file of extra trusted roots).

use std::io::{self, Write};
use std::process;

use sf_rest_lite::{
    ClientConfiguration, Error, ErrorKind, HttpProtocolStrategy, PemTlsProvider, ProxyDescriptor,
    RestClient, TransportOptions,
};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage: sf-rest-lite <command> [args]

commands:
  describe <SObject>              describe an object
  query <SOQL>                    run a query
  next-page <nextRecordsUrl>      fetch the next page of a query
  composite <SObject> <file>      create a record tree from a JSON file";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{USAGE}");
        process::exit(1);
    };

    let client = build_client().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    let result = match (command.as_str(), &args[1..]) {
        ("describe", [object]) => stream(client.describe(object)),
        ("query", [soql]) => stream(client.query(soql)),
        ("next-page", [path]) => stream(client.next_page(path)),
        ("composite", [object, file]) => match std::fs::read(file) {
            Ok(body) => client.post_composite(object, body).map(|()| {
                eprintln!("Created {object} records from {file}");
            }),
            Err(e) => {
                eprintln!("Error: cannot read {file}: {e}");
                process::exit(1);
            }
        },
        _ => {
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        if let Some(source) = &e.source {
            eprintln!("  caused by: {source}");
        }
        process::exit(match e.kind {
            ErrorKind::Rejected { .. } => 2,
            ErrorKind::Transport { .. } => 3,
            _ => 1,
        });
    }
}

fn build_client() -> Result<RestClient, Error> {
    let config = ClientConfiguration::from_env()?;
    let mut options = TransportOptions::new();

    if let Ok(proxy_url) = std::env::var("SF_PROXY_URL") {
        options = options.with_proxy(ProxyDescriptor::from_url(&proxy_url)?);
    }
    if let Ok(protocol) = std::env::var("SF_HTTP_PROTOCOL") {
        options = options.with_protocols(HttpProtocolStrategy::from_name(&protocol)?);
    }
    if let Ok(bundle) = std::env::var("SF_CA_BUNDLE") {
        options = options.with_tls(PemTlsProvider::from_file(bundle)?.with_platform_roots(true));
    }

    tracing::debug!(
        instance_url = config.instance_url(),
        api_version = config.api_version(),
        "Configured client"
    );
    RestClient::with_options(config, options)
}

fn stream(body: Result<sf_rest_lite::ResponseBody, Error>) -> Result<(), Error> {
    let mut body = body?;
    let mut stdout = io::stdout().lock();
    if let Err(e) = io::copy(&mut body, &mut stdout).and_then(|_| stdout.write_all(b"\n")) {
        eprintln!("Error: failed to stream response: {e}");
        process::exit(3);
    }
    Ok(())
}
