//! # sf-rest-lite
//!
//! A small, blocking Salesforce REST client.
//!
//! It does four things: describe an SObject, run a SOQL query, follow a
//! query's `nextRecordsUrl`, and create record trees through the composite
//! tree endpoint. Response bodies come back as raw byte streams.
//!
//! ## Security
//!
//! - Access tokens and proxy passwords are redacted in Debug output
//! - Tracing spans never record tokens
//! - Proxy credentials are only sent after the proxy asks for them (407)
//!
//! ## Crates
//!
//! - **sf-rest-lite-transport** - Blocking HTTP transport: proxy, TLS trust, protocol selection, error taxonomy
//! - **sf-rest-lite-client** - `ClientConfiguration` and `RestClient`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sf_rest_lite::{ClientConfiguration, RestClient};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // SF_INSTANCE_URL, SF_ACCESS_TOKEN, optional SF_API_VERSION
//!     let client = RestClient::new(ClientConfiguration::from_env()?)?;
//!
//!     let mut page = client.query("SELECT Id, Name FROM Account LIMIT 10")?;
//!     std::io::copy(&mut page, &mut std::io::stdout())?;
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
#[cfg(feature = "rest")]
pub use sf_rest_lite_client as rest;
#[cfg(feature = "transport")]
pub use sf_rest_lite_transport as transport;

// Re-export commonly used types at the top level
#[cfg(feature = "rest")]
pub use sf_rest_lite_client::{
    AccessTokenProvider, ClientConfiguration, RestClient, StaticAccessToken,
};
#[cfg(feature = "transport")]
pub use sf_rest_lite_transport::{
    Error, ErrorKind, HttpProtocolStrategy, PemTlsProvider, ProxyDescriptor, ResponseBody, Result,
    TransportOptions,
};
