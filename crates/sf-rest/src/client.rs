//! Salesforce REST client.
//!
//! Every operation has the same shape: build the target URL, fetch a fresh
//! token, execute, then translate the outcome. Non-2xx answers become
//! [`ErrorKind::Rejected`](sf_rest_lite_transport::ErrorKind::Rejected);
//! anything that fails below HTTP becomes
//! [`ErrorKind::Transport`](sf_rest_lite_transport::ErrorKind::Transport).

use std::fmt;
use std::sync::Arc;

use tracing::instrument;

use sf_rest_lite_transport::{
    Error, HttpRequest, ReqwestTransport, ResponseBody, Result, Transport, TransportOptions,
};

use crate::config::ClientConfiguration;

/// Content type of composite tree bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Blocking Salesforce REST client.
///
/// Holds one configuration and one transport, both fixed at construction.
/// Cheap to share across threads behind an `Arc`.
///
/// # Example
///
/// ```rust,no_run
/// use std::io::Read;
/// use sf_rest_lite_client::{ClientConfiguration, RestClient, StaticAccessToken};
///
/// # fn main() -> Result<(), sf_rest_lite_client::Error> {
/// let config = ClientConfiguration::new(
///     "https://myorg.my.salesforce.com",
///     "62.0",
///     30_000,
///     StaticAccessToken::new("00D..."),
/// );
/// let client = RestClient::new(config)?;
///
/// let mut body = String::new();
/// client
///     .query("SELECT Id, Name FROM Account LIMIT 10")?
///     .read_to_string(&mut body)
///     .expect("read query response");
/// # Ok(())
/// # }
/// ```
pub struct RestClient {
    config: ClientConfiguration,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Create a client with no proxy, default trust and default protocol
    /// negotiation.
    pub fn new(config: ClientConfiguration) -> Result<Self> {
        Self::with_options(config, TransportOptions::default())
    }

    /// Create a client whose transport is assembled from `options`.
    ///
    /// The read timeout always comes from the configuration.
    pub fn with_options(config: ClientConfiguration, options: TransportOptions) -> Result<Self> {
        let options = options.with_read_timeout(config.response_timeout());
        let transport = ReqwestTransport::new(&options)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over an already built transport.
    pub fn with_transport(config: ClientConfiguration, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn configuration(&self) -> &ClientConfiguration {
        &self.config
    }

    /// `{instance_url}/services/data/v{api_version}`.
    pub fn versioned_base_url(&self) -> String {
        self.config.versioned_base_url()
    }

    /// Describe an SObject.
    ///
    /// `GET {base}/sobjects/{object_name}/describe?maxRecords=1`
    #[instrument(skip(self))]
    pub fn describe(&self, object_name: &str) -> Result<ResponseBody> {
        let url = self.rest_url(&format!(
            "/sobjects/{}/describe?maxRecords=1",
            urlencoding::encode(object_name)
        ))?;
        self.execute(self.authorized(HttpRequest::get(url)))
    }

    /// Run a SOQL query.
    ///
    /// `GET {base}/query?q={soql}`
    #[instrument(skip(self))]
    pub fn query(&self, soql: &str) -> Result<ResponseBody> {
        let url = self.rest_url(&format!("/query?q={}", urlencoding::encode(soql)))?;
        self.execute(self.authorized(HttpRequest::get(url)))
    }

    /// Fetch the next page of a query.
    ///
    /// `next_records_url` is the `nextRecordsUrl` path from a previous query
    /// response and is appended to the instance URL untouched.
    #[instrument(skip(self))]
    pub fn next_page(&self, next_records_url: &str) -> Result<ResponseBody> {
        let url = format!("{}{}", self.config.instance_url(), next_records_url);
        let url = parse_url(&url)?;
        self.execute(self.authorized(HttpRequest::get(url)))
    }

    /// Create a record tree.
    ///
    /// `POST {base}/composite/tree/{object_api_name}` with `json_body`. The
    /// response body is read to completion and discarded.
    #[instrument(skip(self, json_body))]
    pub fn post_composite(
        &self,
        object_api_name: &str,
        json_body: impl Into<Vec<u8>>,
    ) -> Result<()> {
        let url = self.rest_url(&format!(
            "/composite/tree/{}",
            urlencoding::encode(object_api_name)
        ))?;
        let request = HttpRequest::post(&url).body(JSON_CONTENT_TYPE, json_body);
        let body = self.execute(self.authorized(request))?;
        match body.discard() {
            Ok(_) => Ok(()),
            Err(e) => Err(Error::transport(url, Box::new(e))),
        }
    }

    fn rest_url(&self, path: &str) -> Result<String> {
        parse_url(&format!("{}{}", self.config.versioned_base_url(), path))
    }

    fn authorized(&self, request: HttpRequest) -> HttpRequest {
        request.bearer_auth(self.config.access_token())
    }

    fn execute(&self, request: HttpRequest) -> Result<ResponseBody> {
        let url = request.url().to_string();
        let response = self
            .transport
            .execute(request)
            .map_err(|cause| Error::transport(&url, cause))?;

        let status = response.status();
        if response.is_success() {
            return Ok(response
                .into_body()
                .unwrap_or_else(|| ResponseBody::from_bytes(Vec::new())));
        }

        // Reading the error body also closes the response.
        let body = response
            .into_body()
            .map(ResponseBody::text)
            .transpose()
            .map_err(|e| Error::transport(&url, Box::new(e)))?;
        Err(Error::rejected(status, body))
    }
}

fn parse_url(raw: &str) -> Result<String> {
    Ok(url::Url::parse(raw)?.to_string())
}
