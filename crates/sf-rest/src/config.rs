//! Client configuration and access token supply.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sf_rest_lite_transport::{Error, ErrorKind, Result};

use crate::DEFAULT_API_VERSION;

/// Default response timeout, in milliseconds.
pub const DEFAULT_RESPONSE_TIMEOUT_MILLIS: u64 = 30_000;

/// Supplies the bearer token for each request.
///
/// Called once per request, right before the request is built. Token refresh
/// is the provider's business; the client never caches the result.
pub trait AccessTokenProvider: Send + Sync {
    fn access_token(&self) -> String;
}

impl<F> AccessTokenProvider for F
where
    F: Fn() -> String + Send + Sync,
{
    fn access_token(&self) -> String {
        self()
    }
}

/// A token that never changes.
#[derive(Clone)]
pub struct StaticAccessToken(String);

impl StaticAccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl AccessTokenProvider for StaticAccessToken {
    fn access_token(&self) -> String {
        self.0.clone()
    }
}

impl fmt::Debug for StaticAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticAccessToken([REDACTED])")
    }
}

/// Where and how the client talks to Salesforce.
///
/// Nothing is validated here: a malformed instance URL only fails once a
/// request is attempted.
#[derive(Clone)]
pub struct ClientConfiguration {
    instance_url: String,
    api_version: String,
    response_timeout: Duration,
    access_token_provider: Arc<dyn AccessTokenProvider>,
}

impl fmt::Debug for ClientConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfiguration")
            .field("instance_url", &self.instance_url)
            .field("api_version", &self.api_version)
            .field("response_timeout", &self.response_timeout)
            .field("access_token_provider", &"[REDACTED]")
            .finish()
    }
}

impl ClientConfiguration {
    /// Create a configuration.
    ///
    /// `instance_url` is an origin such as `https://myorg.my.salesforce.com`
    /// without a trailing slash; `api_version` is e.g. `"62.0"`.
    pub fn new(
        instance_url: impl Into<String>,
        api_version: impl Into<String>,
        response_timeout_millis: u64,
        access_token_provider: impl AccessTokenProvider + 'static,
    ) -> Self {
        Self {
            instance_url: instance_url.into(),
            api_version: api_version.into(),
            response_timeout: Duration::from_millis(response_timeout_millis),
            access_token_provider: Arc::new(access_token_provider),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `SF_INSTANCE_URL`, `SF_ACCESS_TOKEN`, `SF_API_VERSION` and
    /// `SF_RESPONSE_TIMEOUT_MS` (the first two also as `SALESFORCE_*`).
    pub fn from_env() -> Result<Self> {
        let instance_url = std::env::var("SF_INSTANCE_URL")
            .or_else(|_| std::env::var("SALESFORCE_INSTANCE_URL"))
            .map_err(|_| Error::new(ErrorKind::EnvVar("SF_INSTANCE_URL".to_string())))?;

        let access_token = std::env::var("SF_ACCESS_TOKEN")
            .or_else(|_| std::env::var("SALESFORCE_ACCESS_TOKEN"))
            .map_err(|_| Error::new(ErrorKind::EnvVar("SF_ACCESS_TOKEN".to_string())))?;

        let api_version = std::env::var("SF_API_VERSION")
            .or_else(|_| std::env::var("SALESFORCE_API_VERSION"))
            .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());

        let response_timeout_millis = match std::env::var("SF_RESPONSE_TIMEOUT_MS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| {
                Error::with_source(
                    ErrorKind::Config(format!("SF_RESPONSE_TIMEOUT_MS is not a number: {raw}")),
                    e,
                )
            })?,
            Err(_) => DEFAULT_RESPONSE_TIMEOUT_MILLIS,
        };

        Ok(Self::new(
            instance_url.trim_end_matches('/'),
            api_version,
            response_timeout_millis,
            StaticAccessToken::new(access_token),
        ))
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Read timeout for every request issued with this configuration.
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Fetch the current token from the provider.
    pub fn access_token(&self) -> String {
        self.access_token_provider.access_token()
    }

    /// `{instance_url}/services/data/v{api_version}`, computed on each call.
    pub fn versioned_base_url(&self) -> String {
        format!("{}/services/data/v{}", self.instance_url, self.api_version)
    }
}
