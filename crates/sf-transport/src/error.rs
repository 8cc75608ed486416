//! Error types for sf-rest-lite.

/// Result type alias for sf-rest-lite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error used for transport-level causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for sf-rest-lite operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<BoxError>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Application-level rejection: the server answered with a non-2xx status.
    pub fn rejected(status: u16, body: Option<String>) -> Self {
        Self::new(ErrorKind::Rejected { status, body })
    }

    /// Transport failure while talking to `url`, wrapping the original cause.
    pub fn transport(url: impl Into<String>, cause: BoxError) -> Self {
        Self {
            kind: ErrorKind::Transport { url: url.into() },
            source: Some(cause),
        }
    }

    /// Returns true if the server rejected the request.
    pub fn is_rejected(&self) -> bool {
        matches!(self.kind, ErrorKind::Rejected { .. })
    }

    /// Returns true if the request failed below the HTTP layer.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport { .. })
    }

    /// Returns true if this error is worth retrying.
    ///
    /// Only transport failures qualify; rejections are answers.
    pub fn is_retryable(&self) -> bool {
        self.is_transport()
    }

    /// HTTP status of a rejection.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The server answered with a non-success status.
    #[error("Invalid response [{status}]: {}", body.as_deref().unwrap_or("null"))]
    Rejected { status: u16, body: Option<String> },

    /// Connection, timeout, TLS or I/O failure.
    #[error("Salesforce HTTP request failed [{url}]")]
    Transport { url: String },

    /// Unusable TLS material.
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// Unusable proxy settings.
    #[error("Proxy configuration error: {0}")]
    Proxy(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Required environment variable missing.
    #[error("Environment variable not set: {0}")]
    EnvVar(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::with_source(ErrorKind::Config(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidUrl(err.to_string()), err)
    }
}
