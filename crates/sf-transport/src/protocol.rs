//! HTTP protocol version selection.

use reqwest::blocking::ClientBuilder;

use crate::error::{Error, ErrorKind, Result};

/// A protocol the transport may speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpProtocol {
    /// HTTP/1.1.
    Http11,
    /// HTTP/2 negotiated over TLS ALPN.
    H2,
    /// HTTP/2 without negotiation, for servers known to speak it.
    H2PriorKnowledge,
}

/// Ordered list of acceptable protocols, consulted once at transport build
/// time.
pub trait ProtocolStrategy: Send + Sync {
    fn protocols(&self) -> Vec<HttpProtocol>;
}

/// Common protocol presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpProtocolStrategy {
    /// Offer HTTP/2, fall back to HTTP/1.1.
    #[default]
    H2Http11,
    /// HTTP/1.1 only.
    Http11,
    /// HTTP/2 only, no negotiation.
    H2PriorKnowledge,
}

impl HttpProtocolStrategy {
    /// Parse the names used in configuration: `h2-http1.1`, `http1.1`,
    /// `h2-prior-knowledge`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "h2-http1.1" | "h2_http_1_1" => Ok(Self::H2Http11),
            "http1.1" | "http_1_1" => Ok(Self::Http11),
            "h2-prior-knowledge" | "h2_prior_knowledge" => Ok(Self::H2PriorKnowledge),
            other => Err(Error::new(ErrorKind::Config(format!(
                "unknown HTTP protocol strategy '{}'",
                other
            )))),
        }
    }
}

impl ProtocolStrategy for HttpProtocolStrategy {
    fn protocols(&self) -> Vec<HttpProtocol> {
        match self {
            Self::H2Http11 => vec![HttpProtocol::H2, HttpProtocol::Http11],
            Self::Http11 => vec![HttpProtocol::Http11],
            Self::H2PriorKnowledge => vec![HttpProtocol::H2PriorKnowledge],
        }
    }
}

/// How a protocol list maps onto the client builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Negotiation {
    Alpn,
    Http1Only,
    PriorKnowledge,
}

pub(crate) fn negotiation(protocols: &[HttpProtocol]) -> Result<Negotiation> {
    if protocols.is_empty() {
        return Err(Error::new(ErrorKind::Config(
            "protocol list must not be empty".to_string(),
        )));
    }
    let has = |p: HttpProtocol| protocols.contains(&p);

    if has(HttpProtocol::H2PriorKnowledge) {
        if protocols.len() > 1 {
            return Err(Error::new(ErrorKind::Config(format!(
                "HTTP/2 prior knowledge cannot be combined with other protocols: {:?}",
                protocols
            ))));
        }
        return Ok(Negotiation::PriorKnowledge);
    }
    if !has(HttpProtocol::Http11) {
        return Err(Error::new(ErrorKind::Config(format!(
            "protocol list must contain HTTP/1.1: {:?}",
            protocols
        ))));
    }
    if has(HttpProtocol::H2) {
        Ok(Negotiation::Alpn)
    } else {
        Ok(Negotiation::Http1Only)
    }
}

impl Negotiation {
    pub(crate) fn resolve(strategy: &dyn ProtocolStrategy) -> Result<Self> {
        negotiation(&strategy.protocols())
    }

    pub(crate) fn apply(self, builder: ClientBuilder) -> ClientBuilder {
        match self {
            Negotiation::Alpn => builder,
            Negotiation::Http1Only => builder.http1_only(),
            Negotiation::PriorKnowledge => builder.http2_prior_knowledge(),
        }
    }
}
