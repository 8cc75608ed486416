//! # sf-transport
//!
//! Blocking HTTP transport used by the sf-rest-lite client.
//!
//! The transport is assembled once from [`TransportOptions`] and then shared
//! by every request:
//! - read timeout applied to every request
//! - optional proxy ([`ProxyKind`]); Basic credentials for an HTTP proxy are
//!   sent only after it answers 407, whether to a plain request or to the
//!   CONNECT that opens an HTTPS tunnel
//! - optional custom trust roots and client identity ([`TlsProvider`])
//! - optional protocol restriction ([`ProtocolStrategy`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use sf_rest_lite_transport::{
//!     HttpProtocolStrategy, HttpRequest, ProxyDescriptor, ReqwestTransport, Transport,
//!     TransportOptions,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let options = TransportOptions::new()
//!     .with_proxy(ProxyDescriptor::http("proxy.corp", 3128).with_credentials("jdoe", "secret"))
//!     .with_protocols(HttpProtocolStrategy::Http11);
//! let transport = ReqwestTransport::new(&options)?;
//!
//! let response = transport.execute(
//!     HttpRequest::get("https://na1.salesforce.com/services/data/").bearer_auth("token"),
//! )?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

mod error;
mod protocol;
mod proxy;
mod request;
mod response;
mod tls;
mod transport;

pub use error::{BoxError, Error, ErrorKind, Result};
pub use protocol::{HttpProtocol, HttpProtocolStrategy, ProtocolStrategy};
pub use proxy::{
    BasicProxyAuthenticator, ProxyAuthenticator, ProxyCredentials, ProxyDescriptor, ProxyKind,
    PROXY_AUTHORIZATION,
};
pub use request::{HttpRequest, RequestMethod};
pub use response::{HttpResponse, ResponseBody};
pub use tls::{PemTlsProvider, TlsContext, TlsProvider, TlsVersion, TrustMaterial};
pub use transport::{ReqwestTransport, Transport, TransportOptions, DEFAULT_READ_TIMEOUT};

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("sf-rest-lite/", env!("CARGO_PKG_VERSION"));
