//! The blocking transport and its one-time assembly.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::{BoxError, Result};
use crate::protocol::{Negotiation, ProtocolStrategy};
use crate::proxy::{ProxyAuthenticator, ProxyDescriptor};
use crate::request::HttpRequest;
use crate::response::{HttpResponse, ResponseBody};
use crate::tls::{ResolvedTls, TlsProvider};

/// Default read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes requests synchronously.
///
/// Implementations must be usable from many threads at once. An `Err` means
/// the exchange failed below HTTP (connect, TLS, timeout, I/O); any status
/// the server sends, including errors, comes back as `Ok`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, BoxError>;
}

/// Optional collaborators for building a [`ReqwestTransport`].
///
/// Each field left as `None` keeps the platform default for that concern:
/// no proxy, built-in trust roots, ALPN protocol negotiation.
#[derive(Clone)]
pub struct TransportOptions {
    /// Read timeout applied to every request. Zero disables it.
    pub read_timeout: Duration,
    pub proxy: Option<ProxyDescriptor>,
    pub tls: Option<Arc<dyn TlsProvider>>,
    pub protocols: Option<Arc<dyn ProtocolStrategy>>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            proxy: None,
            tls: None,
            protocols: None,
        }
    }
}

impl fmt::Debug for TransportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportOptions")
            .field("read_timeout", &self.read_timeout)
            .field("proxy", &self.proxy)
            .field("tls", &self.tls.is_some())
            .field("protocols", &self.protocols.as_ref().map(|p| p.protocols()))
            .finish()
    }
}

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyDescriptor) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_tls(mut self, provider: impl TlsProvider + 'static) -> Self {
        self.tls = Some(Arc::new(provider));
        self
    }

    pub fn with_protocols(mut self, strategy: impl ProtocolStrategy + 'static) -> Self {
        self.protocols = Some(Arc::new(strategy));
        self
    }

    /// The proxy to route through, ignoring direct descriptors.
    fn active_proxy(&self) -> Option<&ProxyDescriptor> {
        self.proxy.as_ref().filter(|p| !p.is_direct())
    }
}

/// [`Transport`] over a pooled `reqwest` blocking client.
///
/// Behind an HTTP proxy with credentials, a second client whose proxy sends
/// `Proxy-Authorization` on CONNECT is kept ready. It is only used after the
/// proxy refuses a tunnel with 407.
pub struct ReqwestTransport {
    inner: reqwest::blocking::Client,
    tunnel_auth: Option<reqwest::blocking::Client>,
    proxy_authenticator: Option<Arc<dyn ProxyAuthenticator>>,
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("proxy_authenticator", &self.proxy_authenticator.is_some())
            .field("tunnel_auth", &self.tunnel_auth.is_some())
            .finish_non_exhaustive()
    }
}

/// Settings shared by every client a transport builds, resolved once.
struct ClientSettings {
    read_timeout: Option<Duration>,
    tls: Option<ResolvedTls>,
    negotiation: Option<Negotiation>,
}

impl ClientSettings {
    fn build(&self, proxy: Option<reqwest::Proxy>) -> Result<reqwest::blocking::Client> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(self.read_timeout);
        if let Some(tls) = &self.tls {
            builder = tls.apply(builder);
        }
        builder = match proxy {
            Some(proxy) => builder.proxy(proxy),
            None => builder.no_proxy(),
        };
        if let Some(negotiation) = self.negotiation {
            builder = negotiation.apply(builder);
        }
        Ok(builder.build()?)
    }
}

impl ReqwestTransport {
    /// Assemble the transport. No network I/O happens here.
    pub fn new(options: &TransportOptions) -> Result<Self> {
        let settings = ClientSettings {
            read_timeout: (!options.read_timeout.is_zero()).then_some(options.read_timeout),
            tls: options
                .tls
                .as_deref()
                .map(ResolvedTls::resolve)
                .transpose()?,
            negotiation: options
                .protocols
                .as_deref()
                .map(Negotiation::resolve)
                .transpose()?,
        };

        let proxy = options.active_proxy();
        let proxy_authenticator: Option<Arc<dyn ProxyAuthenticator>> = proxy
            .and_then(ProxyDescriptor::authenticator)
            .map(|authenticator| Arc::new(authenticator) as Arc<dyn ProxyAuthenticator>);
        let tunnel_proxy = match proxy {
            Some(descriptor) => descriptor.to_reqwest_tunnel_auth()?,
            None => None,
        };
        let direct_proxy = match proxy {
            Some(descriptor) => descriptor.to_reqwest()?,
            None => None,
        };

        let proxy_url = proxy
            .and_then(ProxyDescriptor::proxy_url)
            .unwrap_or_else(|| "none".to_string());
        debug!(
            read_timeout_ms = options.read_timeout.as_millis() as u64,
            tls = settings.tls.is_some(),
            proxy = %proxy_url,
            proxy_auth = proxy_authenticator.is_some(),
            protocols = ?settings.negotiation,
            "Building HTTP transport"
        );

        let inner = settings.build(direct_proxy)?;
        let tunnel_auth = tunnel_proxy
            .map(|proxy| settings.build(Some(proxy)))
            .transpose()?;
        Ok(Self {
            inner,
            tunnel_auth,
            proxy_authenticator,
        })
    }

    /// Transport with default options.
    pub fn default_transport() -> Result<Self> {
        Self::new(&TransportOptions::default())
    }

    /// Whether 407 challenges will be answered.
    pub fn has_proxy_authenticator(&self) -> bool {
        self.proxy_authenticator.is_some()
    }

    fn send(
        &self,
        client: &reqwest::blocking::Client,
        request: &HttpRequest,
    ) -> std::result::Result<HttpResponse, BoxError> {
        let mut req = client.request(request.method().to_reqwest(), request.url());
        for (name, value) in request.headers() {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body_bytes() {
            req = req.body(body.to_vec());
        }

        debug!(method = request.method().as_str(), url = %request.url(), "Sending request");
        let response = req.send()?;

        let status = response.status().as_u16();
        debug!(
            status,
            content_length = response.content_length(),
            "Response received"
        );

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = ResponseBody::new(response);
        Ok(HttpResponse::new(status, headers, Some(body)))
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, BoxError> {
        let response = match self.send(&self.inner, &request) {
            Ok(response) => response,
            Err(e) => {
                return match &self.tunnel_auth {
                    Some(tunnel_auth) if is_tunnel_challenge(&*e) => {
                        debug!(
                            url = %request.url(),
                            "Answering proxy tunnel authentication challenge"
                        );
                        self.send(tunnel_auth, &request)
                    }
                    _ => Err(e),
                };
            }
        };
        if !response.is_proxy_challenge() {
            return Ok(response);
        }
        let Some(authenticator) = &self.proxy_authenticator else {
            return Ok(response);
        };
        match authenticator.authenticate(&request, &response) {
            Some(retry) => {
                drop(response);
                debug!(url = %retry.url(), "Answering proxy authentication challenge");
                self.send(&self.inner, &retry)
            }
            None => Ok(response),
        }
    }
}

/// Whether `err` is an HTTP proxy refusing to open a CONNECT tunnel with
/// 407. The connector reports this as an opaque error, so the cause chain is
/// matched by message.
fn is_tunnel_challenge(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let message = e.to_string().to_ascii_lowercase();
        if message.contains("proxy authorization required")
            || message.contains("proxy authentication required")
        {
            return true;
        }
        current = e.source();
    }
    false
}
