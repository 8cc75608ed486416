//! Custom TLS trust and client identity.

use std::fmt;
use std::path::Path;

use reqwest::blocking::ClientBuilder;

use crate::error::{Error, ErrorKind, Result};

/// Minimum TLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVersion {
    Tls12,
    Tls13,
}

impl TlsVersion {
    fn to_reqwest(self) -> reqwest::tls::Version {
        match self {
            TlsVersion::Tls12 => reqwest::tls::Version::TLS_1_2,
            TlsVersion::Tls13 => reqwest::tls::Version::TLS_1_3,
        }
    }
}

/// Which server certificates to trust.
#[derive(Clone, Default)]
pub struct TrustMaterial {
    /// PEM bundle of additional root certificates.
    pub certificates_pem: Vec<u8>,
    /// Keep trusting the built-in roots alongside `certificates_pem`.
    pub platform_roots: bool,
}

impl TrustMaterial {
    fn certificates(&self) -> Result<Vec<reqwest::Certificate>> {
        if self.certificates_pem.is_empty() {
            return Ok(Vec::new());
        }
        let certificates = reqwest::Certificate::from_pem_bundle(&self.certificates_pem)
            .map_err(|e| {
                Error::with_source(ErrorKind::Tls("invalid trust certificates".into()), e)
            })?;
        if certificates.is_empty() {
            return Err(Error::new(ErrorKind::Tls(
                "trust bundle contains no certificates".to_string(),
            )));
        }
        Ok(certificates)
    }
}

impl fmt::Debug for TrustMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustMaterial")
            .field("certificates_pem_len", &self.certificates_pem.len())
            .field("platform_roots", &self.platform_roots)
            .finish()
    }
}

/// Client-side TLS settings.
#[derive(Clone, Default)]
pub struct TlsContext {
    /// PEM containing the client certificate chain and its private key.
    pub identity_pem: Option<Vec<u8>>,
    pub min_version: Option<TlsVersion>,
}

impl TlsContext {
    fn identity(&self) -> Result<Option<reqwest::Identity>> {
        self.identity_pem
            .as_deref()
            .map(|pem| {
                reqwest::Identity::from_pem(pem).map_err(|e| {
                    Error::with_source(ErrorKind::Tls("invalid client identity".into()), e)
                })
            })
            .transpose()
    }
}

impl fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identity = self.identity_pem.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("TlsContext")
            .field("identity_pem", &identity)
            .field("min_version", &self.min_version)
            .finish()
    }
}

/// Supplies TLS material when a transport is assembled.
///
/// Both methods are called once, before anything is bound to the transport.
/// An error from either one fails construction.
pub trait TlsProvider: Send + Sync {
    fn trust_material(&self) -> Result<TrustMaterial>;

    fn context(&self) -> Result<TlsContext>;
}

/// [`TlsProvider`] backed by PEM data.
#[derive(Debug, Clone, Default)]
pub struct PemTlsProvider {
    trust: TrustMaterial,
    context: TlsContext,
}

impl PemTlsProvider {
    /// Trust only the roots in `certificates_pem`.
    pub fn new(certificates_pem: impl Into<Vec<u8>>) -> Self {
        Self {
            trust: TrustMaterial {
                certificates_pem: certificates_pem.into(),
                platform_roots: false,
            },
            context: TlsContext::default(),
        }
    }

    /// Load the trust bundle from a PEM file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(read_pem(path.as_ref())?))
    }

    /// Keep trusting the built-in roots as well.
    pub fn with_platform_roots(mut self, enabled: bool) -> Self {
        self.trust.platform_roots = enabled;
        self
    }

    /// Present a client certificate (PEM with certificate chain and key).
    pub fn with_identity(mut self, identity_pem: impl Into<Vec<u8>>) -> Self {
        self.context.identity_pem = Some(identity_pem.into());
        self
    }

    /// Load the client identity from a PEM file.
    pub fn with_identity_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let pem = read_pem(path.as_ref())?;
        Ok(self.with_identity(pem))
    }

    pub fn with_min_version(mut self, version: TlsVersion) -> Self {
        self.context.min_version = Some(version);
        self
    }
}

impl TlsProvider for PemTlsProvider {
    fn trust_material(&self) -> Result<TrustMaterial> {
        Ok(self.trust.clone())
    }

    fn context(&self) -> Result<TlsContext> {
        Ok(self.context.clone())
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        Error::with_source(ErrorKind::Tls(format!("cannot read {}", path.display())), e)
    })
}

/// TLS material fetched from a provider and fully parsed, ready to bind to
/// any number of client builders.
#[derive(Debug)]
pub(crate) struct ResolvedTls {
    roots: Vec<reqwest::Certificate>,
    platform_roots: bool,
    identity: Option<reqwest::Identity>,
    min_version: Option<TlsVersion>,
}

impl ResolvedTls {
    /// Fetch and parse everything the provider offers. Nothing is bound
    /// until all of it is valid.
    pub(crate) fn resolve(provider: &dyn TlsProvider) -> Result<Self> {
        let trust = provider.trust_material()?;
        let context = provider.context()?;

        let roots = trust.certificates()?;
        let identity = context.identity()?;
        if roots.is_empty() && !trust.platform_roots {
            return Err(Error::new(ErrorKind::Tls(
                "no trusted root certificates configured".to_string(),
            )));
        }

        Ok(Self {
            roots,
            platform_roots: trust.platform_roots,
            identity,
            min_version: context.min_version,
        })
    }

    #[cfg(test)]
    pub(crate) fn root_count(&self) -> usize {
        self.roots.len()
    }

    #[cfg(test)]
    pub(crate) fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    pub(crate) fn apply(&self, builder: ClientBuilder) -> ClientBuilder {
        let mut builder = builder
            .use_rustls_tls()
            .tls_built_in_root_certs(self.platform_roots);
        for root in &self.roots {
            builder = builder.add_root_certificate(root.clone());
        }
        if let Some(identity) = &self.identity {
            builder = builder.identity(identity.clone());
        }
        if let Some(version) = self.min_version {
            builder = builder.min_tls_version(version.to_reqwest());
        }
        builder
    }
}
