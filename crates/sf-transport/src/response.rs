//! Response values returned by a [`Transport`](crate::Transport).

use std::fmt;
use std::io::{self, Read};

/// A live response body.
///
/// Reading pulls bytes off the underlying connection; dropping the body
/// closes it and hands the connection back to the pool.
pub struct ResponseBody {
    inner: Box<dyn Read + Send>,
}

impl ResponseBody {
    /// Wrap any reader as a response body.
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            inner: Box::new(reader),
        }
    }

    /// In-memory body, mostly useful for custom transports and tests.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(io::Cursor::new(bytes.into()))
    }

    /// Read the whole body as text, replacing invalid UTF-8.
    pub fn text(mut self) -> io::Result<String> {
        let mut buf = Vec::new();
        self.inner.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Read and throw away the rest of the body, returning the byte count.
    pub fn discard(mut self) -> io::Result<u64> {
        io::copy(&mut self.inner, &mut io::sink())
    }
}

impl Read for ResponseBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody").finish_non_exhaustive()
    }
}

/// Status, headers and (possibly absent) body of an HTTP response.
#[derive(Debug)]
pub struct HttpResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Option<ResponseBody>,
}

impl HttpResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Option<ResponseBody>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true for a 407 proxy authentication challenge.
    pub fn is_proxy_challenge(&self) -> bool {
        self.status == 407
    }

    /// Get a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Take ownership of the body, if any.
    pub fn into_body(self) -> Option<ResponseBody> {
        self.body
    }
}
