//! Percent-encoding and endpoint URL construction.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::borrow::Cow;

/// Everything except RFC 3986 unreserved characters is escaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Flags sent with every request so the daemon streams JSON replies.
pub const PROTOCOL_FLAGS: &str = "stream-channels=true&json=true&encoding=json";

/// Percent-encodes `raw` for use as a query key or value.
///
/// Pure and thread-safe.
pub fn url_encode(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_COMPONENT).to_string()
}

/// Reverses [`url_encode`]. Invalid UTF-8 sequences are replaced.
pub fn url_decode(encoded: &str) -> Cow<'_, str> {
    percent_decode_str(encoded).decode_utf8_lossy()
}

/// Builds `prefix/path?<flags>&k1=v1&k2=v2...` for one request.
///
/// Parameters keep their order and repeated keys are preserved. The encoder is
/// pluggable so the transport's fault-injecting encoder can be used.
pub struct UrlBuilder<'a> {
    prefix: &'a str,
    path: &'a str,
    params: Vec<(String, String)>,
}

impl<'a> UrlBuilder<'a> {
    /// Starts a URL for `path` under `prefix` (e.g. `http://localhost:5001/api/v0`).
    pub fn new(prefix: &'a str, path: &'a str) -> Self {
        Self {
            prefix,
            path,
            params: Vec::new(),
        }
    }

    /// Appends one query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Appends several query parameters in order.
    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Builds the URL with the plain encoder.
    pub fn build(self) -> String {
        self.build_with(|raw| Ok::<_, std::convert::Infallible>(url_encode(raw)))
            .unwrap_or_else(|never| match never {})
    }

    /// Builds the URL, passing every key and value through `encode`.
    pub fn build_with<E, F>(self, mut encode: F) -> Result<String, E>
    where
        F: FnMut(&str) -> Result<String, E>,
    {
        let mut url = format!(
            "{}/{}?{}",
            self.prefix.trim_end_matches('/'),
            self.path.trim_start_matches('/'),
            PROTOCOL_FLAGS
        );
        for (key, value) in &self.params {
            url.push('&');
            url.push_str(&encode(key)?);
            url.push('=');
            url.push_str(&encode(value)?);
        }
        Ok(url)
    }
}
