//! IPFS daemon API client.

use crate::config::IpfsConfig;
use crate::encoding::UrlBuilder;
use crate::errors::{IpfsError, IpfsResult};
use crate::transport::{FetchOutcome, ReqwestTransport, Transport};
use crate::types::FileUpload;
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;

mod endpoints;

pub use endpoints::PinRmOptions;

/// IPFS daemon API client.
///
/// A thin layer over a [`Transport`]: every endpoint builds a URL, performs
/// one fetch and extracts fields from the reply. Like its transport, a client
/// runs one request at a time; [`IpfsClient::abort`] may be called from
/// another thread to stop it.
///
/// # Example
///
/// ```no_run
/// use integrations_ipfs::{FileUpload, IpfsClient, IpfsConfig};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = IpfsConfig::builder().host("localhost").port(5001).timeout("2m").build()?;
/// let client = IpfsClient::new(config)?;
///
/// let added = client.files_add(&[FileUpload::contents("foo.txt", "abcd")])?;
/// for file in added {
///     println!("{} {:?}", file.path, file.hash);
/// }
/// # Ok(())
/// # }
/// ```
pub struct IpfsClient {
    /// Configuration.
    config: IpfsConfig,
    /// Prefix of every endpoint URL.
    url_prefix: String,
    /// HTTP transport.
    transport: Arc<dyn Transport>,
}

impl IpfsClient {
    /// Creates a client with its own [`ReqwestTransport`].
    pub fn new(config: IpfsConfig) -> IpfsResult<Self> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Creates a client over an existing transport.
    pub fn with_transport(config: IpfsConfig, transport: Arc<dyn Transport>) -> Self {
        let url_prefix = config.url_prefix();
        Self {
            config,
            url_prefix,
            transport,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &IpfsConfig {
        &self.config
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Stops the request currently running on another thread.
    pub fn abort(&self) {
        self.transport.stop_fetch();
    }

    /// Makes the client usable again after [`abort`](Self::abort), once the
    /// aborted call has returned.
    pub fn reset(&self) {
        self.transport.reset_fetch();
    }

    /// Builds the URL for `path`, appending the server-side timeout when set.
    pub fn make_url(&self, path: &str, params: &[(&str, &str)]) -> IpfsResult<String> {
        let mut builder = UrlBuilder::new(&self.url_prefix, path).params(params.iter().copied());
        if let Some(timeout) = &self.config.timeout {
            builder = builder.param("timeout", timeout.as_str());
        }
        builder
            .build_with(|raw| self.transport.url_encode(raw))
            .map_err(IpfsError::from)
    }

    /// Fetches `url` into `sink`, turning a cancellation into [`IpfsError::Cancelled`].
    pub(crate) fn fetch(
        &self,
        url: &str,
        files: &[FileUpload],
        sink: &mut dyn Write,
    ) -> IpfsResult<()> {
        match self.transport.fetch(url, files, sink)? {
            FetchOutcome::Completed => Ok(()),
            FetchOutcome::Cancelled => Err(IpfsError::Cancelled),
        }
    }

    /// Fetches `url` and parses the reply as a single JSON document.
    pub(crate) fn fetch_json(&self, url: &str, files: &[FileUpload]) -> IpfsResult<Value> {
        let mut body = Vec::new();
        self.fetch(url, files, &mut body)?;
        parse_json(&body)
    }

    /// Fetches `url` and returns the raw reply.
    pub(crate) fn fetch_bytes(&self, url: &str) -> IpfsResult<Vec<u8>> {
        let mut body = Vec::new();
        self.fetch(url, &[], &mut body)?;
        Ok(body)
    }
}

/// Parses a whole reply as JSON.
pub(crate) fn parse_json(input: &[u8]) -> IpfsResult<Value> {
    serde_json::from_slice(input).map_err(|e| {
        IpfsError::malformed_line(
            e.line(),
            String::from_utf8_lossy(input).into_owned(),
            e.to_string(),
        )
    })
}

/// Returns `input[name]`, or [`IpfsError::MissingField`].
pub(crate) fn get_property<'a>(input: &'a Value, name: &str, line: usize) -> IpfsResult<&'a Value> {
    input
        .get(name)
        .ok_or_else(|| IpfsError::missing_field(name, line, input.to_string()))
}

/// Like [`get_property`], requiring a string.
pub(crate) fn get_string_property(input: &Value, name: &str, line: usize) -> IpfsResult<String> {
    get_property(input, name, line)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| IpfsError::missing_field(name, line, input.to_string()))
}
