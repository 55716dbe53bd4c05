//! HTTP transport layer for the IPFS daemon API.
//!
//! [`ReqwestTransport`] performs one exchange at a time and writes the reply
//! body through to a caller-supplied sink as it arrives. The exchange is
//! driven in bounded poll intervals so that [`Transport::stop_fetch`], called
//! from another thread, is observed within one interval.
//!
//! # Cancellation
//!
//! ```no_run
//! use integrations_ipfs::transport::{FetchOutcome, ReqwestTransport, Transport};
//! use integrations_ipfs::IpfsConfig;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(ReqwestTransport::new(&IpfsConfig::default())?);
//!
//! let worker = {
//!     let transport = transport.clone();
//!     std::thread::spawn(move || {
//!         let mut sink = Vec::new();
//!         transport.fetch("http://localhost:5001/api/v0/cat?arg=Qm", &[], &mut sink)
//!     })
//! };
//!
//! transport.stop_fetch();
//! let outcome = worker.join().expect("fetch thread panicked")?;
//! transport.reset_fetch();
//! # let _ = outcome == FetchOutcome::Cancelled;
//! # Ok(())
//! # }
//! ```

pub mod fault;
mod multipart;
mod runtime;
mod state;

pub use state::FetchState;

use crate::config::IpfsConfig;
use crate::encoding;
use crate::errors::{EncodingError, IpfsError, IpfsResult, TransportError};
use crate::types::FileUpload;
use fault::{FailurePoint, FailureStrategy};
use futures::StreamExt;
use reqwest::Client;
use state::FetchControl;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, debug_span, trace, warn, Instrument};

/// Upper bound on the error body copy kept for [`IpfsError::HttpStatus`].
const MAX_ERROR_BODY: usize = 64 * 1024;

/// How a fetch that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The exchange ran to completion with a 2xx status.
    Completed,
    /// The exchange was abandoned after [`Transport::stop_fetch`]. Bytes already
    /// written to the sink are incomplete and should be discarded.
    Cancelled,
}

/// The boundary between endpoint glue and the network.
///
/// At most one `fetch` may be in flight per transport. `stop_fetch` is the
/// only method meant to be called concurrently with it; `url_encode` is safe
/// from any thread at any time.
pub trait Transport: Send + Sync {
    /// Sends a request to `url` and writes the reply body into `sink`.
    ///
    /// With no `files` the request carries no body. Otherwise every entry
    /// becomes one multipart part. Blocks the calling thread; must not be called
    /// from within an async context.
    fn fetch(
        &self,
        url: &str,
        files: &[FileUpload],
        sink: &mut dyn Write,
    ) -> IpfsResult<FetchOutcome>;

    /// Asks the running fetch to stop at its next poll boundary.
    fn stop_fetch(&self);

    /// Returns the transport to `Idle` after a stopped fetch has returned.
    fn reset_fetch(&self);

    /// Percent-encodes a query key or value.
    fn url_encode(&self, raw: &str) -> Result<String, EncodingError>;

    /// Current state of the fetch state machine.
    fn state(&self) -> FetchState;
}

/// Reqwest-based transport.
///
/// Owns one reusable HTTP session; the network runtime underneath is shared
/// process-wide and built on first use.
pub struct ReqwestTransport {
    client: Client,
    runtime: &'static Runtime,
    control: FetchControl,
    poll_interval: Duration,
    verbose: bool,
    failure_strategy: Arc<dyn FailureStrategy>,
}

impl ReqwestTransport {
    /// Creates a transport from the connection settings in `config`.
    ///
    /// The configuration is validated first; its fields are public and may
    /// have been changed after the builder checked them.
    pub fn new(config: &IpfsConfig) -> IpfsResult<Self> {
        config.validate()?;
        let runtime = runtime::shared(config.failure_strategy.as_ref())?;

        // Connector setup needs the runtime's reactor.
        let _enter = runtime.enter();
        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .tcp_keepalive(config.tcp_keepalive)
            .connection_verbose(config.verbose);
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            TransportError::Initialization(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            runtime,
            control: FetchControl::new(),
            poll_interval: config.poll_interval,
            verbose: config.verbose,
            failure_strategy: config.failure_strategy.clone(),
        })
    }

    /// Runs the exchange. Returns `Ok(())` early when a stop is observed.
    async fn perform(
        &self,
        url: &str,
        files: &[FileUpload],
        sink: &mut dyn Write,
    ) -> IpfsResult<()> {
        // The daemon's RPC API only accepts POST; without files the body is empty.
        // reqwest never sends `Expect: 100-continue`, so parts go out immediately.
        let mut request = self.client.post(url);
        if !files.is_empty() {
            request = request.multipart(multipart::build_form(files).await?);
        }

        let send = request.send();
        tokio::pin!(send);
        let response = loop {
            if self.control.stop_requested() {
                return Ok(());
            }
            match tokio::time::timeout(self.poll_interval, &mut send).await {
                Ok(result) => break result?,
                Err(_) => continue,
            }
        };

        let status = response.status();
        debug!(status = status.as_u16(), "response received");

        let mut error_body = (!status.is_success()).then(Vec::new);
        let mut body = Box::pin(response.bytes_stream());
        loop {
            if self.control.stop_requested() {
                return Ok(());
            }
            let chunk = match tokio::time::timeout(self.poll_interval, body.next()).await {
                Err(_) => continue,
                Ok(None) => break,
                Ok(Some(chunk)) => chunk?,
            };

            // The whole chunk reaches the sink before the next one is pulled.
            sink.write_all(&chunk)
                .map_err(|e| IpfsError::io(format!("failed to write response body: {}", e)))?;
            if self.verbose {
                trace!(bytes = chunk.len(), "chunk written");
            }

            if let Some(buffer) = error_body.as_mut() {
                let room = MAX_ERROR_BODY.saturating_sub(buffer.len());
                buffer.extend_from_slice(&chunk[..chunk.len().min(room)]);
            }
        }
        sink.flush()
            .map_err(|e| IpfsError::io(format!("failed to flush response body: {}", e)))?;

        if self.failure_strategy.should_fail(FailurePoint::StatusCode) {
            return Err(TransportError::Http(
                "Can't get the HTTP status code (injected)".to_string(),
            )
            .into());
        }

        if let Some(buffer) = error_body {
            warn!(status = status.as_u16(), "request failed");
            return Err(IpfsError::HttpStatus {
                status,
                body: String::from_utf8_lossy(&buffer).into_owned(),
            });
        }

        Ok(())
    }
}

impl Transport for ReqwestTransport {
    fn fetch(
        &self,
        url: &str,
        files: &[FileUpload],
        sink: &mut dyn Write,
    ) -> IpfsResult<FetchOutcome> {
        let mut guard = self.control.begin()?;

        let span = debug_span!("fetch", url = %url, parts = files.len());
        let result = self
            .runtime
            .block_on(self.perform(url, files, sink).instrument(span));

        // A stop that raced the end of the exchange still wins, and any error
        // it caused is dropped.
        if self.control.stop_requested() {
            debug!(url = %url, "fetch cancelled");
            guard.cancelled();
            return Ok(FetchOutcome::Cancelled);
        }

        result.map(|()| FetchOutcome::Completed)
    }

    fn stop_fetch(&self) {
        self.control.stop();
    }

    fn reset_fetch(&self) {
        self.control.reset();
    }

    fn url_encode(&self, raw: &str) -> Result<String, EncodingError> {
        if self.failure_strategy.should_fail(FailurePoint::UrlEncode) {
            return Err(EncodingError::Failed(raw.to_string()));
        }
        Ok(encoding::url_encode(raw))
    }

    fn state(&self) -> FetchState {
        self.control.state()
    }
}
