//! IPFS HTTP API Integration Module
//!
//! This module provides a blocking, thread-friendly client for the HTTP API of
//! an IPFS daemon. Its core is a transport that performs one request at a
//! time, streams the reply straight into a caller-supplied sink, and can be
//! stopped from another thread.
//!
//! # Features
//!
//! - **Transport**: plain fetches and multipart uploads (inline contents or
//!   files streamed from disk), write-through reply bodies, non-2xx statuses
//!   reported with their body
//! - **Cooperative cancellation**: `stop_fetch` from any thread, observed within
//!   one poll interval; `reset_fetch` returns the transport to idle
//! - **Streaming JSON aggregation**: line-delimited `add` replies folded into one
//!   record per file
//! - **URL building**: percent-encoded, order-preserving query parameters
//! - **Endpoints**: a thin client over the above (`id`, `version`, `files_add`,
//!   `files_get`, `pin_add`, ...)
//!
//! # Example
//!
//! ```no_run
//! use integrations_ipfs::{FileUpload, IpfsClient, IpfsConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = IpfsConfig::builder()
//!     .host("localhost")
//!     .port(5001)
//!     .build()?;
//!
//! let client = IpfsClient::new(config)?;
//!
//! let added = client.files_add(&[
//!     FileUpload::contents("foo.txt", "abcd"),
//!     FileUpload::local_file("bar.txt", "/tmp/bar.txt"),
//! ])?;
//! for file in added {
//!     println!("{}: {:?}", file.path, file.hash);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod aggregation;
pub mod client;
pub mod config;
pub mod encoding;
pub mod errors;
pub mod transport;
pub mod types;

// Internal modules (not part of public API)
#[cfg(test)]
mod mocks;

// Re-exports for convenience
pub use client::IpfsClient;
pub use config::{IpfsConfig, IpfsConfigBuilder};
pub use errors::{IpfsError, IpfsResult};
pub use transport::{FetchOutcome, FetchState, ReqwestTransport, Transport};
pub use types::{AddedFile, FileUpload, FileUploadKind, NodeId};

/// Prelude module with commonly used types and traits.
///
/// ```no_run
/// use integrations_ipfs::prelude::*;
/// ```
pub mod prelude {
    // Client
    pub use crate::client::{IpfsClient, PinRmOptions};

    // Configuration
    pub use crate::config::{IpfsConfig, IpfsConfigBuilder};

    // Transport
    pub use crate::transport::{FetchOutcome, FetchState, ReqwestTransport, Transport};

    // Aggregation and encoding
    pub use crate::aggregation::{aggregate_add_reply, AddReplyAggregator};
    pub use crate::encoding::{url_encode, UrlBuilder};

    // Common types
    pub use crate::types::{AddedFile, FileUpload, FileUploadKind};

    // Errors
    pub use crate::errors::{IpfsError, IpfsResult};
}
