//! Error types for the IPFS HTTP integration.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for IPFS operations.
pub type IpfsResult<T> = Result<T, IpfsError>;

/// Top-level error type for the IPFS integration.
#[derive(Debug, Error)]
pub enum IpfsError {
    /// The remote endpoint could not be reached, or a low-level I/O failure.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The endpoint was reached but answered with a non-2xx status.
    #[error("HTTP request failed with status code {}. Response body:\n{body}", .status.as_u16())]
    HttpStatus {
        /// Response status.
        status: StatusCode,
        /// Response body collected up to the point of failure.
        body: String,
    },

    /// Percent-encoding failed.
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// A line of a multi-line reply was not valid JSON or lacked its identity field.
    #[error("Malformed reply on line {line}: {reason}\nInput JSON:\n{content}")]
    MalformedLine {
        /// 1-based line number.
        line: usize,
        /// The raw line.
        content: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A required field is absent from an otherwise valid JSON reply.
    #[error("Unexpected reply: valid JSON, but without the \"{field}\" property on line {line}:\n{json}")]
    MissingField {
        /// Name of the missing property.
        field: String,
        /// 1-based line number (0 for single-document replies).
        line: usize,
        /// The JSON that was inspected.
        json: String,
    },

    /// A valid reply that contradicts the request.
    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    /// The transport was used outside its state machine contract.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// An endpoint call could not produce a reply because its fetch was
    /// stopped. The transport itself reports cancellation as an outcome.
    #[error("Request was cancelled")]
    Cancelled,
}

impl IpfsError {
    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        IpfsError::Configuration(ConfigurationError::InvalidConfiguration(msg.into()))
    }

    /// Creates a network error.
    pub fn network(msg: impl Into<String>) -> Self {
        IpfsError::Transport(TransportError::Network(msg.into()))
    }

    /// Creates a sink or file I/O error.
    pub fn io(msg: impl Into<String>) -> Self {
        IpfsError::Transport(TransportError::Io(msg.into()))
    }

    /// Creates a malformed line error.
    pub fn malformed_line(line: usize, content: impl Into<String>, reason: impl Into<String>) -> Self {
        IpfsError::MalformedLine {
            line,
            content: content.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>, line: usize, json: impl Into<String>) -> Self {
        IpfsError::MissingField {
            field: field.into(),
            line,
            json: json.into(),
        }
    }

    /// Returns true if the failure is transient and the caller may retry.
    ///
    /// The transport never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            IpfsError::Transport(TransportError::Network(_))
            | IpfsError::Transport(TransportError::Timeout(_)) => true,
            IpfsError::HttpStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    /// Returns the HTTP status code if the daemon answered with one.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            IpfsError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Invalid server-side timeout value.
    #[error("Invalid timeout value: {0}")]
    InvalidTimeout(String),
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The process-wide network runtime or the session handle could not be set up.
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// Network error (DNS, connection refused, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout error.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// HTTP protocol error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Writing the sink or reading a local upload failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let message = error_chain(&err);
        if err.is_timeout() {
            TransportError::Timeout(message)
        } else if err.is_connect() {
            TransportError::Network(message)
        } else {
            TransportError::Http(message)
        }
    }
}

/// Renders `err` followed by each of its sources, `"outer: inner: root"`.
///
/// reqwest's own message names only the request; the OS diagnostic sits
/// further down the chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        // hyper repeats some causes verbatim
        if !message.ends_with(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = cause.source();
    }
    message
}

impl From<reqwest::Error> for IpfsError {
    fn from(err: reqwest::Error) -> Self {
        IpfsError::Transport(err.into())
    }
}

/// Percent-encoding errors.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// The encoder refused the input.
    #[error("url encoding failed on \"{0}\"")]
    Failed(String),
}

/// Violations of the fetch state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// Another fetch is already running on this transport.
    #[error("a fetch is already in flight on this transport")]
    FetchInProgress,

    /// The previous fetch was cancelled and `reset_fetch` was not called.
    #[error("the previous fetch was cancelled; call reset_fetch before reusing the transport")]
    ResetRequired,
}
