//! Mock transport for testing the endpoint client.

use crate::encoding;
use crate::errors::{EncodingError, IpfsError, IpfsResult};
use crate::transport::{FetchOutcome, FetchState, Transport};
use crate::types::FileUpload;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::Mutex;

/// Canned reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Write `body` to the sink and report the given status.
    Reply {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: Vec<u8>,
    },
    /// Write `partial` to the sink, then report a cancellation.
    Cancelled {
        /// Bytes written before the stop.
        partial: Vec<u8>,
    },
}

impl MockResponse {
    /// A 200 reply.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        MockResponse::Reply {
            status: 200,
            body: body.into(),
        }
    }

    /// An error reply.
    pub fn error(status: u16, body: impl Into<Vec<u8>>) -> Self {
        MockResponse::Reply {
            status,
            body: body.into(),
        }
    }
}

/// A recorded fetch call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Requested URL.
    pub url: String,
    /// Uploaded parts.
    pub files: Vec<FileUpload>,
}

/// Transport answering from a queue.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Creates a transport that answers with `responses` in order.
    pub fn with_responses(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn fetch(
        &self,
        url: &str,
        files: &[FileUpload],
        sink: &mut dyn Write,
    ) -> IpfsResult<FetchOutcome> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            files: files.to_vec(),
        });

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no mock response queued");

        match response {
            MockResponse::Reply { status, body } => {
                sink.write_all(&body).unwrap();
                let status = StatusCode::from_u16(status).unwrap();
                if status.is_success() {
                    Ok(FetchOutcome::Completed)
                } else {
                    Err(IpfsError::HttpStatus {
                        status,
                        body: String::from_utf8_lossy(&body).into_owned(),
                    })
                }
            }
            MockResponse::Cancelled { partial } => {
                sink.write_all(&partial).unwrap();
                Ok(FetchOutcome::Cancelled)
            }
        }
    }

    fn stop_fetch(&self) {}

    fn reset_fetch(&self) {}

    fn url_encode(&self, raw: &str) -> Result<String, EncodingError> {
        Ok(encoding::url_encode(raw))
    }

    fn state(&self) -> FetchState {
        FetchState::Idle
    }
}
