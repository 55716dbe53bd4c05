//! Data types shared by the transport, the aggregator and the client.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the payload of a [`FileUpload`] is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileUploadKind {
    /// The payload is the file contents.
    InlineContents(Vec<u8>),
    /// The payload is read from this local path while the request is sent.
    LocalFilePath(PathBuf),
}

/// One part of a multipart upload.
///
/// The form-field name (`file0`, `file1`, ...) is assigned by position when the
/// request is built, so it is not stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Filename reported to the daemon.
    pub display_path: String,
    /// Payload source.
    pub kind: FileUploadKind,
}

impl FileUpload {
    /// Creates a part whose contents are sent as given.
    pub fn contents(display_path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            display_path: display_path.into(),
            kind: FileUploadKind::InlineContents(data.into()),
        }
    }

    /// Creates a part streamed from a local file.
    pub fn local_file(display_path: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            display_path: display_path.into(),
            kind: FileUploadKind::LocalFilePath(path.into()),
        }
    }

    /// Form-field name for the part at `index`.
    pub fn field_name(index: usize) -> String {
        format!("file{}", index)
    }
}

/// One file reported by an `add` reply, merged across all lines naming it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedFile {
    /// Logical name of the file (the reply's `Name` field).
    pub path: String,
    /// Content hash, once reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Size in bytes, once reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl AddedFile {
    /// Creates a record with only the identity-derived path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hash: None,
            size: None,
        }
    }
}

/// Node identity as reported by the `id` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeId {
    /// Peer ID.
    #[serde(rename = "ID")]
    pub id: String,
    /// Public key.
    #[serde(rename = "PublicKey", default)]
    pub public_key: String,
    /// Listen addresses.
    #[serde(rename = "Addresses", default)]
    pub addresses: Option<Vec<String>>,
    /// Agent version string.
    #[serde(rename = "AgentVersion", default)]
    pub agent_version: String,
}
