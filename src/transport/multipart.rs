//! Multipart form construction for uploads.
//!
//! Each [`FileUpload`] becomes one `application/octet-stream` part named by
//! its position (`file0`, `file1`, ...). Local files are streamed from disk
//! while the request body is sent, never read into memory up front.

use crate::errors::{IpfsError, IpfsResult};
use crate::types::{FileUpload, FileUploadKind};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio_util::io::ReaderStream;
use tracing::trace;

/// Builds the form for `files`. Must be awaited inside the transport runtime.
pub(crate) async fn build_form(files: &[FileUpload]) -> IpfsResult<Form> {
    let mut form = Form::new();

    for (index, file) in files.iter().enumerate() {
        let name = FileUpload::field_name(index);
        let part = match &file.kind {
            FileUploadKind::InlineContents(data) => {
                trace!(part = %name, bytes = data.len(), "inline part");
                Part::bytes(data.clone())
            }
            FileUploadKind::LocalFilePath(path) => {
                let handle = tokio::fs::File::open(path).await.map_err(|e| {
                    IpfsError::io(format!("cannot open {}: {}", path.display(), e))
                })?;
                let length = handle
                    .metadata()
                    .await
                    .map_err(|e| IpfsError::io(format!("cannot stat {}: {}", path.display(), e)))?
                    .len();
                trace!(part = %name, bytes = length, path = %path.display(), "file part");
                Part::stream_with_length(Body::wrap_stream(ReaderStream::new(handle)), length)
            }
        };

        let part = part
            .file_name(file.display_path.clone())
            .mime_str(mime::APPLICATION_OCTET_STREAM.as_ref())?;
        form = form.part(name, part);
    }

    Ok(form)
}
