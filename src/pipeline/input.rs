//! Input stage: read a source document from disk.
//!
//! The whole file is loaded into memory because the inference request embeds
//! it inline as base64. CVs are small (a few MB at most), and inline payloads
//! have a hard size cap on the service side anyway.

use crate::error::DocumentError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Read every byte of `path`.
///
/// I/O failures are mapped to the document-level taxonomy: a missing file is
/// [`DocumentError::FileNotFound`], a permission problem is
/// [`DocumentError::PermissionDenied`], and anything else (the path is a
/// directory, the disk errored mid-read) is [`DocumentError::ReadFailed`].
pub async fn read_document(path: &Path) -> Result<Vec<u8>, DocumentError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            debug!("Read {} ({} bytes)", path.display(), bytes.len());
            Ok(bytes)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(DocumentError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            Err(DocumentError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(DocumentError::ReadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}
