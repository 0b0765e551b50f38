//! Prompt source: the extraction instruction lives in a plain-text file.
//!
//! The prompt is operator-owned data, not code. It is re-read on every
//! extraction call so edits to the file take effect on the next document
//! without restarting a long batch.

use crate::error::DocumentError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Read the prompt file and return its contents with surrounding whitespace removed.
///
/// # Errors
/// * [`DocumentError::PromptFileNotFound`] when `path` does not exist
/// * [`DocumentError::PromptReadFailed`] for any other read failure
///   (permissions, invalid UTF-8, path is a directory)
pub async fn load_prompt(path: &Path) -> Result<String, DocumentError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            let prompt = text.trim().to_string();
            debug!("Loaded prompt from {} ({} chars)", path.display(), prompt.len());
            Ok(prompt)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(DocumentError::PromptFileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(DocumentError::PromptReadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}
