//! Error types for the cv-extract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`CvExtractError`] — **Fatal**: the run cannot proceed at all (the
//!   output folder cannot be created, the input folder cannot be listed, the
//!   requested provider is not available). Returned as `Err(CvExtractError)`
//!   from the top-level `process_all*` functions.
//!
//! * [`DocumentError`] — **Non-fatal**: a single document failed (missing
//!   prompt, API error, response that is not JSON) but every other document
//!   in the batch is still processed. Stored inside
//!   [`crate::output::DocumentOutcome`] so callers can inspect partial
//!   success rather than losing the whole batch to one bad file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the cv-extract library.
///
/// Document-level failures use [`DocumentError`] and are stored in
/// [`crate::output::DocumentOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum CvExtractError {
    // ── Folder errors ─────────────────────────────────────────────────────
    /// The input or output folder did not exist and could not be created.
    #[error("Failed to create folder '{}': {source}", .path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input folder exists but its entries could not be listed.
    #[error("Failed to list input folder '{}': {source}", .path.display())]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Provider errors ───────────────────────────────────────────────────
    /// The configured provider could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Single-document entry points ──────────────────────────────────────
    /// Returned by [`crate::extract()`] when the one requested document fails.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// At least one document in the batch failed.
    ///
    /// Returned by [`crate::output::BatchReport::into_result`] when the
    /// caller wants to treat any document failure as an error.
    #[error("{failed}/{total} documents failed during extraction")]
    PartialFailure {
        succeeded: usize,
        failed: usize,
        total: usize,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document.
///
/// Stored alongside [`crate::output::DocumentOutcome`] when a document fails.
/// The batch always continues with the next file.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum DocumentError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The document does not exist.
    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the document.
    #[error("Permission denied reading '{}'", .path.display())]
    PermissionDenied { path: PathBuf },

    /// The document exists but reading it failed.
    #[error("Failed to read '{}': {detail}", .path.display())]
    ReadFailed { path: PathBuf, detail: String },

    // ── Prompt errors ─────────────────────────────────────────────────────
    /// The prompt file is missing.
    #[error("Prompt file not found: {}", .path.display())]
    PromptFileNotFound { path: PathBuf },

    /// The prompt file exists but could not be read as UTF-8 text.
    #[error("Failed to read prompt file '{}': {detail}", .path.display())]
    PromptReadFailed { path: PathBuf, detail: String },

    // ── Inference errors ──────────────────────────────────────────────────
    /// The inference service answered with a non-success status.
    ///
    /// `message` is the service's own error text, passed through unmodified.
    #[error("{provider} API error (HTTP {status}): {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset, timeout).
    #[error("{provider} request failed: {detail}")]
    RequestFailed { provider: String, detail: String },

    /// The service answered but returned no text to decode.
    #[error("{provider} returned no text: {reason}")]
    EmptyResponse { provider: String, reason: String },

    // ── Decode errors ─────────────────────────────────────────────────────
    /// The response, after fence stripping, is not valid JSON.
    #[error("Response is not valid JSON: {detail} (response starts with {excerpt:?})")]
    MalformedRecord { detail: String, excerpt: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The extracted record could not be written to the output folder.
    #[error("Failed to write output file '{}': {detail}", .path.display())]
    OutputWriteFailed { path: PathBuf, detail: String },
}

impl DocumentError {
    /// Whether the failure came from the inference service rather than local I/O.
    pub fn is_inference_error(&self) -> bool {
        matches!(
            self,
            DocumentError::ApiError { .. }
                | DocumentError::RequestFailed { .. }
                | DocumentError::EmptyResponse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_display() {
        let e = CvExtractError::PartialFailure {
            succeeded: 9,
            failed: 1,
            total: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("1/10"), "got: {msg}");
    }

    #[test]
    fn prompt_missing_display() {
        let e = DocumentError::PromptFileNotFound {
            path: PathBuf::from("prompt.txt"),
        };
        assert_eq!(e.to_string(), "Prompt file not found: prompt.txt");
    }

    #[test]
    fn api_error_keeps_service_message() {
        let e = DocumentError::ApiError {
            provider: "gemini".into(),
            status: 403,
            message: "API key not valid. Please pass a valid API key.".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("HTTP 403"), "got: {msg}");
        assert!(msg.contains("API key not valid"), "got: {msg}");
        assert!(e.is_inference_error());
    }

    #[test]
    fn malformed_record_display() {
        let e = DocumentError::MalformedRecord {
            detail: "expected value at line 1 column 1".into(),
            excerpt: "Sorry, I cannot".into(),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("Response is not valid JSON"));
        assert!(msg.contains("Sorry, I cannot"));
        assert!(!e.is_inference_error());
    }

    #[test]
    fn document_error_converts_into_fatal() {
        let e: CvExtractError = DocumentError::FileNotFound {
            path: PathBuf::from("cv_inp/missing.pdf"),
        }
        .into();
        assert!(e.to_string().contains("missing.pdf"));
    }
}
