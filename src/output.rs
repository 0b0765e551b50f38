//! Result types for single-document extraction and batch runs.

use crate::error::{CvExtractError, DocumentError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A decoded extraction result.
///
/// Deliberately schema-free: whatever JSON the model returned is kept as is,
/// with object keys in the order the model produced them.
pub type StructuredRecord = serde_json::Value;

/// Output of [`crate::extract()`] for a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// The input document.
    pub source: PathBuf,
    /// Content-type label sent with the document.
    pub mime_type: String,
    /// The decoded record.
    pub record: StructuredRecord,
    /// Prompt tokens billed for the request (0 if the provider does not report them).
    pub input_tokens: u64,
    /// Completion tokens billed for the request.
    pub output_tokens: u64,
    /// Wall-clock time from reading the file to decoding the record.
    pub duration_ms: u64,
}

/// What happened to one file in a batch.
///
/// Exactly one of `output_path` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// The input document.
    pub source: PathBuf,
    /// Where the record was written, on success.
    pub output_path: Option<PathBuf>,
    /// Why the document failed, on failure.
    pub error: Option<DocumentError>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
}

impl DocumentOutcome {
    pub(crate) fn succeeded(output: &ExtractionOutput, output_path: PathBuf) -> Self {
        Self {
            source: output.source.clone(),
            output_path: Some(output_path),
            error: None,
            input_tokens: output.input_tokens,
            output_tokens: output.output_tokens,
            duration_ms: output.duration_ms,
        }
    }

    pub(crate) fn failed(source: PathBuf, error: DocumentError, duration_ms: u64) -> Self {
        Self {
            source,
            output_path: None,
            error: Some(error),
            input_tokens: 0,
            output_tokens: 0,
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate statistics for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Regular files found in the input folder.
    pub total_files: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_duration_ms: u64,
}

/// Complete result of [`crate::process_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// One entry per regular file, in processing order.
    pub documents: Vec<DocumentOutcome>,
    pub stats: BatchStats,
}

impl BatchReport {
    pub(crate) fn new(
        input_dir: PathBuf,
        output_dir: PathBuf,
        documents: Vec<DocumentOutcome>,
        total_duration_ms: u64,
    ) -> Self {
        let succeeded = documents.iter().filter(|d| d.is_success()).count();
        let stats = BatchStats {
            total_files: documents.len(),
            succeeded,
            failed: documents.len() - succeeded,
            total_input_tokens: documents.iter().map(|d| d.input_tokens).sum(),
            total_output_tokens: documents.iter().map(|d| d.output_tokens).sum(),
            total_duration_ms,
        };
        Self {
            input_dir,
            output_dir,
            documents,
            stats,
        }
    }

    /// `true` when the input folder held no regular files.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Outcomes that failed, in processing order.
    pub fn failures(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.documents.iter().filter(|d| !d.is_success())
    }

    /// Treat any document failure as an error.
    pub fn into_result(self) -> Result<Self, CvExtractError> {
        if self.stats.failed > 0 {
            return Err(CvExtractError::PartialFailure {
                succeeded: self.stats.succeeded,
                failed: self.stats.failed,
                total: self.stats.total_files,
            });
        }
        Ok(self)
    }
}
