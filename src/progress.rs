//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the batch driver works through the input folder. The library
//! itself never prints; the `cvextract` binary turns these events into the
//! operator-facing console lines.
//!
//! # Example
//!
//! ```rust
//! use cv_extract::{BatchProgressCallback, ExtractionConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     saved: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, index: usize, total: usize, output_path: &Path) {
//!         self.saved.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} → {}", index, total, output_path.display());
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { saved: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch driver as it processes each document.
///
/// Documents are processed strictly one at a time, so events for a given
/// batch never overlap. The trait is still `Send + Sync` so a callback can be
/// shared with other tasks. All methods default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the input folder has been listed.
    ///
    /// `total_files` is `0` when the folder holds no regular files; no other
    /// event follows in that case except [`on_batch_complete`](Self::on_batch_complete).
    fn on_batch_start(&self, input_dir: &Path, total_files: usize) {
        let _ = (input_dir, total_files);
    }

    /// Called just before a document is read and sent to the backend.
    ///
    /// # Arguments
    /// * `index` — 1-indexed position in the batch
    /// * `total` — number of documents in the batch
    /// * `source` — path of the input document
    fn on_document_start(&self, index: usize, total: usize, source: &Path) {
        let _ = (index, total, source);
    }

    /// Called after the extracted record was written to `output_path`.
    fn on_document_complete(&self, index: usize, total: usize, output_path: &Path) {
        let _ = (index, total, output_path);
    }

    /// Called when a document fails; the batch continues with the next file.
    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_files: usize, succeeded: usize) {
        let _ = (total_files, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
