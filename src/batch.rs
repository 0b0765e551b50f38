//! Batch driver: extract every document in the input folder.
//!
//! Files are processed strictly one after another. Each file gets exactly one
//! extraction attempt and produces either an output file or a recorded
//! failure, never both; a failure never stops the batch.

use crate::config::ExtractionConfig;
use crate::error::CvExtractError;
use crate::extract::Extractor;
use crate::output::{BatchReport, DocumentOutcome};
use crate::pipeline::persist;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract every regular file directly inside `config.input_dir`.
///
/// Both folders are created if absent. Existing outputs are overwritten.
///
/// # Errors
/// Only setup failures are returned as `Err`: a folder that cannot be created
/// or listed, or a provider that cannot be constructed. Per-document failures
/// are recorded in the returned [`BatchReport`].
///
/// # Example
/// ```rust,no_run
/// use cv_extract::{process_all, ExtractionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::from_env()?;
/// let report = process_all(&config).await?;
/// eprintln!("{}/{} saved", report.stats.succeeded, report.stats.total_files);
/// # Ok(())
/// # }
/// ```
pub async fn process_all(config: &ExtractionConfig) -> Result<BatchReport, CvExtractError> {
    let extractor = Extractor::new(config.clone())?;
    extractor.process_all().await
}

/// Synchronous wrapper around [`process_all`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_all_sync(config: &ExtractionConfig) -> Result<BatchReport, CvExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CvExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_all(config))
}

impl Extractor {
    /// Run the batch with this extractor's configuration and backend.
    pub async fn process_all(&self) -> Result<BatchReport, CvExtractError> {
        let start = Instant::now();
        let config = self.config();
        let callback = config.progress_callback.as_ref();

        prepare_folders(config).await?;
        let files = list_input_files(&config.input_dir).await?;
        let total = files.len();

        if let Some(cb) = callback {
            cb.on_batch_start(&config.input_dir, total);
        }

        if files.is_empty() {
            info!("No files found in {}", config.input_dir.display());
        } else {
            info!(
                "Found {} file(s) in {} (backend: {}, model: {})",
                total,
                config.input_dir.display(),
                self.backend_name(),
                config.model
            );
        }

        let mut outcomes = Vec::with_capacity(total);
        for (i, source) in files.iter().enumerate() {
            let index = i + 1;
            if let Some(cb) = callback {
                cb.on_document_start(index, total, source);
            }

            let outcome = self.process_one(source).await;

            if let Some(cb) = callback {
                match (&outcome.output_path, &outcome.error) {
                    (_, Some(e)) => cb.on_document_error(index, total, &e.to_string()),
                    (Some(path), None) => cb.on_document_complete(index, total, path),
                    (None, None) => {}
                }
            }
            outcomes.push(outcome);
        }

        let report = BatchReport::new(
            config.input_dir.clone(),
            config.output_dir.clone(),
            outcomes,
            start.elapsed().as_millis() as u64,
        );

        info!(
            "Batch complete: {}/{} documents extracted, {}ms total",
            report.stats.succeeded, report.stats.total_files, report.stats.total_duration_ms
        );

        if let Some(cb) = callback {
            cb.on_batch_complete(report.stats.total_files, report.stats.succeeded);
        }

        Ok(report)
    }

    /// Extract one file and persist its record; all errors become the outcome.
    async fn process_one(&self, source: &Path) -> DocumentOutcome {
        let start = Instant::now();
        let output_path = persist::output_path_for(source, &self.config().output_dir);

        let result = match self.extract(source).await {
            Ok(output) => persist::write_record(&output_path, &output.record)
                .await
                .map(|()| output),
            Err(e) => Err(e),
        };

        match result {
            Ok(output) => {
                info!("{} → {}", source.display(), output_path.display());
                DocumentOutcome::succeeded(&output, output_path)
            }
            Err(e) => {
                warn!("{}: {}", source.display(), e);
                DocumentOutcome::failed(
                    source.to_path_buf(),
                    e,
                    start.elapsed().as_millis() as u64,
                )
            }
        }
    }
}

/// Create the input and output folders if they do not exist yet.
pub async fn prepare_folders(config: &ExtractionConfig) -> Result<(), CvExtractError> {
    for dir in [&config.input_dir, &config.output_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| CvExtractError::DirectoryCreateFailed {
                path: dir.clone(),
                source: e,
            })?;
    }
    Ok(())
}

/// List the regular files directly inside `dir`, sorted by file name.
///
/// Not recursive: subfolders are skipped. Symlinks count when they point at a
/// regular file; broken links are skipped.
pub async fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>, CvExtractError> {
    let unreadable = |e: std::io::Error| CvExtractError::InputDirUnreadable {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(unreadable)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => debug!("Skipping non-file entry {}", path.display()),
            Err(e) => debug!("Skipping unreadable entry {}: {}", path.display(), e),
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
