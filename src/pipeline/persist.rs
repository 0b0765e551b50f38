//! Output stage: one `<stem>_extracted.json` file per successful document.

use crate::error::DocumentError;
use crate::output::StructuredRecord;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix replacing the input file's extension.
pub const OUTPUT_SUFFIX: &str = "_extracted.json";

/// Derive the output path for `input` inside `output_dir`.
///
/// The input's extension is replaced: `cv_inp/resume.pdf` becomes
/// `<output_dir>/resume_extracted.json`. Two inputs sharing a stem
/// (`resume.pdf`, `resume.png`) map to the same file; the later one wins.
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{stem}{OUTPUT_SUFFIX}"))
}

/// Serialise a record as two-space indented JSON, keeping non-ASCII text literal.
pub fn render_record(record: &StructuredRecord) -> Result<String, DocumentError> {
    serde_json::to_string_pretty(record).map_err(|e| DocumentError::MalformedRecord {
        detail: format!("record could not be re-serialised: {e}"),
        excerpt: String::new(),
    })
}

/// Write `record` to `path`, replacing any existing file.
///
/// Uses atomic write (temp file + rename) so a failed write never leaves a
/// truncated record behind.
pub async fn write_record(path: &Path, record: &StructuredRecord) -> Result<(), DocumentError> {
    let json = render_record(record)?;
    let write_failed = |e: std::io::Error| DocumentError::OutputWriteFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    };

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(write_failed)?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }

    debug!("Wrote {} ({} bytes)", path.display(), json.len());
    Ok(())
}
