//! # cv-extract
//!
//! Batch-extract structured JSON records from CV/resume documents (PDF or
//! image) with a multimodal LLM.
//!
//! Each document is sent as-is, together with an operator-written prompt, to
//! a model that can read PDFs and images directly. Whatever JSON the model
//! answers with is written to `<stem>_extracted.json`; the crate imposes no
//! schema, so the prompt alone decides which fields come back.
//!
//! ## Pipeline Overview
//!
//! ```text
//! cv_inp/*
//!  │
//!  ├─ 1. List     regular files in the input folder (sorted, non-recursive)
//!  ├─ 2. Classify extension → content type (pdf, png, jpeg, gif, webp)
//!  ├─ 3. Encode   bytes → base64 inline payload
//!  ├─ 4. Prompt   read prompt.txt (re-read per document)
//!  ├─ 5. Model    one generateContent call per document, no retries
//!  ├─ 6. Decode   strip ```json fences, parse JSON
//!  └─ 7. Persist  cv_out/<stem>_extracted.json (2-space indent, UTF-8)
//! ```
//!
//! A failing document is reported and skipped; the batch always runs to the
//! end.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cv_extract::{process_all, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // GEMINI_API_KEY, CV_INPUT_DIR, CV_OUTPUT_DIR, CV_PROMPT_FILE
//!     let config = ExtractionConfig::from_env()?;
//!     let report = process_all(&config).await?;
//!     for doc in report.failures() {
//!         eprintln!("{}: {}", doc.source.display(), doc.error.as_ref().unwrap());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cvextract` binary (clap + anyhow + indicatif + tracing-subscriber + dotenv) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! cv-extract = { version = "0.1", default-features = false }
//! ```
//!
//! ## Providers
//!
//! Gemini (`gemini-2.0-flash` by default) is spoken to directly over REST
//! because it accepts PDFs inline. Any other provider name is routed through
//! `edgequake-llm` (OpenAI, Anthropic, Ollama, …), where PDF support depends
//! on the vendor.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{process_all, process_all_sync};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{CvExtractError, DocumentError};
pub use extract::{extract, extract_sync, Extractor};
pub use output::{BatchReport, BatchStats, DocumentOutcome, ExtractionOutput, StructuredRecord};
pub use pipeline::inference::{InferenceBackend, InferenceRequest, InferenceResponse};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
