//! Single-document extraction entry points.
//!
//! [`Extractor`] binds a configuration to a resolved inference backend and
//! runs the pipeline stages for one file: classify, read, encode, load the
//! prompt, call the model, strip fences, decode. The batch driver in
//! [`crate::batch`] reuses the same `Extractor` for every file in the folder.

use crate::config::ExtractionConfig;
use crate::error::{CvExtractError, DocumentError};
use crate::output::ExtractionOutput;
use crate::pipeline::gemini::GeminiBackend;
use crate::pipeline::inference::{InferenceBackend, InferenceRequest};
use crate::pipeline::llm::LlmProviderBackend;
use crate::pipeline::{encode, input, mime, postprocess};
use crate::prompts::load_prompt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A configuration paired with the backend that serves it.
pub struct Extractor {
    config: ExtractionConfig,
    backend: Arc<dyn InferenceBackend>,
}

impl Extractor {
    /// Resolve the backend named by `config` and build an extractor.
    ///
    /// # Errors
    /// [`CvExtractError::ProviderNotConfigured`] when the named provider
    /// cannot be constructed.
    pub fn new(config: ExtractionConfig) -> Result<Self, CvExtractError> {
        let backend = resolve_backend(&config)?;
        Ok(Self { config, backend })
    }

    /// Build an extractor around an explicit backend, ignoring
    /// `config.backend` and `config.provider_name`.
    pub fn with_backend(config: ExtractionConfig, backend: Arc<dyn InferenceBackend>) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Name of the backend answering requests, e.g. `"gemini"`.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Extract a structured record from one document.
    ///
    /// Makes exactly one backend call. Nothing is written to disk; the batch
    /// driver owns persistence.
    ///
    /// # Errors
    /// Every failure is a [`DocumentError`]: missing or unreadable document,
    /// missing prompt file, inference failure (passed through verbatim), or a
    /// response that is not JSON after fence stripping.
    pub async fn extract(&self, path: &Path) -> Result<ExtractionOutput, DocumentError> {
        let start = Instant::now();

        let mime_type = mime::mime_type_for(path);
        let bytes = input::read_document(path).await?;
        let document = encode::encode_document(&bytes, mime_type);
        drop(bytes);

        let prompt = load_prompt(&self.config.prompt_file).await?;

        let request = InferenceRequest {
            model: self.config.model.clone(),
            prompt,
            document,
        };

        debug!(
            "{}: requesting extraction from {} ({})",
            path.display(),
            self.backend.name(),
            request.model
        );
        let response = self.backend.generate(&request).await?;
        let record = postprocess::decode_record(&response.text)?;

        Ok(ExtractionOutput {
            source: path.to_path_buf(),
            mime_type: mime_type.to_string(),
            record,
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Extract a structured record from a single document.
///
/// Convenience wrapper: resolves the backend from `config`, then runs
/// [`Extractor::extract`].
///
/// # Example
/// ```rust,no_run
/// use cv_extract::{extract, ExtractionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::from_env()?;
/// let output = extract("cv_inp/resume.pdf", &config).await?;
/// println!("{}", serde_json::to_string_pretty(&output.record)?);
/// # Ok(())
/// # }
/// ```
pub async fn extract(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, CvExtractError> {
    let path = path.as_ref();
    info!("Extracting {}", path.display());
    let extractor = Extractor::new(config.clone())?;
    Ok(extractor.extract(path).await?)
}

/// Synchronous wrapper around [`extract()`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, CvExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CvExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(path, config))
}

/// Resolve the inference backend, from most-specific to least-specific.
///
/// 1. **Pre-built backend** (`config.backend`) — used as-is; this is how
///    tests and embedders inject their own implementation.
/// 2. **Named non-Gemini provider** (`config.provider_name`) — built through
///    `edgequake_llm::ProviderFactory` with `config.model`.
/// 3. **Gemini** (default) — the REST client with the configured key and
///    base URL.
pub(crate) fn resolve_backend(
    config: &ExtractionConfig,
) -> Result<Arc<dyn InferenceBackend>, CvExtractError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    if !config.uses_gemini() {
        if let Some(ref name) = config.provider_name {
            let name = name.to_ascii_lowercase();
            return Ok(Arc::new(LlmProviderBackend::from_factory(&name, &config.model)?));
        }
    }

    Ok(Arc::new(GeminiBackend::from_config(config)?))
}
