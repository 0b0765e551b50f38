//! Configuration types for CV extraction.
//!
//! Everything a run needs (folders, prompt file, credential, model, backend)
//! lives in one immutable [`ExtractionConfig`]. It is built once at startup and
//! passed by reference into every component; nothing reads process-wide state
//! after that point. Build it with [`ExtractionConfig::builder()`], or with
//! [`ExtractionConfig::from_env()`] to mirror the CLI's environment variables.

use crate::error::CvExtractError;
use crate::pipeline::inference::InferenceBackend;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Folder scanned for source documents when none is configured.
pub const DEFAULT_INPUT_DIR: &str = "cv_inp";

/// Folder that receives `<stem>_extracted.json` files when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "cv_out";

/// Instruction text file read before every extraction call.
pub const DEFAULT_PROMPT_FILE: &str = "prompt.txt";

/// Model identifier sent with every request.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Gemini REST endpoint root.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variable holding the Gemini API key.
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_INPUT_DIR: &str = "CV_INPUT_DIR";
pub const ENV_OUTPUT_DIR: &str = "CV_OUTPUT_DIR";
pub const ENV_PROMPT_FILE: &str = "CV_PROMPT_FILE";
pub const ENV_MODEL: &str = "CV_EXTRACT_MODEL";
pub const ENV_PROVIDER: &str = "CV_EXTRACT_PROVIDER";
pub const ENV_API_BASE_URL: &str = "GEMINI_API_BASE_URL";

/// Configuration for a CV extraction run.
///
/// # Example
/// ```rust
/// use cv_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .input_dir("resumes")
///     .output_dir("records")
///     .prompt_file("prompts/cv.txt")
///     .api_key("test-key")
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-2.0-flash");
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Folder holding the source documents. Created if absent. Default: `cv_inp`.
    pub input_dir: PathBuf,

    /// Folder receiving one JSON file per extracted document. Created if absent.
    /// Default: `cv_out`.
    pub output_dir: PathBuf,

    /// Plain-text instruction file. Its trimmed contents are sent verbatim on
    /// every extraction call. Default: `prompt.txt`.
    pub prompt_file: PathBuf,

    /// Gemini API key. Not validated up front: when absent, requests go out
    /// unauthenticated and fail per document with the service's own message.
    pub api_key: Option<String>,

    /// Model identifier. Default: `gemini-2.0-flash`.
    pub model: String,

    /// Provider name. `None` or `"gemini"` uses the built-in Gemini REST
    /// client; any other name (`"openai"`, `"anthropic"`, `"ollama"`, …) is
    /// handed to `edgequake_llm::ProviderFactory`.
    pub provider_name: Option<String>,

    /// Pre-constructed backend. Takes precedence over `provider_name`.
    pub backend: Option<Arc<dyn InferenceBackend>>,

    /// Gemini endpoint root. Default: [`DEFAULT_GEMINI_BASE_URL`].
    pub api_base_url: String,

    /// Per-request timeout in seconds. Default: `None` (wait indefinitely).
    pub request_timeout_secs: Option<u64>,

    /// Receives per-document progress events during [`crate::process_all`].
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            prompt_file: PathBuf::from(DEFAULT_PROMPT_FILE),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            backend: None,
            api_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            request_timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("prompt_file", &self.prompt_file)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// Reads `GEMINI_API_KEY`, `CV_INPUT_DIR`, `CV_OUTPUT_DIR`,
    /// `CV_PROMPT_FILE`, `CV_EXTRACT_MODEL`, `CV_EXTRACT_PROVIDER` and
    /// `GEMINI_API_BASE_URL`; unset or empty variables keep their defaults.
    pub fn from_env() -> Result<Self, CvExtractError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but with an injectable lookup,
    /// so tests never touch the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CvExtractError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder();
        if let Some(dir) = var(ENV_INPUT_DIR) {
            builder = builder.input_dir(dir);
        }
        if let Some(dir) = var(ENV_OUTPUT_DIR) {
            builder = builder.output_dir(dir);
        }
        if let Some(path) = var(ENV_PROMPT_FILE) {
            builder = builder.prompt_file(path);
        }
        if let Some(key) = var(ENV_API_KEY) {
            builder = builder.api_key(key);
        }
        if let Some(model) = var(ENV_MODEL) {
            builder = builder.model(model);
        }
        if let Some(provider) = var(ENV_PROVIDER) {
            builder = builder.provider_name(provider);
        }
        if let Some(url) = var(ENV_API_BASE_URL) {
            builder = builder.api_base_url(url);
        }
        builder.build()
    }

    /// Whether requests go through the built-in Gemini REST client.
    pub fn uses_gemini(&self) -> bool {
        self.backend.is_none()
            && self
                .provider_name
                .as_deref()
                .map_or(true, |p| p.eq_ignore_ascii_case("gemini"))
    }
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl fmt::Debug for ExtractionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ExtractionConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn prompt_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.prompt_file = path.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, CvExtractError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(CvExtractError::InvalidConfig(
                "Model identifier must not be empty".into(),
            ));
        }
        if !(c.api_base_url.starts_with("http://") || c.api_base_url.starts_with("https://")) {
            return Err(CvExtractError::InvalidConfig(format!(
                "API base URL must start with http:// or https://, got '{}'",
                c.api_base_url
            )));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(CvExtractError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        if c.input_dir.as_os_str().is_empty() || c.output_dir.as_os_str().is_empty() {
            return Err(CvExtractError::InvalidConfig(
                "Input and output folders must not be empty paths".into(),
            ));
        }
        Ok(self.config)
    }
}
