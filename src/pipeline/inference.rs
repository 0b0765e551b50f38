//! The inference boundary: one prompt + one document in, free-form text out.
//!
//! [`InferenceBackend`] is the only seam between the pipeline and an external
//! model. The batch driver and extractor never know which vendor answers;
//! tests plug in a scripted backend, the CLI picks [`super::gemini::GeminiBackend`]
//! or [`super::llm::LlmProviderBackend`] from configuration.

use crate::error::DocumentError;
use crate::pipeline::encode::DocumentPayload;
use async_trait::async_trait;

/// One extraction request. Built and consumed within a single extraction call.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    /// Model identifier, e.g. `gemini-2.0-flash`.
    pub model: String,
    /// Instruction text sent before the document.
    pub prompt: String,
    /// The encoded document.
    pub document: DocumentPayload,
}

/// Text returned by the service plus token accounting when the vendor reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceResponse {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl InferenceResponse {
    /// A response with no token accounting.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A multimodal model that can read a document and answer with text.
///
/// One call per document, no retries: implementations surface the service's
/// failure as a [`DocumentError`] and return immediately.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Short provider name used in logs and error messages.
    fn name(&self) -> &str;

    /// Submit the request and wait for the complete text response.
    async fn generate(&self, request: &InferenceRequest) -> Result<InferenceResponse, DocumentError>;
}
