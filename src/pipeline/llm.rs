//! Non-Gemini providers through `edgequake-llm`.
//!
//! OpenAI, Anthropic, Ollama, LM Studio and the other vendors `edgequake-llm`
//! knows are reached through its `ProviderFactory`; each reads its own API key
//! from the environment (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, …). The
//! document travels as an `ImageData` attachment carrying its real MIME type,
//! so image CVs work everywhere; PDF support depends on the vendor.

use crate::error::{CvExtractError, DocumentError};
use crate::pipeline::inference::{InferenceBackend, InferenceRequest, InferenceResponse};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// [`InferenceBackend`] adapter over any `edgequake_llm::LLMProvider`.
pub struct LlmProviderBackend {
    provider: Arc<dyn LLMProvider>,
    name: String,
}

impl LlmProviderBackend {
    /// Wrap an already constructed provider.
    pub fn new(name: impl Into<String>, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            name: name.into(),
        }
    }

    /// Instantiate a named provider with the given model via `ProviderFactory`.
    pub fn from_factory(provider_name: &str, model: &str) -> Result<Self, CvExtractError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            CvExtractError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider_name, provider))
    }
}

/// Build the single user turn: instruction text plus the document attachment.
fn build_messages(request: &InferenceRequest) -> Vec<ChatMessage> {
    let attachment = ImageData::new(
        request.document.data.clone(),
        request.document.mime_type.as_str(),
    );
    vec![ChatMessage::user_with_images(
        request.prompt.as_str(),
        vec![attachment],
    )]
}

#[async_trait]
impl InferenceBackend for LlmProviderBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &InferenceRequest) -> Result<InferenceResponse, DocumentError> {
        let messages = build_messages(request);
        let options = CompletionOptions::default();

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| DocumentError::RequestFailed {
                provider: self.name.clone(),
                detail: format!("{}", e),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.name, response.prompt_tokens, response.completion_tokens
        );

        if response.content.trim().is_empty() {
            return Err(DocumentError::EmptyResponse {
                provider: self.name.clone(),
                reason: "completion content is empty".to_string(),
            });
        }

        Ok(InferenceResponse {
            text: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}
