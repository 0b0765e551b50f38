//! Gemini `generateContent` client.
//!
//! Gemini accepts PDFs and images as `inline_data` parts next to the text
//! instruction, so a document never needs rasterising. The key is sent in the
//! `x-goog-api-key` header rather than the query string so it stays out of
//! proxy and server access logs.

use crate::config::ExtractionConfig;
use crate::error::{CvExtractError, DocumentError};
use crate::pipeline::encode::DocumentPayload;
use crate::pipeline::inference::{InferenceBackend, InferenceRequest, InferenceResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// [`InferenceBackend`] speaking the Gemini REST API directly.
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

// ── Gemini request/response types ──────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str, document: &'a DocumentPayload) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text { text: prompt },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: &document.mime_type,
                            data: &document.data,
                        },
                    },
                ],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate.
    fn into_inference_response(self) -> Result<InferenceResponse, DocumentError> {
        let (input_tokens, output_tokens) = self
            .usage_metadata
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or((0, 0));

        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = match self.prompt_feedback.and_then(|f| f.block_reason) {
                Some(block) => format!("prompt blocked ({block})"),
                None => "no candidates in response".to_string(),
            };
            return Err(DocumentError::EmptyResponse {
                provider: PROVIDER.to_string(),
                reason,
            });
        };

        let texts: Vec<String> = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if texts.is_empty() {
            let reason = match candidate.finish_reason {
                Some(finish) => format!("candidate has no text parts (finish reason {finish})"),
                None => "candidate has no text parts".to_string(),
            };
            return Err(DocumentError::EmptyResponse {
                provider: PROVIDER.to_string(),
                reason,
            });
        }

        Ok(InferenceResponse {
            text: texts.concat(),
            input_tokens,
            output_tokens,
        })
    }
}

/// Pull the human-readable message out of a Gemini error body, falling back
/// to the raw body when it is not the usual `{"error": {...}}` envelope.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "<empty response body>".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

// ── Implementation ─────────────────────────────────────────────────────────

impl GeminiBackend {
    /// Create a client for `base_url` (no trailing slash).
    ///
    /// `api_key = None` is allowed: requests are sent without credentials and
    /// fail with the service's own authentication error.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, CvExtractError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| CvExtractError::ProviderNotConfigured {
            provider: PROVIDER.to_string(),
            hint: format!("Failed to build HTTP client: {e}"),
        })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build the client from the run configuration.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, CvExtractError> {
        Self::new(
            config.api_base_url.clone(),
            config.api_key.clone(),
            config.request_timeout_secs,
        )
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl InferenceBackend for GeminiBackend {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, request: &InferenceRequest) -> Result<InferenceResponse, DocumentError> {
        let body = GenerateContentRequest::new(&request.prompt, &request.document);

        debug!(
            "Sending {} document ({} bytes base64) to {}",
            request.document.mime_type,
            request.document.data.len(),
            request.model
        );

        let mut http = self.client.post(self.endpoint(&request.model)).json(&body);
        if let Some(ref key) = self.api_key {
            http = http.header(API_KEY_HEADER, key);
        }

        let response = http.send().await.map_err(|e| DocumentError::RequestFailed {
            provider: PROVIDER.to_string(),
            detail: if e.is_timeout() {
                format!("request timed out: {e}")
            } else {
                e.to_string()
            },
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(DocumentError::ApiError {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|e| DocumentError::RequestFailed {
                provider: PROVIDER.to_string(),
                detail: format!("Failed to parse API response: {e}"),
            })?;

        let result = parsed.into_inference_response()?;
        debug!(
            "{}: {} input tokens, {} output tokens",
            request.model, result.input_tokens, result.output_tokens
        );
        Ok(result)
    }
}
