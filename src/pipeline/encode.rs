//! Document encoding: raw bytes → base64 payload tagged with its content type.
//!
//! Multimodal APIs accept attachments inline in the JSON request body, so the
//! bytes are wrapped with the standard (padded) base64 alphabet exactly as
//! read from disk; no re-encoding or resizing happens here.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A document ready to be attached to an inference request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPayload {
    /// Content-type label, e.g. `application/pdf`.
    pub mime_type: String,
    /// Standard base64 of the file bytes.
    pub data: String,
}

/// Encode document bytes for the inference request body.
pub fn encode_document(bytes: &[u8], mime_type: &str) -> DocumentPayload {
    let data = STANDARD.encode(bytes);
    debug!("Encoded {} document → {} bytes base64", mime_type, data.len());

    DocumentPayload {
        mime_type: mime_type.to_string(),
        data,
    }
}
