//! Post-processing: turn the model's text answer into a structured record.
//!
//! Models asked for JSON routinely wrap it in a markdown code block even when
//! told not to. Three markers are removed, in this order and at most once
//! each, before decoding:
//!
//! 1. a leading "```json"
//! 2. a leading "```" (a bare fence, or the residue of a fence tagged with
//!    some other language)
//! 3. a trailing "```"
//!
//! Nothing else is repaired. A response that is still not JSON after this is
//! reported as [`DocumentError::MalformedRecord`].

use crate::error::DocumentError;
use crate::output::StructuredRecord;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Longest slice of the offending response quoted back in decode errors.
const EXCERPT_CHARS: usize = 120;

/// Remove the optional markdown fence around a JSON answer.
///
/// Text without fences passes through unchanged apart from trimming.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix(JSON_FENCE) {
        text = rest;
    }
    if let Some(rest) = text.strip_prefix(FENCE) {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }
    text.trim()
}

/// Strip fences and decode the remainder as a schema-free JSON value.
pub fn decode_record(raw: &str) -> Result<StructuredRecord, DocumentError> {
    let body = strip_code_fences(raw);
    serde_json::from_str(body).map_err(|e| DocumentError::MalformedRecord {
        detail: e.to_string(),
        excerpt: body.chars().take(EXCERPT_CHARS).collect(),
    })
}
