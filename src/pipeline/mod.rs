//! Pipeline stages for single-document extraction.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and the inference backend can be swapped without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! mime ──▶ input ──▶ encode ──▶ inference ──▶ postprocess ──▶ persist
//! (label)  (bytes)   (base64)   (Gemini/LLM)  (fences+JSON)   (*_extracted.json)
//! ```
//!
//! 1. [`mime`]        — classify the file extension into a content-type label
//! 2. [`input`]       — read the document's bytes, mapping I/O failures
//! 3. [`encode`]      — base64-wrap the bytes with their content type
//! 4. [`inference`]   — the backend seam; [`gemini`] and [`llm`] implement it
//! 5. [`postprocess`] — strip markdown fences and decode the JSON record
//! 6. [`persist`]     — derive the output name and write pretty JSON atomically

pub mod encode;
pub mod gemini;
pub mod inference;
pub mod input;
pub mod llm;
pub mod mime;
pub mod persist;
pub mod postprocess;
