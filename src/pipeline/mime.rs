//! Content-type classification by file extension.
//!
//! Multimodal APIs need a MIME type next to every inline attachment. Only the
//! extension is consulted; sniffing magic bytes would reject files the
//! service can still read, and the service is the final judge anyway.

use std::path::Path;

/// Content type used when the extension is unknown or missing.
pub const FALLBACK_MIME_TYPE: &str = "image/jpeg";

const KNOWN_TYPES: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
];

/// Map a file path to the content-type label sent with the document.
///
/// Matching is case-insensitive. Anything not in the table, including files
/// without an extension, falls back to [`FALLBACK_MIME_TYPE`].
pub fn mime_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| {
            KNOWN_TYPES
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(ext))
                .map(|(_, mime)| *mime)
        })
        .unwrap_or(FALLBACK_MIME_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(mime_type_for(Path::new("cv.pdf")), "application/pdf");
        assert_eq!(mime_type_for(Path::new("cv.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("cv.jpg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("cv.jpeg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("cv.gif")), "image/gif");
        assert_eq!(mime_type_for(Path::new("cv.webp")), "image/webp");
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(mime_type_for(Path::new("SCAN.PDF")), "application/pdf");
        assert_eq!(mime_type_for(Path::new("photo.JpEg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("x.WebP")), "image/webp");
    }

    #[test]
    fn unknown_or_missing_extension_falls_back() {
        assert_eq!(mime_type_for(Path::new("resume.docx")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("resume")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new(".hidden")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("archive.tar.gz")), "image/jpeg");
    }

    #[test]
    fn only_last_extension_counts() {
        assert_eq!(mime_type_for(Path::new("scan.jpg.pdf")), "application/pdf");
        assert_eq!(mime_type_for(Path::new("dir.pdf/scan.png")), "image/png");
    }
}
