//! Source file discovery and text extraction.

use simsearch_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    PlainText,
    Unsupported,
}

impl ContentType {
    /// Detect content type from file extension.
    ///
    /// Only the exact `txt` extension counts as plain text; `.md`, `.pdf`
    /// and upper-case variants are ignored by the builder.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("txt") => Self::PlainText,
            _ => Self::Unsupported,
        }
    }
}

/// Read a text file, dropping byte sequences that are not valid UTF-8.
///
/// Invalid bytes are removed rather than replaced with U+FFFD. `\r\n` and
/// lone `\r` line endings become `\n`.
pub fn read_text_lossy(path: &Path) -> AppResult<String> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::Index(format!("Failed to read {:?}: {}", path, e)))?;
    Ok(normalize_newlines(decode_discarding_invalid(&bytes)))
}

/// Convert `\r\n` and `\r` line endings to `\n`.
pub fn normalize_newlines(text: String) -> String {
    if !text.contains('\r') {
        return text;
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Decode UTF-8, discarding invalid sequences.
pub fn decode_discarding_invalid(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_detection() {
        assert_eq!(ContentType::from_path(&PathBuf::from("a.txt")), ContentType::PlainText);
        assert_eq!(ContentType::from_path(&PathBuf::from("a.md")), ContentType::Unsupported);
        assert_eq!(ContentType::from_path(&PathBuf::from("a.pdf")), ContentType::Unsupported);
        assert_eq!(ContentType::from_path(&PathBuf::from("a.TXT")), ContentType::Unsupported);
        assert_eq!(ContentType::from_path(&PathBuf::from("txt")), ContentType::Unsupported);
    }

    #[test]
    fn test_decode_discards_invalid_bytes() {
        let bytes = b"caf\xc3\xa9 \xff\xfebar";
        assert_eq!(decode_discarding_invalid(bytes), "café bar");
    }

    #[test]
    fn test_decode_keeps_literal_replacement_char() {
        let text = "keep \u{FFFD} this";
        assert_eq!(decode_discarding_invalid(text.as_bytes()), text);
    }

    #[test]
    fn test_read_text_lossy() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chunk.txt");
        std::fs::write(&path, b"line one\n\x80line two").unwrap();

        assert_eq!(read_text_lossy(&path).unwrap(), "line one\nline two");
    }

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\r\nb\rc\n".to_string()), "a\nb\nc\n");
        assert_eq!(normalize_newlines("\r\r\n".to_string()), "\n\n");
        assert_eq!(normalize_newlines("plain".to_string()), "plain");
    }

    #[test]
    fn test_read_crlf_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("windows.txt");
        std::fs::write(&path, b"first line\r\nsecond line\r\n").unwrap();

        assert_eq!(read_text_lossy(&path).unwrap(), "first line\nsecond line\n");
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_text_lossy(Path::new("/no/such/file.txt"));
        assert!(matches!(result, Err(AppError::Index(_))));
    }
}
