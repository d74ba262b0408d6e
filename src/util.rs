//! Input decoding and path helpers.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use memchr::memmem;

/// Extension given to converted files.
pub const OUTPUT_EXTENSION: &str = "adoc";

// ============================================================================
// Text Decoding
// ============================================================================

/// Decode source bytes.
///
/// Valid UTF-8 (with or without BOM) is taken as is. Otherwise the declared
/// encoding is used when `encoding_rs` knows its label, and Windows-1252 when
/// it does not, since that is what most legacy DocBook sources were saved as.
pub fn decode_text<'a>(bytes: &'a [u8], declared: Option<&str>) -> Cow<'a, str> {
    let (utf8, _, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return utf8;
    }
    let fallback = declared
        .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
        .unwrap_or(encoding_rs::WINDOWS_1252);
    log::debug!("source is not UTF-8; decoding as {}", fallback.name());
    fallback.decode(bytes).0
}

/// Extract the encoding name from an XML declaration.
///
/// Only the first 100 bytes are inspected.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = memmem::find(prefix, b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let (&quote, rest) = after_enc.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = memchr::memchr(quote, rest)?;
    std::str::from_utf8(&rest[..value_end]).ok()
}

/// Decode raw XML bytes using the declared encoding as a hint.
pub fn decode_xml(bytes: &[u8]) -> Cow<'_, str> {
    decode_text(bytes, extract_xml_encoding(bytes))
}

// ============================================================================
// Paths
// ============================================================================

/// Output file for a source file: same directory and base name, `.adoc` extension.
pub fn output_path(source: &Path) -> PathBuf {
    source.with_extension(OUTPUT_EXTENSION)
}

/// Path of `target` relative to `base_dir`, with `/` separators as AsciiDoc
/// include targets expect.
pub fn relative_include_path(target: &Path, base_dir: &Path) -> String {
    let relative = pathdiff::diff_paths(target, base_dir).unwrap_or_else(|| target.to_path_buf());
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Lexically normalize a path (`a/./b/../c` → `a/c`) without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

/// Identity of a source file for include-cycle detection.
pub fn canonical_source(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| normalize_path(path))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_xml_encoding() {
        assert_eq!(
            extract_xml_encoding(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a/>"),
            Some("ISO-8859-1")
        );
        assert_eq!(
            extract_xml_encoding(b"<?xml version='1.0' encoding='utf-8'?>"),
            Some("utf-8")
        );
        assert_eq!(extract_xml_encoding(b"<?xml version=\"1.0\"?>"), None);
        assert_eq!(extract_xml_encoding(b"<article/>"), None);
    }

    #[test]
    fn test_decode_latin1_with_hint() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><para>caf\xe9</para>";
        assert!(decode_xml(bytes).contains("caf\u{e9}"));
    }

    #[test]
    fn test_decode_utf8_borrows() {
        let bytes = "<para>naïve</para>".as_bytes();
        assert!(matches!(decode_xml(bytes), Cow::Borrowed(_)));
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("docs/guide.xml")),
            PathBuf::from("docs/guide.adoc")
        );
        assert_eq!(output_path(Path::new("book")), PathBuf::from("book.adoc"));
    }

    #[test]
    fn test_relative_include_path() {
        assert_eq!(
            relative_include_path(Path::new("docs/chapters/one.adoc"), Path::new("docs")),
            "chapters/one.adoc"
        );
        assert_eq!(
            relative_include_path(Path::new("shared/common.adoc"), Path::new("docs")),
            "../shared/common.adoc"
        );
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("a/./b/../c.xml")),
            PathBuf::from("a/c.xml")
        );
    }
}
