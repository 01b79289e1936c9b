//! Plain-text extraction with best-effort encoding fallback.

use anyhow::Result;
use encoding_rs::WINDOWS_1252;

/// Decode the bytes as text and return the whole content as one segment.
///
/// UTF-8 is tried first; anything that fails strict UTF-8 is decoded as
/// Windows-1252, which accepts every byte sequence, so plain-text extraction
/// itself never fails. A zero-byte or all-whitespace file simply yields no
/// surviving segments.
pub(super) fn extract_text(bytes: &[u8]) -> Result<Vec<String>> {
    let content = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            tracing::debug!("Input is not valid UTF-8; decoding as Windows-1252");
            let (decoded, _, _) = WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    };
    Ok(vec![content])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_content_is_preserved() {
        let segments = extract_text("héllo wörld".as_bytes()).expect("text extract");
        assert_eq!(segments, vec!["héllo wörld"]);
    }

    #[test]
    fn latin1_bytes_fall_back_to_windows_1252() {
        // "café" encoded as Latin-1; 0xE9 is invalid on its own in UTF-8.
        let segments = extract_text(b"caf\xe9").expect("text extract");
        assert_eq!(segments, vec!["café"]);
    }

    #[test]
    fn empty_input_yields_one_empty_segment() {
        let segments = extract_text(b"").expect("text extract");
        assert_eq!(segments, vec![String::new()]);
    }
}
