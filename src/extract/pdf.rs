//! PDF text extraction, one segment per page.

use anyhow::{Context, Result};
use lopdf::Document;

/// Extract text from every page of the PDF, preserving page order.
///
/// Pages without extractable text (typical for scanned pages with no OCR
/// layer) yield an empty segment and are filtered out during normalization;
/// the all-pages-empty case is rejected by the caller.
pub(super) fn extract_pages(bytes: &[u8]) -> Result<Vec<String>> {
    let document = Document::load_mem(bytes).context("failed to parse PDF document")?;
    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    tracing::debug!(pages = page_numbers.len(), "Extracting PDF text per page");

    let mut segments = Vec::with_capacity(page_numbers.len());
    for page_number in page_numbers {
        // A page whose content stream cannot be decoded becomes an empty
        // segment rather than failing the whole document.
        let text = document.extract_text(&[page_number]).unwrap_or_else(|err| {
            tracing::debug!(page = page_number, error = %err, "Page text unavailable");
            String::new()
        });
        segments.push(text);
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_to_parse() {
        assert!(extract_pages(b"definitely not a pdf").is_err());
    }

    #[test]
    fn truncated_header_fails_to_parse() {
        assert!(extract_pages(b"%PDF-1.7\n").is_err());
    }
}
