//! Image extraction via optical character recognition.
//!
//! The image is decoded in-process and handed to the Tesseract engine
//! through `rusty-tesseract`; the recognized text becomes a single segment.
//! An image that decodes but recognizes to nothing is rejected by the
//! caller's all-empty check rather than passed on as a silent empty result.

use anyhow::{Context, Result, anyhow};
use rusty_tesseract::{Args, Image};

/// Decode the image bytes and run OCR, producing one text segment.
pub(super) fn extract_ocr(bytes: &[u8], language: &str) -> Result<Vec<String>> {
    let decoded = image::load_from_memory(bytes).context("failed to decode image")?;
    tracing::debug!(
        width = decoded.width(),
        height = decoded.height(),
        language,
        "Running OCR"
    );

    let image = Image::from_dynamic_image(&decoded)
        .map_err(|err| anyhow!("failed to prepare image for OCR: {err}"))?;
    let args = Args {
        lang: language.to_string(),
        ..Args::default()
    };
    let text = rusty_tesseract::image_to_string(&image, &args)
        .map_err(|err| anyhow!("OCR failed: {err}"))?;

    Ok(vec![text])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undecodable_bytes_fail_before_ocr() {
        assert!(extract_ocr(b"\x89PNG but truncated", "eng").is_err());
    }
}
