//! Format-specific extraction strategies.
//!
//! Each supported [`FormatCategory`] has one strategy that turns raw file
//! bytes into an ordered list of text segments (one per page, row, or sheet
//! depending on the format). Segments are whitespace-normalized here so the
//! rest of the pipeline never sees blank entries; a document whose segments
//! all normalize away is reported as a failure for categories where that
//! signals an unreadable source (scanned PDFs, OCR with no recognizable
//! text) and left to the orchestrator's empty-content check otherwise.

mod ocr;
mod pdf;
mod tabular;
mod text;

use crate::config::TabularSegmenting;
use crate::detect::FormatCategory;
use anyhow::Error as ExtractionFailure;
use thiserror::Error;

/// Error raised when a file cannot be extracted as its detected category.
///
/// The underlying library failure is kept as a source for logging; the
/// display form stays opaque so wire responses never leak parser internals.
#[derive(Debug, Error)]
#[error("failed to extract {category} content")]
pub struct ExtractionError {
    /// Category whose strategy failed.
    pub category: FormatCategory,
    /// Underlying failure, logged but never serialized.
    #[source]
    pub source: ExtractionFailure,
}

/// Knobs that shape extraction output, fixed at process start.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Row-level or sheet-level segmenting for tabular formats.
    pub tabular_segmenting: TabularSegmenting,
    /// Language hint handed to the OCR engine.
    pub ocr_language: String,
}

/// Ordered text segments extracted from one uploaded file.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Name of the source file as declared by the uploader.
    pub filename: String,
    /// Category the file was extracted as.
    pub category: FormatCategory,
    /// Non-empty, whitespace-trimmed text segments in source order.
    pub segments: Vec<String>,
}

/// Run the extraction strategy for `category` over the uploaded bytes.
///
/// The orchestrator short-circuits [`FormatCategory::Unsupported`] before
/// calling here; reaching this function with it is a programming error and
/// reported as such.
pub fn extract(
    category: FormatCategory,
    filename: &str,
    bytes: &[u8],
    options: &ExtractOptions,
) -> Result<ExtractedDocument, ExtractionError> {
    let raw_segments = match category {
        FormatCategory::Pdf => pdf::extract_pages(bytes),
        FormatCategory::Spreadsheet => {
            tabular::extract_workbook(bytes, options.tabular_segmenting)
        }
        FormatCategory::Csv => tabular::extract_csv(bytes, options.tabular_segmenting),
        FormatCategory::Image => ocr::extract_ocr(bytes, &options.ocr_language),
        FormatCategory::PlainText => text::extract_text(bytes),
        FormatCategory::Unsupported => Err(anyhow::anyhow!(
            "unsupported category reached the extractor set"
        )),
    }
    .map_err(|source| ExtractionError { category, source })?;

    let segments = normalize_segments(raw_segments);

    // A PDF with no extractable text on any page, or an image that OCRs to
    // nothing, means the source itself is unreadable rather than empty.
    if segments.is_empty()
        && matches!(category, FormatCategory::Pdf | FormatCategory::Image)
    {
        return Err(ExtractionError {
            category,
            source: anyhow::anyhow!("no extractable text in any segment"),
        });
    }

    tracing::debug!(
        filename,
        category = %category,
        segments = segments.len(),
        "Extraction completed"
    );

    Ok(ExtractedDocument {
        filename: filename.to_string(),
        category,
        segments,
    })
}

/// Trim each segment and drop the ones that are empty after trimming.
fn normalize_segments(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .filter_map(|segment| {
            let trimmed = segment.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    fn options() -> ExtractOptions {
        ExtractOptions {
            tabular_segmenting: TabularSegmenting::Row,
            ocr_language: "eng".into(),
        }
    }

    /// Build a minimal PDF with one page per entry; an empty entry becomes a
    /// page with no text.
    fn make_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in pages {
            let operations = if text.is_empty() {
                Vec::new()
            } else {
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ]
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("content encodes"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = i64::try_from(pages.len()).expect("page count fits");
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("pdf serializes");
        buffer
    }

    #[test]
    fn pdf_with_one_blank_page_still_succeeds() {
        let bytes = make_pdf(&["Alpha page one", "", "Gamma page three"]);
        let document =
            extract(FormatCategory::Pdf, "report.pdf", &bytes, &options()).expect("pdf extract");

        // The blank middle page contributes nothing; pages one and three survive.
        assert_eq!(document.segments.len(), 2);
        assert!(document.segments[0].contains("Alpha"));
        assert!(document.segments[1].contains("Gamma"));
    }

    #[test]
    fn pdf_with_all_pages_blank_is_an_extraction_error() {
        let bytes = make_pdf(&["", "", ""]);
        let error = extract(FormatCategory::Pdf, "scanned.pdf", &bytes, &options())
            .expect_err("all-blank PDFs are unreadable");
        assert_eq!(error.category, FormatCategory::Pdf);
    }

    #[test]
    fn normalize_drops_blank_segments() {
        let segments = normalize_segments(vec![
            "  first page ".into(),
            "\n\t".into(),
            String::new(),
            "last page".into(),
        ]);
        assert_eq!(segments, vec!["first page", "last page"]);
    }

    #[test]
    fn malformed_pdf_reports_extraction_error() {
        let error = extract(FormatCategory::Pdf, "broken.pdf", b"not a pdf", &options())
            .expect_err("garbage bytes must not parse as PDF");
        assert_eq!(error.category, FormatCategory::Pdf);
    }

    #[test]
    fn malformed_image_reports_extraction_error() {
        let error = extract(FormatCategory::Image, "broken.png", b"\x00\x01\x02", &options())
            .expect_err("garbage bytes must not decode as an image");
        assert_eq!(error.category, FormatCategory::Image);
    }

    #[test]
    fn empty_text_file_yields_zero_segments() {
        let document =
            extract(FormatCategory::PlainText, "empty.txt", b"", &options()).expect("text extract");
        assert!(document.segments.is_empty());
    }

    #[test]
    fn csv_rows_become_header_value_segments() {
        let document = extract(
            FormatCategory::Csv,
            "ledger.csv",
            b"name,amount\nAlice,100\n",
            &options(),
        )
        .expect("csv extract");
        assert_eq!(document.segments, vec!["name: Alice, amount: 100"]);
    }
}
