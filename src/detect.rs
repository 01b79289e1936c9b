//! Maps an upload's filename and declared content type to a format category.
//!
//! The file extension is consulted first (case-insensitive); the declared MIME
//! type is a fallback for files uploaded without a recognizable extension.
//! Detection never fails: anything that resolves to neither is
//! [`FormatCategory::Unsupported`], which the pipeline turns into a
//! user-facing error before any extractor runs. No content sniffing is done.

use serde::Serialize;

/// Closed set of file format categories the pipeline can handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatCategory {
    /// PDF documents, extracted page by page.
    Pdf,
    /// Excel workbooks (XLS/XLSX).
    Spreadsheet,
    /// Comma-separated values.
    Csv,
    /// Raster images, extracted via OCR.
    Image,
    /// Plain text and text-like source files.
    PlainText,
    /// No matching extraction strategy.
    Unsupported,
}

impl FormatCategory {
    /// Stable lowercase label used in logs and error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Spreadsheet => "spreadsheet",
            Self::Csv => "csv",
            Self::Image => "image",
            Self::PlainText => "plain-text",
            Self::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for FormatCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the format category for an upload.
///
/// Extension wins when it maps to a known category; otherwise the declared
/// MIME type is consulted. Returns [`FormatCategory::Unsupported`] when
/// neither resolves.
pub fn detect_format(filename: &str, content_type: Option<&str>) -> FormatCategory {
    if let Some(category) = category_from_extension(filename) {
        return category;
    }
    content_type
        .and_then(category_from_content_type)
        .unwrap_or(FormatCategory::Unsupported)
}

fn category_from_extension(filename: &str) -> Option<FormatCategory> {
    let extension = filename.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())?;
    match extension.as_str() {
        "pdf" => Some(FormatCategory::Pdf),
        "xls" | "xlsx" => Some(FormatCategory::Spreadsheet),
        "csv" => Some(FormatCategory::Csv),
        "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tif" | "tiff" | "webp" => {
            Some(FormatCategory::Image)
        }
        "txt" | "md" | "markdown" | "log" | "py" | "js" | "html" | "css" => {
            Some(FormatCategory::PlainText)
        }
        _ => None,
    }
}

fn category_from_content_type(content_type: &str) -> Option<FormatCategory> {
    // Parameters such as "; charset=utf-8" are not part of the media type.
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase();
    match media_type.as_str() {
        "application/pdf" => Some(FormatCategory::Pdf),
        "application/vnd.ms-excel"
        | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
            Some(FormatCategory::Spreadsheet)
        }
        "text/csv" => Some(FormatCategory::Csv),
        _ if media_type.starts_with("image/") => Some(FormatCategory::Image),
        _ if media_type.starts_with("text/") => Some(FormatCategory::PlainText),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(detect_format("Report.PDF", None), FormatCategory::Pdf);
        assert_eq!(detect_format("data.CsV", None), FormatCategory::Csv);
        assert_eq!(detect_format("scan.JPEG", None), FormatCategory::Image);
    }

    #[test]
    fn extension_wins_over_content_type() {
        let category = detect_format("ledger.xlsx", Some("application/octet-stream"));
        assert_eq!(category, FormatCategory::Spreadsheet);
    }

    #[test]
    fn content_type_used_when_extension_unknown() {
        assert_eq!(
            detect_format("upload", Some("application/pdf")),
            FormatCategory::Pdf
        );
        assert_eq!(
            detect_format("upload.bin", Some("text/plain; charset=utf-8")),
            FormatCategory::PlainText
        );
        assert_eq!(
            detect_format("photo", Some("image/png")),
            FormatCategory::Image
        );
    }

    #[test]
    fn unknown_extension_and_type_is_unsupported() {
        assert_eq!(
            detect_format("setup.exe", Some("application/octet-stream")),
            FormatCategory::Unsupported
        );
        assert_eq!(detect_format("noextension", None), FormatCategory::Unsupported);
    }

    #[test]
    fn text_like_source_files_are_plain_text() {
        assert_eq!(detect_format("script.py", None), FormatCategory::PlainText);
        assert_eq!(detect_format("notes.md", None), FormatCategory::PlainText);
    }
}
