//! Tabular extraction for CSV files and Excel workbooks.
//!
//! Policy: the first row of each sheet (or of the CSV file) is the header
//! row; every data row becomes `header: value` pairs joined with `", "`,
//! skipping empty cells. Cells beyond the header width are kept as bare
//! values. `TABULAR_SEGMENTING` selects one segment per row (default) or one
//! segment per sheet.

use crate::config::TabularSegmenting;
use anyhow::{Context, Result};
use calamine::{Data, Reader};
use std::io::Cursor;

/// Extract segments from a CSV file.
pub(super) fn extract_csv(bytes: &[u8], mode: TabularSegmenting) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .context("failed to read CSV header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to parse CSV record")?;
        let text = row_text(&headers, record.iter());
        if !text.is_empty() {
            rows.push(text);
        }
    }

    tracing::debug!(rows = rows.len(), "Extracted CSV rows");
    Ok(group_rows(rows, mode, None))
}

/// Extract segments from an XLS/XLSX workbook, sheet by sheet.
pub(super) fn extract_workbook(bytes: &[u8], mode: TabularSegmenting) -> Result<Vec<String>> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .context("failed to open workbook")?;

    let mut segments = Vec::new();
    for sheet_name in workbook.sheet_names().to_vec() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("failed to read sheet '{sheet_name}'"))?;

        let mut data_rows = range.rows();
        let headers: Vec<String> = data_rows
            .next()
            .map(|row| row.iter().map(cell_text).collect())
            .unwrap_or_default();

        let mut rows = Vec::new();
        for row in data_rows {
            let cells: Vec<String> = row.iter().map(cell_text).collect();
            let text = row_text(&headers, cells.iter().map(String::as_str));
            if !text.is_empty() {
                rows.push(text);
            }
        }

        tracing::debug!(sheet = %sheet_name, rows = rows.len(), "Extracted sheet rows");
        segments.extend(group_rows(rows, mode, Some(&sheet_name)));
    }

    Ok(segments)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        other => other.to_string(),
    }
}

/// Render one data row as `header: value` pairs, skipping empty cells.
fn row_text<'a>(headers: &[String], cells: impl Iterator<Item = &'a str>) -> String {
    let mut parts = Vec::new();
    for (index, cell) in cells.enumerate() {
        let value = cell.trim();
        if value.is_empty() {
            continue;
        }
        let header = headers
            .get(index)
            .map(|header| header.trim())
            .filter(|header| !header.is_empty());
        match header {
            Some(header) => parts.push(format!("{header}: {value}")),
            None => parts.push(value.to_string()),
        }
    }
    parts.join(", ")
}

fn group_rows(rows: Vec<String>, mode: TabularSegmenting, sheet: Option<&str>) -> Vec<String> {
    match mode {
        TabularSegmenting::Row => rows,
        TabularSegmenting::Sheet => {
            if rows.is_empty() {
                return Vec::new();
            }
            let body = rows.join("\n");
            let segment = match sheet {
                Some(name) => format!("Sheet: {name}\n{body}"),
                None => body,
            };
            vec![segment]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_pair_headers_with_values() {
        let segments = extract_csv(
            b"name,amount\nAlice,100\nBob,250\n",
            TabularSegmenting::Row,
        )
        .expect("csv parses");
        assert_eq!(
            segments,
            vec!["name: Alice, amount: 100", "name: Bob, amount: 250"]
        );
    }

    #[test]
    fn csv_skips_empty_cells() {
        let segments =
            extract_csv(b"name,amount,note\nAlice,100,\n", TabularSegmenting::Row)
                .expect("csv parses");
        assert_eq!(segments, vec!["name: Alice, amount: 100"]);
    }

    #[test]
    fn csv_keeps_values_beyond_header_width() {
        let segments =
            extract_csv(b"name\nAlice,extra\n", TabularSegmenting::Row).expect("csv parses");
        assert_eq!(segments, vec!["name: Alice, extra"]);
    }

    #[test]
    fn csv_header_only_yields_no_segments() {
        let segments =
            extract_csv(b"name,amount\n", TabularSegmenting::Row).expect("csv parses");
        assert!(segments.is_empty());
    }

    #[test]
    fn sheet_mode_joins_rows_into_one_segment() {
        let segments = extract_csv(
            b"name,amount\nAlice,100\nBob,250\n",
            TabularSegmenting::Sheet,
        )
        .expect("csv parses");
        assert_eq!(
            segments,
            vec!["name: Alice, amount: 100\nname: Bob, amount: 250"]
        );
    }

    #[test]
    fn workbook_rejects_garbage_bytes() {
        assert!(extract_workbook(b"not a workbook", TabularSegmenting::Row).is_err());
    }
}
