//! CSV files: parsed with header detection, re-rendered as a pipe table.

use super::DocumentMetadata;
use crate::error::{ImportError, Result};

pub(super) fn extract(bytes: &[u8]) -> Result<(String, DocumentMetadata)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::Document(format!("invalid CSV: {}", e)))?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.iter().any(|cell| !cell.is_empty()) {
            rows.push(row);
        }
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let (header, data) = if has_header_row(&rows) {
        let mut header = rows.remove(0);
        header.resize(width, String::new());
        (header, rows)
    } else {
        ((1..=width).map(|i| format!("Column {}", i)).collect(), rows)
    };

    let metadata = DocumentMetadata {
        row_count: Some(data.len()),
        header_count: Some(header.len()),
        ..Default::default()
    };

    Ok((render_pipe_table(&header, &data), metadata))
}

/// The first row is a header when none of its cells are numeric and some
/// later row has a numeric cell.
fn has_header_row(rows: &[Vec<String>]) -> bool {
    let Some((first, rest)) = rows.split_first() else {
        return false;
    };
    if first.iter().any(|cell| looks_numeric(cell)) {
        return false;
    }
    rest.is_empty() || rest.iter().any(|row| row.iter().any(|cell| looks_numeric(cell)))
}

fn looks_numeric(cell: &str) -> bool {
    let cleaned: String = cell
        .trim()
        .trim_start_matches(&['€', '$', '£'][..])
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    !cleaned.is_empty() && cleaned.replace(',', ".").parse::<f64>().is_ok()
}

/// Render rows as a fixed-width pipe table.
///
/// ```text
/// | Name  | Price |
/// |-------|-------|
/// | Cola  | 2.50  |
/// ```
pub fn render_pipe_table(header: &[String], rows: &[Vec<String>]) -> String {
    let columns = header.len().max(rows.iter().map(Vec::len).max().unwrap_or(0));
    if columns == 0 {
        return String::new();
    }

    let cell = |row: &[String], i: usize| row.get(i).map(String::as_str).unwrap_or("").to_string();

    let mut widths = vec![0usize; columns];
    for row in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        for (i, width) in widths.iter_mut().enumerate() {
            *width = (*width).max(cell(row, i).chars().count());
        }
    }
    for width in widths.iter_mut() {
        *width = (*width).max(3);
    }

    let render_row = |row: &[String]| {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let value = cell(row, i);
                let pad = width - value.chars().count();
                format!(" {}{} ", value, " ".repeat(pad))
            })
            .collect();
        format!("|{}|", cells.join("|"))
    };

    let separator = format!(
        "|{}|",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("|")
    );

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(header));
    lines.push(separator);
    for row in rows {
        lines.push(render_row(row));
    }
    lines.join("\n")
}
