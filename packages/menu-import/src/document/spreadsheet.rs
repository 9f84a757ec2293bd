//! xlsx workbooks: every sheet rendered as CSV under a sheet header line.

use calamine::{Reader, Xlsx};
use std::io::Cursor;

use super::DocumentMetadata;
use crate::error::{ImportError, Result};

pub(super) fn extract(bytes: &[u8]) -> Result<(String, DocumentMetadata)> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| ImportError::Document(format!("could not open workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names();
    let mut sections = Vec::with_capacity(sheet_names.len());
    let mut row_count = 0usize;

    for name in &sheet_names {
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| ImportError::Document(format!("could not read sheet {}: {}", name, e)))?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        row_count += rows.len();
        sections.push(format!("## Sheet: {}\n{}", name, rows_to_csv(&rows)?));
    }

    let metadata = DocumentMetadata {
        sheet_count: Some(sheet_names.len()),
        row_count: Some(row_count),
        ..Default::default()
    };

    Ok((sections.join("\n\n"), metadata))
}

fn rows_to_csv(rows: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| ImportError::Document(format!("could not render sheet: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::Document(format!("could not render sheet: {}", e)))?;

    Ok(String::from_utf8_lossy(&bytes).trim_end().to_string())
}
