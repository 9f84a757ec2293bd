//! Document decoding against real files.

use menu_import::{extract_document, extract_text, FileType};

const TWO_SHEETS: &[u8] = include_bytes!("fixtures/menu_two_sheets.xlsx");

#[test]
fn test_workbook_renders_every_sheet_under_a_header() {
    let doc = extract_text(TWO_SHEETS, "xlsx").unwrap();

    assert_eq!(
        doc.text,
        "## Sheet: Food\nItem,Price\nBurger,12.5\nFries,4.5\n\n## Sheet: Drinks\nItem,Price\nCola,2.5"
    );
}

#[test]
fn test_workbook_metadata_sums_rows_across_sheets() {
    let doc = extract_text(TWO_SHEETS, "xlsx").unwrap();

    // Blank row 3 on the Food sheet is not counted
    assert_eq!(doc.metadata.sheet_count, Some(2));
    assert_eq!(doc.metadata.row_count, Some(5));
    assert!(!doc.metadata.truncated);
    assert_eq!(doc.metadata.original_length, doc.text.chars().count());
}

#[test]
fn test_workbook_text_is_capped() {
    let doc = extract_document(TWO_SHEETS, FileType::Xlsx, 14).unwrap();

    assert_eq!(doc.text, "## Sheet: Food");
    assert!(doc.metadata.truncated);
    assert_eq!(doc.metadata.sheet_count, Some(2));
}

