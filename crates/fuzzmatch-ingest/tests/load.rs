use std::fs;
use std::path::PathBuf;

use fuzzmatch_ingest::{IngestError, LoadOptions, load_dataset, sheet_names};
use fuzzmatch_model::CellValue;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    path
}

#[test]
fn reads_csv_with_bom_and_blank_cells() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(
        &dir,
        "people.csv",
        "\u{feff}ID, Full  Name ,City\n007,Alice,Leeds\n008, ,\n009,Bob\n".as_bytes(),
    );

    let dataset = load_dataset(&path, &LoadOptions::default()).expect("load csv");
    assert_eq!(dataset.name(), "people");
    assert_eq!(dataset.columns(), ["ID", "Full Name", "City"]);
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.value(0, 0), Some(&CellValue::text("007")));
    assert_eq!(dataset.value(1, 1), Some(&CellValue::Missing));
    assert_eq!(dataset.value(1, 2), Some(&CellValue::Missing));
    // Short rows are padded.
    assert_eq!(dataset.value(2, 2), Some(&CellValue::Missing));
}

#[test]
fn rejects_rows_wider_than_header() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(&dir, "wide.csv", b"id,name\n1,a,extra\n");
    let err = load_dataset(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        IngestError::RowTooWide {
            row: 2,
            expected: 2,
            actual: 3,
            ..
        }
    ));
}

#[test]
fn rejects_utf16_and_unknown_extensions() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(&dir, "utf16.csv", &[0xFF, 0xFE, b'i', 0, b'd', 0]);
    let err = load_dataset(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::UnsupportedEncoding { .. }));

    let path = write_file(&dir, "data.json", b"{}");
    let err = load_dataset(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::UnsupportedFormat { .. }));
}

#[test]
fn missing_file_is_reported() {
    let dir = TempDir::new().expect("temp dir");
    let err = load_dataset(&dir.path().join("absent.csv"), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}

#[test]
fn empty_csv_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(&dir, "empty.csv", b"");
    let err = load_dataset(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::EmptyFile { .. }));
}

#[test]
fn size_limit_is_enforced() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(&dir, "big.csv", b"id,name\n1,abcdefghij\n");
    let options = LoadOptions {
        max_size: Some(4),
        ..LoadOptions::default()
    };
    let err = load_dataset(&path, &options).unwrap_err();
    assert!(matches!(err, IngestError::FileTooLarge { max_size: 4, .. }));
}

#[test]
fn reads_named_worksheet() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("staff.xlsx");

    let mut workbook = Workbook::new();
    let notes = workbook.add_worksheet();
    notes.set_name("Notes").expect("name sheet");
    notes.write_string(0, 0, "ignored").expect("write");

    let staff = workbook.add_worksheet();
    staff.set_name("Current").expect("name sheet");
    staff.write_string(0, 0, "Key").expect("write");
    staff.write_string(0, 1, "Name").expect("write");
    staff.write_number(1, 0, 10.0).expect("write");
    staff.write_string(1, 1, "Alicia").expect("write");
    staff.write_number(3, 0, 11.0).expect("write");
    workbook.save(&path).expect("save workbook");

    assert_eq!(sheet_names(&path).expect("sheet names"), ["Notes", "Current"]);

    let dataset = load_dataset(
        &path,
        &LoadOptions::default().with_sheet("Current").with_name("staff"),
    )
    .expect("load workbook");
    assert_eq!(dataset.columns(), ["Key", "Name"]);
    // Blank row 3 is skipped.
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.value(0, 0).and_then(CellValue::as_text).as_deref(), Some("10"));
    assert_eq!(dataset.value(1, 1), Some(&CellValue::Missing));

    let err = load_dataset(&path, &LoadOptions::default().with_sheet("Archive")).unwrap_err();
    assert!(matches!(err, IngestError::SheetNotFound { sheet, .. } if sheet == "Archive"));
}
