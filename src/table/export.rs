//! # Exporter
//!
//! Serializes a [`Table`] as a single-sheet Excel workbook: header row
//! first, then one row per table row, no index column.
use crate::error::RustyTimetableError;
use crate::table::Table;
use crate::table::Value;
use rust_xlsxwriter::Workbook;
use rust_xlsxwriter::Worksheet;
use rust_xlsxwriter::XlsxError;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

/// File name offered for the cleaned workbook
pub const FILE_NAME: &str = "cleaned_timetable.xlsx";
/// MIME type of the cleaned workbook
pub const MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Name of the only worksheet
pub const SHEET_NAME: &str = "Sheet1";
/// Longest text an xlsx cell holds, in characters
pub const MAX_STRING_CHARS: usize = 32_767;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Write xlsx failed: {0}")]
    WriterError(#[from] XlsxError),

    #[error("Cell at row {0}, column {1} is outside the worksheet limits")]
    CellOutOfRangeError(usize, usize),

    #[error("Save '{0}' failed: {1}")]
    SaveError(String, #[source] std::io::Error),
}

/// Encodes the table as xlsx bytes.
pub fn export(table: &Table) -> Result<Vec<u8>, RustyTimetableError> {
    let mut workbook = build_workbook(table)?;
    let bytes = workbook.save_to_buffer().map_err(ExportError::from)?;
    debug!(rows = table.grid().height(), bytes = bytes.len(), "exported table");
    Ok(bytes)
}

/// Writes the table as an xlsx file at `path`.
pub fn save<P: AsRef<Path>>(table: &Table, path: P) -> Result<(), RustyTimetableError> {
    let bytes = export(table)?;
    std::fs::write(path.as_ref(), bytes)
        .map_err(|error| ExportError::SaveError(path.as_ref().display().to_string(), error))?;
    debug!(path = %path.as_ref().display(), "saved table");
    Ok(())
}

fn build_workbook(table: &Table) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, label) in table.header().iter().enumerate() {
        if !label.is_empty() {
            let (row, col) = to_position(0, col)?;
            worksheet.write_string(row, col, fit_string(label, row, col))?;
        }
    }
    for (row, values) in table.rows().iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            write_value(worksheet, row + 1, col, value)?;
        }
    }
    Ok(workbook)
}

fn write_value(worksheet: &mut Worksheet, row: usize, col: usize, value: &Value) -> Result<(), ExportError> {
    let (row, col) = to_position(row, col)?;
    match value {
        Value::Null => (),
        Value::String(text) if text.is_empty() => (),
        Value::String(text) => {
            worksheet.write_string(row, col, fit_string(text, row, col))?;
        }
        Value::Number(number) => {
            worksheet.write_number(row, col, *number)?;
        }
        Value::Boolean(flag) => {
            worksheet.write_boolean(row, col, *flag)?;
        }
    }
    Ok(())
}

/// Cuts `text` to the xlsx cell limit.
fn fit_string(text: &str, row: u32, col: u16) -> &str {
    match text.char_indices().nth(MAX_STRING_CHARS) {
        Some((end, _)) => {
            warn!(row, col, chars = text.chars().count(), "truncated text to {MAX_STRING_CHARS} characters");
            &text[..end]
        }
        None => text,
    }
}

fn to_position(row: usize, col: usize) -> Result<(u32, u16), ExportError> {
    let error = || ExportError::CellOutOfRangeError(row, col);
    Ok((u32::try_from(row).map_err(|_| error())?, u16::try_from(col).map_err(|_| error())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::Workbook;
    use crate::table::Row;

    const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

    fn timetable(rows: Vec<Row>) -> Table {
        let header = ["teacher", "day", "time", "subject", "class"].map(String::from).to_vec();
        Table::from_parts(header, rows)
    }

    #[test]
    fn exports_rows() {
        let table = timetable(vec![
            vec!["Ana".into(), "Mon".into(), "08:00".into(), "Math".into(), 7.0.into()],
            vec!["Bo".into(), Value::Null, "09:00".into(), "Art".into(), true.into()],
        ]);
        let bytes = export(&table).unwrap();
        assert!(bytes.starts_with(ZIP_SIGNATURE));
    }

    #[test]
    fn exports_empty_table() {
        let bytes = export(&timetable(vec![])).unwrap();
        assert!(bytes.starts_with(ZIP_SIGNATURE));

        let mut workbook = Workbook::from_bytes(FILE_NAME, bytes).unwrap();
        assert_eq!(workbook.sheet_names(), [SHEET_NAME]);
        let frame = workbook.read_sheet(SHEET_NAME).unwrap();
        assert_eq!(frame.labels(), ["teacher", "day", "time", "subject", "class"]);
        assert!(frame.grid().is_empty());

        let bytes = export(&Table::default()).unwrap();
        assert!(bytes.starts_with(ZIP_SIGNATURE));
    }

    #[test]
    fn truncates_long_text() {
        let note = "é".repeat(40_000);
        let mut table = timetable(vec![vec!["Ana".into(), "Mon".into(), "08:00".into(), note.as_str().into(), "7A".into()]]);
        let bytes = export(&table).unwrap();

        let mut workbook = Workbook::from_bytes(FILE_NAME, bytes).unwrap();
        let frame = workbook.read_sheet(SHEET_NAME).unwrap();
        match &frame.grid().rows()[0][3] {
            Value::String(text) => {
                assert_eq!(text.chars().count(), MAX_STRING_CHARS);
                assert!(note.starts_with(text.as_str()));
            }
            other => panic!("unexpected value {other:?}"),
        }

        table = Table::from_parts(vec!["x".repeat(MAX_STRING_CHARS + 1)], vec![vec!["Ana".into()]]);
        assert!(export(&table).is_ok());
        assert_eq!(fit_string("Math", 0, 0), "Math");
        assert_eq!(fit_string(&"a".repeat(MAX_STRING_CHARS), 0, 0).len(), MAX_STRING_CHARS);
    }

    #[test]
    fn save_failure_is_export_failure() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("missing").join(FILE_NAME);
        let error = save(&timetable(vec![]), &path).unwrap_err();
        assert_eq!(error.kind(), crate::error::ErrorKind::ExportFailed);
        assert!(error.to_string().starts_with(&format!("Save '{}' failed", path.display())));
    }

    #[test]
    fn positions_fit_worksheet() {
        assert_eq!(to_position(0, 4).unwrap(), (0, 4));
        assert!(to_position(0, 70_000).is_err());
    }

    #[test]
    fn constants() {
        assert_eq!(FILE_NAME, "cleaned_timetable.xlsx");
        assert!(MIME_TYPE.ends_with("spreadsheetml.sheet"));
    }
}
