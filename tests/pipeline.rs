use rust_xlsxwriter::Workbook;
use rusty_timetable::config::Config;
use rusty_timetable::error::ErrorKind;
use rusty_timetable::pipeline::{clean, Session};
use rusty_timetable::spreadsheet;
use rusty_timetable::table::export;
use rusty_timetable::table::mapping::project;
use rusty_timetable::table::normalize::{normalize, normalize_with_report};
use rusty_timetable::table::{ColumnMapping, Frame, SemanticKey, Table, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A sheet the way hosted spreadsheets export it: a title row, a blank row,
/// the real header, an empty column, a row of placeholders and a repeated label.
fn write_messy_workbook(directory: &Path) -> PathBuf {
    let path = directory.join("timetable.xlsx");
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Week A").unwrap();
    sheet.write_string(0, 0, "Timetable 2024").unwrap();
    for (col, label) in ["Teacher", "Day", "", "Time", "Subject", "Class", "Teacher"].iter().enumerate() {
        if !label.is_empty() {
            sheet.write_string(2, col as u16, *label).unwrap();
        }
    }
    for (col, value) in ["Ana", "Mon", "", "08:00", "Math", "7A", "Bo"].iter().enumerate() {
        if !value.is_empty() {
            sheet.write_string(3, col as u16, *value).unwrap();
        }
    }
    for (col, value) in [" ", "NA", "", "null", "NA", " ", "null"].iter().enumerate() {
        if !value.is_empty() {
            sheet.write_string(4, col as u16, *value).unwrap();
        }
    }
    for (col, value) in ["Bo", "Tue", "", "", "Art", "7B", "Ana"].iter().enumerate() {
        if !value.is_empty() {
            sheet.write_string(5, col as u16, *value).unwrap();
        }
    }
    sheet.write_number(5, 3, 9.0).unwrap();

    let other = workbook.add_worksheet();
    other.set_name("Week B").unwrap();
    other.write_string(0, 0, "Teacher").unwrap();
    other.write_string(1, 0, "Cy").unwrap();

    workbook.save(&path).unwrap();
    path
}

fn substitute_mapping() -> ColumnMapping {
    [
        (SemanticKey::Teacher, "Teacher_(1)"),
        (SemanticKey::Day, "Day"),
        (SemanticKey::Time, "Time"),
        (SemanticKey::Subject, "Subject"),
        (SemanticKey::Class, "Class"),
    ]
    .into_iter()
    .collect()
}

#[test]
fn loads_and_normalizes_messy_sheet() {
    let directory = TempDir::new().unwrap();
    let path = write_messy_workbook(directory.path());
    let locator = path.to_str().unwrap();

    let (sheet_names, frame) = spreadsheet::load(locator, None, &Config::default()).unwrap();
    assert_eq!(sheet_names, ["Week A", "Week B"]);
    assert_eq!(frame.labels()[0], "Timetable 2024");
    assert_eq!(frame.labels()[1], "Unnamed: 1");

    let (table, report) = normalize_with_report(frame);
    assert_eq!(report.leading_rows_stripped, 1);
    assert!(report.header_promoted);
    assert_eq!(report.rows_dropped, 1);
    assert_eq!(table.header(), ["Teacher", "Day", "Time", "Subject", "Class", "Teacher_(1)"]);
    assert_eq!(table.rows(), [
        vec![Value::from("Ana"), "Mon".into(), "08:00".into(), "Math".into(), "7A".into(), "Bo".into()],
        vec![Value::from("Bo"), "Tue".into(), 9.0.into(), "Art".into(), "7B".into(), "Ana".into()],
    ]);
    assert_eq!(normalize(table.clone().into_frame()), table);
}

#[test]
fn exported_workbook_loads_back() {
    let directory = TempDir::new().unwrap();
    let path = write_messy_workbook(directory.path());
    let (_, frame) = spreadsheet::load(path.to_str().unwrap(), Some("Week A"), &Config::default()).unwrap();
    let projected = project(&normalize(frame), &substitute_mapping()).unwrap();

    let output = directory.path().join(export::FILE_NAME);
    export::save(&projected, &output).unwrap();

    let (sheet_names, frame) = spreadsheet::load(output.to_str().unwrap(), None, &Config::default()).unwrap();
    assert_eq!(sheet_names, [export::SHEET_NAME]);
    assert_eq!(frame.labels(), ["teacher", "day", "time", "subject", "class"]);
    assert_eq!(normalize(frame), projected);
}

#[test]
fn header_only_sheet_has_nothing_to_map() {
    let frame = Frame::new(["Teacher", "Day", "Time", "Subject", "Class"].map(String::from).to_vec(), vec![]);
    let table = normalize(frame);
    assert!(table.header().is_empty());

    let mapping: ColumnMapping = SemanticKey::ALL.into_iter().map(|key| (key, key.as_str())).collect();
    let error = project(&table, &mapping).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::MissingMapping);
}

#[test]
fn empty_table_round_trip() {
    let directory = TempDir::new().unwrap();
    let output = directory.path().join(export::FILE_NAME);
    export::save(&Table::default(), &output).unwrap();

    let (sheet_names, frame) = spreadsheet::load(output.to_str().unwrap(), None, &Config::default()).unwrap();
    assert_eq!(sheet_names, [export::SHEET_NAME]);
    assert!(frame.labels().is_empty());
    assert!(frame.grid().is_empty());
}

#[test]
fn selects_other_sheet() {
    let directory = TempDir::new().unwrap();
    let path = write_messy_workbook(directory.path());

    let mut session = Session::new(Config::default());
    session.probe(path.to_str().unwrap()).unwrap();
    let table = session.load(Some("Week B")).unwrap();
    assert_eq!(table.header(), ["Teacher"]);
    assert_eq!(table.rows(), [vec![Value::from("Cy")]]);

    let error = session.load(Some("Week C")).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UnsupportedFormat);
    assert_eq!(session.sheet_name(), Some("Week B"));
}

#[test]
fn runs_in_one_call() {
    let directory = TempDir::new().unwrap();
    let path = write_messy_workbook(directory.path());
    let cleaned = clean(path.to_str().unwrap(), None, &substitute_mapping(), Config::default()).unwrap();
    assert_eq!(cleaned.table.header(), ["teacher", "day", "time", "subject", "class"]);
    assert_eq!(cleaned.table.rows()[0][0], Value::from("Bo"));
    assert_eq!(cleaned.file_name, export::FILE_NAME);
}

#[test]
fn reports_unreachable_sources() {
    let directory = TempDir::new().unwrap();
    let missing = directory.path().join("missing.xlsx");
    let error = spreadsheet::load(missing.to_str().unwrap(), None, &Config::default()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::SourceUnreachable);
    assert!(error.to_string().starts_with(missing.to_str().unwrap()));
}
