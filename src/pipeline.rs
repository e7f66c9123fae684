//! # Session
//!
//! One user's run through the pipeline: probe a locator for its sheets,
//! load and normalize one sheet, then project it with a column mapping and
//! export the result. Each step either completes or leaves the session as
//! it was, so a failed submission can simply be retried.
use crate::config::Config;
use crate::error::ErrorKind;
use crate::error::RustyTimetableError;
use crate::spreadsheet::Workbook;
use crate::table::export;
use crate::table::export::ExportError;
use crate::table::mapping::project;
use crate::table::normalize::normalize_with_report;
use crate::table::normalize::NormalizeReport;
use crate::table::ColumnMapping;
use crate::table::Table;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No spreadsheet has been opened")]
    NoSourceError,

    #[error("No sheet has been loaded")]
    NoTableError,
}

/// The projected timetable together with its encoded workbook.
#[derive(Clone, Debug)]
pub struct CleanedTimetable {
    pub table: Table,
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl CleanedTimetable {
    pub fn mime_type(&self) -> &'static str {
        export::MIME_TYPE
    }

    /// Writes the workbook into `directory` under its file name.
    pub fn write_to<P: AsRef<Path>>(&self, directory: P) -> Result<PathBuf, RustyTimetableError> {
        let path = directory.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.bytes).map_err(|error| ExportError::SaveError(path.display().to_string(), error))?;
        debug!(path = %path.display(), "wrote cleaned timetable");
        Ok(path)
    }
}

/// State of one pipeline run.
pub struct Session {
    config: Config,
    locator: Option<String>,
    workbook: Option<Workbook>,
    sheet_names: Vec<String>,
    sheet_name: Option<String>,
    table: Option<Table>,
    report: Option<NormalizeReport>,
    cleaned: Option<CleanedTimetable>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session {
            config,
            locator: None,
            workbook: None,
            sheet_names: Vec::new(),
            sheet_name: None,
            table: None,
            report: None,
            cleaned: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens a spreadsheet by locator and returns its sheet names.
    pub fn probe(&mut self, locator: &str) -> Result<&[String], RustyTimetableError> {
        let workbook = Workbook::open(locator, &self.config).inspect_err(surface)?;
        Ok(self.replace_source(locator, workbook))
    }

    /// Same as [`Session::probe`] for a spreadsheet already in memory.
    pub fn probe_bytes(&mut self, name: &str, bytes: Vec<u8>) -> Result<&[String], RustyTimetableError> {
        let workbook = Workbook::from_bytes(name, bytes).inspect_err(surface)?;
        Ok(self.replace_source(name, workbook))
    }

    fn replace_source(&mut self, locator: &str, workbook: Workbook) -> &[String] {
        info!(locator, sheets = workbook.sheet_names().len(), "opened spreadsheet");
        self.locator = Some(locator.to_owned());
        self.sheet_names = workbook.sheet_names();
        self.workbook = Some(workbook);
        self.sheet_name = None;
        self.table = None;
        self.report = None;
        self.cleaned = None;
        &self.sheet_names
    }

    /// Reads one sheet (the first when `None`) and normalizes it.
    pub fn load(&mut self, sheet_name: Option<&str>) -> Result<&Table, RustyTimetableError> {
        let workbook = self.workbook.as_mut().ok_or(SessionError::NoSourceError)?;
        let sheet_name = match sheet_name.or(self.sheet_names.first().map(String::as_str)) {
            Some(sheet_name) => sheet_name.to_owned(),
            None => return Err(SessionError::NoSourceError.into()),
        };
        let frame = workbook.read_sheet(&sheet_name).inspect_err(surface)?;
        let (table, report) = normalize_with_report(frame);
        info!(
            sheet = %sheet_name,
            columns = table.grid().width(),
            rows = table.grid().height(),
            "loaded sheet"
        );
        self.sheet_name = Some(sheet_name);
        self.report = Some(report);
        self.cleaned = None;
        Ok(self.table.insert(table))
    }

    /// Projects the loaded table with the mapping and encodes the result.
    pub fn submit(&mut self, mapping: &ColumnMapping) -> Result<&CleanedTimetable, RustyTimetableError> {
        let table = self.table.as_ref().ok_or(SessionError::NoTableError)?;
        let cleaned = project(table, mapping)
            .and_then(|table| {
                let bytes = export::export(&table)?;
                Ok(CleanedTimetable {
                    table,
                    bytes,
                    file_name: self.config.output_file_name.to_owned(),
                })
            })
            .inspect_err(surface)?;
        info!(rows = cleaned.table.grid().height(), bytes = cleaned.bytes.len(), "cleaned timetable");
        Ok(self.cleaned.insert(cleaned))
    }

    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    pub fn sheet_name(&self) -> Option<&str> {
        self.sheet_name.as_deref()
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn report(&self) -> Option<&NormalizeReport> {
        self.report.as_ref()
    }

    pub fn cleaned(&self) -> Option<&CleanedTimetable> {
        self.cleaned.as_ref()
    }
}

/// Runs the whole pipeline for one locator in a fresh session.
pub fn clean(
    locator: &str,
    sheet_name: Option<&str>,
    mapping: &ColumnMapping,
    config: Config,
) -> Result<CleanedTimetable, RustyTimetableError> {
    let mut session = Session::new(config);
    session.probe(locator)?;
    session.load(sheet_name)?;
    session.submit(mapping)?;
    session.cleaned.ok_or_else(|| SessionError::NoTableError.into())
}

/// The single message shown to the user for a failed submission.
pub fn user_message(error: &RustyTimetableError) -> String {
    format!("An error occurred: {error}")
}

fn surface(error: &RustyTimetableError) {
    match error.kind() {
        ErrorKind::SourceUnreachable | ErrorKind::ExportFailed => warn!(%error, kind = ?error.kind(), "submission failed"),
        ErrorKind::UnsupportedFormat | ErrorKind::MissingMapping => info!(%error, kind = ?error.kind(), "submission rejected"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Frame;
    use crate::table::SemanticKey;
    use crate::table::Value;

    fn workbook_bytes() -> Vec<u8> {
        let labels = ["Name", "Weekday", "Hour", "Course", "Group"].map(String::from).to_vec();
        let table = crate::table::normalize::normalize(Frame::new(labels, vec![
            vec!["Ana".into(), "Mon".into(), "08:00".into(), "Math".into(), "7A".into()],
            vec!["Bo".into(), "Tue".into(), 9.0.into(), "Art".into(), "7B".into()],
        ]));
        export::export(&table).unwrap()
    }

    fn mapping() -> ColumnMapping {
        [
            (SemanticKey::Teacher, "Name"),
            (SemanticKey::Day, "Weekday"),
            (SemanticKey::Time, "Hour"),
            (SemanticKey::Subject, "Course"),
            (SemanticKey::Class, "Group"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn runs_all_steps() {
        let mut session = Session::new(Config::default());
        assert_eq!(session.probe_bytes("week.xlsx", workbook_bytes()).unwrap(), ["Sheet1"]);

        let table = session.load(None).unwrap();
        assert_eq!(table.header(), ["Name", "Weekday", "Hour", "Course", "Group"]);
        assert_eq!(session.sheet_name(), Some("Sheet1"));

        let cleaned = session.submit(&mapping()).unwrap();
        assert_eq!(cleaned.file_name, "cleaned_timetable.xlsx");
        assert_eq!(cleaned.table.header(), ["teacher", "day", "time", "subject", "class"]);
        assert_eq!(cleaned.table.rows()[1][2], Value::Number(9.0));
        assert!(!cleaned.bytes.is_empty());
    }

    #[test]
    fn keeps_state_on_failure() {
        let mut session = Session::new(Config::default());
        session.probe_bytes("week.xlsx", workbook_bytes()).unwrap();
        session.load(None).unwrap();

        let error = session.probe_bytes("notes.txt", b"not a workbook".to_vec()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsupportedFormat);
        assert_eq!(session.locator(), Some("week.xlsx"));
        assert!(session.table().is_some());

        let error = session.load(Some("Sheet9")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsupportedFormat);
        assert_eq!(session.sheet_name(), Some("Sheet1"));

        let mut incomplete = mapping();
        incomplete.assign(SemanticKey::Class, "Room");
        let error = session.submit(&incomplete).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingMapping);
        assert!(session.cleaned().is_none());
        assert!(user_message(&error).starts_with("An error occurred: "));
    }

    #[test]
    fn requires_previous_steps() {
        let mut session = Session::new(Config::default());
        assert!(session.load(None).is_err());
        assert!(session.submit(&mapping()).is_err());
    }

    #[test]
    fn writes_cleaned_workbook() {
        let mut session = Session::new(Config::default());
        session.probe_bytes("week.xlsx", workbook_bytes()).unwrap();
        session.load(None).unwrap();
        let cleaned = session.submit(&mapping()).unwrap();

        let directory = tempfile::tempdir().unwrap();
        let path = cleaned.write_to(directory.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "cleaned_timetable.xlsx");
        assert_eq!(std::fs::read(&path).unwrap(), cleaned.bytes);
        assert_eq!(cleaned.mime_type(), export::MIME_TYPE);
    }

    #[test]
    fn failed_write_keeps_result() {
        let mut session = Session::new(Config::default());
        session.probe_bytes("week.xlsx", workbook_bytes()).unwrap();
        session.load(None).unwrap();
        session.submit(&mapping()).unwrap();

        let directory = tempfile::tempdir().unwrap();
        let missing = directory.path().join("missing");
        let cleaned = session.cleaned().unwrap();
        let error = cleaned.write_to(&missing).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ExportFailed);
        assert!(user_message(&error).starts_with("An error occurred: Save '"));

        std::fs::create_dir(&missing).unwrap();
        let path = cleaned.write_to(&missing).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), cleaned.bytes);
    }
}
