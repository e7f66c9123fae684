//! # Spreadsheet Loader
//!
//! Opens a spreadsheet from a local path or a URL and reads one sheet into a
//! [`Frame`]. Excel workbooks (`.xlsx`, `.xlsm`) and OpenDocument spreadsheets
//! (`.ods`) are supported. The format is detected from the archive content,
//! so export URLs without a file extension work as well.
use crate::config::Config;
use crate::error::ResultMessage;
use crate::error::RustyTimetableError;
use crate::helpers::locator::to_export_url;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::zip::ZipHelper;
use crate::spreadsheet::ods::OdsSpreadsheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use crate::table::Frame;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use zip::ZipArchive;

pub(crate) mod cell;
pub(crate) mod ods;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

pub use ods::OdsError;

/// Signature of OLE2 compound files (legacy `.xls` and password protected workbooks)
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Cannot detect spreadsheet format of '{0}'")]
    FileFormatError(String),

    #[error("Legacy or password protected workbook '{0}' is not supported")]
    CompoundFileError(String),

    #[error("Spreadsheet '{0}' contains no sheets")]
    SpreadsheetEmptyError(String),

    #[error("Sheet '{0}' not found")]
    SheetNotFoundError(String),

    #[error("Missing file '{0}' in spreadsheet archive")]
    FileError(String),

    #[error("Shared string index {0} out of range")]
    SharedStringIndexError(usize),

    #[error("Invalid value at cell '{0}': {1}")]
    CellValueError(String, String),

    #[error("Sheet '{0}' spans {1} rows by {2} columns, too many cells to load")]
    SheetTooLargeError(String, usize, usize),
}

/// Common interface of the format specific readers
pub(crate) trait Spreadsheet {
    /// Returns the file name or URL the spreadsheet was read from
    fn name(&self) -> String;

    /// Returns the sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Reads one sheet; the first row of its used range supplies the labels
    fn read_sheet(&mut self, sheet_name: &str) -> Result<Frame, RustyTimetableError>;
}

/// An opened spreadsheet of any supported format.
pub struct Workbook {
    inner: Box<dyn Spreadsheet>,
}

impl Workbook {
    /// Opens a spreadsheet from a local path or URL.
    /// Google Sheets share links are rewritten to their xlsx export URL first.
    pub fn open(locator: &str, config: &Config) -> Result<Workbook, RustyTimetableError> {
        let file_name = to_export_url(locator);
        if file_name != locator {
            info!(locator, export = %file_name, "rewrote share link to export url");
        }
        UnifiedReader::new(&file_name, config)
            .and_then(|reader| open_spreadsheet(&file_name, reader))
            .with_prefix(locator)
    }

    /// Opens a spreadsheet that is already in memory.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Workbook, RustyTimetableError> {
        open_spreadsheet(name, UnifiedReader::from_bytes(bytes)).with_prefix(name)
    }

    pub fn name(&self) -> String {
        self.inner.name()
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    /// Reads the named sheet into a frame.
    pub fn read_sheet(&mut self, sheet_name: &str) -> Result<Frame, RustyTimetableError> {
        let frame = self.inner.read_sheet(sheet_name)?;
        debug!(
            sheet = sheet_name,
            columns = frame.grid().width(),
            rows = frame.grid().height(),
            "read sheet"
        );
        Ok(frame)
    }
}

/// Loads one sheet of a spreadsheet: the first sheet when `sheet_name` is `None`.
///
/// # Returns
/// The workbook's sheet names and the frame of the chosen sheet
pub fn load(locator: &str, sheet_name: Option<&str>, config: &Config) -> Result<(Vec<String>, Frame), RustyTimetableError> {
    let mut workbook = Workbook::open(locator, config)?;
    let sheet_names = workbook.sheet_names();
    let sheet_name = match sheet_name {
        Some(name) => name.to_owned(),
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| SpreadsheetError::SpreadsheetEmptyError(locator.to_owned()))?,
    };
    let frame = workbook.read_sheet(&sheet_name)?;
    Ok((sheet_names, frame))
}

/// Detects the container format and opens the matching reader.
fn open_spreadsheet(file_name: &str, mut reader: UnifiedReader) -> Result<Workbook, RustyTimetableError> {
    if is_compound_file(&mut reader)? {
        Err(SpreadsheetError::CompoundFileError(file_name.to_owned()))?;
    }

    let zip = ZipArchive::new(reader)
        .map_err(|_| SpreadsheetError::FileFormatError(file_name.to_owned()))?;
    let inner: Box<dyn Spreadsheet> = if zip.contains("mimetype") {
        debug!(file_name, "detected OpenDocument spreadsheet");
        Box::new(OdsSpreadsheet::open(file_name, zip)?)
    } else if zip.contains("xl/workbook.xml") {
        debug!(file_name, "detected Excel workbook");
        Box::new(XlsxSpreadsheet::open(file_name, zip)?)
    } else {
        Err(SpreadsheetError::FileFormatError(file_name.to_owned()))?
    };

    if inner.sheet_names().is_empty() {
        Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?;
    }
    Ok(Workbook { inner })
}

/// Checks the leading bytes for the OLE2 compound file signature.
fn is_compound_file(reader: &mut UnifiedReader) -> Result<bool, RustyTimetableError> {
    let mut signature = [0u8; 8];
    let mut length = 0;
    while length < signature.len() {
        match reader.read(&mut signature[length..])? {
            0 => break,
            count => length += count,
        }
    }
    reader.seek(SeekFrom::Start(0))?;
    Ok(length == signature.len() && signature == CFB_SIGNATURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn rejects_non_archives() {
        let error = Workbook::from_bytes("notes.txt", b"teacher,day\nAna,Mon\n".to_vec()).err().expect("csv is not a workbook");
        assert_eq!(error.kind(), ErrorKind::UnsupportedFormat);
        assert!(error.to_string().contains("notes.txt"));
    }

    #[test]
    fn rejects_compound_files() {
        let mut bytes = CFB_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0u8; 512]);
        let error = Workbook::from_bytes("legacy.xls", bytes).err().expect("xls is not supported");
        assert_eq!(error.kind(), ErrorKind::UnsupportedFormat);
        assert!(error.to_string().contains("password protected"));
    }

    #[test]
    fn rejects_unknown_archives() {
        let mut buffer = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            writer.start_file("readme.md", zip::write::SimpleFileOptions::default()).unwrap();
            std::io::Write::write_all(&mut writer, b"# hello").unwrap();
            writer.finish().unwrap();
        }
        let error = Workbook::from_bytes("docs.zip", buffer.into_inner()).err().expect("not a spreadsheet");
        assert_eq!(error.kind(), ErrorKind::UnsupportedFormat);
    }
}
