use crate::error::RustyTimetableError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::sheet::MAX_CELLS;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use crate::table::Frame;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::io::Read;
use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

/// ODS file MIME type identifier
const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
/// XML element name for spreadsheet root
const SPREADSHEET: QName = QName(b"office:spreadsheet");
/// XML element name for table (sheet)
const TABLE: QName = QName(b"table:table");
/// XML element name for table row
const TABLE_ROW: QName = QName(b"table:table-row");
/// XML element name for table cell
const TABLE_CELL: QName = QName(b"table:table-cell");
/// XML element name for covered table cell (merged cells)
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
/// XML element name for annotations (comments)
const ANNOTATION: QName = QName(b"office:annotation");
/// XML element name for paragraph text
const PARAGRAPH: QName = QName(b"text:p");
/// XML element name for string (space) text
const STRING: QName = QName(b"text:s");

/// Error types specific to ODS spreadsheet processing
#[derive(Error, Debug)]
pub enum OdsError {
    /// Invalid ODS MIME type detected in file
    #[error("Invalid ODS MIME type")]
    MimeTypeError,

    /// `content.xml` missing from the archive
    #[error("Missing content.xml in ODS archive")]
    ContentMissingError,
}

/// OpenDocument spreadsheet (`.ods`)
pub(crate) struct OdsSpreadsheet {
    /// File name or URL of the spreadsheet
    name: String,
    /// ZIP archive containing the document parts
    zip: ZipArchive<UnifiedReader>,
    /// Table names in document order
    sheets: Vec<String>,
}

impl OdsSpreadsheet {
    /// Validates an opened archive and lists its tables.
    pub(crate) fn open(file_name: &str, mut zip: ZipArchive<UnifiedReader>) -> Result<Self, RustyTimetableError> {
        check_mime(&mut zip)?;
        if is_password_protected(&mut zip)? {
            Err(SpreadsheetError::CompoundFileError(file_name.to_owned()))?;
        }
        let sheets = load_sheet_names(&mut zip)?;
        Ok(OdsSpreadsheet {
            name: file_name.to_owned(),
            zip,
            sheets,
        })
    }
}

impl Spreadsheet for OdsSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.to_owned()
    }

    fn read_sheet(&mut self, sheet_name: &str) -> Result<Frame, RustyTimetableError> {
        if !self.sheets.iter().any(|name| name == sheet_name) {
            Err(SpreadsheetError::SheetNotFoundError(sheet_name.to_owned()))?;
        }

        let mut reader = self.zip
            .xml_reader("content.xml")?
            .ok_or(OdsError::ContentMissingError)?;
        match_xml_events!(reader => {
            Event::End(event) if event.name() == SPREADSHEET => break,
            Event::Start(event) if event.name() == TABLE => {
                if event.get_attribute_value("table:name")?.as_deref() == Some(sheet_name) {
                    break;
                }
            }
        });

        let mut sheet = Sheet::new(sheet_name);
        let mut row = 0usize;
        let mut col = 0usize;
        let mut row_count = 1usize;
        let mut col_count = 1usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut element_context = false; // reading string children
        let mut comment_context = false; // inside an annotation
        match_xml_events!(reader => {
            Event::End(event) if event.name() == TABLE => break,
            Event::Start(event) if event.name() == TABLE_ROW => {
                row_count = event.parse_attribute_value("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if event.name() == TABLE_ROW => row = row.saturating_add(row_count),
            Event::Start(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                value.clear();
                col_count = event.parse_attribute_value::<usize>("table:number-columns-repeated")?.unwrap_or(1);
                kind = CellType::Empty;
                element_context = false;
                if let Some(value_type) = event.get_attribute_value("office:value-type")? {
                    match value_type.as_ref() {
                        "boolean" => {
                            kind = CellType::Boolean;
                            let flag = event.get_attribute_value("office:boolean-value")?
                                .map(|cow| cow != "false" && cow != "0")
                                .unwrap_or(false);
                            value.push_str(if flag { "1" } else { "0" });
                        }
                        "date" => {
                            kind = CellType::IsoDateTime;
                            if let Some(data) = event.get_attribute_value("office:date-value")? {
                                value.push_str(&data);
                            }
                        }
                        "time" => {
                            kind = CellType::IsoDuration;
                            if let Some(data) = event.get_attribute_value("office:time-value")? {
                                value.push_str(&data);
                            }
                        }
                        "string" => {
                            kind = CellType::InlineString;
                            element_context = true;
                        }
                        _ => {
                            kind = CellType::Number;
                            if let Some(data) = event.get_attribute_value("office:value")? {
                                value.push_str(&data);
                            }
                        }
                    }
                }
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                if kind != CellType::Empty && !value.is_empty() {
                    if row_count.saturating_mul(col_count) > MAX_CELLS {
                        return Err(SpreadsheetError::SheetTooLargeError(sheet.name.to_owned(), row_count, col_count).into());
                    }
                    for row_offset in 0..row_count {
                        for col_offset in 0..col_count {
                            sheet.push(Cell {
                                row: row + row_offset,
                                col: col + col_offset,
                                kind,
                                value: value.to_owned(),
                            });
                        }
                    }
                }
                col = col.saturating_add(col_count);
                element_context = false;
                comment_context = false;
            }
            Event::Start(event) if element_context && event.name() == ANNOTATION => comment_context = true,
            Event::End(event) if element_context && comment_context && event.name() == ANNOTATION => comment_context = false,
            Event::Start(event) if element_context && !comment_context && event.name() == PARAGRAPH => {
                if !value.is_empty() {
                    value.push('\n');
                }
            }
            Event::Start(event) if element_context && !comment_context && event.name() == STRING => {
                let count = event.parse_attribute_value("text:c")?.unwrap_or(1);
                for _ in 0..count {
                    value.push(' ');
                }
            }
            Event::Text(event) if element_context && !comment_context => value.push_bytes_text(&event)?,
            Event::GeneralRef(event) if element_context && !comment_context => value.push_bytes_ref(&event)?,
        });

        debug!(sheet = %sheet.name, cells = sheet.cells.len(), "collected ods cells");
        sheet.to_frame(&[])
    }
}

/// Lists the `table:name` of every table in `content.xml`.
fn load_sheet_names(zip: &mut ZipArchive<UnifiedReader>) -> Result<Vec<String>, RustyTimetableError> {
    let mut reader = zip
        .xml_reader("content.xml")?
        .ok_or(OdsError::ContentMissingError)?;
    let mut sheets = Vec::<String>::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == SPREADSHEET => break,
        Event::Start(event) if event.name() == TABLE => {
            if let Some(name) = event.get_attribute_value("table:name")? {
                sheets.push(name.to_string());
            }
        }
    });
    Ok(sheets)
}

/// Validates that the ZIP archive is an ODS document by checking its MIME type.
fn check_mime(zip: &mut ZipArchive<UnifiedReader>) -> Result<(), RustyTimetableError> {
    if let Some(file) = &mut zip.file("mimetype")? {
        let mut buffer = Vec::with_capacity(MIME_TYPE.len());
        file.read_to_end(&mut buffer)?;
        if buffer.trim_ascii() != MIME_TYPE {
            Err(OdsError::MimeTypeError)?;
        }
    }
    Ok(())
}

/// Checks the manifest for encrypted entries.
fn is_password_protected(zip: &mut ZipArchive<UnifiedReader>) -> Result<bool, RustyTimetableError> {
    let mut reader = match zip.xml_reader("META-INF/manifest.xml")? {
        Some(reader) => reader,
        None => return Ok(false),
    };
    let mut in_file_entry = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = true,
        Event::Start(event) if in_file_entry && event.name() == QName(b"manifest:encryption-data") => {
            return Ok(true);
        }
    });
    Ok(false)
}
