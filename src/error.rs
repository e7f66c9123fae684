use crate::pipeline::SessionError;
use thiserror::Error;

/// Main error type for the Rusty Timetable crate.
/// Aggregates errors from the standard library, dependencies and every pipeline stage.
#[derive(Error, Debug)]
pub enum RustyTimetableError {
    #[error("{message}: {source}")]
    WithContextError {
        message: String,
        #[source]
        source: Box<RustyTimetableError>,
    },

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    UnifiedReaderError(#[from] crate::helpers::reader::UnifiedReaderError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    OdsError(#[from] crate::spreadsheet::ods::OdsError),

    // Table module errors
    #[error("{0}")]
    MappingError(#[from] crate::table::mapping::MappingError),

    #[error("{0}")]
    ExportError(#[from] crate::table::export::ExportError),

    #[error("{0}")]
    SessionError(#[from] crate::pipeline::SessionError),
}

/// Coarse classification of a failure, as reported to the user.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The locator could not be fetched or opened.
    SourceUnreachable,
    /// The bytes are not a readable spreadsheet, or the sheet does not exist.
    UnsupportedFormat,
    /// A semantic key has no usable column selection.
    MissingMapping,
    /// Serializing the final table failed.
    ExportFailed,
}

impl RustyTimetableError {
    /// Classifies the error into one of the user-facing kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::WithContextError { source, .. } => source.kind(),
            Self::UnifiedReaderError(_) => ErrorKind::SourceUnreachable,
            Self::MappingError(_) => ErrorKind::MissingMapping,
            Self::ExportError(_) => ErrorKind::ExportFailed,
            Self::SessionError(SessionError::NoSourceError) => ErrorKind::SourceUnreachable,
            Self::SessionError(SessionError::NoTableError) => ErrorKind::MissingMapping,
            _ => ErrorKind::UnsupportedFormat,
        }
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, RustyTimetableError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| RustyTimetableError::WithContextError {
            message: message.to_owned(),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::reader::UnifiedReaderError;
    use crate::spreadsheet::SpreadsheetError;
    use crate::table::mapping::MappingError;
    use crate::table::SemanticKey;

    #[test]
    fn kind_follows_source_module() {
        let error = RustyTimetableError::from(UnifiedReaderError::RemoteFileNoDataError("x".to_owned()));
        assert_eq!(error.kind(), ErrorKind::SourceUnreachable);

        let error = RustyTimetableError::from(SpreadsheetError::SheetNotFoundError("Sheet9".to_owned()));
        assert_eq!(error.kind(), ErrorKind::UnsupportedFormat);

        let error = RustyTimetableError::from(MappingError::MissingMappingError(vec![SemanticKey::Day]));
        assert_eq!(error.kind(), ErrorKind::MissingMapping);
    }

    #[test]
    fn prefix_keeps_kind_and_message() {
        let result: Result<(), RustyTimetableError> =
            Err(UnifiedReaderError::RemoteFileNoDataError("a.xlsx".to_owned()).into());
        let error = result.with_prefix("https://example.com/a.xlsx").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SourceUnreachable);
        assert_eq!(
            error.to_string(),
            "https://example.com/a.xlsx: No data from remote file: 'a.xlsx'"
        );
    }
}
