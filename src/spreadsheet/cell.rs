use crate::error::RustyTimetableError;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::SpreadsheetError;
use crate::table::Value;
use chrono::Duration;
use chrono::NaiveDate;

/// Types of cell data in spreadsheet files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values (true/false)
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// ISO 8601 duration strings
    IsoDuration,
    /// Inline string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Analyzes format codes for date/time patterns.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }
}

/// A single cell read from a worksheet with its position, type and raw text.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Cell value as stored in the file
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts the raw text into a table value.
    /// Dates and times become ISO-like strings; shared strings are resolved.
    pub(crate) fn to_value(&self, shared_strings: &[String]) -> Result<Value, RustyTimetableError> {
        let mapper = |message: String| SpreadsheetError::CellValueError(self.reference(), message);
        let value = match self.kind {
            CellType::Empty => Value::Null,
            CellType::Boolean => Value::Boolean(self.value == "1" || self.value.eq_ignore_ascii_case("true")),
            CellType::Number => Value::Number(self.to_double().map_err(mapper)?),
            CellType::NumberDateTime1900 => Value::String(to_datetime_string(&self.value, false).map_err(mapper)?),
            CellType::NumberDateTime1904 => Value::String(to_datetime_string(&self.value, true).map_err(mapper)?),
            CellType::NumberDate1900 => Value::String(to_date_string(&self.value, false).map_err(mapper)?),
            CellType::NumberDate1904 => Value::String(to_date_string(&self.value, true).map_err(mapper)?),
            CellType::NumberTime1900 | CellType::NumberTime1904 => Value::String(to_time_string(&self.value).map_err(mapper)?),
            CellType::IsoDateTime => Value::String(self.value.replace('T', " ")),
            CellType::IsoDuration => Value::String(iso_duration_to_time_string(&self.value)),
            CellType::InlineString | CellType::Error => Value::String(self.value.to_owned()),
            CellType::SharedString => {
                let index = self.value.parse::<usize>()?;
                let string = shared_strings
                    .get(index)
                    .ok_or(SpreadsheetError::SharedStringIndexError(index))?;
                Value::String(string.to_owned())
            }
        };
        Ok(value)
    }

    /// Converts cell value to double-precision floating point.
    fn to_double(&self) -> Result<f64, String> {
        self.value.parse::<f64>().map_err(|_| format!("parse '{}' to double failed", self.value))
    }
}

/// Largest day count accepted as a date serial
const MAX_DATE_SERIAL: f64 = 1e9;

/// Converts Excel numeric date to ISO date string.
/// Handles Lotus 1-2-3 leap year bug for 1900 epoch.
fn to_date_string(value: &str, is_1904: bool) -> Result<String, String> {
    let out_of_range = || format!("date '{value}' out of range");
    let serial = value
        .parse::<f64>()
        .map_err(|_| format!("parse '{value}' to date failed"))?
        .trunc();
    if !serial.is_finite() || serial.abs() > MAX_DATE_SERIAL {
        return Err(out_of_range());
    }
    let days = serial as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).ok_or("invalid epoch")?;
    let date = days
        .checked_add(offset)
        .and_then(Duration::try_days)
        .and_then(|duration| epoch.checked_add_signed(duration))
        .ok_or_else(out_of_range)?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Converts Excel numeric time (fraction of a day) to a `HH:MM:SS` string.
fn to_time_string(value: &str) -> Result<String, String> {
    let factor = value
        .parse::<f64>()
        .map_err(|_| format!("parse '{value}' to time failed"))?;
    if !factor.is_finite() {
        return Err(format!("time '{value}' out of range"));
    }
    let mut hours = (factor.fract() * 86_400_000f64).round() as i64;
    let milliseconds = hours % 1_000; hours /= 1_000;
    let seconds = hours % 60; hours /= 60;
    let minutes = hours % 60; hours /= 60;
    let timestamp = if milliseconds > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    };
    Ok(timestamp)
}

/// Converts Excel numeric datetime to ISO datetime string.
fn to_datetime_string(value: &str, is_1904: bool) -> Result<String, String> {
    let date = to_date_string(value, is_1904)?;
    let time = to_time_string(value)?;
    Ok(format!("{date} {time}"))
}

/// Converts an ODS time value (`PT08H30M00S`) to `08:30:00`.
fn iso_duration_to_time_string(value: &str) -> String {
    value
        .trim_start_matches("PT")
        .replace('H', ":")
        .replace('M', ":")
        .replace('S', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(kind: CellType, value: &str) -> Cell {
        Cell {
            row: 1,
            col: 2,
            kind,
            value: value.to_owned(),
        }
    }

    #[test]
    fn custom_number_formats() {
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd", false), CellType::NumberDate1900);
        assert_eq!(CellType::parse_custom_number_format("hh:mm", false), CellType::NumberTime1900);
        assert_eq!(CellType::parse_custom_number_format("dd/mm/yyyy hh:mm", true), CellType::NumberDateTime1904);
        assert_eq!(CellType::parse_custom_number_format("[Red]0.00", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("0.0\" days\"", false), CellType::Number);
    }

    #[test]
    fn converts_to_values() -> Result<(), RustyTimetableError> {
        let shared = vec!["Math".to_owned(), "Ana".to_owned()];
        assert_eq!(cell(CellType::Number, "12.5").to_value(&shared)?, Value::Number(12.5));
        assert_eq!(cell(CellType::Boolean, "1").to_value(&shared)?, Value::Boolean(true));
        assert_eq!(cell(CellType::SharedString, "1").to_value(&shared)?, Value::from("Ana"));
        assert_eq!(cell(CellType::InlineString, "Room 4").to_value(&shared)?, Value::from("Room 4"));
        assert_eq!(cell(CellType::NumberDate1900, "45292").to_value(&shared)?, Value::from("2024-01-01"));
        assert_eq!(cell(CellType::NumberTime1900, "0.354166666666667").to_value(&shared)?, Value::from("08:30:00"));
        assert_eq!(cell(CellType::NumberDateTime1900, "45292.5").to_value(&shared)?, Value::from("2024-01-01 12:00:00"));
        assert_eq!(cell(CellType::IsoDuration, "PT09H15M00S").to_value(&shared)?, Value::from("09:15:00"));
        assert_eq!(cell(CellType::IsoDateTime, "2024-01-01T07:45:00").to_value(&shared)?, Value::from("2024-01-01 07:45:00"));
        Ok(())
    }

    #[test]
    fn reports_bad_values() {
        let error = cell(CellType::Number, "abc").to_value(&[]).unwrap_err();
        assert_eq!(error.to_string(), "Invalid value at cell 'C2': parse 'abc' to double failed");
        assert!(cell(CellType::SharedString, "3").to_value(&[]).is_err());

        for serial in ["1e15", "1e300", "-1e15", "9223372036854775807", "inf", "NaN"] {
            let error = cell(CellType::NumberDate1900, serial).to_value(&[]).unwrap_err();
            assert_eq!(error.to_string(), format!("Invalid value at cell 'C2': date '{serial}' out of range"));
        }
        let error = cell(CellType::NumberDateTime1904, "1e15").to_value(&[]).unwrap_err();
        assert!(error.to_string().contains("out of range"));
        assert!(cell(CellType::NumberTime1900, "inf").to_value(&[]).is_err());
    }
}
