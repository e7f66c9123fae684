//! # Rusty Timetable
//!
//! Cleans timetable spreadsheets exported from hosted office suites and
//! reshapes them into a fixed five column layout.
//!
//! ## Pipeline
//!
//! - **Loader** ([`spreadsheet`]): opens an Excel (`.xlsx`, `.xlsm`) or
//!   OpenDocument (`.ods`) workbook from a local path or URL. Google Sheets
//!   share links are rewritten to their xlsx export URL.
//! - **Normalizer** ([`table::normalize`]): strips blank leading rows,
//!   treats `""`, `" "`, `"NA"` and `"null"` as missing, drops empty
//!   columns and rows, detects a header row hidden below placeholder labels
//!   and makes labels unique.
//! - **Column Mapper** ([`table::mapping`]): projects the table onto
//!   `teacher, day, time, subject, class`.
//! - **Exporter** ([`table::export`]): writes `cleaned_timetable.xlsx`.
//!
//! [`pipeline::Session`] ties the stages together for one user.
//!
//! ```no_run
//! use rusty_timetable::config::Config;
//! use rusty_timetable::pipeline::Session;
//! use rusty_timetable::table::{ColumnMapping, SemanticKey};
//!
//! let mut session = Session::new(Config::default());
//! session.probe("https://docs.google.com/spreadsheets/d/1AbC/edit#gid=0")?;
//! session.load(None)?;
//! let mapping: ColumnMapping = [
//!     (SemanticKey::Teacher, "Teacher"),
//!     (SemanticKey::Day, "Day"),
//!     (SemanticKey::Time, "Time"),
//!     (SemanticKey::Subject, "Subject"),
//!     (SemanticKey::Class, "Class"),
//! ]
//! .into_iter()
//! .collect();
//! session.submit(&mapping)?.write_to(".")?;
//! # Ok::<(), rusty_timetable::error::RustyTimetableError>(())
//! ```
pub mod config;
pub mod error;
mod helpers;
pub mod pipeline;
pub mod spreadsheet;
pub mod table;

pub use helpers::locator::to_export_url;
pub use helpers::reader::UnifiedReaderError;
pub use helpers::xml::XmlError;
