//! # Table Module
//!
//! In-memory representation of sheet data as it moves through the pipeline:
//! a [`Frame`] is what the loader reads from a sheet (labels not yet trusted),
//! a [`Table`] is what the normalizer produces (labels unique, no blank rows
//! or columns). Both wrap a rectangular [`Grid`] of [`Value`] cells.
use std::fmt::Display;

pub mod export;
pub mod mapping;
pub mod normalize;

pub use mapping::ColumnMapping;
pub use mapping::SemanticKey;

/// Strings that stand for a missing value in exported spreadsheets
pub const NULL_SENTINELS: [&str; 4] = ["", " ", "NA", "null"];

/// A single cell value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    String(String),
    Number(f64),
    Boolean(bool),
}

impl Value {
    /// Returns true for `Null` and for the strings in [`NULL_SENTINELS`].
    /// Every null check in the pipeline goes through this predicate.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(value) => NULL_SENTINELS.contains(&value.as_str()),
            _ => false,
        }
    }

    /// Text used when the value becomes a column label. Nulls become the empty label.
    pub fn to_label(&self) -> String {
        match self {
            Value::Null => String::new(),
            _ => self.to_string(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::String(value) => write!(f, "{value}"),
            Value::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => write!(f, "{}", *value as i64),
            Value::Number(value) => write!(f, "{value}"),
            Value::Boolean(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One row of cells
pub type Row = Vec<Value>;

/// Rectangular grid of cells. Every row has exactly `width` cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grid {
    width: usize,
    rows: Vec<Row>,
}

impl Grid {
    /// Creates a grid of the given width; short rows are padded with nulls.
    /// The width grows to fit the longest row.
    pub fn new(width: usize, rows: Vec<Row>) -> Self {
        let width = rows.iter().map(Vec::len).fold(width, usize::max);
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Grid { width, rows }
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Iterates the cells of one column from top to bottom
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    pub(crate) fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

/// Sheet data as read by the loader: a grid plus the labels the loader
/// assigned from the sheet's first row. Labels may repeat or be placeholders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    labels: Vec<String>,
    grid: Grid,
}

impl Frame {
    /// Creates a frame. Columns without a label get a positional `Unnamed: {index}` label.
    pub fn new(labels: Vec<String>, rows: Vec<Row>) -> Self {
        let grid = Grid::new(labels.len(), rows);
        let mut labels = labels;
        for index in labels.len()..grid.width() {
            labels.push(unnamed_label(index));
        }
        Frame { labels, grid }
    }

    /// Creates a frame whose first row holds the column labels.
    /// Null header cells become `Unnamed: {index}`.
    pub fn with_header_row(rows: Vec<Row>) -> Self {
        let mut rows = rows.into_iter();
        match rows.next() {
            Some(header) => {
                let labels = header
                    .iter()
                    .enumerate()
                    .map(|(index, value)| match value {
                        Value::Null => unnamed_label(index),
                        _ => value.to_label(),
                    })
                    .collect();
                Frame::new(labels, rows.collect())
            }
            None => Frame::default(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Row>) {
        (self.labels, self.grid.into_rows())
    }
}

/// Placeholder label for a column without header text
pub(crate) fn unnamed_label(index: usize) -> String {
    format!("Unnamed: {index}")
}

/// A grid with one unique label per column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    header: Vec<String>,
    grid: Grid,
}

impl Table {
    /// Assembles a table; callers guarantee that labels are unique and match the width.
    pub(crate) fn from_parts(header: Vec<String>, rows: Vec<Row>) -> Self {
        let grid = Grid::new(header.len(), rows);
        debug_assert_eq!(header.len(), grid.width());
        Table { header, grid }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rows(&self) -> &[Row] {
        self.grid.rows()
    }

    /// Position of the column with the given label
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.header.iter().position(|it| it == label)
    }

    /// The first `count` rows, for previews
    pub fn head(&self, count: usize) -> &[Row] {
        &self.rows()[..count.min(self.grid.height())]
    }

    /// Turns the table back into loader output, labels included.
    pub fn into_frame(self) -> Frame {
        Frame {
            labels: self.header,
            grid: self.grid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sentinels_are_null() {
        for value in [Value::Null, "".into(), " ".into(), "NA".into(), "null".into()] {
            assert!(value.is_null(), "{value:?} should be null");
        }
        for value in [Value::from("N/A"), "  ".into(), "NULL".into(), 0.0.into(), false.into()] {
            assert!(!value.is_null(), "{value:?} should not be null");
        }
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::from(3.0).to_string(), "3");
        assert_eq!(Value::from(8.5).to_string(), "8.5");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::Null.to_label(), "");
        assert_eq!(Value::from(None::<&str>), Value::Null);
    }

    #[test]
    fn grid_is_rectangular() {
        let grid = Grid::new(2, vec![vec!["a".into()], vec!["b".into(), "c".into(), "d".into()]]);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.rows()[0], vec![Value::from("a"), Value::Null, Value::Null]);
        assert_eq!(grid.column(1).collect::<Vec<_>>(), vec![&Value::Null, &Value::from("c")]);
    }

    #[test]
    fn frame_header_row() {
        let frame = Frame::with_header_row(vec![
            vec!["Name".into(), Value::Null, 7.0.into()],
            vec!["Ana".into(), "Mon".into(), Value::Null, "extra".into()],
        ]);
        assert_eq!(frame.labels(), ["Name", "Unnamed: 1", "7", "Unnamed: 3"]);
        assert_eq!(frame.grid().height(), 1);
        assert_eq!(frame.grid().width(), 4);
    }

    #[test]
    fn empty_frame() {
        let frame = Frame::with_header_row(vec![]);
        assert!(frame.labels().is_empty());
        assert!(frame.grid().is_empty());
    }
}
