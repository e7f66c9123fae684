use crate::error::RustyTimetableError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::SpreadsheetError;
use crate::table::Frame;
use crate::table::Row;
use crate::table::Value;

/// Largest used range, in cells, laid out as dense rows
pub(crate) const MAX_CELLS: usize = 10_000_000;

/// Cells collected from one worksheet together with their used range.
pub(crate) struct Sheet {
    /// Sheet name
    pub(crate) name: String,
    /// All non-empty cells in the sheet
    pub(crate) cells: Vec<Cell>,
    /// Used range (determined from cell data)
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    /// Adds a cell to the sheet, widening the used range.
    pub(crate) fn push(&mut self, cell: Cell) {
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
    }

    /// Updates the used range boundaries based on a cell position.
    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_lower_bound.map(|row_lower_bound| row < row_lower_bound).unwrap_or(true) {
            self.row_lower_bound = Some(row);
        }
        if self.row_upper_bound.map(|row_upper_bound| row_upper_bound < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_lower_bound.map(|col_lower_bound| col < col_lower_bound).unwrap_or(true) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.map(|col_upper_bound| col_upper_bound < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Lays the cells out as dense rows covering the used range; gaps are nulls.
    pub(crate) fn to_rows(&self, shared_strings: &[String]) -> Result<Vec<Row>, RustyTimetableError> {
        let (Some(row_lower), Some(row_upper), Some(col_lower), Some(col_upper)) = (
            self.row_lower_bound,
            self.row_upper_bound,
            self.col_lower_bound,
            self.col_upper_bound,
        ) else {
            return Ok(Vec::new());
        };

        let width = col_upper - col_lower + 1;
        let height = row_upper - row_lower + 1;
        if width.checked_mul(height).map(|cells| cells > MAX_CELLS).unwrap_or(true) {
            return Err(SpreadsheetError::SheetTooLargeError(self.name.to_owned(), height, width).into());
        }
        let mut rows = vec![vec![Value::Null; width]; height];
        for cell in &self.cells {
            rows[cell.row - row_lower][cell.col - col_lower] = cell.to_value(shared_strings)?;
        }
        Ok(rows)
    }

    /// Builds a frame whose labels come from the first row of the used range.
    pub(crate) fn to_frame(&self, shared_strings: &[String]) -> Result<Frame, RustyTimetableError> {
        Ok(Frame::with_header_row(self.to_rows(shared_strings)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellType;

    fn push(sheet: &mut Sheet, row: usize, col: usize, value: &str) {
        sheet.push(Cell {
            row,
            col,
            kind: CellType::InlineString,
            value: value.to_owned(),
        });
    }

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("Term 1");

        assert!(sheet.cells.is_empty());
        assert_eq!(sheet.row_lower_bound, None);
        assert_eq!(sheet.row_upper_bound, None);
        assert_eq!(sheet.col_lower_bound, None);
        assert_eq!(sheet.col_upper_bound, None);
        assert!(sheet.to_rows(&[]).unwrap().is_empty());
    }

    #[test]
    fn sheet_update() {
        let mut sheet = Sheet::new("Term 1");
        push(&mut sheet, 1, 3, "b");
        push(&mut sheet, 1, 1, "a");
        push(&mut sheet, 3, 1, "c");
        push(&mut sheet, 3, 3, "d");

        assert_eq!(sheet.cells.len(), 4);
        assert_eq!(sheet.row_lower_bound, Some(1));
        assert_eq!(sheet.row_upper_bound, Some(3));
        assert_eq!(sheet.col_lower_bound, Some(1));
        assert_eq!(sheet.col_upper_bound, Some(3));
    }

    #[test]
    fn sheet_rows_are_dense() {
        let mut sheet = Sheet::new("Term 1");
        push(&mut sheet, 1, 1, "a");
        push(&mut sheet, 1, 3, "b");
        push(&mut sheet, 3, 2, "c");

        let rows = sheet.to_rows(&[]).unwrap();
        assert_eq!(rows, vec![
            vec![Value::from("a"), Value::Null, Value::from("b")],
            vec![Value::Null, Value::Null, Value::Null],
            vec![Value::Null, Value::from("c"), Value::Null],
        ]);

        let frame = sheet.to_frame(&[]).unwrap();
        assert_eq!(frame.labels(), ["a", "Unnamed: 1", "b"]);
        assert_eq!(frame.grid().height(), 2);
    }

    #[test]
    fn stray_far_cell_is_rejected() {
        let mut sheet = Sheet::new("Term 1");
        push(&mut sheet, 0, 0, "Teacher");
        push(&mut sheet, 1_048_575, 16_383, "x");

        let error = sheet.to_rows(&[]).unwrap_err();
        assert_eq!(error.to_string(), "Sheet 'Term 1' spans 1048576 rows by 16384 columns, too many cells to load");
        assert!(sheet.to_frame(&[]).is_err());
    }
}
