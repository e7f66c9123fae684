//! # Grid Normalizer
//!
//! Turns a loosely structured [`Frame`] into a [`Table`] through a fixed,
//! ordered sequence of cleaning steps:
//!
//! 1. strip leading rows that are entirely null
//! 2. replace null sentinels with [`Value::Null`]
//! 3. drop columns that are entirely null
//! 4. promote the first row to the header when at least half of the labels
//!    are `unnamed` placeholders
//! 5. make labels unique by suffixing repeats with `_(n)`
//! 6. drop rows that are entirely null
//!
//! Running the normalizer on its own output changes nothing.
use crate::table::Frame;
use crate::table::Row;
use crate::table::Table;
use crate::table::Value;
use std::collections::HashMap;
use tracing::debug;

/// Marker the loader leaves in labels of columns without header text
const UNNAMED_MARKER: &str = "unnamed";

/// What one normalizer run changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizeReport {
    /// Rows removed from the top before the first row with a value
    pub leading_rows_stripped: usize,
    /// Labels of the columns removed because every cell was null
    pub columns_dropped: Vec<String>,
    /// Whether the first data row became the header
    pub header_promoted: bool,
    /// Labels rewritten to make the header unique, as (original, renamed)
    pub labels_renamed: Vec<(String, String)>,
    /// Rows removed because every cell was null
    pub rows_dropped: usize,
}

/// Normalizes a frame into a table with unique labels and no blank rows or columns.
pub fn normalize(frame: Frame) -> Table {
    normalize_with_report(frame).0
}

/// Same as [`normalize`], also describing what each step did.
pub fn normalize_with_report(frame: Frame) -> (Table, NormalizeReport) {
    let mut report = NormalizeReport::default();
    let (labels, rows) = frame.into_parts();

    let rows = strip_leading_null_rows(rows, &mut report);
    let rows = replace_sentinels(rows);
    let (labels, rows) = drop_null_columns(labels, rows, &mut report);
    let (labels, rows) = match should_promote_header(&labels, &rows) {
        true => {
            report.header_promoted = true;
            let (labels, rows) = promote_header(rows);
            drop_null_columns(labels, rows, &mut report)
        }
        false => (labels, rows),
    };
    let labels = deduplicate_labels(labels, &mut report);
    let rows = drop_null_rows(rows, &mut report);

    let table = Table::from_parts(labels, rows);
    debug!(
        columns = table.grid().width(),
        rows = table.grid().height(),
        leading_rows_stripped = report.leading_rows_stripped,
        columns_dropped = report.columns_dropped.len(),
        header_promoted = report.header_promoted,
        labels_renamed = report.labels_renamed.len(),
        rows_dropped = report.rows_dropped,
        "normalized table"
    );
    (table, report)
}

fn is_null_row(row: &Row) -> bool {
    row.iter().all(Value::is_null)
}

/// Step 1: removes rows from the top while the first row holds no value.
fn strip_leading_null_rows(rows: Vec<Row>, report: &mut NormalizeReport) -> Vec<Row> {
    let mut start = 0;
    while start < rows.len() && is_null_row(&rows[start]) {
        start += 1;
    }
    report.leading_rows_stripped = start;
    rows.into_iter().skip(start).collect()
}

/// Step 2: every sentinel becomes the canonical null.
fn replace_sentinels(rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|value| if value.is_null() { Value::Null } else { value })
                .collect()
        })
        .collect()
}

/// Step 3: removes columns without a single value. A column of a grid with
/// no rows holds no value, so an empty grid loses all of its columns.
fn drop_null_columns(labels: Vec<String>, rows: Vec<Row>, report: &mut NormalizeReport) -> (Vec<String>, Vec<Row>) {
    let keep = (0..labels.len())
        .map(|index| rows.iter().any(|row| row.get(index).is_some_and(|value| !value.is_null())))
        .collect::<Vec<bool>>();
    if keep.iter().all(|keep| *keep) {
        return (labels, rows);
    }

    let labels = labels
        .into_iter()
        .zip(&keep)
        .filter_map(|(label, keep)| match keep {
            true => Some(label),
            false => {
                report.columns_dropped.push(label);
                None
            }
        })
        .collect();
    let rows = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&keep)
                .filter_map(|(value, keep)| keep.then_some(value))
                .collect()
        })
        .collect();
    (labels, rows)
}

/// Step 4 test: at least half of the labels are placeholders.
fn should_promote_header(labels: &[String], rows: &[Row]) -> bool {
    if labels.is_empty() || rows.is_empty() {
        return false;
    }
    let unnamed = labels
        .iter()
        .filter(|label| label.to_lowercase().contains(UNNAMED_MARKER))
        .count();
    unnamed * 2 >= labels.len()
}

/// Step 4: the first row becomes the header; nulls become empty labels.
fn promote_header(rows: Vec<Row>) -> (Vec<String>, Vec<Row>) {
    let mut rows = rows.into_iter();
    let labels = rows
        .next()
        .map(|header| header.iter().map(Value::to_label).collect())
        .unwrap_or_default();
    (labels, rows.collect())
}

/// Step 5: the n-th repeat of a label becomes `label_(n)`.
fn deduplicate_labels(labels: Vec<String>, report: &mut NormalizeReport) -> Vec<String> {
    let mut counts = HashMap::<String, usize>::with_capacity(labels.len());
    let mut unique = Vec::with_capacity(labels.len());
    for label in labels {
        if !counts.contains_key(&label) {
            counts.insert(label.to_owned(), 0);
            unique.push(label);
            continue;
        }
        // A generated name may itself clash with an earlier label; keep counting.
        let renamed = loop {
            let count = counts.entry(label.to_owned()).or_default();
            *count += 1;
            let candidate = format!("{label}_({count})");
            if !counts.contains_key(&candidate) {
                break candidate;
            }
        };
        counts.insert(renamed.to_owned(), 0);
        report.labels_renamed.push((label, renamed.to_owned()));
        unique.push(renamed);
    }
    unique
}

/// Step 6: removes rows without a single value, keeping order.
fn drop_null_rows(rows: Vec<Row>, report: &mut NormalizeReport) -> Vec<Row> {
    let before = rows.len();
    let rows = rows.into_iter().filter(|row| !is_null_row(row)).collect::<Vec<Row>>();
    report.rows_dropped = before - rows.len();
    rows
}

/// Keeps only rows with at least one value. Shared with the column mapper.
pub(crate) fn prune_null_rows(rows: Vec<Row>) -> Vec<Row> {
    drop_null_rows(rows, &mut NormalizeReport::default())
}
