//! # Column Mapper
//!
//! Projects a normalized [`Table`] onto the fixed timetable schema
//! `teacher, day, time, subject, class` using one user-chosen column per key.
use crate::error::RustyTimetableError;
use crate::table::normalize::prune_null_rows;
use crate::table::Row;
use crate::table::Table;
use std::collections::HashMap;
use std::fmt::Display;
use thiserror::Error;
use tracing::debug;

/// Errors raised while projecting a table
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("No column selected for: {}", join_keys(.0))]
    MissingMappingError(Vec<SemanticKey>),

    #[error("Column '{1}' selected for {0} is not in the table")]
    UnknownColumnError(SemanticKey, String),
}

fn join_keys(keys: &[SemanticKey]) -> String {
    keys.iter().map(SemanticKey::as_str).collect::<Vec<_>>().join(", ")
}

/// The fields of a cleaned timetable, in output order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticKey {
    Teacher,
    Day,
    Time,
    Subject,
    Class,
}

impl SemanticKey {
    /// All keys in output column order
    pub const ALL: [SemanticKey; 5] = [
        SemanticKey::Teacher,
        SemanticKey::Day,
        SemanticKey::Time,
        SemanticKey::Subject,
        SemanticKey::Class,
    ];

    /// Output column label
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticKey::Teacher => "teacher",
            SemanticKey::Day => "day",
            SemanticKey::Time => "time",
            SemanticKey::Subject => "subject",
            SemanticKey::Class => "class",
        }
    }

    /// What the user is asked to pick a column for
    pub fn prompt(&self) -> &'static str {
        match self {
            SemanticKey::Teacher => "teacher's name",
            SemanticKey::Day => "day of the week",
            SemanticKey::Time => "class's time",
            SemanticKey::Subject => "class's subject",
            SemanticKey::Class => "class's name",
        }
    }
}

impl Display for SemanticKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User choice of one source column label per semantic key.
/// Several keys may point at the same label.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnMapping {
    labels: HashMap<SemanticKey, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a source label to a key, replacing an earlier choice.
    pub fn assign(&mut self, key: SemanticKey, label: impl Into<String>) -> &mut Self {
        self.labels.insert(key, label.into());
        self
    }

    pub fn get(&self, key: SemanticKey) -> Option<&str> {
        self.labels.get(&key).map(String::as_str)
    }

    /// Keys without a label, in output order
    pub fn missing(&self) -> Vec<SemanticKey> {
        SemanticKey::ALL
            .into_iter()
            .filter(|key| !self.labels.contains_key(key))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Finds the source column index of every key, in output order.
    pub fn resolve(&self, table: &Table) -> Result<[usize; 5], RustyTimetableError> {
        let missing = self.missing();
        if !missing.is_empty() {
            Err(MappingError::MissingMappingError(missing))?;
        }

        let mut indexes = [0usize; 5];
        for (slot, key) in indexes.iter_mut().zip(SemanticKey::ALL) {
            let label = self.get(key).unwrap_or_default();
            *slot = table
                .column_index(label)
                .ok_or_else(|| MappingError::UnknownColumnError(key, label.to_owned()))?;
        }
        Ok(indexes)
    }
}

impl<S: Into<String>> FromIterator<(SemanticKey, S)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (SemanticKey, S)>>(iter: I) -> Self {
        let mut mapping = ColumnMapping::new();
        for (key, label) in iter {
            mapping.assign(key, label);
        }
        mapping
    }
}

/// Projects the table onto the five semantic columns in fixed order,
/// then drops rows that are entirely null.
pub fn project(table: &Table, mapping: &ColumnMapping) -> Result<Table, RustyTimetableError> {
    let indexes = mapping.resolve(table)?;
    let header = SemanticKey::ALL.iter().map(|key| key.as_str().to_owned()).collect();
    let rows = table
        .rows()
        .iter()
        .map(|row| indexes.iter().map(|index| row[*index].to_owned()).collect::<Row>())
        .collect();
    let rows = prune_null_rows(rows);
    debug!(source_rows = table.grid().height(), rows = rows.len(), "projected table");
    Ok(Table::from_parts(header, rows))
}
