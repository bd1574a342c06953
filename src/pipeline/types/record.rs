use super::{Color, ColorParseError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// One decoded table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based data row number in the source table (header excluded).
    pub row: usize,
    pub name: String,
    /// The code with whitespace and a leading `#` stripped, case preserved.
    pub raw_code: String,
    pub color: Color,
}

impl Record {
    pub fn new(row: usize, name: impl Into<String>, raw_code: impl Into<String>, color: Color) -> Self {
        Self {
            row,
            name: name.into(),
            raw_code: raw_code.into(),
            color,
        }
    }
}

/// Decoded records in input order.
pub type RecordSet = Vec<Record>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowFailureReason {
    #[error("{0}")]
    Color(#[from] ColorParseError),
    #[error("name is empty")]
    EmptyName,
    #[error("cell is not valid UTF-8")]
    InvalidUtf8,
}

/// A row rejected while loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub row: usize,
    pub name: String,
    pub raw_value: String,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: RowFailureReason,
}

fn serialize_reason<S: serde::Serializer>(
    reason: &RowFailureReason,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} ('{}', value '{}'): {}",
            self.row, self.name, self.raw_value, self.reason
        )
    }
}

/// A record together with its palette membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRecord {
    pub record: Record,
    pub matched: bool,
}

/// Every decoded record, classified, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub records: Vec<ClassifiedRecord>,
}

impl Reconciliation {
    pub fn matched_count(&self) -> usize {
        self.records.iter().filter(|r| r.matched).count()
    }

    pub fn missing_count(&self) -> usize {
        self.records.len() - self.matched_count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Missing records, deduplicated by `(name, raw_code)`, first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub records: Vec<Record>,
}

impl ReconciliationResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}
