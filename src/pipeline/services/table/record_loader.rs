use csv::{ByteRecord, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::config::Configuration;
use crate::error::AppError;
use crate::pipeline::orchestration::{PipelineStage, ProgressReporter};
use crate::pipeline::types::{Color, Record, RecordSet, RowFailure, RowFailureReason};

const STAGE: PipelineStage = PipelineStage::RecordLoading;

/// Output of a table load: the decoded records plus every row that was
/// dropped on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedRecords {
    pub records: RecordSet,
    pub dropped: Vec<RowFailure>,
    pub total_rows: usize,
}

impl LoadedRecords {
    pub fn decoded_count(&self) -> usize {
        self.records.len()
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Reads a delimited table and decodes each row's color code.
#[derive(Clone)]
pub struct RecordLoader {
    name_column: String,
    color_column: String,
    delimiter: u8,
    drop_invalid_rows: bool,
    progress: ProgressReporter,
}

impl RecordLoader {
    pub fn new(color_column: impl Into<String>) -> Self {
        Self {
            name_column: "name".to_string(),
            color_column: color_column.into(),
            delimiter: b',',
            drop_invalid_rows: true,
            progress: ProgressReporter::silent(),
        }
    }

    pub fn from_configuration(configuration: &Configuration) -> Result<Self, AppError> {
        Ok(Self::new(configuration.color_column.clone())
            .with_name_column(configuration.name_column.clone())
            .with_delimiter(configuration.delimiter_byte()?)
            .drop_invalid_rows(configuration.drop_invalid_rows))
    }

    pub fn with_name_column(mut self, name_column: impl Into<String>) -> Self {
        self.name_column = name_column.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn drop_invalid_rows(mut self, drop_invalid_rows: bool) -> Self {
        self.drop_invalid_rows = drop_invalid_rows;
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn load(&self, path: &Path) -> Result<LoadedRecords, AppError> {
        self.progress
            .started(STAGE, &format!("Processing table {}", path.display()));
        let file = File::open(path).map_err(|e| AppError::TableRead {
            path: path.to_path_buf(),
            source: csv::Error::from(e),
        })?;
        self.load_from_reader(file, path)
    }

    /// `source` is only used to label errors.
    pub fn load_from_reader<R: Read>(&self, reader: R, source: &Path) -> Result<LoadedRecords, AppError> {
        let table_error = |e: csv::Error| AppError::TableRead {
            path: source.to_path_buf(),
            source: e,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers().map_err(table_error)?.clone();
        let (name_idx, color_idx) = self.resolve_columns(&headers, source)?;

        // cells are decoded per row so bad bytes fail only their own row
        let rows: Vec<ByteRecord> = reader
            .byte_records()
            .collect::<Result<_, _>>()
            .map_err(table_error)?;
        let total_rows = rows.len();

        let mut records = RecordSet::with_capacity(total_rows);
        let mut dropped = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            match decode_row(idx + 1, row, name_idx, color_idx) {
                Ok(record) => records.push(record),
                Err(failure) => dropped.push(failure),
            }
            self.progress.tick(STAGE, idx + 1, total_rows, "rows");
        }

        if !dropped.is_empty() && !self.drop_invalid_rows {
            return Err(AppError::ColorDecode {
                path: source.to_path_buf(),
                failures: dropped,
            });
        }

        self.progress.finished(
            STAGE,
            &format!(
                "Table processing complete: {} records loaded, {} dropped",
                records.len(),
                dropped.len()
            ),
        );
        Ok(LoadedRecords {
            records,
            dropped,
            total_rows,
        })
    }

    /// Finds both required columns, or names every one that is absent.
    fn resolve_columns(&self, headers: &StringRecord, source: &Path) -> Result<(usize, usize), AppError> {
        let position = |column: &str| headers.iter().position(|h| h == column);
        match (position(&self.name_column), position(&self.color_column)) {
            (Some(name_idx), Some(color_idx)) => Ok((name_idx, color_idx)),
            (name_idx, color_idx) => {
                let mut missing = Vec::new();
                if name_idx.is_none() {
                    missing.push(self.name_column.clone());
                }
                if color_idx.is_none() {
                    missing.push(self.color_column.clone());
                }
                Err(AppError::Schema {
                    path: source.to_path_buf(),
                    missing,
                })
            }
        }
    }
}

fn decode_row(row: usize, fields: &ByteRecord, name_idx: usize, color_idx: usize) -> Result<Record, RowFailure> {
    // short rows are allowed; absent fields read as empty
    let name_bytes = fields.get(name_idx).unwrap_or_default();
    let raw_bytes = fields.get(color_idx).unwrap_or_default();
    let failure = |reason: RowFailureReason| RowFailure {
        row,
        name: String::from_utf8_lossy(name_bytes).into_owned(),
        raw_value: String::from_utf8_lossy(raw_bytes).into_owned(),
        reason,
    };

    let (name, raw_value) = match (std::str::from_utf8(name_bytes), std::str::from_utf8(raw_bytes)) {
        (Ok(name), Ok(raw_value)) => (name, raw_value),
        _ => return Err(failure(RowFailureReason::InvalidUtf8)),
    };

    let color = Color::from_hex(raw_value).map_err(|e| failure(e.into()))?;
    if name.trim().is_empty() {
        return Err(failure(RowFailureReason::EmptyName));
    }
    Ok(Record::new(row, name, Color::normalize_code(raw_value), color))
}
