use indexmap::IndexSet;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::Configuration;
use crate::error::AppError;
use crate::pipeline::orchestration::{PipelineStage, ProgressReporter};
use crate::pipeline::types::{Reconciliation, ReconciliationResult};

const STAGE: PipelineStage = PipelineStage::Reporting;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReportOutcome {
    /// Nothing was missing. The output path is left untouched, so a report
    /// from an earlier run stays in place.
    NoMissing,
    Written { path: PathBuf, rows: usize },
}

/// Selects the missing records and writes them out as a table.
#[derive(Clone)]
pub struct ReportEmitter {
    name_column: String,
    color_column: String,
    delimiter: u8,
    write_empty_report: bool,
    progress: ProgressReporter,
}

impl ReportEmitter {
    pub fn new(name_column: impl Into<String>, color_column: impl Into<String>) -> Self {
        Self {
            name_column: name_column.into(),
            color_column: color_column.into(),
            delimiter: b',',
            write_empty_report: false,
            progress: ProgressReporter::silent(),
        }
    }

    pub fn from_configuration(configuration: &Configuration) -> Result<Self, AppError> {
        Ok(Self::new(
            configuration.name_column.clone(),
            configuration.color_column.clone(),
        )
        .with_delimiter(configuration.delimiter_byte()?)
        .write_empty_report(configuration.write_empty_report))
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn write_empty_report(mut self, write_empty_report: bool) -> Self {
        self.write_empty_report = write_empty_report;
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Unmatched records with repeated `(name, raw_code)` pairs removed,
    /// keeping the first occurrence.
    pub fn collect_missing(&self, reconciliation: &Reconciliation) -> ReconciliationResult {
        let mut seen: IndexSet<(&str, &str)> = IndexSet::new();
        let records = reconciliation
            .records
            .iter()
            .filter(|classified| !classified.matched)
            .filter(|classified| {
                seen.insert((
                    classified.record.name.as_str(),
                    classified.record.raw_code.as_str(),
                ))
            })
            .map(|classified| classified.record.clone())
            .collect();
        ReconciliationResult { records }
    }

    /// Writes `result` to `path`, or reports [`ReportOutcome::NoMissing`]
    /// without touching the file system when it is empty and empty reports
    /// are disabled.
    pub fn emit(&self, result: &ReconciliationResult, path: &Path) -> Result<ReportOutcome, AppError> {
        if result.is_empty() && !self.write_empty_report {
            self.progress.finished(STAGE, "No missing records; report not written");
            return Ok(ReportOutcome::NoMissing);
        }

        self.progress
            .started(STAGE, &format!("Saving results to {}", path.display()));
        let write_error = |source: io::Error| AppError::OutputWrite {
            path: path.to_path_buf(),
            source,
        };

        let mut buffer = Vec::new();
        self.write_table(result, &mut buffer).map_err(write_error)?;
        write_atomically(path, &buffer).map_err(write_error)?;

        self.progress.finished(
            STAGE,
            &format!("Results saved to {} ({} rows)", path.display(), result.len()),
        );
        Ok(ReportOutcome::Written {
            path: path.to_path_buf(),
            rows: result.len(),
        })
    }

    /// Header `name_column, color_column`, then one row per record.
    pub fn write_table<W: Write>(&self, result: &ReconciliationResult, sink: W) -> io::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(sink);
        writer.write_record([self.name_column.as_str(), self.color_column.as_str()])?;
        for record in result.iter() {
            writer.write_record([record.name.as_str(), record.raw_code.as_str()])?;
        }
        writer.flush()
    }
}

/// Writes to a sibling `.tmp` file and renames it over `path`, so a failed
/// write never leaves a partial report behind.
fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    file_name.push(".tmp");
    let temp_path = path.with_file_name(file_name);

    let written = std::fs::write(&temp_path, contents).and_then(|()| std::fs::rename(&temp_path, path));
    if written.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    written
}
