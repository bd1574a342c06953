use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::AppError;
use crate::pipeline::services::ReportOutcome;
use crate::pipeline::types::{ReconciliationResult, RowFailure};

/// Dropped rows kept in the summary for diagnosis.
pub const MAX_DROPPED_SAMPLES: usize = 10;

/// Record counts for one run. `missing_records` counts every unmatched row;
/// `reported_records` is what remains after deduplication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub total_records: usize,
    pub decoded_records: usize,
    pub dropped_records: usize,
    pub matched_records: usize,
    pub missing_records: usize,
    pub reported_records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub image_path: PathBuf,
    pub table_path: PathBuf,
    pub palette_size: usize,
    #[serde(flatten)]
    pub counts: RunCounts,
    pub dropped_samples: Vec<RowFailure>,
    pub stage_timings_ms: IndexMap<&'static str, f64>,
    /// `None` when the report could not be written.
    pub report: Option<ReportOutcome>,
}

impl RunSummary {
    pub fn write_json(&self, path: &Path) -> Result<(), AppError> {
        let write_error = |source: std::io::Error| AppError::SummaryWrite {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_vec_pretty(self).map_err(|e| write_error(e.into()))?;
        std::fs::write(path, json).map_err(write_error)
    }
}

/// Everything a run computed. Returned even when persisting the report fails.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub result: ReconciliationResult,
    pub dropped: Vec<RowFailure>,
    pub summary: RunSummary,
}

impl RunOutcome {
    pub fn counts(&self) -> RunCounts {
        self.summary.counts
    }

    pub fn has_missing(&self) -> bool {
        !self.result.is_empty()
    }
}
