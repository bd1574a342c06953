use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn, Instrument};
use uuid::Uuid;

use super::pipeline_stage::PipelineStage;
use super::progress::{ProgressObserver, ProgressReporter};
use super::run_summary::{RunCounts, RunOutcome, RunSummary, MAX_DROPPED_SAMPLES};
use super::stage_timings::StageTimings;
use crate::config::Configuration;
use crate::error::AppError;
use crate::pipeline::services::{
    LoadedRecords, PaletteExtractor, Reconciler, RecordLoader, ReportEmitter,
};
use crate::pipeline::types::Palette;

#[derive(Error, Debug)]
pub enum RunError {
    /// A stage failed before anything could be reconciled.
    #[error(transparent)]
    Aborted(#[from] AppError),
    /// Reconciliation finished but its results could not be persisted. The
    /// computed outcome is kept.
    #[error("{error}")]
    Persist {
        error: AppError,
        outcome: Box<RunOutcome>,
    },
}

impl RunError {
    pub fn app_error(&self) -> &AppError {
        match self {
            RunError::Aborted(error) | RunError::Persist { error, .. } => error,
        }
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        match self {
            RunError::Aborted(_) => None,
            RunError::Persist { outcome, .. } => Some(&**outcome),
        }
    }
}

/// Runs extraction, loading, reconciliation and reporting for one
/// configuration.
pub struct ReconciliationPipeline {
    configuration: Configuration,
    extractor: PaletteExtractor,
    loader: RecordLoader,
    reconciler: Reconciler,
    emitter: ReportEmitter,
}

impl ReconciliationPipeline {
    pub fn new(configuration: Configuration) -> Result<Self, AppError> {
        ReconciliationPipelineBuilder::new(configuration).build()
    }

    pub fn builder(configuration: Configuration) -> ReconciliationPipelineBuilder {
        ReconciliationPipelineBuilder::new(configuration)
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub async fn run(&self) -> Result<RunOutcome, RunError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("reconciliation", %run_id);
        self.run_with_id(run_id).instrument(span).await
    }

    async fn run_with_id(&self, run_id: Uuid) -> Result<RunOutcome, RunError> {
        let started_at = Utc::now();
        let mut timings = StageTimings::new();
        debug!(
            image = %self.configuration.image_path.display(),
            table = %self.configuration.table_path.display(),
            color_column = %self.configuration.color_column,
            parallel = self.configuration.parallel_load,
            "Starting reconciliation run"
        );

        let ((palette, extract_time), (loaded, load_time)) = if self.configuration.parallel_load {
            tokio::try_join!(self.extract_palette(), self.load_records())?
        } else {
            // the table is never read if the image fails
            let extracted = self.extract_palette().await?;
            let loaded = self.load_records().await?;
            (extracted, loaded)
        };
        timings.record(PipelineStage::PaletteExtraction, extract_time);
        timings.record(PipelineStage::RecordLoading, load_time);
        self.log_dropped(&loaded);

        let start = Instant::now();
        let reconciliation = self.reconciler.reconcile(&loaded.records, &palette);
        timings.record(PipelineStage::Reconciliation, start.elapsed());

        let start = Instant::now();
        let result = self.emitter.collect_missing(&reconciliation);
        let report = self.emitter.emit(&result, &self.configuration.output_path);
        timings.record(PipelineStage::Reporting, start.elapsed());

        let counts = RunCounts {
            total_records: loaded.total_rows,
            decoded_records: loaded.decoded_count(),
            dropped_records: loaded.dropped_count(),
            matched_records: reconciliation.matched_count(),
            missing_records: reconciliation.missing_count(),
            reported_records: result.len(),
        };
        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            image_path: self.configuration.image_path.clone(),
            table_path: self.configuration.table_path.clone(),
            palette_size: palette.len(),
            counts,
            dropped_samples: loaded.dropped.iter().take(MAX_DROPPED_SAMPLES).cloned().collect(),
            stage_timings_ms: timings.as_millis(),
            report: report.as_ref().ok().cloned(),
        };
        info!(
            total = counts.total_records,
            decoded = counts.decoded_records,
            dropped = counts.dropped_records,
            matched = counts.matched_records,
            missing = counts.missing_records,
            "Reconciliation finished in {:.2}s",
            timings.total().as_secs_f64()
        );

        let outcome = RunOutcome {
            result,
            dropped: loaded.dropped,
            summary,
        };
        let summary_written = match &self.configuration.summary_path {
            Some(path) => outcome.summary.write_json(path),
            None => Ok(()),
        };

        match (report, summary_written) {
            (Ok(_), Ok(())) => Ok(outcome),
            (Err(error), summary_written) => {
                error!("Failed to persist report: {}", error);
                if let Err(e) = summary_written {
                    warn!("{}", e);
                }
                Err(RunError::Persist {
                    error,
                    outcome: Box::new(outcome),
                })
            }
            (Ok(_), Err(error)) => {
                error!("Failed to persist run summary: {}", error);
                Err(RunError::Persist {
                    error,
                    outcome: Box::new(outcome),
                })
            }
        }
    }

    #[instrument(skip(self), fields(path = %self.configuration.image_path.display()))]
    async fn extract_palette(&self) -> Result<(Palette, Duration), AppError> {
        let extractor = self.extractor.clone();
        let path = self.configuration.image_path.clone();
        tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let palette = extractor.extract(&path)?;
            Ok::<_, AppError>((palette, start.elapsed()))
        })
        .await?
    }

    #[instrument(skip(self), fields(path = %self.configuration.table_path.display()))]
    async fn load_records(&self) -> Result<(LoadedRecords, Duration), AppError> {
        let loader = self.loader.clone();
        let path = self.configuration.table_path.clone();
        tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let loaded = loader.load(&path)?;
            Ok::<_, AppError>((loaded, start.elapsed()))
        })
        .await?
    }

    fn log_dropped(&self, loaded: &LoadedRecords) {
        if loaded.dropped.is_empty() {
            return;
        }
        warn!(
            "Dropped {} of {} rows with invalid data",
            loaded.dropped_count(),
            loaded.total_rows
        );
        for failure in loaded.dropped.iter().take(MAX_DROPPED_SAMPLES) {
            warn!("  {}", failure);
        }
        if loaded.dropped_count() > MAX_DROPPED_SAMPLES {
            warn!(
                "  (...showing first {} of {} dropped rows)",
                MAX_DROPPED_SAMPLES,
                loaded.dropped_count()
            );
        }
    }
}

pub struct ReconciliationPipelineBuilder {
    configuration: Configuration,
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl ReconciliationPipelineBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            observers: Vec::new(),
        }
    }

    pub fn observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn build(self) -> Result<ReconciliationPipeline, AppError> {
        self.configuration.validate()?;

        let progress = self
            .observers
            .into_iter()
            .fold(ProgressReporter::new(self.configuration.progress_interval), |reporter, observer| {
                reporter.add_observer(observer)
            });

        let extractor = PaletteExtractor::new().with_progress(progress.clone());
        let loader = RecordLoader::from_configuration(&self.configuration)?.with_progress(progress.clone());
        let reconciler = Reconciler::new().with_progress(progress.clone());
        let emitter = ReportEmitter::from_configuration(&self.configuration)?.with_progress(progress);

        Ok(ReconciliationPipeline {
            configuration: self.configuration,
            extractor,
            loader,
            reconciler,
            emitter,
        })
    }
}
