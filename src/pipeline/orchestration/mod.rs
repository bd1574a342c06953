pub mod pipeline_stage;
pub mod progress;
pub mod reconciliation_pipeline;
pub mod run_summary;
pub mod stage_timings;

pub use pipeline_stage::PipelineStage;
pub use progress::{
    ProgressEvent, ProgressObserver, ProgressRecorder, ProgressReporter, TracingProgress,
    DEFAULT_PROGRESS_INTERVAL,
};
pub use reconciliation_pipeline::{ReconciliationPipeline, ReconciliationPipelineBuilder, RunError};
pub use run_summary::{RunCounts, RunOutcome, RunSummary, MAX_DROPPED_SAMPLES};
pub use stage_timings::StageTimings;
