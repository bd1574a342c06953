pub mod orchestration;
pub mod services;
pub mod types;

pub use orchestration::{ReconciliationPipeline, RunError, RunOutcome, RunSummary};
pub use services::{PaletteExtractor, Reconciler, RecordLoader, ReportEmitter, ReportOutcome};
pub use types::{Color, Palette, Record, RecordSet, ReconciliationResult};
