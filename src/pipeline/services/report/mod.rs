pub mod report_emitter;

pub use report_emitter::{ReportEmitter, ReportOutcome};
