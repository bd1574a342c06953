pub mod image;
pub mod reconciler;
pub mod report;
pub mod table;

pub use image::PaletteExtractor;
pub use reconciler::Reconciler;
pub use report::{ReportEmitter, ReportOutcome};
pub use table::{LoadedRecords, RecordLoader};
