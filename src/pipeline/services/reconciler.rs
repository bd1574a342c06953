use crate::pipeline::orchestration::{PipelineStage, ProgressReporter};
use crate::pipeline::types::{ClassifiedRecord, Palette, Reconciliation, RecordSet};

const STAGE: PipelineStage = PipelineStage::Reconciliation;

/// Classifies each record by exact palette membership.
#[derive(Clone, Default)]
pub struct Reconciler {
    progress: ProgressReporter,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Pure: the output depends only on `records` and `palette`.
    pub fn reconcile(&self, records: &RecordSet, palette: &Palette) -> Reconciliation {
        self.progress.started(STAGE, "Comparing records");
        let total = records.len();

        let classified: Vec<ClassifiedRecord> = records
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                let matched = palette.contains(&record.color);
                self.progress.tick(STAGE, idx + 1, total, "records");
                ClassifiedRecord {
                    record: record.clone(),
                    matched,
                }
            })
            .collect();

        let reconciliation = Reconciliation {
            records: classified,
        };
        self.progress.finished(
            STAGE,
            &format!(
                "Comparison complete: {} matches found, {} missing",
                reconciliation.matched_count(),
                reconciliation.missing_count()
            ),
        );
        reconciliation
    }
}
