use serde::Serialize;
use std::fmt;

/// The fixed stages of a reconciliation run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    PaletteExtraction,
    RecordLoading,
    Reconciliation,
    Reporting,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 4] = [
        PipelineStage::PaletteExtraction,
        PipelineStage::RecordLoading,
        PipelineStage::Reconciliation,
        PipelineStage::Reporting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::PaletteExtraction => "palette_extraction",
            PipelineStage::RecordLoading => "record_loading",
            PipelineStage::Reconciliation => "reconciliation",
            PipelineStage::Reporting => "reporting",
        }
    }

    /// 1-based position used in `[n/4]` console labels.
    pub fn ordinal(&self) -> usize {
        match self {
            PipelineStage::PaletteExtraction => 1,
            PipelineStage::RecordLoading => 2,
            PipelineStage::Reconciliation => 3,
            PipelineStage::Reporting => 4,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
