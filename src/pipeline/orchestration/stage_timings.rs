use super::pipeline_stage::PipelineStage;
use indexmap::IndexMap;
use std::time::Duration;

/// Wall-clock duration per stage, in the order stages completed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageTimings {
    stage_durations: IndexMap<PipelineStage, Duration>,
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stage's duration, accumulating if it ran before.
    pub fn record(&mut self, stage: PipelineStage, duration: Duration) {
        *self
            .stage_durations
            .entry(stage)
            .or_insert_with(|| Duration::from_secs(0)) += duration;
    }

    pub fn get(&self, stage: PipelineStage) -> Duration {
        self.stage_durations
            .get(&stage)
            .copied()
            .unwrap_or_else(|| Duration::from_secs(0))
    }

    pub fn total(&self) -> Duration {
        self.stage_durations.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PipelineStage, &Duration)> {
        self.stage_durations.iter()
    }

    /// Milliseconds per stage, keyed by stage name.
    pub fn as_millis(&self) -> IndexMap<&'static str, f64> {
        self.stage_durations
            .iter()
            .map(|(stage, duration)| (stage.as_str(), duration.as_secs_f64() * 1000.0))
            .collect()
    }
}
