use super::pipeline_stage::PipelineStage;
use std::sync::{Arc, Mutex};

/// Observer pattern for run progress. Observers see progress, they never
/// influence what the pipeline computes.
pub trait ProgressObserver: Send + Sync {
    fn notify(&self, stage: PipelineStage, message: &str, fraction_complete: f32);
}

/// Units of work between notifications unless configured otherwise.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 1000;

/// Fans notifications out to every registered observer. An empty reporter is
/// a no-op.
#[derive(Clone)]
pub struct ProgressReporter {
    observers: Vec<Arc<dyn ProgressObserver>>,
    interval: usize,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL)
    }
}

impl ProgressReporter {
    pub fn new(interval: usize) -> Self {
        Self {
            observers: Vec::new(),
            interval: interval.max(1),
        }
    }

    /// A reporter with no observers.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn add_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub fn notify(&self, stage: PipelineStage, message: &str, fraction_complete: f32) {
        let fraction = fraction_complete.clamp(0.0, 1.0);
        for observer in &self.observers {
            observer.notify(stage, message, fraction);
        }
    }

    pub fn started(&self, stage: PipelineStage, message: &str) {
        self.notify(stage, message, 0.0);
    }

    pub fn finished(&self, stage: PipelineStage, message: &str) {
        self.notify(stage, message, 1.0);
    }

    /// Called once per unit of work; notifies every `interval` units and on
    /// the last one.
    pub fn tick(&self, stage: PipelineStage, done: usize, total: usize, unit: &str) {
        if !self.has_observers() || total == 0 {
            return;
        }
        if done % self.interval == 0 || done == total {
            let fraction = done as f32 / total as f32;
            let message = format!(
                "Checked {done}/{total} {unit} ({:.1}%)",
                fraction * 100.0
            );
            self.notify(stage, &message, fraction);
        }
    }
}

/// Logs progress through `tracing`.
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn notify(&self, stage: PipelineStage, message: &str, fraction_complete: f32) {
        if fraction_complete <= 0.0 {
            tracing::info!(
                "[{}/{}] {}",
                stage.ordinal(),
                PipelineStage::ALL.len(),
                message
            );
        } else if fraction_complete >= 1.0 {
            tracing::info!("{}", message);
        } else {
            tracing::debug!(stage = %stage, "{} ({:.0}%)", message, fraction_complete * 100.0);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub stage: PipelineStage,
    pub message: String,
    pub fraction_complete: f32,
}

/// Keeps every notification in memory.
#[derive(Default)]
pub struct ProgressRecorder {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProgressObserver for ProgressRecorder {
    fn notify(&self, stage: PipelineStage, message: &str, fraction_complete: f32) {
        let event = ProgressEvent {
            stage,
            message: message.to_string(),
            fraction_complete,
        };
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_reporter_does_nothing() {
        let reporter = ProgressReporter::silent();
        assert!(!reporter.has_observers());
        reporter.tick(PipelineStage::Reconciliation, 1, 1, "records");
    }

    #[test]
    fn ticks_at_interval_and_on_last_unit() {
        let recorder = Arc::new(ProgressRecorder::new());
        let reporter = ProgressReporter::new(10).add_observer(recorder.clone());
        assert!(reporter.has_observers());

        for done in 1..=25 {
            reporter.tick(PipelineStage::Reconciliation, done, 25, "records");
        }

        let fractions: Vec<f32> = recorder
            .events()
            .iter()
            .map(|e| e.fraction_complete)
            .collect();
        assert_eq!(fractions, vec![0.4, 0.8, 1.0]);
        assert_eq!(recorder.events()[2].message, "Checked 25/25 records (100.0%)");
    }

    #[test]
    fn fans_out_to_every_observer() {
        let first = Arc::new(ProgressRecorder::new());
        let second = Arc::new(ProgressRecorder::new());
        let reporter = ProgressReporter::new(1)
            .add_observer(first.clone())
            .add_observer(second.clone());

        reporter.started(PipelineStage::PaletteExtraction, "Analyzing image");
        reporter.notify(PipelineStage::PaletteExtraction, "over", 3.0);

        assert_eq!(first.events(), second.events());
        assert_eq!(first.events()[1].fraction_complete, 1.0);
    }
}
