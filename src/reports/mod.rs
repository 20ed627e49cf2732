mod artifacts;
mod tables;

use serde::Serialize;
use std::time::Instant;
use tracing::info;

pub use self::artifacts::{write_all as write_artifacts, RunSummary};
pub use self::tables::{
    dataset as print_dataset_report, map as print_map_report, nl_items as print_nl_report,
    run as print_run_report, sweep as print_sweep_report,
};

#[derive(Debug, Clone, Serialize)]
pub struct PhaseTiming {
    pub phase: String,
    pub seconds: f64,
}

/// Collects wall-clock durations of consecutive phases.
pub struct PhaseTimer {
    started: Instant,
    timings: Vec<PhaseTiming>,
}

impl PhaseTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            timings: Vec::new(),
        }
    }

    /// Closes the current phase under `name` and starts the next one.
    pub fn lap(&mut self, name: &str) {
        let seconds = self.started.elapsed().as_secs_f64();
        info!("⏱️  {}: {:.2}s", name, seconds);
        self.timings.push(PhaseTiming {
            phase: name.to_string(),
            seconds,
        });
        self.started = Instant::now();
    }

    pub fn timings(&self) -> &[PhaseTiming] {
        &self.timings
    }
}
