pub mod map;
pub mod metrics;
pub mod sweep;

use crate::config::SweepParams;
use crate::corpus::CorpusIndex;
use crate::dataset::Dataset;
use crate::error::CfResult;
use crate::optimizer::Population;
use serde::Serialize;

pub use self::map::map_from_population;
pub use self::metrics::{map_from_rows, EvalMetrics, EvalRow, MapScores, MAP_DEPTH};
pub use self::sweep::{threshold_sweep, SweepConfig, SweepPoint, SweepResult};

/// Everything computed from the final populations.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    /// MAP read directly off the populations.
    pub map_from_population: Option<MapScores>,
    pub sweep: SweepResult,
    /// Row-based MAP for each reported sweep point. Diagnostic only.
    pub diagnostic_map: DiagnosticMap,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticMap {
    pub best_f1: Option<MapScores>,
    pub best_f1_zero_ratio: Option<MapScores>,
    pub baseline: Option<MapScores>,
}

pub fn evaluate(
    corpus: &CorpusIndex,
    populations: &[&Population],
    dataset: &Dataset,
    params: &SweepParams,
) -> CfResult<EvaluationReport> {
    let map = map_from_population(corpus, populations, dataset);
    let sweep = threshold_sweep(corpus, populations, dataset, params)?;
    let diagnostic_map = DiagnosticMap {
        best_f1: sweep.best_f1.as_ref().and_then(|p| map_from_rows(&p.rows)),
        best_f1_zero_ratio: sweep
            .best_f1_zero_ratio
            .as_ref()
            .and_then(|p| map_from_rows(&p.rows)),
        baseline: map_from_rows(&sweep.baseline.rows),
    };
    Ok(EvaluationReport {
        map_from_population: map,
        sweep,
        diagnostic_map,
    })
}
