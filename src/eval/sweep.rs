use crate::config::SweepParams;
use crate::corpus::CorpusIndex;
use crate::dataset::Dataset;
use crate::error::{CfResult, CodfrelError};
use crate::eval::metrics::{EvalMetrics, EvalRow};
use crate::optimizer::Population;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, info};

/// One point of the threshold grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepConfig {
    pub min_fitness: f64,
    pub min_lines_ratio: f64,
}

impl fmt::Display for SweepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min_fitness={},min_lines_ratio={}",
            self.min_fitness, self.min_lines_ratio
        )
    }
}

/// A configuration with its metrics and the rows they came from.
#[derive(Debug, Clone, Serialize)]
pub struct SweepPoint {
    pub config: SweepConfig,
    pub metrics: EvalMetrics,
    #[serde(skip)]
    pub rows: Vec<EvalRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    /// Highest defined F1 over the grid; `None` if no F1 was defined.
    pub best_f1: Option<SweepPoint>,
    /// Highest defined F1 with `min_lines_ratio = 0`.
    pub best_f1_zero_ratio: Option<SweepPoint>,
    /// The loosest configuration: `min_fitness = floor`, ratio 0.
    pub baseline: SweepPoint,
    pub configs_evaluated: usize,
}

/// What the populations of one report know about one artifact.
#[derive(Debug, Default)]
struct ArtifactTouch {
    total_lines: usize,
    max_fitness: f64,
    /// Best fitness of any candidate containing each touched line.
    line_fitness: HashMap<usize, f64>,
}

impl ArtifactTouch {
    fn pred_lines(&self, min_fitness: f64) -> usize {
        self.line_fitness
            .values()
            .filter(|&&f| f > min_fitness)
            .count()
    }
}

fn touches(corpus: &CorpusIndex, population: &Population) -> BTreeMap<usize, ArtifactTouch> {
    let mut by_pl: BTreeMap<usize, ArtifactTouch> = BTreeMap::new();
    for candidate in population.candidates() {
        for &g in candidate.lines() {
            let line = corpus.line(g);
            let touch = by_pl.entry(line.pl_index).or_default();
            touch.total_lines = line.total_lines;
            touch.max_fitness = touch.max_fitness.max(candidate.fitness);
            let best = touch.line_fitness.entry(line.line_index).or_insert(f64::MIN);
            *best = best.max(candidate.fitness);
        }
    }
    by_pl
}

/// A grid point without its rows.
#[derive(Debug, Clone, Copy)]
struct Scored {
    config: SweepConfig,
    f1: f64,
}

/// Keeps `a` unless `b` has a strictly higher F1. `a` must come first in
/// grid order.
fn earlier_or_better(a: Option<Scored>, b: Option<Scored>) -> Option<Scored> {
    match (a, b) {
        (Some(x), Some(y)) if y.f1 > x.f1 => Some(y),
        (Some(x), _) => Some(x),
        (None, y) => y,
    }
}

/// The sweep grid over every (report, artifact) pair.
struct Grid<'a> {
    dataset: &'a Dataset,
    touched: Vec<BTreeMap<usize, ArtifactTouch>>,
    pl_count: usize,
    /// Linked pairs inside the grid.
    linked: usize,
}

impl<'a> Grid<'a> {
    fn new(corpus: &CorpusIndex, populations: &[&Population], dataset: &'a Dataset) -> Self {
        let pl_count = dataset.pl_count();
        let touched: Vec<_> = populations
            .par_iter()
            .map(|p| touches(corpus, p))
            .collect();
        let linked = (0..touched.len())
            .map(|nl| dataset.linked(nl).map_or(0, |s| s.range(..pl_count).count()))
            .sum();
        Self {
            dataset,
            touched,
            pl_count,
            linked,
        }
    }

    fn pairs(&self) -> usize {
        self.touched.len() * self.pl_count
    }

    /// Touched pairs with at least one line, in row order.
    fn touched_pairs(&self) -> impl Iterator<Item = (usize, usize, &ArtifactTouch)> + '_ {
        self.touched.iter().enumerate().flat_map(move |(nl, by_pl)| {
            by_pl
                .range(..self.pl_count)
                .filter(|(_, t)| t.total_lines > 0)
                .map(move |(&pl, t)| (nl, pl, t))
        })
    }

    fn rows(&self, config: SweepConfig) -> Vec<EvalRow> {
        let mut rows = Vec::with_capacity(self.pairs());
        for (nl_index, by_pl) in self.touched.iter().enumerate() {
            for pl_index in 0..self.pl_count {
                let is_link = self.dataset.are_linked(nl_index, pl_index);
                let row = match by_pl.get(&pl_index) {
                    Some(touch) if touch.total_lines > 0 => {
                        let pred_lines = touch.pred_lines(config.min_fitness);
                        EvalRow {
                            nl_index,
                            pl_index,
                            is_link,
                            predicted: pred_lines as f64 / touch.total_lines as f64
                                > config.min_lines_ratio,
                            max_fitness: touch.max_fitness,
                            pred_lines,
                            total_lines: touch.total_lines,
                        }
                    }
                    _ => EvalRow {
                        nl_index,
                        pl_index,
                        is_link,
                        predicted: false,
                        max_fitness: 0.0,
                        pred_lines: 0,
                        total_lines: 0,
                    },
                };
                rows.push(row);
            }
        }
        rows
    }

    fn point(&self, config: SweepConfig) -> SweepPoint {
        let rows = self.rows(config);
        SweepPoint {
            config,
            metrics: EvalMetrics::from_rows(&rows),
            rows,
        }
    }

    /// Metrics of every ratio step at one fitness threshold. Predicted line
    /// shares are computed once; untouched pairs are never predicted.
    fn step_metrics(
        &self,
        min_fitness: f64,
        ratio_steps: usize,
    ) -> Vec<(SweepConfig, EvalMetrics)> {
        let shares: Vec<(bool, f64)> = self
            .touched_pairs()
            .map(|(nl, pl, t)| {
                let share = t.pred_lines(min_fitness) as f64 / t.total_lines as f64;
                (self.dataset.are_linked(nl, pl), share)
            })
            .collect();

        (0..ratio_steps)
            .map(|j| {
                let config = SweepConfig {
                    min_fitness,
                    min_lines_ratio: j as f64 / ratio_steps as f64,
                };
                let (mut tp, mut fp) = (0, 0);
                for &(is_link, share) in &shares {
                    if share > config.min_lines_ratio {
                        if is_link {
                            tp += 1;
                        } else {
                            fp += 1;
                        }
                    }
                }
                let fn_ = self.linked - tp;
                let tn = self.pairs() - tp - fp - fn_;
                (config, EvalMetrics::from_counts(tp, fp, tn, fn_))
            })
            .collect()
    }
}

/// Evaluates the `min_fitness x min_lines_ratio` grid over every
/// (report, artifact) pair.
///
/// Fitness steps run in parallel and reduce in grid order, so ties keep the
/// earliest configuration. Rows are only built for the reported points.
pub fn threshold_sweep(
    corpus: &CorpusIndex,
    populations: &[&Population],
    dataset: &Dataset,
    params: &SweepParams,
) -> CfResult<SweepResult> {
    params.validate()?;
    if populations.len() != dataset.nl_count() {
        return Err(CodfrelError::Validation(format!(
            "{} populations for {} NL items",
            populations.len(),
            dataset.nl_count()
        )));
    }

    let grid = Grid::new(corpus, populations, dataset);
    let floor = params.min_fitness_floor;
    let fitness_steps = params.min_fitness_steps;
    let ratio_steps = params.min_lines_ratio_steps;
    let min_fitness_at = |i: usize| floor + (i as f64 / fitness_steps as f64) * (1.0 - floor);

    let (best, zero_ratio) = (0..fitness_steps)
        .into_par_iter()
        .map(|i| {
            let min_fitness = min_fitness_at(i);
            let mut best = None;
            let mut zero_ratio = None;
            let step = grid.step_metrics(min_fitness, ratio_steps);
            for (j, (config, metrics)) in step.into_iter().enumerate() {
                let scored = metrics.f1.map(|f1| Scored { config, f1 });
                if j == 0 {
                    zero_ratio = scored;
                }
                best = earlier_or_better(best, scored);
            }
            debug!("Sweep step {} (min_fitness={:.4}) done", i, min_fitness);
            (best, zero_ratio)
        })
        .reduce(
            || (None, None),
            |a, b| (earlier_or_better(a.0, b.0), earlier_or_better(a.1, b.1)),
        );

    let best_f1 = best.map(|s| grid.point(s.config));
    let best_f1_zero_ratio = zero_ratio.map(|s| grid.point(s.config));
    let baseline = grid.point(SweepConfig {
        min_fitness: floor,
        min_lines_ratio: 0.0,
    });
    let configs_evaluated = fitness_steps * ratio_steps;

    info!(
        "📐 Swept {} configurations; best F1 {}",
        configs_evaluated,
        best_f1
            .as_ref()
            .and_then(|p: &SweepPoint| p.metrics.f1)
            .map_or_else(|| "undefined".to_string(), |f| format!("{:.4}", f))
    );

    Ok(SweepResult {
        best_f1,
        best_f1_zero_ratio,
        baseline,
        configs_evaluated,
    })
}
