use crate::corpus::CorpusIndex;
use crate::error::CfResult;
use crate::optimizer::evolution::{finalize_population, initialize_population, next_generation};
use crate::optimizer::fitness::FitnessEvaluator;
use crate::optimizer::population::Population;
use crate::optimizer::stopping::{PatienceState, StoppingCondition};
use crate::optimizer::GaOptions;
use crate::similarity::SimilarityModel;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Cooperative interrupt flag, checked between generations.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run-wide counters handed to stopping conditions.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub started_at: Instant,
    pub global_generation: usize,
    pub nl_count: usize,
    pub interrupted: bool,
}

impl RunContext {
    pub fn new(nl_count: usize) -> Self {
        Self {
            started_at: Instant::now(),
            global_generation: 0,
            nl_count,
            interrupted: false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[derive(Debug, Clone)]
pub struct ProgressReport {
    pub global_generation: usize,
    pub active_nl: usize,
    pub total_nl: usize,
    pub mean_best_fitness: f64,
    pub elapsed: Duration,
}

/// A trait for receiving updates after every generation pass.
/// Boolean return value indicates if the run should continue (true) or be interrupted (false).
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, report: &ProgressReport) -> bool;
}

pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_progress(&self, _report: &ProgressReport) -> bool {
        true
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub interrupted: bool,
    pub global_generations: usize,
    pub generations_per_nl: Vec<usize>,
    pub elapsed_secs: f64,
}

/// Evolution state of one report.
pub struct NlState {
    pub nl_index: usize,
    pub population: Population,
    pub generations: usize,
    pub patience: Option<PatienceState>,
    rng: fastrand::Rng,
}

impl NlState {
    fn advance(
        &mut self,
        corpus: &CorpusIndex,
        evaluator: &FitnessEvaluator,
        options: &GaOptions,
    ) -> CfResult<()> {
        let nl = &corpus.nl_items()[self.nl_index];
        let next = next_generation(
            &mut self.rng,
            &self.population,
            corpus,
            evaluator,
            nl,
            options,
        )?;
        self.population = next;
        self.generations += 1;
        Ok(())
    }
}

pub struct Engine {
    corpus: Arc<CorpusIndex>,
    evaluator: FitnessEvaluator,
    options: GaOptions,
    states: Vec<NlState>,
}

impl Engine {
    /// Validates the options and initializes one scored population per report.
    pub fn new(
        corpus: Arc<CorpusIndex>,
        model: Arc<dyn SimilarityModel>,
        options: GaOptions,
        seed: Option<u64>,
    ) -> CfResult<Self> {
        options.validate()?;
        let evaluator = FitnessEvaluator::new(model);

        let init_start = Instant::now();
        let states = corpus
            .nl_items()
            .par_iter()
            .map(|nl| -> CfResult<NlState> {
                let mut rng = match seed {
                    Some(s) => fastrand::Rng::with_seed(s.wrapping_add(nl.index as u64)),
                    None => fastrand::Rng::new(),
                };
                let population =
                    initialize_population(&mut rng, &corpus, &evaluator, nl, &options)?;
                Ok(NlState {
                    nl_index: nl.index,
                    population,
                    generations: 0,
                    patience: None,
                    rng,
                })
            })
            .collect::<CfResult<Vec<_>>>()?;

        info!(
            "🧬 Initialized {} populations (cap {}) in {:.2?}",
            states.len(),
            options.population_per_nl,
            init_start.elapsed()
        );

        Ok(Self {
            corpus,
            evaluator,
            options,
            states,
        })
    }

    pub fn corpus(&self) -> &CorpusIndex {
        &self.corpus
    }

    pub fn states(&self) -> &[NlState] {
        &self.states
    }

    pub fn population(&self, nl_index: usize) -> &Population {
        &self.states[nl_index].population
    }

    pub fn populations(&self) -> Vec<&Population> {
        self.states.iter().map(|s| &s.population).collect()
    }

    /// Advances every report whose stopping condition is still false until
    /// none is left or the run is interrupted.
    ///
    /// A failing similarity call aborts the run with that error; reports whose
    /// generation succeeded in the same pass keep their new population and
    /// the failing report keeps its previous one.
    pub fn run<CB: ProgressCallback>(
        &mut self,
        condition: &StoppingCondition,
        cancel: &CancellationToken,
        callback: &CB,
    ) -> CfResult<RunOutcome> {
        let mut ctx = RunContext::new(self.states.len());
        info!("🚀 Evolving with stopping condition: {}", condition);

        loop {
            if cancel.is_cancelled() {
                ctx.interrupted = true;
                break;
            }

            let active: Vec<bool> = self
                .states
                .iter_mut()
                .map(|s| {
                    !condition.should_stop(&ctx, &s.population, s.generations, &mut s.patience)
                })
                .collect();
            let active_count = active.iter().filter(|&&a| a).count();
            if active_count == 0 {
                break;
            }

            let corpus = &self.corpus;
            let evaluator = &self.evaluator;
            let options = &self.options;
            let results: Vec<CfResult<()>> = self
                .states
                .par_iter_mut()
                .zip(active.par_iter())
                .filter(|(_, is_active)| **is_active)
                .map(|(state, _)| state.advance(corpus, evaluator, options))
                .collect();
            ctx.global_generation += 1;

            if let Some(err) = results.into_iter().find_map(Result::err) {
                return Err(err);
            }

            let report = ProgressReport {
                global_generation: ctx.global_generation,
                active_nl: active_count,
                total_nl: self.states.len(),
                mean_best_fitness: self.mean_best_fitness(),
                elapsed: ctx.elapsed(),
            };
            if !callback.on_progress(&report) {
                ctx.interrupted = true;
                break;
            }
        }

        if ctx.interrupted {
            warn!(
                "⚠️  Run interrupted after {} generations. Finalizing populations...",
                ctx.global_generation
            );
            self.finalize()?;
        }

        info!(
            "🏁 Evolution finished: {} global generations in {:.2?}",
            ctx.global_generation,
            ctx.elapsed()
        );

        Ok(RunOutcome {
            interrupted: ctx.interrupted,
            global_generations: ctx.global_generation,
            generations_per_nl: self.states.iter().map(|s| s.generations).collect(),
            elapsed_secs: ctx.elapsed().as_secs_f64(),
        })
    }

    /// Dedups, re-scores and ranks every population.
    pub fn finalize(&mut self) -> CfResult<()> {
        let corpus = &self.corpus;
        let evaluator = &self.evaluator;
        self.states.par_iter_mut().try_for_each(|state| {
            let nl = &corpus.nl_items()[state.nl_index];
            finalize_population(&mut state.population, corpus, evaluator, nl)
        })
    }

    fn mean_best_fitness(&self) -> f64 {
        if self.states.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .states
            .iter()
            .map(|s| s.population.best().map(|c| c.fitness).unwrap_or(0.0))
            .sum();
        sum / self.states.len() as f64
    }
}
