pub mod crossover;
pub mod evolution;
pub mod fitness;
pub mod generator;
pub mod mutation;
pub mod population;
pub mod runner;
pub mod stopping;

use crate::config::Config;
use crate::error::{CfResult, CodfrelError};
use self::mutation::MutationRates;

pub use self::population::{Candidate, Population};
pub use self::runner::{CancellationToken, Engine, ProgressCallback, RunOutcome};
pub use self::stopping::{StoppingCondition, StoppingKind};

#[derive(Debug, Clone)]
pub struct GaOptions {
    pub population_per_nl: usize,
    pub number_of_parents: usize,
    pub number_of_children: usize,
    pub rates: MutationRates,
}

impl From<&Config> for GaOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            population_per_nl: cfg.ga.population_per_nl,
            number_of_parents: cfg.ga.number_of_parents,
            number_of_children: cfg.ga.number_of_children,
            rates: MutationRates {
                mutation: cfg.ga.mutation_probability,
                additive: cfg.ga.additive_mutation_probability,
            },
        }
    }
}

impl Default for GaOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl GaOptions {
    pub fn validate(&self) -> CfResult<()> {
        if self.population_per_nl == 0 || self.number_of_parents == 0 {
            return Err(CodfrelError::Config(
                "population_per_nl and number_of_parents must be at least 1".into(),
            ));
        }
        for (name, p) in [
            ("mutation_probability", self.rates.mutation),
            ("additive_mutation_probability", self.rates.additive),
        ] {
            if !(p.is_finite() && (0.0..=1.0).contains(&p)) {
                return Err(CodfrelError::Config(format!(
                    "{} must lie in [0, 1], got {}",
                    name, p
                )));
            }
        }
        Ok(())
    }
}
