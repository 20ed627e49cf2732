use crate::error::{CfResult, CodfrelError};
use crate::optimizer::stopping::{StoppingCondition, StoppingKind};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub ga: GaParams,
    #[command(flatten)]
    pub stopping: StoppingParams,
    #[command(flatten)]
    pub limits: DatasetLimits,
    #[command(flatten)]
    pub sweep: SweepParams,
}

/// Population sizing and variation operator rates.
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GaParams {
    #[arg(long, default_value_t = 1000)]
    pub population_per_nl: usize,
    #[arg(long, default_value_t = 7)]
    pub number_of_parents: usize,
    #[arg(long, default_value_t = 21)]
    pub number_of_children: usize,
    #[arg(long, default_value_t = 0.25)]
    pub mutation_probability: f64,
    #[arg(long, default_value_t = 0.5)]
    pub additive_mutation_probability: f64,
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            population_per_nl: 1000,
            number_of_parents: 7,
            number_of_children: 21,
            mutation_probability: 0.25,
            additive_mutation_probability: 0.5,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoppingParams {
    #[arg(
        long,
        default_value_t = StoppingKind::Iterations,
        value_parser = StoppingKind::parse
    )]
    pub stopping_condition: StoppingKind,
    /// Seconds per NL item, generation count or patience, depending on the condition
    #[arg(long, default_value_t = 100.0)]
    pub stopping_parameter: f64,
    #[arg(long, default_value_t = 10)]
    pub top_items_allowed_shift: usize,
}

impl Default for StoppingParams {
    fn default() -> Self {
        Self {
            stopping_condition: StoppingKind::Iterations,
            stopping_parameter: 100.0,
            top_items_allowed_shift: 10,
        }
    }
}

/// Dataset size caps. Zero disables a cap.
#[derive(Args, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetLimits {
    #[arg(long, default_value_t = 0)]
    pub max_nl: usize,
    #[arg(long, default_value_t = 0)]
    pub max_pl: usize,
    #[arg(long, default_value_t = 0)]
    pub max_links: usize,
}

impl DatasetLimits {
    pub fn nl_limit(&self) -> Option<usize> {
        non_zero(self.max_nl)
    }

    pub fn pl_limit(&self) -> Option<usize> {
        non_zero(self.max_pl)
    }

    pub fn links_limit(&self) -> Option<usize> {
        non_zero(self.max_links)
    }
}

fn non_zero(v: usize) -> Option<usize> {
    if v == 0 {
        None
    } else {
        Some(v)
    }
}

/// Grid of the threshold sweep.
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepParams {
    #[arg(long, default_value_t = 0.5)]
    pub min_fitness_floor: f64,
    #[arg(long, default_value_t = 500)]
    pub min_fitness_steps: usize,
    #[arg(long, default_value_t = 20)]
    pub min_lines_ratio_steps: usize,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            min_fitness_floor: 0.5,
            min_fitness_steps: 500,
            min_lines_ratio_steps: 20,
        }
    }
}

impl SweepParams {
    pub fn validate(&self) -> CfResult<()> {
        if !(0.0..1.0).contains(&self.min_fitness_floor) {
            return Err(CodfrelError::Config(format!(
                "min_fitness_floor must lie in [0, 1), got {}",
                self.min_fitness_floor
            )));
        }
        if self.min_fitness_steps == 0 || self.min_lines_ratio_steps == 0 {
            return Err(CodfrelError::Config(
                "sweep step counts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CfResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CodfrelError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Overwrites fields with values that were explicitly typed on the command line.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($group:ident . $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$group.$field = cli.$group.$field.clone();
                }
            };
        }

        update_if_present!(ga.population_per_nl);
        update_if_present!(ga.number_of_parents);
        update_if_present!(ga.number_of_children);
        update_if_present!(ga.mutation_probability);
        update_if_present!(ga.additive_mutation_probability);

        update_if_present!(stopping.stopping_condition);
        update_if_present!(stopping.stopping_parameter);
        update_if_present!(stopping.top_items_allowed_shift);

        update_if_present!(limits.max_nl);
        update_if_present!(limits.max_pl);
        update_if_present!(limits.max_links);

        update_if_present!(sweep.min_fitness_floor);
        update_if_present!(sweep.min_fitness_steps);
        update_if_present!(sweep.min_lines_ratio_steps);
    }

    pub fn validate(&self) -> CfResult<()> {
        let ga = &self.ga;
        if ga.population_per_nl == 0 {
            return Err(CodfrelError::Config(
                "population_per_nl must be at least 1".into(),
            ));
        }
        if ga.number_of_parents == 0 {
            return Err(CodfrelError::Config(
                "number_of_parents must be at least 1".into(),
            ));
        }
        check_probability("mutation_probability", ga.mutation_probability)?;
        check_probability(
            "additive_mutation_probability",
            ga.additive_mutation_probability,
        )?;

        self.sweep.validate()?;
        self.stopping_condition().map(|_| ())
    }

    pub fn stopping_condition(&self) -> CfResult<StoppingCondition> {
        StoppingCondition::from_params(
            self.stopping.stopping_condition,
            self.stopping.stopping_parameter,
            self.stopping.top_items_allowed_shift,
        )
    }
}

fn check_probability(name: &str, value: f64) -> CfResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CodfrelError::Config(format!(
            "{} must lie in [0, 1], got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_limits_mean_unlimited() {
        let limits = DatasetLimits {
            max_nl: 0,
            max_pl: 3,
            max_links: 0,
        };
        assert_eq!(limits.nl_limit(), None);
        assert_eq!(limits.pl_limit(), Some(3));
        assert_eq!(limits.links_limit(), None);
    }

    #[test]
    fn rejects_bad_probability() {
        let mut cfg = Config::default();
        cfg.ga.mutation_probability = 1.5;
        assert!(matches!(cfg.validate(), Err(CodfrelError::Config(_))));

        let mut cfg = Config::default();
        cfg.ga.additive_mutation_probability = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_population() {
        let mut cfg = Config::default();
        cfg.ga.population_per_nl = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{ "ga": { "population_per_nl": 42 } }"#).unwrap();
        assert_eq!(cfg.ga.population_per_nl, 42);
        assert_eq!(cfg.ga.number_of_parents, 7);
        assert_eq!(cfg.stopping.stopping_condition, StoppingKind::Iterations);
        assert_eq!(cfg.sweep.min_fitness_steps, 500);
    }
}
