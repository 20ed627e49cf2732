use crate::error::{CfResult, CodfrelError};
use crate::optimizer::population::Population;
use crate::optimizer::runner::RunContext;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Stopping condition names accepted on the command line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum StoppingKind {
    TimePerNl,
    Iterations,
    #[strum(to_string = "patience-after-top-item-change")]
    #[serde(rename = "patience-after-top-item-change")]
    PatienceTop1,
    #[strum(to_string = "patience-after-top-2-items-change")]
    #[serde(rename = "patience-after-top-2-items-change")]
    PatienceTop2,
    #[strum(
        to_string = "patience-after-top-3-items-change",
        serialize = "patience-after-top-3-item-change"
    )]
    #[serde(
        rename = "patience-after-top-3-items-change",
        alias = "patience-after-top-3-item-change"
    )]
    PatienceTop3,
    #[strum(to_string = "patience-after-top-4-items-change")]
    #[serde(rename = "patience-after-top-4-items-change")]
    PatienceTop4,
    #[strum(to_string = "patience-after-top-5-items-change")]
    #[serde(rename = "patience-after-top-5-items-change")]
    PatienceTop5,
}

impl StoppingKind {
    /// Every accepted name, comma separated.
    pub fn names() -> String {
        Self::iter().join(", ")
    }

    /// Parses a kind name; the error lists the accepted names.
    pub fn parse(name: &str) -> CfResult<Self> {
        Self::from_str(name).map_err(|_| {
            CodfrelError::Config(format!(
                "unknown stopping condition '{}', expected one of: {}",
                name,
                Self::names()
            ))
        })
    }

    fn top_items_count(self) -> Option<usize> {
        match self {
            Self::TimePerNl | Self::Iterations => None,
            Self::PatienceTop1 => Some(1),
            Self::PatienceTop2 => Some(2),
            Self::PatienceTop3 => Some(3),
            Self::PatienceTop4 => Some(4),
            Self::PatienceTop5 => Some(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoppingCondition {
    /// Stop once the run has used `seconds_per_nl` for every report.
    TimePerNl { seconds_per_nl: Duration },
    /// Stop once the global generation counter passes the bound.
    Iterations { max_generations: usize },
    /// Stop a report once its top candidates stayed put for long enough.
    Patience {
        patience_iterations: usize,
        top_items_count: usize,
        top_items_allowed_shift: usize,
    },
}

/// Per-report memory of the patience condition.
#[derive(Debug, Clone, PartialEq)]
pub struct PatienceState {
    last_top: Vec<String>,
    last_change: usize,
}

impl PatienceState {
    pub fn last_change(&self) -> usize {
        self.last_change
    }
}

fn whole_positive(kind: StoppingKind, value: f64) -> CfResult<usize> {
    if value.is_finite() && value >= 1.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(CodfrelError::Config(format!(
            "{} expects a positive whole number, got {}",
            kind, value
        )))
    }
}

impl StoppingCondition {
    pub fn from_params(kind: StoppingKind, parameter: f64, allowed_shift: usize) -> CfResult<Self> {
        match kind {
            StoppingKind::TimePerNl => {
                if !(parameter.is_finite() && parameter > 0.0) {
                    return Err(CodfrelError::Config(format!(
                        "{} expects a positive number of seconds, got {}",
                        kind, parameter
                    )));
                }
                Ok(Self::TimePerNl {
                    seconds_per_nl: Duration::from_secs_f64(parameter),
                })
            }
            StoppingKind::Iterations => Ok(Self::Iterations {
                max_generations: whole_positive(kind, parameter)?,
            }),
            _ => Ok(Self::Patience {
                patience_iterations: whole_positive(kind, parameter)?,
                top_items_count: kind.top_items_count().unwrap_or(1),
                top_items_allowed_shift: allowed_shift,
            }),
        }
    }

    /// Evaluates the condition for one report. `generations` is the number of
    /// generations that report has gone through so far.
    pub fn should_stop(
        &self,
        ctx: &RunContext,
        population: &Population,
        generations: usize,
        patience: &mut Option<PatienceState>,
    ) -> bool {
        match *self {
            Self::TimePerNl { seconds_per_nl } => {
                let budget = seconds_per_nl.as_secs_f64() * ctx.nl_count as f64;
                ctx.elapsed().as_secs_f64() > budget
            }
            Self::Iterations { max_generations } => ctx.global_generation > max_generations,
            Self::Patience {
                patience_iterations,
                top_items_count,
                top_items_allowed_shift,
            } => {
                let window = (top_items_count + top_items_allowed_shift).min(population.len());
                let current = population.top_keys(window);

                match patience {
                    None => {
                        *patience = Some(PatienceState {
                            last_top: current,
                            last_change: generations,
                        });
                        false
                    }
                    Some(state) => {
                        if top_changed(&state.last_top, &current, top_items_count) {
                            state.last_top = current;
                            state.last_change = generations;
                            false
                        } else {
                            generations.saturating_sub(state.last_change) > patience_iterations
                        }
                    }
                }
            }
        }
    }
}

/// True unless each side's top `k` keys still sit inside the other side's
/// widened window.
fn top_changed(last: &[String], current: &[String], k: usize) -> bool {
    let last_set: HashSet<&String> = last.iter().collect();
    let current_set: HashSet<&String> = current.iter().collect();
    let last_kept = last.iter().take(k).all(|key| current_set.contains(key));
    let current_known = current.iter().take(k).all(|key| last_set.contains(key));
    !(last_kept && current_known)
}

impl fmt::Display for StoppingCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimePerNl { seconds_per_nl } => {
                write!(f, "time-per-nl ({:.1}s per NL item)", seconds_per_nl.as_secs_f64())
            }
            Self::Iterations { max_generations } => {
                write!(f, "iterations (max {} generations)", max_generations)
            }
            Self::Patience {
                patience_iterations,
                top_items_count,
                top_items_allowed_shift,
            } => write!(
                f,
                "patience (top {} items, shift {}, patience {})",
                top_items_count, top_items_allowed_shift, patience_iterations
            ),
        }
    }
}
