use crate::corpus::{CorpusIndex, NlItem};
use crate::error::CfResult;
use crate::optimizer::crossover::crossover_union;
use crate::optimizer::fitness::FitnessEvaluator;
use crate::optimizer::generator::generate_window;
use crate::optimizer::mutation::{mutate, select_parents};
use crate::optimizer::population::Population;
use crate::optimizer::GaOptions;
use fastrand::Rng;
use std::collections::HashSet;
use tracing::debug;

/// Generator draws allowed per population slot before giving up on
/// finding distinct windows.
const DRAWS_PER_SLOT: usize = 10;

/// Fills a population with distinct random windows, then scores and ranks it.
///
/// Duplicated windows are redrawn, so the population only comes out short
/// when the selection cannot produce enough distinct windows.
pub fn initialize_population(
    rng: &mut Rng,
    corpus: &CorpusIndex,
    evaluator: &FitnessEvaluator,
    nl: &NlItem,
    options: &GaOptions,
) -> CfResult<Population> {
    let cap = options.population_per_nl;
    let selection = corpus.selection(nl.index);
    let mut population = Population::new(cap);
    let mut seen: HashSet<Vec<usize>> = HashSet::with_capacity(cap);

    let mut draws = 0;
    while population.len() < cap && draws < cap * DRAWS_PER_SLOT {
        draws += 1;
        let candidate = generate_window(rng, corpus, selection);
        if seen.insert(candidate.lines().to_vec()) {
            population.push(candidate);
        }
    }
    if population.len() < cap {
        debug!(
            "NL[{}]: only {} distinct windows after {} draws",
            nl.index,
            population.len(),
            draws
        );
    }

    evaluator.score(&mut population, corpus, nl)?;
    population.sort_by_fitness();
    Ok(population)
}

/// Produces the next generation of `current` without touching it.
///
/// Parents are drawn by fitness, each child is the union of two parents and
/// may be mutated once. The grown population is deduplicated, fully
/// re-scored and trimmed back to its cap.
pub fn next_generation(
    rng: &mut Rng,
    current: &Population,
    corpus: &CorpusIndex,
    evaluator: &FitnessEvaluator,
    nl: &NlItem,
    options: &GaOptions,
) -> CfResult<Population> {
    let mut next = current.clone();
    if current.is_empty() || options.number_of_parents == 0 {
        return Ok(next);
    }

    let selection = corpus.selection(nl.index);
    let weights = current.selection_weights();
    let parents = select_parents(rng, &weights, options.number_of_parents);
    let pool = current.candidates();

    for _ in 0..options.number_of_children {
        let a = &pool[parents[rng.usize(0..parents.len())]];
        let b = &pool[parents[rng.usize(0..parents.len())]];
        let mut child = crossover_union(a, b);
        mutate(rng, &mut child, corpus, selection, options.rates);
        next.push(child);
    }

    let dropped = next.remove_duplicates();
    evaluator.score(&mut next, corpus, nl)?;
    next.sort_and_trim();

    debug!(
        "NL[{}]: {} duplicates dropped, best fitness {:.4}",
        nl.index,
        dropped,
        next.best().map(|c| c.fitness).unwrap_or(0.0)
    );
    Ok(next)
}

/// Leaves a population deduplicated, freshly scored, ranked and capped.
pub fn finalize_population(
    population: &mut Population,
    corpus: &CorpusIndex,
    evaluator: &FitnessEvaluator,
    nl: &NlItem,
) -> CfResult<()> {
    population.remove_duplicates();
    evaluator.score(population, corpus, nl)?;
    population.sort_and_trim();
    Ok(())
}
