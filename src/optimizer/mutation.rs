use crate::corpus::CorpusIndex;
use crate::optimizer::crossover::merge_sorted;
use crate::optimizer::generator::generate_window;
use crate::optimizer::population::Candidate;
use fastrand::Rng;

/// Picks an index with probability proportional to its weight.
pub fn roulette_select(rng: &mut Rng, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return rng.usize(0..weights.len());
    }

    let target = rng.f64() * total;
    let mut current = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        current += w;
        if current > target {
            return i;
        }
    }
    // Float rounding left the target past the last bucket
    weights
        .iter()
        .rposition(|&w| w > 0.0)
        .unwrap_or(weights.len() - 1)
}

/// Samples `count` parent indices with replacement.
pub fn select_parents(rng: &mut Rng, weights: &[f64], count: usize) -> Vec<usize> {
    if weights.is_empty() {
        return Vec::new();
    }
    (0..count).map(|_| roulette_select(rng, weights)).collect()
}

/// Removes between 1 and `len / 2` randomly chosen lines. Candidates with
/// fewer than two lines are left alone. Returns the number removed.
pub fn remove_random_lines(rng: &mut Rng, candidate: &mut Candidate) -> usize {
    let len = candidate.len();
    if len < 2 {
        return 0;
    }
    let count = rng.usize(1..=len / 2);
    let lines = candidate.lines_mut();
    for _ in 0..count {
        let victim = rng.usize(0..lines.len());
        lines.remove(victim);
    }
    count
}

/// Unions a fresh window drawn from `selection` into the candidate.
pub fn add_random_window(
    rng: &mut Rng,
    candidate: &mut Candidate,
    corpus: &CorpusIndex,
    selection: &[usize],
) {
    let window = generate_window(rng, corpus, selection);
    let merged = merge_sorted(candidate.lines(), window.lines());
    *candidate.lines_mut() = merged;
}

#[derive(Debug, Clone, Copy)]
pub struct MutationRates {
    pub mutation: f64,
    pub additive: f64,
}

/// Applies at most one mutation to a freshly crossed child.
pub fn mutate(
    rng: &mut Rng,
    child: &mut Candidate,
    corpus: &CorpusIndex,
    selection: &[usize],
    rates: MutationRates,
) {
    if rng.f64() >= rates.mutation {
        return;
    }
    if rng.f64() < rates.additive {
        add_random_window(rng, child, corpus, selection);
    } else {
        remove_random_lines(rng, child);
    }
}
