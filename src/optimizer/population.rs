use itertools::Itertools;
use serde::Serialize;
use std::collections::HashSet;

/// A cluster of source lines proposed as evidence for one report.
///
/// Members are global line indices into the corpus, kept sorted and unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Candidate {
    lines: Vec<usize>,
    pub fitness: f64,
}

impl Candidate {
    pub fn new(mut lines: Vec<usize>) -> Self {
        lines.sort_unstable();
        lines.dedup();
        Self {
            lines,
            fitness: 0.0,
        }
    }

    /// Wraps lines that are already sorted and unique.
    pub(crate) fn from_sorted(lines: Vec<usize>) -> Self {
        debug_assert!(lines.windows(2).all(|w| w[0] < w[1]));
        Self {
            lines,
            fitness: 0.0,
        }
    }

    pub fn lines(&self) -> &[usize] {
        &self.lines
    }

    pub(crate) fn lines_mut(&mut self) -> &mut Vec<usize> {
        &mut self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Identity used for deduplication.
    pub fn key(&self) -> String {
        self.lines.iter().join(",")
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Population {
    candidates: Vec<Candidate>,
    cap: usize,
}

impl Population {
    pub fn new(cap: usize) -> Self {
        Self {
            candidates: Vec::with_capacity(cap),
            cap,
        }
    }

    pub fn from_candidates(cap: usize, candidates: Vec<Candidate>) -> Self {
        Self { candidates, cap }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn candidates_mut(&mut self) -> &mut [Candidate] {
        &mut self.candidates
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    pub fn extend<I: IntoIterator<Item = Candidate>>(&mut self, iter: I) {
        self.candidates.extend(iter);
    }

    /// Keeps the first candidate of every key, in current order.
    pub fn remove_duplicates(&mut self) -> usize {
        let before = self.candidates.len();
        let mut seen: HashSet<Vec<usize>> = HashSet::with_capacity(before);
        self.candidates.retain(|c| seen.insert(c.lines.clone()));
        before - self.candidates.len()
    }

    /// Stable sort, fittest first.
    pub fn sort_by_fitness(&mut self) {
        self.candidates.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
    }

    pub fn sort_and_trim(&mut self) {
        self.sort_by_fitness();
        self.candidates.truncate(self.cap);
    }

    /// Roulette weights proportional to fitness, uniform when all are zero.
    pub fn selection_weights(&self) -> Vec<f64> {
        let n = self.candidates.len();
        let total: f64 = self.candidates.iter().map(|c| c.fitness).sum();
        if total > 0.0 {
            self.candidates.iter().map(|c| c.fitness / total).collect()
        } else {
            vec![1.0 / n as f64; n]
        }
    }

    /// Keys of the first `n` candidates.
    pub fn top_keys(&self, n: usize) -> Vec<String> {
        self.candidates.iter().take(n).map(Candidate::key).collect()
    }

    pub fn is_ranked(&self) -> bool {
        self.candidates
            .windows(2)
            .all(|w| w[0].fitness >= w[1].fitness)
    }

    pub fn has_unique_keys(&self) -> bool {
        let mut seen = HashSet::new();
        self.candidates.iter().all(|c| seen.insert(c.lines()))
    }
}
