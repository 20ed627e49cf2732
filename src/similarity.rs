//! Semantic similarity between token documents.
//!
//! The fitness evaluator hands a whole batch (candidate documents plus the
//! report document) to a [`SimilarityModel`] so that vocabulary and term
//! weighting are computed jointly over that batch.

use crate::error::CfResult;
use std::collections::HashMap;

pub trait SimilarityModel: Send + Sync {
    /// Similarity in [-1, 1] of every document in `corpus` to `corpus[query]`.
    ///
    /// Implementations must be deterministic for an identical batch, return
    /// 1.0 for a non-empty document compared with itself and be symmetric.
    /// The returned vector has one entry per document.
    fn similarities(&self, corpus: &[Vec<&str>], query: usize) -> CfResult<Vec<f64>>;
}

/// Cosine similarity over TF-IDF vectors fitted on the batch.
///
/// Term ids follow first-seen order and vectors are kept sorted by id, so
/// identical batches always produce bit-identical scores. Empty documents
/// have a zero vector and score 0 against everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfCosine;

type SparseVec = Vec<(usize, f64)>;

impl TfIdfCosine {
    pub fn new() -> Self {
        Self
    }

    fn vectorize(corpus: &[Vec<&str>]) -> Vec<SparseVec> {
        let mut vocab: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();

        let counts: Vec<SparseVec> = corpus
            .iter()
            .map(|doc| {
                let mut tf: HashMap<usize, f64> = HashMap::new();
                for &term in doc {
                    let next_id = vocab.len();
                    let id = *vocab.entry(term).or_insert(next_id);
                    if id == doc_freq.len() {
                        doc_freq.push(0);
                    }
                    let slot = tf.entry(id).or_insert(0.0);
                    if *slot == 0.0 {
                        doc_freq[id] += 1;
                    }
                    *slot += 1.0;
                }
                let mut v: SparseVec = tf.into_iter().collect();
                v.sort_unstable_by_key(|&(id, _)| id);
                v
            })
            .collect();

        let n = corpus.len() as f64;
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        counts
            .into_iter()
            .map(|mut v| {
                for (id, w) in v.iter_mut() {
                    *w *= idf[*id];
                }
                let norm = v.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, w) in v.iter_mut() {
                        *w /= norm;
                    }
                }
                v
            })
            .collect()
    }
}

/// Dot product of two id-sorted sparse vectors.
fn sparse_dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

impl SimilarityModel for TfIdfCosine {
    fn similarities(&self, corpus: &[Vec<&str>], query: usize) -> CfResult<Vec<f64>> {
        if query >= corpus.len() {
            return Err(crate::error::CodfrelError::Similarity(format!(
                "query index {} outside batch of {} documents",
                query,
                corpus.len()
            )));
        }
        let vectors = Self::vectorize(corpus);
        let q = &vectors[query];
        Ok(vectors
            .iter()
            .map(|v| sparse_dot(v, q).clamp(-1.0, 1.0))
            .collect())
    }
}
