#![allow(dead_code)]

use codfrel::corpus::CorpusIndex;
use codfrel::error::{CfResult, CodfrelError};
use codfrel::optimizer::GaOptions;
use codfrel::optimizer::mutation::MutationRates;
use codfrel::similarity::SimilarityModel;
use std::collections::HashSet;

/// Returns the same similarity for every document.
pub struct ConstantSimilarity(pub f64);

impl SimilarityModel for ConstantSimilarity {
    fn similarities(&self, corpus: &[Vec<&str>], _query: usize) -> CfResult<Vec<f64>> {
        Ok(vec![self.0; corpus.len()])
    }
}

/// Fails whenever the query document contains `trigger`, scores 1 otherwise.
pub struct FailingSimilarity {
    pub trigger: &'static str,
}

impl SimilarityModel for FailingSimilarity {
    fn similarities(&self, corpus: &[Vec<&str>], query: usize) -> CfResult<Vec<f64>> {
        if corpus[query].contains(&self.trigger) {
            return Err(CodfrelError::Similarity("model unavailable".into()));
        }
        Ok(vec![1.0; corpus.len()])
    }
}

/// Scores each document by the share of its tokens found in the query.
pub struct OverlapSimilarity;

impl SimilarityModel for OverlapSimilarity {
    fn similarities(&self, corpus: &[Vec<&str>], query: usize) -> CfResult<Vec<f64>> {
        let q: HashSet<&str> = corpus[query].iter().copied().collect();
        Ok(corpus
            .iter()
            .map(|doc| {
                if doc.is_empty() {
                    return 0.0;
                }
                let hits = doc.iter().filter(|t| q.contains(*t)).count();
                hits as f64 / doc.len() as f64
            })
            .collect())
    }
}

fn words(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// Builds an index from whitespace-separated reports and artifacts with
/// one line per `\n`. Every report token is also a keyword.
pub fn corpus(nl: &[&str], artifacts: &[&str]) -> CorpusIndex {
    let nl = nl
        .iter()
        .map(|text| {
            let tokens = words(text);
            let keywords = tokens.iter().cloned().collect();
            (tokens, keywords)
        })
        .collect();
    let artifacts = artifacts
        .iter()
        .map(|text| text.lines().map(words).collect())
        .collect();
    CorpusIndex::from_tokens(nl, artifacts).unwrap()
}

pub fn options(population: usize) -> GaOptions {
    GaOptions {
        population_per_nl: population,
        number_of_parents: 3,
        number_of_children: 6,
        rates: MutationRates {
            mutation: 0.5,
            additive: 0.5,
        },
    }
}

/// A small two-report corpus where each report matches one artifact.
pub fn two_report_corpus() -> CorpusIndex {
    corpus(
        &["export dialog freeze", "login token expire"],
        &[
            "open export dialog\nlist folder files\nrender dialog\nclose dialog",
            "read login form\ncheck token\nrefresh token expire\nstore session",
            "unrelated math helper\ncompute sum",
        ],
    )
}

/// One JSONL row in the docstring/function layout.
pub fn codesearchnet_row(docstring: &str, code: &str) -> String {
    let tokens: Vec<&str> = docstring.split_whitespace().collect();
    serde_json::json!({
        "docstring": docstring,
        "docstring_tokens": tokens,
        "code": code,
    })
    .to_string()
}

/// Scores 1 until the query containing `trigger` has been scored `budget`
/// times, then fails for that query.
pub struct FailAfter {
    pub trigger: &'static str,
    pub budget: std::sync::atomic::AtomicUsize,
}

impl FailAfter {
    pub fn new(trigger: &'static str, budget: usize) -> Self {
        Self {
            trigger,
            budget: std::sync::atomic::AtomicUsize::new(budget),
        }
    }
}

impl SimilarityModel for FailAfter {
    fn similarities(&self, corpus: &[Vec<&str>], query: usize) -> CfResult<Vec<f64>> {
        use std::sync::atomic::Ordering;
        if corpus[query].contains(&self.trigger) {
            let left = self.budget.load(Ordering::SeqCst);
            if left == 0 {
                return Err(CodfrelError::Similarity("model unavailable".into()));
            }
            self.budget.store(left - 1, Ordering::SeqCst);
        }
        Ok(vec![1.0; corpus.len()])
    }
}
