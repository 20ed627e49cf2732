use crate::corpus::{CorpusIndex, NlItem};
use crate::error::{CfResult, CodfrelError};
use crate::optimizer::population::Population;
use crate::similarity::SimilarityModel;
use std::sync::Arc;

/// Scores candidates against their report through a [`SimilarityModel`].
#[derive(Clone)]
pub struct FitnessEvaluator {
    model: Arc<dyn SimilarityModel>,
}

impl FitnessEvaluator {
    pub fn new(model: Arc<dyn SimilarityModel>) -> Self {
        Self { model }
    }

    /// Recomputes the fitness of every candidate in one batch.
    ///
    /// The report document is appended last so that term weighting covers
    /// the whole batch. Similarities in [-1, 1] map to `(s + 1) / 2`.
    pub fn score(
        &self,
        population: &mut Population,
        corpus: &CorpusIndex,
        nl: &NlItem,
    ) -> CfResult<()> {
        if population.is_empty() {
            return Ok(());
        }

        let mut documents: Vec<Vec<&str>> = population
            .candidates()
            .iter()
            .map(|c| {
                c.lines()
                    .iter()
                    .flat_map(|&g| corpus.line(g).tokens.iter().map(String::as_str))
                    .collect()
            })
            .collect();
        documents.push(nl.tokens.iter().map(String::as_str).collect());

        let query = documents.len() - 1;
        let sims = self.model.similarities(&documents, query)?;
        if sims.len() != documents.len() {
            return Err(CodfrelError::Similarity(format!(
                "model returned {} scores for {} documents",
                sims.len(),
                documents.len()
            )));
        }

        if sims.iter().any(|s| !s.is_finite()) {
            return Err(CodfrelError::Similarity(format!(
                "non-finite similarity for NL[{}]",
                nl.index
            )));
        }

        for (candidate, &s) in population.candidates_mut().iter_mut().zip(&sims) {
            candidate.fitness = ((s + 1.0) / 2.0).clamp(0.0, 1.0);
        }
        Ok(())
    }
}
