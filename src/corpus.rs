use crate::error::{CfResult, CodfrelError};
use crate::text::Tokenizer;
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct NlItem {
    pub index: usize,
    pub tokens: Vec<String>,
    pub keywords: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct PlLine {
    pub pl_index: usize,
    pub line_index: usize,
    pub global_index: usize,
    pub total_lines: usize,
    pub tokens: Vec<String>,
}

/// Flattened, read-only view of every source line plus the guided selection
/// list of each report.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    nl_items: Vec<NlItem>,
    lines: Vec<PlLine>,
    artifact_count: usize,
    guided: Vec<Vec<usize>>,
    all_lines: Vec<usize>,
}

impl CorpusIndex {
    /// Tokenizes reports and artifacts and builds the index.
    pub fn build(
        nl_texts: &[String],
        pl_texts: &[String],
        tokenizer: &dyn Tokenizer,
    ) -> CfResult<Self> {
        let nl: Vec<(Vec<String>, HashSet<String>)> = nl_texts
            .par_iter()
            .map(|text| (tokenizer.nl_tokens(text), tokenizer.nl_keywords(text)))
            .collect();

        let artifacts: Vec<Vec<Vec<String>>> = pl_texts
            .par_iter()
            .map(|text| text.lines().map(|l| tokenizer.pl_tokens(l)).collect())
            .collect();

        Self::from_tokens(nl, artifacts)
    }

    /// Builds the index from already tokenized reports and artifact lines.
    pub fn from_tokens(
        nl: Vec<(Vec<String>, HashSet<String>)>,
        artifacts: Vec<Vec<Vec<String>>>,
    ) -> CfResult<Self> {
        if nl.is_empty() {
            return Err(CodfrelError::Config("No NL items to link".into()));
        }

        let artifact_count = artifacts.len();
        let mut lines = Vec::new();
        for (pl_index, artifact) in artifacts.into_iter().enumerate() {
            let total_lines = artifact.len();
            for (line_index, tokens) in artifact.into_iter().enumerate() {
                let global_index = lines.len();
                lines.push(PlLine {
                    pl_index,
                    line_index,
                    global_index,
                    total_lines,
                    tokens,
                });
            }
        }
        if lines.is_empty() {
            return Err(CodfrelError::Config("PL corpus contains no lines".into()));
        }

        let nl_items: Vec<NlItem> = nl
            .into_iter()
            .enumerate()
            .map(|(index, (tokens, keywords))| NlItem {
                index,
                tokens,
                keywords,
            })
            .collect();

        let guided: Vec<Vec<usize>> = nl_items
            .par_iter()
            .map(|item| {
                lines
                    .iter()
                    .filter(|line| line.tokens.iter().any(|t| item.keywords.contains(t)))
                    .map(|line| line.global_index)
                    .collect()
            })
            .collect();

        for (item, selection) in nl_items.iter().zip(&guided) {
            if selection.is_empty() {
                warn!(
                    "⚠️  No PL line contains a keyword of NL[{}]. Falling back to random selection.",
                    item.index
                );
            }
        }

        let all_lines = (0..lines.len()).collect();
        info!(
            "📚 Corpus indexed: {} NL items, {} artifacts, {} lines",
            nl_items.len(),
            artifact_count,
            lines.len()
        );

        Ok(Self {
            nl_items,
            lines,
            artifact_count,
            guided,
            all_lines,
        })
    }

    pub fn nl_items(&self) -> &[NlItem] {
        &self.nl_items
    }

    pub fn nl_count(&self) -> usize {
        self.nl_items.len()
    }

    pub fn artifact_count(&self) -> usize {
        self.artifact_count
    }

    pub fn lines(&self) -> &[PlLine] {
        &self.lines
    }

    pub fn line(&self, global_index: usize) -> &PlLine {
        &self.lines[global_index]
    }

    /// Window center candidates for one report. Never empty.
    pub fn selection(&self, nl_index: usize) -> &[usize] {
        let guided = &self.guided[nl_index];
        if guided.is_empty() {
            &self.all_lines
        } else {
            guided
        }
    }

    pub fn guided_len(&self, nl_index: usize) -> usize {
        self.guided[nl_index].len()
    }

    pub fn is_fallback(&self, nl_index: usize) -> bool {
        self.guided[nl_index].is_empty()
    }

    /// Reports whose keywords match no line at all.
    pub fn fallback_items(&self) -> Vec<usize> {
        (0..self.nl_items.len())
            .filter(|&i| self.is_fallback(i))
            .collect()
    }
}
