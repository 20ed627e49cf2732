pub mod transforms;

use crate::config::DatasetLimits;
use crate::error::{CfResult, CodfrelError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{debug, info};

/// Record layout of a JSONL dataset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DatasetType {
    /// Docstring / function pairs.
    Codesearchnet,
    /// Issue reports linked to the methods their fix touched.
    IssueMethod,
    /// Issue reports linked to the code lines their fix changed.
    IssueCodelines,
}

/// Ground truth: report texts, artifact texts and the links between them.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    nl_texts: Vec<String>,
    pl_texts: Vec<String>,
    links: BTreeMap<usize, BTreeSet<usize>>,
    links_count: usize,
}

impl Dataset {
    pub fn load_jsonl<P: AsRef<Path>>(
        path: P,
        kind: DatasetType,
        limits: &DatasetLimits,
    ) -> CfResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            CodfrelError::Config(format!("Cannot open dataset '{}': {}", path.display(), e))
        })?;
        let dataset = Self::from_reader(BufReader::new(file), kind, limits)?;
        info!(
            "📂 Loaded {}: {} NL items, {} PL items, {} links",
            path.display(),
            dataset.nl_count(),
            dataset.pl_count(),
            dataset.links_count()
        );
        Ok(dataset)
    }

    /// Reads one JSON object per line. Identical texts share one index.
    ///
    /// Reading stops once the link limit is reached. A row that would add a
    /// new report or artifact past its limit is skipped.
    pub fn from_reader<R: BufRead>(
        reader: R,
        kind: DatasetType,
        limits: &DatasetLimits,
    ) -> CfResult<Self> {
        let mut dataset = Self::default();
        let mut nl_ids: HashMap<String, usize> = HashMap::new();
        let mut pl_ids: HashMap<String, usize> = HashMap::new();
        let mut skipped = 0usize;

        for (line_no, line) in reader.lines().enumerate() {
            if limits
                .links_limit()
                .is_some_and(|max| dataset.links_count >= max)
            {
                break;
            }
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row: serde_json::Value = serde_json::from_str(&line).map_err(|e| {
                CodfrelError::Validation(format!("dataset line {}: {}", line_no + 1, e))
            })?;

            let (Some(nl), Some(pl)) = (
                transforms::nl_transform(kind, &row),
                transforms::pl_transform(kind, &row),
            ) else {
                skipped += 1;
                continue;
            };

            let nl_full = !nl_ids.contains_key(&nl)
                && limits
                    .nl_limit()
                    .is_some_and(|max| dataset.nl_texts.len() >= max);
            let pl_full = !pl_ids.contains_key(&pl)
                && limits
                    .pl_limit()
                    .is_some_and(|max| dataset.pl_texts.len() >= max);
            if nl_full || pl_full {
                continue;
            }

            let nl_index = intern(&mut nl_ids, &mut dataset.nl_texts, nl);
            let pl_index = intern(&mut pl_ids, &mut dataset.pl_texts, pl);
            dataset.links.entry(nl_index).or_default().insert(pl_index);
            dataset.links_count += 1;
        }

        debug!("{} dataset rows rejected by transforms", skipped);
        Ok(dataset)
    }

    /// Builds a dataset from texts and `(nl, pl)` link pairs.
    pub fn from_parts(
        nl_texts: Vec<String>,
        pl_texts: Vec<String>,
        links: &[(usize, usize)],
    ) -> CfResult<Self> {
        let mut dataset = Self {
            nl_texts,
            pl_texts,
            ..Self::default()
        };
        for &(nl, pl) in links {
            if nl >= dataset.nl_texts.len() || pl >= dataset.pl_texts.len() {
                return Err(CodfrelError::Validation(format!(
                    "link ({}, {}) points outside the dataset",
                    nl, pl
                )));
            }
            dataset.links.entry(nl).or_default().insert(pl);
            dataset.links_count += 1;
        }
        Ok(dataset)
    }

    pub fn nl_texts(&self) -> &[String] {
        &self.nl_texts
    }

    pub fn pl_texts(&self) -> &[String] {
        &self.pl_texts
    }

    pub fn nl_count(&self) -> usize {
        self.nl_texts.len()
    }

    pub fn pl_count(&self) -> usize {
        self.pl_texts.len()
    }

    /// Accepted link rows, repeated pairs included.
    pub fn links_count(&self) -> usize {
        self.links_count
    }

    pub fn are_linked(&self, nl_index: usize, pl_index: usize) -> bool {
        self.links
            .get(&nl_index)
            .is_some_and(|pls| pls.contains(&pl_index))
    }

    pub fn linked(&self, nl_index: usize) -> Option<&BTreeSet<usize>> {
        self.links.get(&nl_index)
    }
}

fn intern(ids: &mut HashMap<String, usize>, texts: &mut Vec<String>, text: String) -> usize {
    if let Some(&id) = ids.get(&text) {
        return id;
    }
    let id = texts.len();
    texts.push(text.clone());
    ids.insert(text, id);
    id
}
