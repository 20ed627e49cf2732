use crate::corpus::CorpusIndex;
use crate::dataset::Dataset;
use crate::eval::metrics::{average_precision_curve, MapScores, MAP_DEPTH};
use crate::optimizer::Population;
use std::collections::HashSet;

/// Distinct artifact indices in population order, first occurrence wins.
pub fn ranked_artifacts(corpus: &CorpusIndex, population: &Population) -> Vec<usize> {
    let mut seen = HashSet::new();
    let mut ranked = Vec::with_capacity(MAP_DEPTH);
    'scan: for candidate in population.candidates() {
        for &g in candidate.lines() {
            let pl = corpus.line(g).pl_index;
            if seen.insert(pl) {
                ranked.push(pl);
            }
            if ranked.len() >= MAP_DEPTH {
                break 'scan;
            }
        }
    }
    ranked
}

/// MAP@1..10 read directly off the final populations.
///
/// `populations[i]` belongs to report `i`. Undefined when there are no
/// reports or the dataset holds no links.
pub fn map_from_population(
    corpus: &CorpusIndex,
    populations: &[&Population],
    dataset: &Dataset,
) -> Option<MapScores> {
    if dataset.links_count() == 0 {
        return None;
    }
    let curves: Vec<[f64; MAP_DEPTH]> = populations
        .iter()
        .enumerate()
        .map(|(nl_index, population)| {
            let relevance: Vec<bool> = ranked_artifacts(corpus, population)
                .into_iter()
                .map(|pl| dataset.are_linked(nl_index, pl))
                .collect();
            average_precision_curve(&relevance)
        })
        .collect();
    MapScores::mean_of(&curves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::Candidate;
    use std::collections::HashSet as Set;

    // Three artifacts with two lines each: globals 0-1, 2-3, 4-5.
    fn corpus() -> CorpusIndex {
        let line = || vec!["tok".to_string()];
        CorpusIndex::from_tokens(
            vec![(vec!["tok".into()], Set::new()), (vec!["tok".into()], Set::new())],
            vec![vec![line(), line()], vec![line(), line()], vec![line(), line()]],
        )
        .unwrap()
    }

    fn population(windows: &[&[usize]]) -> Population {
        let candidates = windows
            .iter()
            .map(|w| Candidate::new(w.to_vec()))
            .collect();
        Population::from_candidates(10, candidates)
    }

    fn dataset(links: &[(usize, usize)]) -> Dataset {
        Dataset::from_parts(
            vec!["a".into(), "b".into()],
            vec!["x".into(), "y".into(), "z".into()],
            links,
        )
        .unwrap()
    }

    #[test]
    fn artifacts_are_ranked_by_first_occurrence() {
        let corpus = corpus();
        let pop = population(&[&[2, 3], &[0, 4], &[1]]);
        assert_eq!(ranked_artifacts(&corpus, &pop), vec![1, 0, 2]);
    }

    #[test]
    fn map_uses_dataset_relevance() {
        let corpus = corpus();
        let first = population(&[&[2], &[0]]);
        let second = population(&[&[4]]);
        let map = map_from_population(&corpus, &[&first, &second], &dataset(&[(0, 0), (1, 2)]))
            .unwrap();
        assert_eq!(map.at(1), Some(0.5));
        assert_eq!(map.at(2), Some(0.75));
        assert_eq!(map.at(10), Some(0.75));
    }

    #[test]
    fn map_is_undefined_without_links() {
        let corpus = corpus();
        let pop = population(&[&[0]]);
        assert!(map_from_population(&corpus, &[&pop, &pop], &dataset(&[])).is_none());
        assert!(map_from_population(&corpus, &[], &dataset(&[(0, 0)])).is_none());
    }
}
