use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Ranks scored by MAP.
pub const MAP_DEPTH: usize = 10;

/// One (report, artifact) pair under a given sweep configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalRow {
    pub nl_index: usize,
    pub pl_index: usize,
    pub is_link: bool,
    pub predicted: bool,
    /// Highest fitness among candidates touching the artifact, 0 when none does.
    pub max_fitness: f64,
    pub pred_lines: usize,
    pub total_lines: usize,
}

/// Confusion counts and the scores derived from them.
///
/// Scores are `None` when their denominator is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvalMetrics {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
    pub f2: Option<f64>,
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

impl EvalMetrics {
    pub fn from_rows(rows: &[EvalRow]) -> Self {
        let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);
        for row in rows {
            match (row.is_link, row.predicted) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (false, false) => tn += 1,
                (true, false) => fn_ += 1,
            }
        }
        Self::from_counts(tp, fp, tn, fn_)
    }

    pub fn from_counts(tp: usize, fp: usize, tn: usize, fn_: usize) -> Self {
        let mut m = Self {
            tp,
            fp,
            tn,
            fn_,
            ..Self::default()
        };
        m.precision = ratio(m.tp, m.tp + m.fp);
        m.recall = ratio(m.tp, m.tp + m.fn_);
        if let (Some(p), Some(r)) = (m.precision, m.recall) {
            if p + r > 0.0 {
                m.f1 = Some(2.0 * p * r / (p + r));
                m.f2 = Some(5.0 * p * r / (4.0 * p + r));
            }
        }
        m
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "undefined".to_string(), |x| format!("{:.4}", x))
}

impl fmt::Display for EvalMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tp={} fp={} tn={} fn={} precision={} recall={} f1={} f2={}",
            self.tp,
            self.fp,
            self.tn,
            self.fn_,
            fmt_opt(self.precision),
            fmt_opt(self.recall),
            fmt_opt(self.f1),
            fmt_opt(self.f2)
        )
    }
}

/// MAP@1 through MAP@10.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapScores {
    at: [f64; MAP_DEPTH],
}

impl MapScores {
    /// Averages per-report AP curves. `None` for an empty input.
    pub(crate) fn mean_of(curves: &[[f64; MAP_DEPTH]]) -> Option<Self> {
        if curves.is_empty() {
            return None;
        }
        let mut at = [0.0; MAP_DEPTH];
        for curve in curves {
            for (sum, ap) in at.iter_mut().zip(curve) {
                *sum += ap;
            }
        }
        let n = curves.len() as f64;
        at.iter_mut().for_each(|v| *v /= n);
        Some(Self { at })
    }

    /// MAP at cutoff `k`, for `k` in `1..=10`.
    pub fn at(&self, k: usize) -> Option<f64> {
        k.checked_sub(1).and_then(|i| self.at.get(i)).copied()
    }

    pub fn values(&self) -> &[f64; MAP_DEPTH] {
        &self.at
    }
}

impl fmt::Display for MapScores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .at
            .iter()
            .enumerate()
            .map(|(i, v)| format!("MAP@{}={:.4}", i + 1, v));
        write!(f, "{}", parts.format(" "))
    }
}

/// Incremental average precision for a relevance list, padded with
/// non-relevant entries up to `MAP_DEPTH`.
pub fn average_precision_curve(relevance: &[bool]) -> [f64; MAP_DEPTH] {
    let mut curve = [0.0; MAP_DEPTH];
    let mut relevant = 0usize;
    let mut ap_sum = 0.0;
    for (i, slot) in curve.iter_mut().enumerate() {
        let r = relevance.get(i).copied().unwrap_or(false);
        if r {
            relevant += 1;
            ap_sum += relevant as f64 / (i + 1) as f64;
        }
        *slot = if relevant == 0 {
            0.0
        } else {
            ap_sum / relevant as f64
        };
    }
    curve
}

/// MAP computed from sweep rows alone.
///
/// Rows are ranked by max fitness (descending) then artifact index, and a
/// row with max fitness 0 never counts as relevant even when linked. This
/// approximates which artifacts the populations reached and is diagnostic
/// only.
pub fn map_from_rows(rows: &[EvalRow]) -> Option<MapScores> {
    let mut by_nl: BTreeMap<usize, Vec<&EvalRow>> = BTreeMap::new();
    for row in rows {
        by_nl.entry(row.nl_index).or_default().push(row);
    }

    let curves: Vec<[f64; MAP_DEPTH]> = by_nl
        .into_values()
        .map(|mut ranked| {
            ranked.sort_by(|a, b| {
                b.max_fitness
                    .total_cmp(&a.max_fitness)
                    .then(a.pl_index.cmp(&b.pl_index))
            });
            let relevance: Vec<bool> = ranked
                .iter()
                .take(MAP_DEPTH)
                .map(|row| row.max_fitness != 0.0 && row.is_link)
                .collect();
            average_precision_curve(&relevance)
        })
        .collect();

    MapScores::mean_of(&curves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row(nl: usize, pl: usize, is_link: bool, predicted: bool, fitness: f64) -> EvalRow {
        EvalRow {
            nl_index: nl,
            pl_index: pl,
            is_link,
            predicted,
            max_fitness: fitness,
            pred_lines: 0,
            total_lines: 0,
        }
    }

    #[test]
    fn confusion_counts_and_scores() {
        let rows = vec![
            row(0, 0, true, true, 0.9),
            row(0, 1, false, true, 0.8),
            row(1, 0, true, false, 0.0),
            row(1, 1, false, false, 0.0),
        ];
        let m = EvalMetrics::from_rows(&rows);
        assert_eq!((m.tp, m.fp, m.tn, m.fn_), (1, 1, 1, 1));
        assert_eq!(m.precision, Some(0.5));
        assert_eq!(m.recall, Some(0.5));
        assert_eq!(m.f1, Some(0.5));
        assert!((m.f2.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn no_positive_predictions_leave_precision_undefined() {
        let rows = vec![row(0, 0, true, false, 0.0), row(0, 1, false, false, 0.0)];
        let m = EvalMetrics::from_rows(&rows);
        assert_eq!(m.precision, None);
        assert_eq!(m.recall, Some(0.0));
        assert_eq!(m.f1, None);
        assert_eq!(m.f2, None);
    }

    #[test]
    fn zero_precision_and_recall_leave_f_scores_undefined() {
        let rows = vec![row(0, 0, true, false, 0.0), row(0, 1, false, true, 0.7)];
        let m = EvalMetrics::from_rows(&rows);
        assert_eq!(m.precision, Some(0.0));
        assert_eq!(m.recall, Some(0.0));
        assert_eq!(m.f1, None);
    }

    #[test]
    fn counts_match_rows() {
        let rows = vec![
            row(0, 0, true, true, 0.9),
            row(0, 1, false, true, 0.8),
            row(0, 2, false, true, 0.8),
            row(1, 0, true, false, 0.0),
        ];
        assert_eq!(EvalMetrics::from_counts(1, 2, 0, 1), EvalMetrics::from_rows(&rows));
    }

    #[test]
    fn metrics_display_marks_undefined() {
        let m = EvalMetrics::from_rows(&[]);
        assert!(m.to_string().contains("precision=undefined"));
    }

    #[rstest]
    #[case(&[], [0.0; MAP_DEPTH])]
    #[case(&[true], [1.0; MAP_DEPTH])]
    #[case(&[false, true], [0.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5])]
    fn ap_curve(#[case] relevance: &[bool], #[case] expected: [f64; MAP_DEPTH]) {
        assert_eq!(average_precision_curve(relevance), expected);
    }

    #[test]
    fn ap_curve_averages_precision_at_hits() {
        let curve = average_precision_curve(&[true, false, true]);
        assert_eq!(curve[0], 1.0);
        assert_eq!(curve[1], 1.0);
        assert!((curve[2] - (1.0 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn row_map_ranks_by_fitness_and_ignores_unreached_links() {
        let rows = vec![
            row(0, 0, false, false, 0.6),
            row(0, 1, true, false, 0.9),
            row(1, 0, true, false, 0.0),
            row(1, 1, false, false, 0.0),
        ];
        let map = map_from_rows(&rows).unwrap();
        assert_eq!(map.at(1), Some(0.5));
        assert_eq!(map.at(10), Some(0.5));
        assert_eq!(map.at(0), None);
        assert_eq!(map.at(11), None);
    }

    #[test]
    fn row_map_ties_break_on_artifact_index() {
        let rows = vec![row(0, 1, false, false, 0.7), row(0, 0, true, false, 0.7)];
        assert_eq!(map_from_rows(&rows).and_then(|m| m.at(1)), Some(1.0));
    }

    #[test]
    fn row_map_is_undefined_without_rows() {
        assert!(map_from_rows(&[]).is_none());
    }
}
