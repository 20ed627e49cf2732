mod common;

use codfrel::config::SweepParams;
use codfrel::corpus::CorpusIndex;
use codfrel::dataset::Dataset;
use codfrel::eval::{self, map_from_population, threshold_sweep};
use codfrel::optimizer::runner::SilentProgress;
use codfrel::optimizer::{CancellationToken, Engine, StoppingCondition};
use codfrel::similarity::TfIdfCosine;
use codfrel::text::RakeTokenizer;
use common::{corpus, options, OverlapSimilarity};
use std::sync::Arc;

fn evolved(corpus: CorpusIndex, seed: u64) -> Engine {
    let mut engine = Engine::new(
        Arc::new(corpus),
        Arc::new(OverlapSimilarity),
        options(8),
        Some(seed),
    )
    .unwrap();
    engine
        .run(
            &StoppingCondition::Iterations { max_generations: 5 },
            &CancellationToken::new(),
            &SilentProgress,
        )
        .unwrap();
    engine
}

fn linked_pair_corpus() -> CorpusIndex {
    corpus(
        &["export dialog freeze", "login token expire"],
        &[
            "open export dialog\nrender dialog\nfreeze check",
            "read login form\nrefresh token\ntoken expire",
        ],
    )
}

fn dataset(links: &[(usize, usize)]) -> Dataset {
    Dataset::from_parts(
        vec!["export".into(), "login".into()],
        vec!["dialog.java".into(), "login.java".into()],
        links,
    )
    .unwrap()
}

#[test]
fn sweep_reports_defined_baseline_and_a_config_at_least_as_good() {
    let engine = evolved(linked_pair_corpus(), 17);
    let populations = engine.populations();
    let result = threshold_sweep(
        engine.corpus(),
        &populations,
        &dataset(&[(0, 0)]),
        &SweepParams::default(),
    )
    .unwrap();

    let baseline = &result.baseline;
    assert_eq!(baseline.config.min_fitness, 0.5);
    assert_eq!(baseline.config.min_lines_ratio, 0.0);
    assert_eq!(baseline.metrics.precision, Some(0.5));
    assert_eq!(baseline.metrics.recall, Some(1.0));
    let baseline_f1 = baseline.metrics.f1.unwrap();

    let best = result.best_f1.unwrap();
    assert!(best.metrics.f1.unwrap() >= baseline_f1);
    assert_eq!(result.configs_evaluated, 500 * 20);

    let zero = result.best_f1_zero_ratio.unwrap();
    assert_eq!(zero.config.min_lines_ratio, 0.0);
    assert!(zero.metrics.f1.unwrap() >= baseline_f1);
    assert!(best.metrics.f1 >= zero.metrics.f1);
}

#[test]
fn population_map_counts_each_report_once() {
    let engine = evolved(linked_pair_corpus(), 23);
    let map = map_from_population(engine.corpus(), &engine.populations(), &dataset(&[(0, 0)]))
        .unwrap();
    assert_eq!(map.at(1), Some(0.5));
    assert_eq!(map.at(10), Some(0.5));
}

#[test]
fn map_is_undefined_without_links() {
    let engine = evolved(linked_pair_corpus(), 5);
    let populations = engine.populations();
    let report = eval::evaluate(
        engine.corpus(),
        &populations,
        &dataset(&[]),
        &SweepParams {
            min_fitness_floor: 0.5,
            min_fitness_steps: 10,
            min_lines_ratio_steps: 4,
        },
    )
    .unwrap();

    assert!(report.map_from_population.is_none());
    assert!(report.sweep.best_f1.is_none());
    assert_eq!(report.sweep.baseline.metrics.recall, None);
    assert_eq!(report.sweep.baseline.metrics.tp, 0);
}

#[test]
fn default_collaborators_run_end_to_end() {
    let nl = vec![
        "Exporting the report fails when the column list is empty".to_string(),
        "Login session expires although the refresh token is still valid".to_string(),
    ];
    let pl = vec![
        "void exportReport(List<Column> columns) {\n  if (columns.isEmpty()) {\n    throw new ExportException();\n  }\n  writer.write(columns);\n}".to_string(),
        "boolean refreshSession(Token refreshToken) {\n  if (refreshToken.isValid()) {\n    session.extend();\n  }\n  return session.isActive();\n}".to_string(),
    ];
    let corpus = CorpusIndex::build(&nl, &pl, &RakeTokenizer::new()).unwrap();
    let mut engine = Engine::new(
        Arc::new(corpus),
        Arc::new(TfIdfCosine::new()),
        options(10),
        Some(99),
    )
    .unwrap();
    engine
        .run(
            &StoppingCondition::Iterations { max_generations: 10 },
            &CancellationToken::new(),
            &SilentProgress,
        )
        .unwrap();

    let dataset = Dataset::from_parts(nl, pl, &[(0, 0), (1, 1)]).unwrap();
    let populations = engine.populations();
    let report = eval::evaluate(
        engine.corpus(),
        &populations,
        &dataset,
        &SweepParams {
            min_fitness_floor: 0.5,
            min_fitness_steps: 20,
            min_lines_ratio_steps: 5,
        },
    )
    .unwrap();

    let map = report.map_from_population.unwrap();
    assert!(map.values().iter().all(|v| (0.0..=1.0).contains(v)));
    assert_eq!(report.sweep.baseline.rows.len(), 4);
    assert!(report.diagnostic_map.baseline.is_some());
}
