mod common;

use codfrel::optimizer::runner::SilentProgress;
use codfrel::optimizer::{CancellationToken, Engine, StoppingCondition};
use codfrel::similarity::TfIdfCosine;
use common::{options, two_report_corpus};
use std::sync::Arc;

fn run_keys(seed: u64) -> Vec<Vec<(String, f64)>> {
    let mut engine = Engine::new(
        Arc::new(two_report_corpus()),
        Arc::new(TfIdfCosine::new()),
        options(6),
        Some(seed),
    )
    .unwrap();
    engine
        .run(
            &StoppingCondition::Iterations { max_generations: 8 },
            &CancellationToken::new(),
            &SilentProgress,
        )
        .unwrap();
    engine
        .populations()
        .iter()
        .map(|p| {
            p.candidates()
                .iter()
                .map(|c| (c.key(), c.fitness))
                .collect()
        })
        .collect()
}

#[test]
fn same_seed_gives_identical_populations() {
    assert_eq!(run_keys(42), run_keys(42));
}

#[test]
fn reports_evolve_independently_of_thread_scheduling() {
    let reference = run_keys(7);
    for _ in 0..3 {
        assert_eq!(run_keys(7), reference);
    }
}
