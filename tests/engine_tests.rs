mod common;

use codfrel::error::CodfrelError;
use codfrel::optimizer::runner::{ProgressReport, SilentProgress};
use codfrel::optimizer::{
    CancellationToken, Engine, Population, ProgressCallback, StoppingCondition,
};
use common::{
    corpus, options, two_report_corpus, ConstantSimilarity, FailAfter, FailingSimilarity,
    OverlapSimilarity,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn assert_valid(pop: &Population, cap: usize) {
    assert!(pop.len() <= cap, "population above cap");
    assert!(pop.is_ranked(), "population not ranked");
    assert!(pop.has_unique_keys(), "duplicate candidates");
    assert!(pop
        .candidates()
        .iter()
        .all(|c| (0.0..=1.0).contains(&c.fitness)));
}

/// Requests an interrupt once `after` passes have been reported.
struct StopAfter {
    after: usize,
    seen: AtomicUsize,
}

impl ProgressCallback for StopAfter {
    fn on_progress(&self, _report: &ProgressReport) -> bool {
        self.seen.fetch_add(1, Ordering::SeqCst) + 1 < self.after
    }
}

#[test]
fn single_artifact_initialization_yields_distinct_perfect_candidates() {
    let corpus = Arc::new(corpus(
        &["alpha"],
        &["alpha one\nalpha two\nalpha three\nalpha four\nalpha five"],
    ));
    let engine = Engine::new(
        corpus,
        Arc::new(ConstantSimilarity(1.0)),
        options(3),
        Some(7),
    )
    .unwrap();

    let pop = engine.population(0);
    assert_eq!(pop.len(), 3);
    assert!(pop.has_unique_keys());
    assert!(pop.candidates().iter().all(|c| c.fitness == 1.0));
}

#[test]
fn iterations_condition_runs_one_pass_past_the_bound() {
    let corpus = Arc::new(two_report_corpus());
    let mut engine =
        Engine::new(corpus, Arc::new(OverlapSimilarity), options(6), Some(1)).unwrap();
    let condition = StoppingCondition::Iterations { max_generations: 3 };

    let outcome = engine
        .run(&condition, &CancellationToken::new(), &SilentProgress)
        .unwrap();

    assert!(!outcome.interrupted);
    assert_eq!(outcome.global_generations, 4);
    assert_eq!(outcome.generations_per_nl, vec![4, 4]);
    for pop in engine.populations() {
        assert_valid(pop, 6);
    }
}

#[test]
fn patience_stops_every_report_on_a_flat_landscape() {
    let corpus = Arc::new(two_report_corpus());
    let mut engine = Engine::new(
        corpus,
        Arc::new(ConstantSimilarity(0.0)),
        options(5),
        Some(2),
    )
    .unwrap();
    let condition = StoppingCondition::Patience {
        patience_iterations: 2,
        top_items_count: 1,
        top_items_allowed_shift: 0,
    };

    let outcome = engine
        .run(&condition, &CancellationToken::new(), &SilentProgress)
        .unwrap();

    assert!(!outcome.interrupted);
    assert!(outcome.generations_per_nl.iter().all(|&g| g >= 3));
    for pop in engine.populations() {
        assert_valid(pop, 5);
        assert!(pop.candidates().iter().all(|c| c.fitness == 0.5));
    }
}

#[test]
fn time_budget_scales_with_report_count() {
    let corpus = Arc::new(two_report_corpus());
    let mut engine =
        Engine::new(corpus, Arc::new(OverlapSimilarity), options(4), Some(3)).unwrap();
    let condition = StoppingCondition::TimePerNl {
        seconds_per_nl: Duration::from_millis(20),
    };

    let outcome = engine
        .run(&condition, &CancellationToken::new(), &SilentProgress)
        .unwrap();

    assert!(!outcome.interrupted);
    assert!(outcome.elapsed_secs >= 0.04);
    assert!(outcome.global_generations >= 1);
}

#[test]
fn callback_interrupt_leaves_populations_finalized() {
    let corpus = Arc::new(two_report_corpus());
    let mut engine =
        Engine::new(corpus, Arc::new(OverlapSimilarity), options(5), Some(4)).unwrap();
    let condition = StoppingCondition::Iterations {
        max_generations: 1_000,
    };
    let stop = StopAfter {
        after: 3,
        seen: AtomicUsize::new(0),
    };

    let outcome = engine
        .run(&condition, &CancellationToken::new(), &stop)
        .unwrap();

    assert!(outcome.interrupted);
    assert_eq!(outcome.global_generations, 3);
    for pop in engine.populations() {
        assert_valid(pop, 5);
    }
}

#[test]
fn cancelled_token_stops_before_any_generation() {
    let corpus = Arc::new(two_report_corpus());
    let mut engine =
        Engine::new(corpus, Arc::new(OverlapSimilarity), options(5), Some(4)).unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let outcome = engine
        .run(
            &StoppingCondition::Iterations { max_generations: 10 },
            &token,
            &SilentProgress,
        )
        .unwrap();

    assert!(outcome.interrupted);
    assert_eq!(outcome.global_generations, 0);
    assert_eq!(outcome.generations_per_nl, vec![0, 0]);
    for pop in engine.populations() {
        assert_valid(pop, 5);
    }
}

#[test]
fn invalid_options_fail_before_initialization() {
    let corpus = Arc::new(two_report_corpus());
    let mut opts = options(5);
    opts.number_of_parents = 0;
    let result = Engine::new(corpus, Arc::new(OverlapSimilarity), opts, None);
    assert!(matches!(result, Err(CodfrelError::Config(_))));
}

#[test]
fn model_failure_during_setup_is_fatal() {
    let corpus = Arc::new(corpus(&["alpha poison", "beta"], &["alpha\nbeta"]));
    let result = Engine::new(
        corpus,
        Arc::new(FailingSimilarity { trigger: "poison" }),
        options(3),
        Some(1),
    );
    assert!(matches!(result, Err(CodfrelError::Similarity(_))));
}

#[test]
fn model_failure_does_not_touch_other_reports() {
    let corpus = Arc::new(corpus(
        &["alpha poison", "beta"],
        &["alpha one\nalpha two\nbeta three\nbeta four"],
    ));
    // One call for initialization, then the first generation fails.
    let mut engine = Engine::new(
        corpus,
        Arc::new(FailAfter::new("poison", 1)),
        options(3),
        Some(9),
    )
    .unwrap();
    let poisoned_before = engine.population(0).clone();

    let result = engine.run(
        &StoppingCondition::Iterations { max_generations: 5 },
        &CancellationToken::new(),
        &SilentProgress,
    );

    assert!(matches!(result, Err(CodfrelError::Similarity(_))));
    let states = engine.states();
    assert_eq!(states[0].generations, 0);
    assert_eq!(
        engine.population(0).candidates(),
        poisoned_before.candidates()
    );
    assert_eq!(states[1].generations, 1);
    assert_valid(engine.population(1), 3);
}
