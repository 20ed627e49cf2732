use crate::reports::{self, PhaseTimer, RunSummary};
use clap::Args;
use codfrel::config::Config;
use codfrel::corpus::CorpusIndex;
use codfrel::dataset::{Dataset, DatasetType};
use codfrel::error::CfResult;
use codfrel::eval;
use codfrel::optimizer::runner::ProgressReport;
use codfrel::optimizer::{CancellationToken, Engine, GaOptions, ProgressCallback};
use codfrel::similarity::TfIdfCosine;
use codfrel::text::RakeTokenizer;
use codfrel::util::dataset_sha256;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct EvalArgs {
    /// Run name; results go to <OUTPUT_DIR>/<NAME>/
    pub name: String,

    #[arg(short, long)]
    pub dataset: PathBuf,

    #[arg(short = 't', long)]
    pub dataset_type: DatasetType,

    #[command(flatten)]
    pub config: Config,

    #[arg(short = 'S', long)]
    pub seed: Option<u64>,

    #[arg(short, long, default_value = "codfrel_eval")]
    pub output_dir: PathBuf,
}

/// Logs a status line at most once per interval.
struct ConsoleProgress {
    interval: Duration,
    last_print: Mutex<Instant>,
}

impl ConsoleProgress {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_print: Mutex::new(Instant::now()),
        }
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_progress(&self, report: &ProgressReport) -> bool {
        let Ok(mut last) = self.last_print.lock() else {
            return true;
        };
        if last.elapsed() >= self.interval {
            info!(
                "🧬 Gen {:>5} | active {}/{} | mean best fitness {:.4} | {:.1?}",
                report.global_generation,
                report.active_nl,
                report.total_nl,
                report.mean_best_fitness,
                report.elapsed
            );
            *last = Instant::now();
        }
        true
    }
}

/// Exit status after an interrupt, 128 + SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptAction {
    /// Let the in-flight generation finish, then finalize.
    FinishGeneration,
    Exit,
}

/// Decides what a Ctrl-C means at the current stage of the run.
///
/// Only the first interrupt during evolution is cooperative. A repeated one,
/// or any after evolution returned, ends the process.
#[derive(Debug, Clone)]
struct InterruptPolicy {
    token: CancellationToken,
    evolving: Arc<AtomicBool>,
}

impl InterruptPolicy {
    fn new(token: CancellationToken) -> Self {
        Self {
            token,
            evolving: Arc::new(AtomicBool::new(true)),
        }
    }

    fn evolution_finished(&self) {
        self.evolving.store(false, Ordering::SeqCst);
    }

    fn on_interrupt(&self) -> InterruptAction {
        if self.evolving.load(Ordering::SeqCst) && !self.token.is_cancelled() {
            self.token.cancel();
            InterruptAction::FinishGeneration
        } else {
            InterruptAction::Exit
        }
    }
}

/// Applies `policy` to every Ctrl-C for the rest of the process.
fn watch_interrupt(policy: InterruptPolicy) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!("⚠️  Ctrl-C handling unavailable: {}", e);
                return;
            }
        };
        runtime.block_on(async {
            while tokio::signal::ctrl_c().await.is_ok() {
                match policy.on_interrupt() {
                    InterruptAction::FinishGeneration => warn!(
                        "⚠️  Interrupt received. Finishing the current generation \
                         (Ctrl-C again to quit)..."
                    ),
                    InterruptAction::Exit => {
                        warn!("🛑 Interrupted. Exiting without writing results.");
                        process::exit(INTERRUPTED_EXIT_CODE);
                    }
                }
            }
        });
    });
}

pub fn run(args: &EvalArgs, config: Config) -> CfResult<()> {
    info!("🚀 codfrel eval '{}'", args.name);
    let mut timer = PhaseTimer::start();

    let dataset_hash = dataset_sha256(&args.dataset)?;
    let dataset = Dataset::load_jsonl(&args.dataset, args.dataset_type, &config.limits)?;
    timer.lap("Loading dataset");

    let tokenizer = RakeTokenizer::new();
    let corpus = Arc::new(CorpusIndex::build(
        dataset.nl_texts(),
        dataset.pl_texts(),
        &tokenizer,
    )?);
    timer.lap("Indexing corpus");

    let condition = config.stopping_condition()?;
    let mut engine = Engine::new(
        corpus.clone(),
        Arc::new(TfIdfCosine::new()),
        GaOptions::from(&config),
        args.seed,
    )?;
    timer.lap("Initializing populations");

    let token = CancellationToken::new();
    let interrupts = InterruptPolicy::new(token.clone());
    watch_interrupt(interrupts.clone());
    let outcome = engine.run(&condition, &token, &ConsoleProgress::new(Duration::from_secs(2)));
    interrupts.evolution_finished();
    let outcome = outcome?;
    timer.lap("Evolving populations");

    let populations = engine.populations();
    let report = eval::evaluate(&corpus, &populations, &dataset, &config.sweep)?;
    timer.lap("Evaluating");

    reports::print_map_report(&report);
    reports::print_sweep_report(&report);
    reports::print_run_report(&outcome, timer.timings());

    let out_dir = args.output_dir.join(&args.name);
    let summary = RunSummary {
        name: &args.name,
        dataset: args.dataset.display().to_string(),
        dataset_type: args.dataset_type,
        dataset_sha256: dataset_hash,
        seed: args.seed,
        config: &config,
        nl_items: dataset.nl_count(),
        pl_items: dataset.pl_count(),
        links: dataset.links_count(),
        fallback_nl_items: corpus.fallback_items(),
        outcome: &outcome,
        evaluation: &report,
        timings: timer.timings(),
    };
    reports::write_artifacts(&out_dir, &summary)?;
    info!("💾 Results written to {}", out_dir.display());

    if outcome.interrupted {
        warn!("⚠️  Results come from an interrupted run");
    }
    Ok(())
}
