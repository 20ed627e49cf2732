use crate::reports;
use clap::Args;
use codfrel::config::Config;
use codfrel::corpus::CorpusIndex;
use codfrel::dataset::{Dataset, DatasetType};
use codfrel::error::CfResult;
use codfrel::text::RakeTokenizer;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[arg(short, long)]
    pub dataset: PathBuf,

    #[arg(short = 't', long)]
    pub dataset_type: DatasetType,

    #[command(flatten)]
    pub config: Config,

    /// Number of NL items listed individually
    #[arg(short, long, default_value_t = 20)]
    pub show: usize,
}

pub fn run(args: &InspectArgs, config: Config) -> CfResult<()> {
    let dataset = Dataset::load_jsonl(&args.dataset, args.dataset_type, &config.limits)?;
    let corpus = CorpusIndex::build(
        dataset.nl_texts(),
        dataset.pl_texts(),
        &RakeTokenizer::new(),
    )?;

    println!("\n🔎 === DATASET: {} ({}) === 🔎", args.dataset.display(), args.dataset_type);
    reports::print_dataset_report(&dataset, &corpus);
    reports::print_nl_report(&dataset, &corpus, args.show);

    let fallback = corpus.fallback_items();
    if !fallback.is_empty() {
        println!(
            "⚠️  {} NL items fall back to random selection: {:?}",
            fallback.len(),
            fallback
        );
    }
    info!("🛑 Stopping condition would be: {}", config.stopping_condition()?);
    Ok(())
}
