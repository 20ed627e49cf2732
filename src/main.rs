use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use codfrel::config::Config;
use codfrel::error::CfResult;
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration used as the base; explicit flags override it
    #[arg(global = true, long = "config", value_name = "JSON")]
    config_file: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evolve link candidates for a dataset and score them against its links
    Eval(cmd::eval::EvalArgs),
    /// Print dataset and corpus statistics without running the search
    Inspect(cmd::inspect::InspectArgs),
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let Some((_, sub_matches)) = matches.subcommand() else {
        error!("❌ No subcommand given");
        process::exit(2);
    };

    let result = match &cli.command {
        Commands::Eval(args) => {
            resolve_config(cli.config_file.as_deref(), &args.config, sub_matches)
                .and_then(|config| cmd::eval::run(args, config))
        }
        Commands::Inspect(args) => {
            resolve_config(cli.config_file.as_deref(), &args.config, sub_matches)
                .and_then(|config| cmd::inspect::run(args, config))
        }
    };

    if let Err(e) = result {
        error!("❌ {}", e);
        process::exit(1);
    }
}

/// File configuration as the base, explicit flags on top, then validated.
fn resolve_config(file: Option<&str>, cli: &Config, matches: &ArgMatches) -> CfResult<Config> {
    let config = match file {
        Some(path) => {
            info!("⚖️  Loading configuration from: {}", path);
            let mut base = Config::load_from_file(path)?;
            base.merge_from_cli(cli, matches);
            base
        }
        None => cli.clone(),
    };
    config.validate()?;
    Ok(config)
}
