mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, state::StateSubcommand};
use compwatch_core::config::MAX_INTERVAL_MINUTES;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "compwatch",
    about = "Announce newly published WCA competitions to Discord and Telegram",
    version,
    propagate_version = true
)]
struct Cli {
    /// Directory holding compwatch.yaml and the state file (default: auto-detect)
    #[arg(long, global = true, env = "COMPWATCH_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch upcoming competitions, announce new ones, and update the state file
    Check {
        /// Report what is new without sending anything or saving state
        #[arg(long)]
        dry_run: bool,

        /// Two-letter country code (overrides wca.country)
        #[arg(long)]
        country: Option<String>,
    },

    /// Run `check` on a fixed interval until interrupted
    Watch {
        /// Minutes between checks (overrides schedule.interval_minutes)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_INTERVAL_MINUTES))]
        interval_minutes: Option<u64>,

        /// Two-letter country code (overrides wca.country)
        #[arg(long)]
        country: Option<String>,
    },

    /// List upcoming competitions without touching state
    List {
        /// Two-letter country code (overrides wca.country)
        #[arg(long)]
        country: Option<String>,
    },

    /// Inspect or reset the recorded competitions
    State {
        #[command(subcommand)]
        subcommand: StateSubcommand,
    },

    /// Create, show, and validate compwatch.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Check { .. } | Commands::Watch { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Check { dry_run, country } => cmd::check::run(&root, country, dry_run, cli.json),
        Commands::Watch {
            interval_minutes,
            country,
        } => cmd::watch::run(&root, interval_minutes, country),
        Commands::List { country } => cmd::list::run(&root, country, cli.json),
        Commands::State { subcommand } => cmd::state::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
