use crate::output::{print_competitions, print_json};
use anyhow::Context;
use clap::Subcommand;
use compwatch_core::config::Config;
use compwatch_core::store::CompetitionStore;
use std::path::Path;

#[derive(Subcommand)]
pub enum StateSubcommand {
    /// Show the competitions recorded by the last announcing run
    Show,
    /// Delete the state file and pending ledger; the next check announces every upcoming competition
    Reset,
}

pub fn run(root: &Path, subcmd: StateSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load compwatch.yaml")?;
    let store = CompetitionStore::new(config.state_path(root));

    match subcmd {
        StateSubcommand::Show => show(&store, json),
        StateSubcommand::Reset => reset(&store, json),
    }
}

fn show(store: &CompetitionStore, json: bool) -> anyhow::Result<()> {
    let comps = store
        .load()
        .with_context(|| format!("failed to read {}", store.path().display()))?;

    let pending = store
        .load_pending()
        .with_context(|| format!("failed to read {}", store.pending_path().display()))?;

    if json {
        print_json(&comps)?;
        return Ok(());
    }
    if comps.is_empty() {
        println!("No recorded competitions ({}).", store.path().display());
    } else {
        print_competitions(&comps);
    }
    for (channel, ids) in pending.iter().filter(|(_, ids)| !ids.is_empty()) {
        println!("Pending for {channel}: {}", ids.join(", "));
    }
    Ok(())
}

fn reset(store: &CompetitionStore, json: bool) -> anyhow::Result<()> {
    let removed = store.clear().context("failed to remove state file")?;

    if json {
        print_json(&serde_json::json!({
            "path": store.path(),
            "removed": removed,
        }))?;
    } else if removed {
        println!("Removed {}", store.path().display());
    } else {
        println!("Nothing to reset: {} does not exist", store.path().display());
    }
    Ok(())
}
