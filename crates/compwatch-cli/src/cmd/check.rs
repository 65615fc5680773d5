use crate::output::{print_competitions, print_json};
use anyhow::Context;
use compwatch_core::check::{run_check, CheckOptions, CheckReport};
use compwatch_core::config::Config;
use std::path::Path;

/// `compwatch check` — one polling cycle.
///
/// Exits non-zero when an announcement could not be delivered, so a
/// scheduled CI job shows up as failed. What a channel missed stays in the
/// pending ledger and is sent to that channel on the next run.
pub fn run(root: &Path, country: Option<String>, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load_with_env(root).context("failed to load compwatch.yaml")?;
    let opts = CheckOptions {
        country,
        dry_run,
        ..CheckOptions::today()
    };

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt
        .block_on(run_check(root, &config, &opts))
        .context("check failed")?;

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }

    if !report.is_success() {
        let failed: Vec<&str> = report
            .deliveries
            .iter()
            .filter(|d| !d.succeeded())
            .map(|d| d.channel)
            .collect();
        anyhow::bail!(
            "announcement failed on {}; undelivered competitions will be retried on the next run",
            failed.join(", ")
        );
    }
    Ok(())
}

pub(crate) fn print_report(report: &CheckReport) {
    println!(
        "{}: {} upcoming, {} previously seen, {} finished or removed",
        report.country, report.fetched, report.previous, report.gone
    );

    if report.new.is_empty() {
        println!("No new competitions.");
    } else {
        println!("\n{} new competition(s):", report.new.len());
        print_competitions(&report.new);
    }

    if report.dry_run {
        if !report.new.is_empty() || !report.pending.is_empty() {
            println!("\nDry run: nothing sent, state file unchanged.");
        }
        return;
    }

    if !report.new.is_empty() && report.deliveries.is_empty() {
        println!("\nNo notification channel configured.");
    }
    for d in &report.deliveries {
        match &d.error {
            None => println!(
                "  {:<9} sent {} competition(s) in {} message(s)",
                d.channel, d.delivered, d.messages
            ),
            Some(e) => println!(
                "  {:<9} FAILED after {} of {}: {e}",
                d.channel,
                d.delivered,
                d.delivered + d.pending
            ),
        }
    }
    if report.state_saved {
        println!("State saved.");
    }
    for (channel, ids) in &report.pending {
        println!("Pending for {channel}: {}", ids.join(", "));
    }
}
