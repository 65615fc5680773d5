use crate::cmd::check::print_report;
use anyhow::Context;
use compwatch_core::check::{run_check, CheckOptions};
use compwatch_core::config::{Config, MAX_INTERVAL_MINUTES};
use std::path::Path;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// `compwatch watch` — run `check` now and then every interval until Ctrl-C.
///
/// The config is re-read before every cycle. A failing cycle is logged and
/// the loop keeps going.
pub fn run(
    root: &Path,
    interval_minutes: Option<u64>,
    country: Option<String>,
) -> anyhow::Result<()> {
    let config = Config::load_with_env(root).context("failed to load compwatch.yaml")?;
    let minutes = interval_minutes.unwrap_or(config.schedule.interval_minutes);
    let period = period(minutes)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_minutes = minutes, root = %root.display(), "watching for new competitions");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted, stopping");
                    return Ok(());
                }
            }

            let config = match Config::load_with_env(root) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!(error = %e, "failed to reload config; skipping cycle");
                    continue;
                }
            };
            let opts = CheckOptions {
                country: country.clone(),
                ..CheckOptions::today()
            };

            let cycle = tokio::select! {
                res = run_check(root, &config, &opts) => res,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted during a cycle, stopping");
                    return Ok(());
                }
            };

            match cycle {
                Ok(report) => {
                    print_report(&report);
                    if !report.is_success() {
                        tracing::warn!("announcement failed; will retry next cycle");
                    }
                }
                Err(e) => tracing::error!(error = %e, "check cycle failed"),
            }
        }
    })
}

fn period(minutes: u64) -> anyhow::Result<Duration> {
    if !(1..=MAX_INTERVAL_MINUTES).contains(&minutes) {
        anyhow::bail!("interval must be between 1 and {MAX_INTERVAL_MINUTES} minutes, got {minutes}");
    }
    let secs = minutes
        .checked_mul(60)
        .with_context(|| format!("interval of {minutes} minutes is too large"))?;
    Ok(Duration::from_secs(secs))
}
