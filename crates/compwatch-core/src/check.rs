use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::competition::Competition;
use crate::config::Config;
use crate::diff;
use crate::error::Result;
use crate::notify::{Channel, DeliveryOutcome};
use crate::store::{CompetitionStore, PendingLedger};
use crate::wca::WcaClient;

// ---------------------------------------------------------------------------
// Options / report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub today: NaiveDate,
    pub country: Option<String>,
    pub dry_run: bool,
}

impl CheckOptions {
    pub fn today() -> Self {
        Self {
            today: chrono::Local::now().date_naive(),
            country: None,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub country: String,
    pub fetched: usize,
    pub previous: usize,
    pub gone: usize,
    pub new: Vec<Competition>,
    pub deliveries: Vec<DeliveryOutcome>,
    /// Competition ids each channel still owes after this run.
    pub pending: PendingLedger,
    pub dry_run: bool,
    pub state_saved: bool,
}

impl CheckReport {
    /// A run is successful unless an announcement failed to go out.
    pub fn is_success(&self) -> bool {
        self.deliveries.iter().all(DeliveryOutcome::succeeded)
    }
}

// ---------------------------------------------------------------------------
// run_check
// ---------------------------------------------------------------------------

/// One polling cycle: fetch, diff against the stored list, announce what is
/// new, and persist the current list.
///
/// The state file is written whenever something new was found, whether or
/// not every channel accepted the announcement. What a channel did not
/// receive is recorded in the store's pending ledger and sent to that channel
/// alone on the next run, so channels that did deliver never post twice.
pub async fn run_check(root: &Path, config: &Config, opts: &CheckOptions) -> Result<CheckReport> {
    let country = opts
        .country
        .clone()
        .unwrap_or_else(|| config.wca.country.clone())
        .to_ascii_uppercase();

    let client = WcaClient::new(&config.wca)?;
    let current = client.fetch_upcoming(&country, opts.today).await?;

    let store = CompetitionStore::new(config.state_path(root));
    let previous = store.load()?;
    let mut pending = store.load_pending()?;
    pending.retain(|_, ids| !ids.is_empty());

    let new: Vec<Competition> = diff::detect_new(&current, &previous)
        .into_iter()
        .cloned()
        .collect();
    let gone = diff::detect_gone(&current, &previous).len();

    let mut report = CheckReport {
        country,
        fetched: current.len(),
        previous: previous.len(),
        gone,
        new,
        deliveries: Vec::new(),
        pending,
        dry_run: opts.dry_run,
        state_saved: false,
    };

    if report.new.is_empty() && report.pending.is_empty() {
        tracing::info!(fetched = report.fetched, "no new competitions");
        return Ok(report);
    }

    for comp in &report.new {
        tracing::info!(id = %comp.id, name = %comp.name, start = %comp.start_date, "new competition");
    }
    for (channel, ids) in &report.pending {
        tracing::info!(channel = %channel, count = ids.len(), "retrying undelivered announcements");
    }

    if opts.dry_run {
        tracing::info!(new = report.new.len(), "dry run: nothing sent, state untouched");
        return Ok(report);
    }

    let channels = Channel::from_config(config)?;
    if channels.is_empty() && !report.new.is_empty() {
        tracing::warn!("no notification channel configured; recording new competitions only");
    }

    let new_ids: HashSet<&str> = report.new.iter().map(|c| c.id.as_str()).collect();
    let mut owed = PendingLedger::new();
    for channel in &channels {
        let retry: HashSet<&str> = report
            .pending
            .get(channel.name())
            .map(|ids| ids.iter().map(String::as_str).collect())
            .unwrap_or_default();
        let outstanding: Vec<Competition> = current
            .iter()
            .filter(|c| new_ids.contains(c.id.as_str()) || retry.contains(c.id.as_str()))
            .cloned()
            .collect();
        if outstanding.is_empty() {
            continue;
        }

        let outcome = channel.deliver(&outstanding).await;
        let remaining: Vec<String> = outstanding[outcome.delivered.min(outstanding.len())..]
            .iter()
            .map(|c| c.id.clone())
            .collect();
        if !remaining.is_empty() {
            tracing::error!(
                channel = channel.name(),
                pending = remaining.len(),
                "announcement incomplete; the rest is retried on the next run"
            );
            owed.insert(channel.name().to_string(), remaining);
        }
        report.deliveries.push(outcome);
    }

    // Ids of unconfigured channels or of competitions no longer listed are
    // dropped here.
    store.save_pending(&owed)?;
    report.pending = owed;

    if !report.new.is_empty() {
        store.save(&current)?;
        report.state_saved = true;
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
