use crate::output::{print_competitions, print_json};
use anyhow::Context;
use compwatch_core::config::Config;
use compwatch_core::wca::WcaClient;
use std::path::Path;

/// `compwatch list` — show upcoming competitions without touching state.
pub fn run(root: &Path, country: Option<String>, json: bool) -> anyhow::Result<()> {
    let config = Config::load_with_env(root).context("failed to load compwatch.yaml")?;
    let country = country
        .unwrap_or_else(|| config.wca.country.clone())
        .to_ascii_uppercase();
    let today = chrono::Local::now().date_naive();

    let client = WcaClient::new(&config.wca)?;
    let rt = tokio::runtime::Runtime::new()?;
    let comps = rt
        .block_on(client.fetch_upcoming(&country, today))
        .with_context(|| format!("failed to fetch competitions for {country}"))?;

    if json {
        print_json(&comps)?;
    } else if comps.is_empty() {
        println!("No upcoming competitions in {country}.");
    } else {
        print_competitions(&comps);
    }
    Ok(())
}
