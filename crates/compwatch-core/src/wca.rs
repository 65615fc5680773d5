//! Client for the public WCA competitions API.
//!
//! `GET {base_url}/competitions?country_iso2=CL&start=2025-01-01&page=1`
//! returns a JSON array of competitions starting on or after `start`. Results
//! are paginated; pages are followed until an empty page comes back.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::competition::Competition;
use crate::config::WcaConfig;
use crate::error::{CompwatchError, Result};
use crate::paths;

const USER_AGENT: &str = concat!("compwatch/", env!("CARGO_PKG_VERSION"));

pub struct WcaClient {
    client: reqwest::Client,
    base_url: String,
    max_pages: u32,
}

impl WcaClient {
    pub fn new(config: &WcaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_pages: config.max_pages,
        })
    }

    /// All competitions in `country` starting on or after `today`.
    pub async fn fetch_upcoming(&self, country: &str, today: NaiveDate) -> Result<Vec<Competition>> {
        paths::validate_country(country)?;
        let start = today.format("%Y-%m-%d").to_string();

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut page_size = 0;
        for page in 1..=self.max_pages {
            let batch = self.fetch_page(country, &start, page).await?;
            if batch.is_empty() {
                break;
            }
            tracing::debug!(page, count = batch.len(), "fetched competitions page");
            if page == 1 {
                page_size = batch.len();
            }
            if hit_page_limit(page, self.max_pages, batch.len(), page_size) {
                tracing::warn!(
                    max_pages = self.max_pages,
                    "stopped at wca.max_pages; later competitions were not fetched"
                );
            }
            for comp in batch {
                if seen.insert(comp.id.clone()) {
                    out.push(comp);
                }
            }
        }

        tracing::info!(country, start = %start, count = out.len(), "fetched upcoming competitions");
        Ok(out)
    }

    async fn fetch_page(&self, country: &str, start: &str, page: u32) -> Result<Vec<Competition>> {
        let url = format!("{}/competitions", self.base_url);
        let page = page.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("country_iso2", country),
                ("start", start),
                ("page", page.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CompwatchError::HttpStatus {
                service: "wca",
                status: response.status().as_u16(),
            });
        }
        Ok(response.json::<Vec<Competition>>().await?)
    }
}

/// True when the last allowed page came back full, so more pages may exist.
/// A short last page means the listing ended there.
fn hit_page_limit(page: u32, max_pages: u32, len: usize, page_size: usize) -> bool {
    page == max_pages && len >= page_size
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
