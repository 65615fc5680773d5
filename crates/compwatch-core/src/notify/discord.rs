//! Discord webhook delivery.
//!
//! One embed per competition; Discord caps a message at 10 embeds, so larger
//! announcements go out as several messages with the header text only on the
//! first.

use std::time::Duration;

use serde::Serialize;

use super::{Progress, RetryPolicy};
use crate::competition::Competition;
use crate::config::DiscordConfig;
use crate::error::{CompwatchError, Result};

pub const MAX_EMBEDS_PER_MESSAGE: usize = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

pub fn embed_for(comp: &Competition, color: u32) -> Embed {
    Embed {
        title: format!("🏆 {}", comp.name),
        description: format!("📍 **City:** {}\n{}", comp.city, comp.date_line()),
        url: comp.url.clone(),
        color,
    }
}

/// Split the announcement into webhook payloads of at most 10 embeds each.
pub fn build_payloads(competitions: &[Competition], content: &str, color: u32) -> Vec<WebhookPayload> {
    competitions
        .chunks(MAX_EMBEDS_PER_MESSAGE)
        .enumerate()
        .map(|(i, chunk)| WebhookPayload {
            content: (i == 0).then(|| content.to_string()),
            embeds: chunk.iter().map(|c| embed_for(c, color)).collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// DiscordNotifier
// ---------------------------------------------------------------------------

pub struct DiscordNotifier {
    client: reqwest::Client,
    webhook_url: String,
    content: String,
    color: u32,
    retry: RetryPolicy,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String, config: &DiscordConfig, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            webhook_url,
            content: config.content.clone(),
            color: config.color,
            retry,
        })
    }

    /// Post the announcement batch by batch. `progress` is updated after each
    /// accepted batch, so a failure part-way reports what already went out.
    pub async fn deliver(&self, competitions: &[Competition], progress: &mut Progress) -> Result<()> {
        for payload in &build_payloads(competitions, &self.content, self.color) {
            self.retry
                .run("discord", || self.try_send(payload))
                .await?;
            progress.record(payload.embeds.len());
        }
        Ok(())
    }

    async fn try_send(&self, payload: &WebhookPayload) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CompwatchError::HttpStatus {
                service: "discord",
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
