//! Announcement channels for newly published competitions.
//!
//! Each channel renders the competitions into its own message format and
//! POSTs them, retrying transient failures with exponential backoff
//! (`base`, `2·base`, `4·base`, …).

pub mod discord;
pub mod telegram;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;

use crate::competition::Competition;
use crate::config::{Config, RetryConfig};
use crate::error::Result;

pub use discord::DiscordNotifier;
pub use telegram::TelegramNotifier;

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.base_delay_ms),
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << (attempt.saturating_sub(1)).min(16);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are exhausted. Returns the last error.
    pub async fn run<T, F, Fut>(&self, target: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < self.max_attempts && e.is_retryable() => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        target_channel = target,
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(target_channel = target, attempt, error = %e, "delivery failed");
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

pub enum Channel {
    Discord(DiscordNotifier),
    Telegram(TelegramNotifier),
}

impl Channel {
    /// Every channel whose credentials are present in `config`.
    pub fn from_config(config: &Config) -> Result<Vec<Channel>> {
        let retry = RetryPolicy::from_config(&config.retry);
        let mut channels = Vec::new();
        if let Some(url) = &config.discord.webhook_url {
            channels.push(Channel::Discord(DiscordNotifier::new(
                url.clone(),
                &config.discord,
                retry.clone(),
            )?));
        }
        if let (Some(token), Some(chat)) = (&config.telegram.bot_token, &config.telegram.channel_id) {
            channels.push(Channel::Telegram(TelegramNotifier::new(
                token.clone(),
                chat.clone(),
                &config.telegram,
                retry,
            )?));
        }
        Ok(channels)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Discord(_) => "discord",
            Channel::Telegram(_) => "telegram",
        }
    }

    /// Send the announcement and report how far it got.
    pub async fn deliver(&self, competitions: &[Competition]) -> DeliveryOutcome {
        let mut progress = Progress::default();
        let result = match self {
            Channel::Discord(n) => n.deliver(competitions, &mut progress).await,
            Channel::Telegram(n) => n.deliver(competitions, &mut progress).await,
        };
        if result.is_ok() {
            tracing::info!(
                channel = self.name(),
                messages = progress.messages,
                competitions = progress.delivered,
                "announcement delivered"
            );
        }
        DeliveryOutcome {
            channel: self.name(),
            messages: progress.messages,
            delivered: progress.delivered,
            pending: competitions.len().saturating_sub(progress.delivered),
            error: result.err().map(|e| e.to_string()),
        }
    }
}

/// How far a notifier got. Competitions go out in order, so the first
/// `delivered` of them reached the channel even when a later message failed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub messages: usize,
    pub delivered: usize,
}

impl Progress {
    fn record(&mut self, competitions: usize) {
        self.messages += 1;
        self.delivered += competitions;
    }
}

// ---------------------------------------------------------------------------
// DeliveryOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    pub channel: &'static str,
    pub messages: usize,
    /// Competitions that reached the channel.
    pub delivered: usize,
    /// Competitions still owed to the channel.
    pub pending: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompwatchError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    fn status(status: u16) -> CompwatchError {
        CompwatchError::HttpStatus {
            service: "test",
            status,
        }
    }

    #[test]
    fn delays_double() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
        };
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let policy = RetryPolicy::from_config(&RetryConfig {
            max_attempts: 0,
            base_delay_ms: 0,
        });
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let result = fast(3)
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(status(502))
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast(2)
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(status(500))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast(5)
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(status(404))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn no_channels_without_credentials() {
        let channels = Channel::from_config(&Config::default()).unwrap();
        assert!(channels.is_empty());
    }

    #[test]
    fn channels_follow_credentials() {
        let mut cfg = Config::default();
        cfg.discord.webhook_url = Some("https://discord.test/hook".to_string());
        cfg.telegram.bot_token = Some("123:abc".to_string());
        let names: Vec<_> = Channel::from_config(&cfg)
            .unwrap()
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, ["discord"]);

        cfg.telegram.channel_id = Some("@cubing".to_string());
        let names: Vec<_> = Channel::from_config(&cfg)
            .unwrap()
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, ["discord", "telegram"]);
    }

    #[test]
    fn progress_counts_messages_and_competitions() {
        let mut progress = Progress::default();
        progress.record(10);
        progress.record(1);
        assert_eq!(
            progress,
            Progress {
                messages: 2,
                delivered: 11
            }
        );
    }

    #[tokio::test]
    async fn outcome_reports_what_is_still_owed() {
        let mut server = mockito::Server::new_async().await;
        let _hook = server
            .mock("POST", "/hook")
            .with_status(403)
            .create_async()
            .await;
        let mut cfg = Config::default();
        cfg.discord.webhook_url = Some(format!("{}/hook", server.url()));
        cfg.retry.max_attempts = 1;
        let channels = Channel::from_config(&cfg).unwrap();

        let comps = vec![crate::competition::fixtures::competition(
            "A2025",
            "2025-03-01",
            "2025-03-01",
        )];
        let outcome = channels[0].deliver(&comps).await;
        assert!(!outcome.succeeded());
        assert_eq!(outcome.delivered, 0);
        assert_eq!(outcome.pending, 1);
        assert!(outcome.error.unwrap().contains("discord returned HTTP 403"));
    }
}
