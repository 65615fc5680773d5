//! Telegram Bot API delivery (`sendMessage` to a channel, HTML parse mode).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Progress, RetryPolicy};
use crate::competition::Competition;
use crate::config::TelegramConfig;
use crate::error::{CompwatchError, Result};

/// Bot API limit for the `text` field of `sendMessage`, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// One competition rendered as an HTML block.
pub fn block_for(comp: &Competition) -> String {
    let label = if comp.is_multi_day() { "Dates" } else { "Date" };
    format!(
        "🏆 <a href=\"{}\">{}</a>\n📍 <b>City:</b> {}\n📅 <b>{}:</b> {}",
        escape_html(&comp.url),
        escape_html(&comp.name),
        escape_html(&comp.city),
        label,
        comp.date_range()
    )
}

/// One `sendMessage` text and how many competition blocks it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub text: String,
    pub competitions: usize,
}

/// Cut `s` to at most `max` characters, marking the cut with `…`.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Pack the header and competition blocks into messages under the size limit.
///
/// Blocks are never split across messages. When the header leaves no room
/// for the first block it goes out as a message of its own. A header or block
/// longer than the limit on its own is truncated.
pub fn build_messages(competitions: &[Competition], header: &str) -> Vec<Message> {
    if competitions.is_empty() {
        return Vec::new();
    }

    let mut messages = Vec::new();
    let mut current = Message {
        text: truncate_chars(header, MAX_MESSAGE_CHARS),
        competitions: 0,
    };
    let mut current_chars = current.text.chars().count();

    for block in competitions.iter().map(block_for) {
        let block = truncate_chars(&block, MAX_MESSAGE_CHARS);
        let block_chars = block.chars().count();

        if current_chars > 0 && current_chars + 2 + block_chars > MAX_MESSAGE_CHARS {
            messages.push(std::mem::replace(
                &mut current,
                Message {
                    text: String::new(),
                    competitions: 0,
                },
            ));
            current_chars = 0;
        }
        if current_chars > 0 {
            current.text.push_str("\n\n");
            current_chars += 2;
        }
        current.text.push_str(&block);
        current_chars += block_chars;
        current.competitions += 1;
    }

    messages.push(current);
    messages
}

// ---------------------------------------------------------------------------
// TelegramNotifier
// ---------------------------------------------------------------------------

pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
    header: String,
    retry: RetryPolicy,
}

impl TelegramNotifier {
    pub fn new(
        bot_token: String,
        chat_id: String,
        config: &TelegramConfig,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let endpoint = format!(
            "{}/bot{}/sendMessage",
            config.api_base.trim_end_matches('/'),
            bot_token
        );
        if config.header.chars().count() > MAX_MESSAGE_CHARS {
            tracing::warn!(
                limit = MAX_MESSAGE_CHARS,
                "telegram.header is longer than a Telegram message and will be truncated"
            );
        }
        Ok(Self {
            client,
            endpoint,
            chat_id,
            header: config.header.clone(),
            retry,
        })
    }

    pub async fn deliver(&self, competitions: &[Competition], progress: &mut Progress) -> Result<()> {
        for message in &build_messages(competitions, &self.header) {
            self.retry
                .run("telegram", || self.try_send(&message.text))
                .await?;
            progress.record(message.competitions);
        }
        Ok(())
    }

    async fn try_send(&self, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();

        // The Bot API reports errors as JSON with `ok: false`; keep the
        // description when it is there.
        let parsed = response.json::<ApiResponse>().await.ok();
        match parsed {
            Some(api) if status.is_success() && api.ok => Ok(()),
            Some(api) if status.is_success() => Err(CompwatchError::TelegramRejected(
                api.description.unwrap_or_else(|| "ok=false".to_string()),
            )),
            Some(ApiResponse {
                description: Some(desc),
                ..
            }) if status.is_client_error() && status.as_u16() != 429 => {
                Err(CompwatchError::TelegramRejected(format!("{}: {desc}", status.as_u16())))
            }
            _ if status.is_success() => Err(CompwatchError::TelegramRejected(
                "unreadable response body".to_string(),
            )),
            _ => Err(CompwatchError::HttpStatus {
                service: "telegram",
                status: status.as_u16(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
