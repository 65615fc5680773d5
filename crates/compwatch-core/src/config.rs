use crate::error::Result;
use crate::notify::telegram::MAX_MESSAGE_CHARS;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DISCORD_WEBHOOK_URL: &str = "DISCORD_WEBHOOK_URL";
pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_TELEGRAM_CHANNEL_ID: &str = "TELEGRAM_CHANNEL_ID";
pub const ENV_COUNTRY: &str = "COMPWATCH_COUNTRY";

const REDACTED: &str = "<redacted>";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// WcaConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WcaConfig {
    #[serde(default = "default_wca_base_url")]
    pub base_url: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_wca_base_url() -> String {
    "https://www.worldcubeassociation.org/api/v0".to_string()
}

fn default_country() -> String {
    "CL".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_pages() -> u32 {
    10
}

impl Default for WcaConfig {
    fn default() -> Self {
        Self {
            base_url: default_wca_base_url(),
            country: default_country(),
            timeout_secs: default_timeout_secs(),
            max_pages: default_max_pages(),
        }
    }
}

impl WcaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// DiscordConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_discord_content")]
    pub content: String,
    #[serde(default = "default_embed_color")]
    pub color: u32,
}

fn default_discord_content() -> String {
    "🎉 **¡Nuevos torneos!**".to_string()
}

fn default_embed_color() -> u32 {
    0x002C99
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            content: default_discord_content(),
            color: default_embed_color(),
        }
    }
}

// ---------------------------------------------------------------------------
// TelegramConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
    #[serde(default = "default_telegram_header")]
    pub header: String,
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_telegram_header() -> String {
    "🎉 <b>¡Nuevos torneos!</b>".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            channel_id: None,
            api_base: default_telegram_api_base(),
            header: default_telegram_header(),
        }
    }
}

// ---------------------------------------------------------------------------
// RetryConfig / ScheduleConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Longest accepted interval between checks: one week.
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

fn default_interval_minutes() -> u64 {
    120
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default)]
    pub wca: WcaConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

fn default_version() -> u32 {
    1
}

fn default_state_file() -> String {
    paths::DEFAULT_STATE_FILE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            state_file: default_state_file(),
            wca: WcaConfig::default(),
            discord: DiscordConfig::default(),
            telegram: TelegramConfig::default(),
            retry: RetryConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl Config {
    /// Load `compwatch.yaml` from `root`. A missing file yields the defaults,
    /// so a bare checkout driven only by environment variables works.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load from `root` and apply overrides from the process environment.
    pub fn load_with_env(root: &Path) -> Result<Self> {
        let mut cfg = Self::load(root)?;
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Override secrets and the country from `lookup`. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_DISCORD_WEBHOOK_URL) {
            self.discord.webhook_url = Some(url);
        }
        if let Some(token) = get(ENV_TELEGRAM_BOT_TOKEN) {
            self.telegram.bot_token = Some(token);
        }
        if let Some(channel) = get(ENV_TELEGRAM_CHANNEL_ID) {
            self.telegram.channel_id = Some(channel);
        }
        if let Some(country) = get(ENV_COUNTRY) {
            self.wca.country = country.to_ascii_uppercase();
        }
    }

    pub fn state_path(&self, root: &Path) -> PathBuf {
        paths::state_path(root, &self.state_file)
    }

    pub fn discord_enabled(&self) -> bool {
        self.discord.webhook_url.is_some()
    }

    pub fn telegram_enabled(&self) -> bool {
        self.telegram.bot_token.is_some() && self.telegram.channel_id.is_some()
    }

    /// A copy safe to print: webhook URL and bot token are masked.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        if cfg.discord.webhook_url.is_some() {
            cfg.discord.webhook_url = Some(REDACTED.to_string());
        }
        if cfg.telegram.bot_token.is_some() {
            cfg.telegram.bot_token = Some(REDACTED.to_string());
        }
        cfg
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level, message: String| warnings.push(ConfigWarning { level, message });

        if paths::validate_country(&self.wca.country).is_err() {
            push(
                WarnLevel::Error,
                format!(
                    "wca.country '{}' is not a two-letter uppercase ISO code",
                    self.wca.country
                ),
            );
        }

        if !is_http_url(&self.wca.base_url) {
            push(
                WarnLevel::Error,
                format!("wca.base_url '{}' is not an http(s) URL", self.wca.base_url),
            );
        }

        if self.wca.max_pages == 0 {
            push(
                WarnLevel::Error,
                "wca.max_pages is 0: no competitions would ever be fetched".to_string(),
            );
        }

        if let Some(url) = &self.discord.webhook_url {
            if !is_http_url(url) {
                push(
                    WarnLevel::Error,
                    "discord.webhook_url is not an http(s) URL".to_string(),
                );
            }
        }

        match (&self.telegram.bot_token, &self.telegram.channel_id) {
            (Some(_), None) => push(
                WarnLevel::Warning,
                "telegram.bot_token is set but telegram.channel_id is missing: Telegram disabled"
                    .to_string(),
            ),
            (None, Some(_)) => push(
                WarnLevel::Warning,
                "telegram.channel_id is set but telegram.bot_token is missing: Telegram disabled"
                    .to_string(),
            ),
            _ => {}
        }

        if !self.discord_enabled() && !self.telegram_enabled() {
            push(
                WarnLevel::Warning,
                "no notification channel configured: new competitions will only be recorded"
                    .to_string(),
            );
        }

        if self.telegram.header.chars().count() > MAX_MESSAGE_CHARS {
            push(
                WarnLevel::Error,
                format!("telegram.header is longer than {MAX_MESSAGE_CHARS} characters"),
            );
        }

        if self.retry.max_attempts == 0 {
            push(
                WarnLevel::Error,
                "retry.max_attempts is 0: deliveries would never be attempted".to_string(),
            );
        }

        if !(1..=MAX_INTERVAL_MINUTES).contains(&self.schedule.interval_minutes) {
            push(
                WarnLevel::Error,
                format!("schedule.interval_minutes must be between 1 and {MAX_INTERVAL_MINUTES}"),
            );
        }

        warnings
    }
}

fn is_http_url(s: &str) -> bool {
    match reqwest::Url::parse(s) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
