use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompwatchError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid country '{0}': must be a two-letter ISO 3166-1 code like CL")]
    InvalidCountry(String),

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("{service} returned HTTP {status}")]
    HttpStatus { service: &'static str, status: u16 },

    #[error("telegram rejected the message: {0}")]
    TelegramRejected(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CompwatchError {
    /// Whether repeating the same request could plausibly succeed.
    ///
    /// Client errors (4xx) are final except for 429 rate limiting.
    pub fn is_retryable(&self) -> bool {
        match self {
            CompwatchError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            CompwatchError::Http(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompwatchError>;
