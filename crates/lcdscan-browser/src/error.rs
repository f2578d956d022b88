use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Coarse classification of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Transport,
    HttpStatus(u16),
    Launch,
    InvalidUrl,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timeout after {after:?} loading {url}")]
    Timeout { url: String, after: Duration },

    #[error("transport error loading {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("chromium error: {0}")]
    Launch(String),

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Timeout { .. } => FetchErrorKind::Timeout,
            Self::Transport { .. } => FetchErrorKind::Transport,
            Self::HttpStatus { status, .. } => FetchErrorKind::HttpStatus(*status),
            Self::Launch(_) => FetchErrorKind::Launch,
            Self::InvalidUrl { .. } => FetchErrorKind::InvalidUrl,
        }
    }

    /// Whether another attempt at the same URL may succeed.
    ///
    /// Timeouts, transport resets, 408, 429 and 5xx responses are transient.
    pub fn is_retryable(&self) -> bool {
        match self.kind() {
            FetchErrorKind::Timeout | FetchErrorKind::Transport => true,
            FetchErrorKind::HttpStatus(status) => {
                status == 408 || status == 429 || (500..600).contains(&status)
            }
            FetchErrorKind::Launch | FetchErrorKind::InvalidUrl => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind() == FetchErrorKind::HttpStatus(429)
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to load page for rendering: {0}")]
    Fetch(#[from] FetchError),

    #[error("PDF generation failed for {url}: {reason}")]
    Pdf { url: String, reason: String },
}
