//! Error types for the collector

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    /// A parsed value fell outside the roulette domain.
    #[error("number {0} outside roulette range 0-36")]
    InvalidNumber(i64),

    /// The target site served an anti-automation challenge instead of game
    /// content, and every recovery strategy failed.
    #[error("navigation blocked by anti-automation challenge")]
    NavigationBlocked,

    #[error("session refresh failed: {0}")]
    RefreshFailed(String),

    /// DevTools transport failure (discovery, websocket, protocol).
    #[error("browser error: {0}")]
    Browser(String),

    /// A sink answered with a status outside its success set.
    #[error("{sink} rejected request with status {status}")]
    SinkRejected { sink: &'static str, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, CollectorError>;
