//! Error types for the relay.
//!
//! Every failure in this crate is local to one connection or one delivery
//! attempt. `RelayError` is what those code paths return; the connection
//! task that owns them logs it and moves on.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid relay url: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
