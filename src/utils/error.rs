//! The `error` module defines the error type shared by the outer layers of
//! `pullsub`: configuration loading, the WebSocket transport and the client
//! wrapper.
//!
//! The broker core itself never fails; every error here originates at the
//! process or network boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PubSubError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("server replied with an error: {0}")]
    Server(String),

    #[error("unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply { expected: &'static str, got: String },

    #[error("connection closed by peer")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, PubSubError>;
