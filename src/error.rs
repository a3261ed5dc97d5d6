//! Error types for the Nova voice client

use thiserror::Error;

/// Result type alias for Nova operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Nova voice client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Microphone access denied
    #[error("microphone access denied: {0}")]
    Permission(String),

    /// Live session handshake or transport failure
    #[error("connection error: {0}")]
    Connection(String),

    /// Malformed inbound audio payload
    #[error("decode error: {0}")]
    Decode(String),

    /// Audio capture or playback unavailable in this environment
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Voice profile or session misuse error
    #[error("voice error: {0}")]
    Voice(String),

    /// Preview synthesis error
    #[error("preview error: {0}")]
    Preview(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// WebSocket error
    #[error("websocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}
