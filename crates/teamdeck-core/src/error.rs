//! Error types for TeamDeck

use thiserror::Error;

/// Result type alias using TeamDeck's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for TeamDeck operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport error (connect, read, or close on the live channel)
    #[error("Transport error: {0}")]
    Transport(String),

    /// An update payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Export error
    #[error("Export error: {0}")]
    Export(String),

    /// Terminal UI error
    #[error("TUI error: {0}")]
    Tui(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an export error
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Create a TUI error
    pub fn tui(msg: impl Into<String>) -> Self {
        Self::Tui(msg.into())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
