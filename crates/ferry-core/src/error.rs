//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] ferry_storage::StorageError),

    #[error("Tab error: {0}")]
    Tab(#[from] ferry_tabs::TabError),

    #[error("{0}")]
    Navigation(#[from] ferry_navigation::NavigationError),

    #[error("{0}")]
    Relay(#[from] ferry_relay::RelayError),

    /// Failure envelope returned by a remote relay
    #[error("{message}")]
    RelayRejected { status: u16, message: String },

    #[error("Relay unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Compatibility advisory said no and the caller did not force the visit
    #[error("{message}")]
    Incompatible { url: String, message: String },

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Config(e.to_string())
    }
}
