//! Ferry Core
//!
//! Client-side coordination layer. The `Browser` owns all client state (open
//! tabs, visit history, compatibility settings) and reaches the relay through
//! a `RelayClient`, either in-process or over HTTP.

mod browser;
mod client;
mod config;
mod error;
mod messages;

pub use browser::{Browser, MessageOutcome};
pub use client::{HttpRelayClient, RelayClient};
pub use config::Config;
pub use error::CoreError;
pub use messages::{FormMethod, InboundMessage, ResourceResponse};

// Re-export core components
pub use ferry_compat::{CompatibilityChecker, CompatibilityLevel, KnownSite, COMPATIBLE_EXAMPLES};
pub use ferry_navigation::{normalize_input, HistoryEntry, HistoryManager, NavigationError};
pub use ferry_relay::{Mode, Relay, RelayError, RelayRequest, RelayResponse};
pub use ferry_storage::{Database, StorageError};
pub use ferry_tabs::{NavigationKind, PageContent, Tab, TabError, TabManager, TabState, TabsSnapshot};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
