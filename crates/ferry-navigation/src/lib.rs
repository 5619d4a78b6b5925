//! Ferry Navigation
//!
//! Caller-side helpers that run before anything reaches the relay:
//! - Address input normalization (bare hosts get an `https://` scheme)
//! - The persistent visit history list shown to the user

mod error;
mod history;
mod input;

pub use error::NavigationError;
pub use history::{HistoryEntry, HistoryManager, DEFAULT_HISTORY_LIMIT};
pub use input::{normalize_input, resolve_input};

pub type Result<T> = std::result::Result<T, NavigationError>;
