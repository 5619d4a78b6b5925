//! Ferry Storage Layer
//!
//! SQLite-backed persistence for client-side state that outlives a tab:
//! the visit history list and simple key/value settings.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
