//! Ferry Tab Management
//!
//! Owns the open tabs, which one is active, and each tab's back/forward
//! history. All state lives behind one `TabManager`; consumers read
//! snapshots or subscribe to changes instead of holding references.

mod error;
mod history;
mod manager;
mod state;
mod tab;

pub use error::TabError;
pub use history::NavigationHistory;
pub use manager::{TabManager, TabsSnapshot};
pub use state::TabState;
pub use tab::{NavigationKind, PageContent, Tab, TabUpdate};

pub type Result<T> = std::result::Result<T, TabError>;
