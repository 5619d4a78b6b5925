//! Tab State Machine
//!
//! ```text
//! Created ──▶ Navigating ──▶ Idle
//!    │            ▲           │
//!    │            └───────────┘
//!    └──────────────┴─────────────▶ Closed
//! ```
//!
//! A tab created from an already-fetched page skips straight to `Idle`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabState {
    /// Tab exists but has not shown a page yet
    Created,
    /// A relay call for this tab is in flight
    Navigating,
    /// Showing a page, ready to navigate
    Idle,
    /// Terminal
    Closed,
}

impl TabState {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, target: TabState) -> bool {
        match (self, target) {
            (TabState::Created, TabState::Navigating) => true,
            (TabState::Created, TabState::Idle) => true,
            (TabState::Navigating, TabState::Idle) => true,
            (TabState::Idle, TabState::Navigating) => true,
            // Anything but Closed itself can be closed
            (TabState::Closed, _) => false,
            (_, TabState::Closed) => true,
            // Navigating -> Navigating is refused: one navigation in flight per tab
            _ => false,
        }
    }

    pub fn is_navigating(&self) -> bool {
        matches!(self, TabState::Navigating)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TabState::Closed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TabState::Created => "created",
            TabState::Navigating => "navigating",
            TabState::Idle => "idle",
            TabState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for TabState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
