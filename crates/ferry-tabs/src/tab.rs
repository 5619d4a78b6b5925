//! Tab data structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TabError;
use crate::history::NavigationHistory;
use crate::state::TabState;
use crate::Result;

/// A relayed document as the tab displays it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub url: String,
    pub title: String,
    pub content: String,
}

impl PageContent {
    pub fn new(url: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Partial in-place update; `None` fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabUpdate {
    pub url: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// How a finished navigation affects the tab's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationKind {
    /// New entry; forward entries are dropped
    New,
    /// Replay of the previous entry
    Back,
    /// Replay of the next entry
    Forward,
}

impl NavigationKind {
    pub fn adds_to_history(&self) -> bool {
        matches!(self, NavigationKind::New)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tab {
    /// Unique identifier
    pub id: String,
    /// Current URL
    pub url: String,
    /// Page title
    pub title: String,
    /// Rewritten document currently displayed
    pub content: String,
    /// Current state in the state machine
    pub state: TabState,
    pub history: NavigationHistory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tab {
    pub fn new(url: String) -> Result<Self> {
        if url.is_empty() {
            return Err(TabError::EmptyUrl);
        }

        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            url,
            title: String::new(),
            content: String::new(),
            state: TabState::Created,
            history: NavigationHistory::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// A tab already showing `page`, with `page.url` as its first history entry
    pub fn with_page(page: PageContent) -> Result<Self> {
        let mut tab = Self::new(page.url.clone())?;
        tab.apply_page(page, NavigationKind::New);
        tab.transition_to(TabState::Idle)?;
        Ok(tab)
    }

    /// Attempt to transition to a new state
    pub fn transition_to(&mut self, new_state: TabState) -> Result<()> {
        if !self.state.can_transition_to(new_state) {
            return Err(TabError::InvalidTransition {
                from: self.state,
                to: new_state,
            });
        }

        tracing::debug!(
            tab_id = %self.id,
            from = %self.state,
            to = %new_state,
            "Tab state transition"
        );

        self.state = new_state;
        self.updated_at = Utc::now();

        Ok(())
    }

    /// Enter `Navigating`. Returns `false`, changing nothing, when a
    /// navigation is already in flight.
    pub fn begin_navigation(&mut self) -> Result<bool> {
        if self.state.is_navigating() {
            return Ok(false);
        }
        self.transition_to(TabState::Navigating)?;
        Ok(true)
    }

    /// Show a freshly relayed page and leave `Navigating`
    pub fn finish_navigation(&mut self, page: PageContent, kind: NavigationKind) -> Result<()> {
        if self.state != TabState::Idle {
            self.transition_to(TabState::Idle)?;
        }
        self.apply_page(page, kind);
        Ok(())
    }

    /// Leave `Navigating` without touching the displayed page
    pub fn abort_navigation(&mut self) -> Result<()> {
        if self.state.is_navigating() {
            self.transition_to(TabState::Idle)?;
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.transition_to(TabState::Closed)
    }

    pub fn apply_update(&mut self, update: TabUpdate) {
        if let Some(url) = update.url {
            self.url = url;
        }
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        self.updated_at = Utc::now();
    }

    fn apply_page(&mut self, page: PageContent, kind: NavigationKind) {
        match kind {
            NavigationKind::New => self.history.push(page.url.clone()),
            NavigationKind::Back => {
                self.history.back();
            }
            NavigationKind::Forward => {
                self.history.forward();
            }
        }

        self.url = page.url;
        self.title = page.title;
        self.content = page.content;
        self.updated_at = Utc::now();
    }

    /// URL the given history step would load, if there is one
    pub fn history_target(&self, kind: NavigationKind) -> Option<&str> {
        match kind {
            NavigationKind::New => None,
            NavigationKind::Back => self.history.peek_back(),
            NavigationKind::Forward => self.history.peek_forward(),
        }
    }

    /// Get display title (with fallback to URL)
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> PageContent {
        PageContent::new(url, format!("Title of {}", url), "<html></html>")
    }

    #[test]
    fn test_new_tab() {
        let tab = Tab::new("https://example.com".to_string()).unwrap();
        assert_eq!(tab.state, TabState::Created);
        assert!(tab.history.is_empty());
        assert_eq!(tab.display_title(), "https://example.com");
    }

    #[test]
    fn test_with_page_is_idle() {
        let tab = Tab::with_page(page("https://a.example/")).unwrap();
        assert_eq!(tab.state, TabState::Idle);
        assert_eq!(tab.history.entries(), &["https://a.example/".to_string()]);
        assert_eq!(tab.display_title(), "Title of https://a.example/");
    }

    #[test]
    fn test_empty_url_rejected() {
        assert!(Tab::new(String::new()).is_err());
    }

    #[test]
    fn test_navigation_latch() {
        let mut tab = Tab::with_page(page("https://a.example/")).unwrap();

        assert!(tab.begin_navigation().unwrap());
        assert!(!tab.begin_navigation().unwrap());
        assert_eq!(tab.state, TabState::Navigating);

        tab.finish_navigation(page("https://b.example/"), NavigationKind::New)
            .unwrap();
        assert_eq!(tab.state, TabState::Idle);
        assert_eq!(tab.url, "https://b.example/");
        assert!(tab.begin_navigation().unwrap());
    }

    #[test]
    fn test_replay_moves_cursor_only() {
        let mut tab = Tab::with_page(page("A")).unwrap();
        tab.finish_navigation(page("B"), NavigationKind::New).unwrap();

        assert_eq!(tab.history_target(NavigationKind::Back), Some("A"));
        tab.finish_navigation(page("A"), NavigationKind::Back).unwrap();
        assert_eq!(tab.history.index(), Some(0));
        assert_eq!(tab.history.len(), 2);
        assert_eq!(tab.history_target(NavigationKind::Forward), Some("B"));
    }

    #[test]
    fn test_closed_is_terminal() {
        let mut tab = Tab::with_page(page("A")).unwrap();
        tab.close().unwrap();
        assert!(tab.begin_navigation().is_err());
        assert!(tab.close().is_err());
    }

    #[test]
    fn test_partial_update() {
        let mut tab = Tab::with_page(page("A")).unwrap();
        tab.apply_update(TabUpdate {
            title: Some("Renamed".to_string()),
            ..Default::default()
        });
        assert_eq!(tab.title, "Renamed");
        assert_eq!(tab.url, "A");
        assert_eq!(tab.history.len(), 1);
    }
}
