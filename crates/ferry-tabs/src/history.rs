//! Per-tab back/forward stack

use serde::{Deserialize, Serialize};

/// Visited URLs plus a cursor.
///
/// Invariant: `index < entries.len()` whenever `entries` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationHistory {
    entries: Vec<String>,
    index: usize,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh navigation, dropping any forward entries first
    pub fn push(&mut self, url: impl Into<String>) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(url.into());
        self.index = self.entries.len() - 1;
    }

    /// Move the cursor back one entry, returning the new current URL
    pub fn back(&mut self) -> Option<&str> {
        if !self.can_go_back() {
            return None;
        }
        self.index -= 1;
        self.current()
    }

    /// Move the cursor forward one entry, returning the new current URL
    pub fn forward(&mut self) -> Option<&str> {
        if !self.can_go_forward() {
            return None;
        }
        self.index += 1;
        self.current()
    }

    /// URL `back()` would land on, without moving
    pub fn peek_back(&self) -> Option<&str> {
        if self.can_go_back() {
            self.entries.get(self.index - 1).map(String::as_str)
        } else {
            None
        }
    }

    /// URL `forward()` would land on, without moving
    pub fn peek_forward(&self) -> Option<&str> {
        if self.can_go_forward() {
            self.entries.get(self.index + 1).map(String::as_str)
        } else {
            None
        }
    }

    pub fn can_go_back(&self) -> bool {
        !self.entries.is_empty() && self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.index).map(String::as_str)
    }

    /// Cursor position, `None` while empty
    pub fn index(&self) -> Option<usize> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.index)
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_navigation_truncates_forward_entries() {
        let mut history = NavigationHistory::new();
        history.push("A");
        history.push("B");
        history.push("C");

        assert_eq!(history.back(), Some("B"));
        assert_eq!(history.back(), Some("A"));
        history.push("D");

        assert_eq!(history.entries(), &["A".to_string(), "D".to_string()]);
        assert_eq!(history.index(), Some(1));
        assert!(!history.can_go_forward());
    }

    #[test]
    fn test_back_and_forward_keep_entries() {
        let mut history = NavigationHistory::new();
        history.push("A");
        history.push("B");

        assert_eq!(history.back(), Some("A"));
        assert_eq!(history.back(), None);
        assert_eq!(history.index(), Some(0));

        assert_eq!(history.peek_forward(), Some("B"));
        assert_eq!(history.forward(), Some("B"));
        assert_eq!(history.forward(), None);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_empty_history() {
        let mut history = NavigationHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.index(), None);
        assert_eq!(history.current(), None);
        assert_eq!(history.back(), None);
        assert_eq!(history.forward(), None);
        assert_eq!(history.peek_back(), None);
    }
}
