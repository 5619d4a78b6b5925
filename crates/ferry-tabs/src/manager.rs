//! Tab Manager
//!
//! Single owner of the open tabs and the active-tab pointer. Every mutation
//! publishes a fresh `TabsSnapshot` to subscribers.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::TabError;
use crate::tab::{NavigationKind, PageContent, Tab, TabUpdate};
use crate::Result;

/// Immutable view of the tab set at one point in time
#[derive(Debug, Clone, Default, Serialize)]
pub struct TabsSnapshot {
    pub tabs: Vec<Tab>,
    pub active_tab_id: Option<String>,
}

impl TabsSnapshot {
    pub fn active_tab(&self) -> Option<&Tab> {
        let id = self.active_tab_id.as_deref()?;
        self.tabs.iter().find(|t| t.id == id)
    }
}

#[derive(Default)]
struct TabSet {
    /// Display order
    tabs: Vec<Tab>,
    active: Option<String>,
}

impl TabSet {
    fn position(&self, tab_id: &str) -> Result<usize> {
        self.tabs
            .iter()
            .position(|t| t.id == tab_id)
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))
    }

    fn get_mut(&mut self, tab_id: &str) -> Result<&mut Tab> {
        let index = self.position(tab_id)?;
        Ok(&mut self.tabs[index])
    }

    fn snapshot(&self) -> TabsSnapshot {
        TabsSnapshot {
            tabs: self.tabs.clone(),
            active_tab_id: self.active.clone(),
        }
    }
}

pub struct TabManager {
    tabs: Arc<RwLock<TabSet>>,
    updates: Arc<watch::Sender<TabsSnapshot>>,
}

impl TabManager {
    pub fn new() -> Self {
        let (updates, _) = watch::channel(TabsSnapshot::default());
        Self {
            tabs: Arc::new(RwLock::new(TabSet::default())),
            updates: Arc::new(updates),
        }
    }

    /// Receive a snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<TabsSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> TabsSnapshot {
        self.tabs.read().snapshot()
    }

    /// Publish while the write lock is still held so subscribers never see
    /// snapshots out of order.
    fn publish(&self, set: &TabSet) {
        self.updates.send_replace(set.snapshot());
    }

    /// Open a tab showing `page` and make it active
    pub fn add_tab(&self, page: PageContent) -> Result<Tab> {
        let tab = Tab::with_page(page)?;

        let mut set = self.tabs.write();
        set.tabs.push(tab.clone());
        set.active = Some(tab.id.clone());
        self.publish(&set);

        tracing::info!(tab_id = %tab.id, url = %tab.url, "Created new tab");

        Ok(tab)
    }

    /// Close a tab. If it was active, the tab now at its position (clamped
    /// to the end of the list) becomes active. Returns the active tab id.
    pub fn remove_tab(&self, tab_id: &str) -> Result<Option<String>> {
        let mut set = self.tabs.write();
        let index = set.position(tab_id)?;

        let mut tab = set.tabs.remove(index);
        tab.close()?;

        if set.tabs.is_empty() {
            set.active = None;
        } else if set.active.as_deref() == Some(tab_id) {
            let next = index.min(set.tabs.len() - 1);
            set.active = Some(set.tabs[next].id.clone());
        }

        let active = set.active.clone();
        self.publish(&set);

        tracing::info!(tab_id = %tab_id, active = ?active, "Closed tab");

        Ok(active)
    }

    pub fn set_active(&self, tab_id: &str) -> Result<()> {
        let mut set = self.tabs.write();
        set.position(tab_id)?;
        set.active = Some(tab_id.to_string());
        self.publish(&set);
        Ok(())
    }

    /// Patch a tab in place without touching its history
    pub fn update_tab(&self, tab_id: &str, update: TabUpdate) -> Result<Tab> {
        let mut set = self.tabs.write();
        let tab = set.get_mut(tab_id)?;
        tab.apply_update(update);
        let tab = tab.clone();
        self.publish(&set);
        Ok(tab)
    }

    pub fn close_all(&self) {
        let mut set = self.tabs.write();
        let count = set.tabs.len();
        for tab in set.tabs.iter_mut() {
            if let Err(e) = tab.close() {
                tracing::warn!(tab_id = %tab.id, error = %e, "Closing tab failed");
            }
        }
        set.tabs.clear();
        set.active = None;
        self.publish(&set);

        tracing::info!(count, "Closed all tabs");
    }

    pub fn get_tab(&self, tab_id: &str) -> Result<Tab> {
        let set = self.tabs.read();
        let index = set.position(tab_id)?;
        Ok(set.tabs[index].clone())
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.tabs.read().tabs.clone()
    }

    pub fn active_tab_id(&self) -> Option<String> {
        self.tabs.read().active.clone()
    }

    pub fn active_tab(&self) -> Option<Tab> {
        let set = self.tabs.read();
        let id = set.active.as_deref()?;
        set.tabs.iter().find(|t| t.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tabs.read().tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.read().tabs.is_empty()
    }

    /// Take the tab's navigation latch. `Ok(false)` means a navigation is
    /// already in flight and this one should be dropped.
    pub fn begin_navigation(&self, tab_id: &str) -> Result<bool> {
        let mut set = self.tabs.write();
        let tab = set.get_mut(tab_id)?;
        let started = tab.begin_navigation()?;
        if started {
            self.publish(&set);
        } else {
            tracing::debug!(tab_id = %tab_id, "Navigation already in flight; ignoring");
        }
        Ok(started)
    }

    /// Apply a successful relay response to the tab it was requested for.
    ///
    /// Fails with `NotFound` if the tab was closed in the meantime.
    pub fn complete_navigation(
        &self,
        tab_id: &str,
        page: PageContent,
        kind: NavigationKind,
    ) -> Result<Tab> {
        let mut set = self.tabs.write();
        let tab = set.get_mut(tab_id)?;
        tab.finish_navigation(page, kind)?;

        tracing::debug!(
            tab_id = %tab_id,
            url = %tab.url,
            kind = ?kind,
            "Navigation completed"
        );

        let tab = tab.clone();
        self.publish(&set);
        Ok(tab)
    }

    /// Release the latch after a failed relay call
    pub fn fail_navigation(&self, tab_id: &str) -> Result<()> {
        let mut set = self.tabs.write();
        set.get_mut(tab_id)?.abort_navigation()?;
        self.publish(&set);
        Ok(())
    }

    /// URL a back/forward step on this tab would load
    /// Look up the back/forward target and take the navigation latch in one
    /// step. `None` means there is nowhere to go or a navigation is already
    /// in flight; the latch is only taken when a URL is returned.
    pub fn begin_replay(&self, tab_id: &str, kind: NavigationKind) -> Result<Option<String>> {
        let mut set = self.tabs.write();
        let tab = set.get_mut(tab_id)?;
        let target = match tab.history_target(kind) {
            Some(url) => url.to_string(),
            None => return Ok(None),
        };
        if !tab.begin_navigation()? {
            tracing::debug!(tab_id = %tab_id, "Navigation already in flight; ignoring");
            return Ok(None);
        }
        self.publish(&set);
        Ok(Some(target))
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TabManager {
    fn clone(&self) -> Self {
        Self {
            tabs: Arc::clone(&self.tabs),
            updates: Arc::clone(&self.updates),
        }
    }
}
