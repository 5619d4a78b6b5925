//! Main client state container
//!
//! Ties the address bar, compatibility advisory, tab manager, visit history
//! and relay client together. Every page shown in a tab got there through
//! exactly one relay call made from here.

use parking_lot::RwLock;
use std::sync::Arc;

use ferry_compat::{CompatibilityChecker, CompatibilityLevel};
use ferry_navigation::{resolve_input, HistoryEntry, HistoryManager};
use ferry_relay::{RelayRequest, RelayResponse};
use ferry_storage::Database;
use ferry_tabs::{NavigationKind, PageContent, Tab, TabManager};
use url::Url;

use crate::client::{HttpRelayClient, RelayClient};
use crate::config::Config;
use crate::error::CoreError;
use crate::messages::{FormMethod, InboundMessage, ResourceResponse};
use crate::Result;

/// Settings key remembering the user's compatibility advisory toggle
const COMPATIBILITY_CHECKS_KEY: &str = "compatibility_checks";

/// What handling an inbound message led to
#[derive(Debug, Clone)]
pub enum MessageOutcome {
    /// An existing tab navigated
    Navigated(Tab),
    /// A new tab was opened
    Opened(Tab),
    /// Dropped because the tab already had a navigation in flight
    Ignored,
    /// Reply to post back into the embedded document
    Resource(ResourceResponse),
}

pub struct Browser {
    config: Config,
    db: Database,
    history_manager: HistoryManager,
    compatibility: Arc<RwLock<CompatibilityChecker>>,
    tab_manager: TabManager,
    relay: Arc<dyn RelayClient>,
}

impl Browser {
    /// Open the database at the configured path and talk to the configured
    /// relay endpoint over HTTP
    pub fn new(config: Config) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        let relay = Arc::new(HttpRelayClient::new(&config.relay_endpoint)?);

        Ok(Self::with_parts(config, db, relay))
    }

    pub fn with_parts(config: Config, db: Database, relay: Arc<dyn RelayClient>) -> Self {
        let history_manager = HistoryManager::with_limit(db.clone(), config.history_limit);

        // A toggle saved by the user wins over the configured default
        let compatibility_checks = match db.flag(COMPATIBILITY_CHECKS_KEY) {
            Ok(stored) => stored.unwrap_or(config.compatibility_checks),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read compatibility setting");
                config.compatibility_checks
            }
        };
        let mut compatibility = CompatibilityChecker::new();
        compatibility.set_enabled(compatibility_checks);
        for host in &config.blocked_hosts {
            compatibility.block_fragment(host);
        }
        for host in &config.limited_hosts {
            compatibility.limit_fragment(host);
        }

        tracing::info!(
            history_limit = history_manager.limit(),
            compatibility_checks,
            "Browser initialized"
        );

        Self {
            config,
            db,
            history_manager,
            compatibility: Arc::new(RwLock::new(compatibility)),
            tab_manager: TabManager::new(),
            relay,
        }
    }

    // === Visiting ===

    /// Visit address-bar input in a new tab.
    ///
    /// The input is normalized first. Unless `force` is set, a host on the
    /// compatibility deny-list is refused with `CoreError::Incompatible`; the
    /// caller can retry with `force` as a "try anyway".
    pub async fn visit(&self, input: &str, force: bool) -> Result<Tab> {
        let target = resolve_input(input)?;

        if !force {
            let (level, message) = self.check_compatibility(target.as_str());
            match level {
                CompatibilityLevel::Blocked => {
                    let message = message.unwrap_or_else(|| level.to_string());
                    tracing::warn!(url = %target, "Visit refused by compatibility advisory");
                    return Err(CoreError::Incompatible {
                        url: target.to_string(),
                        message,
                    });
                }
                CompatibilityLevel::Limited => {
                    tracing::info!(
                        url = %target,
                        warning = ?message,
                        "Visiting site with limited compatibility"
                    );
                }
                CompatibilityLevel::Compatible => {}
            }
        }

        self.open_tab(&target).await
    }

    async fn open_tab(&self, target: &Url) -> Result<Tab> {
        let response = self.relay.relay(RelayRequest::page(target.as_str())).await?;
        let page = page_content(response);
        self.record_visit(&page);
        Ok(self.tab_manager.add_tab(page)?)
    }

    /// Navigate an existing tab. `Ok(None)` means the request was dropped
    /// because the tab is already navigating.
    pub async fn navigate_tab(&self, tab_id: &str, url: &str) -> Result<Option<Tab>> {
        self.run_navigation(tab_id, url, NavigationKind::New).await
    }

    pub async fn go_back(&self, tab_id: &str) -> Result<Option<Tab>> {
        self.replay(tab_id, NavigationKind::Back).await
    }

    pub async fn go_forward(&self, tab_id: &str) -> Result<Option<Tab>> {
        self.replay(tab_id, NavigationKind::Forward).await
    }

    async fn replay(&self, tab_id: &str, kind: NavigationKind) -> Result<Option<Tab>> {
        match self.tab_manager.begin_replay(tab_id, kind)? {
            Some(url) => self.load_into_tab(tab_id, &url, kind).await.map(Some),
            None => Ok(None),
        }
    }

    async fn run_navigation(
        &self,
        tab_id: &str,
        url: &str,
        kind: NavigationKind,
    ) -> Result<Option<Tab>> {
        if !self.tab_manager.begin_navigation(tab_id)? {
            return Ok(None);
        }
        self.load_into_tab(tab_id, url, kind).await.map(Some)
    }

    /// Relay `url` into a tab whose latch is already held
    async fn load_into_tab(&self, tab_id: &str, url: &str, kind: NavigationKind) -> Result<Tab> {
        tracing::debug!(tab_id = %tab_id, url = %url, kind = ?kind, "Navigating tab");

        match self.relay.relay(RelayRequest::page(url)).await {
            Ok(response) => {
                let page = page_content(response);
                if kind.adds_to_history() {
                    self.record_visit(&page);
                }
                Ok(self.tab_manager.complete_navigation(tab_id, page, kind)?)
            }
            Err(e) => {
                tracing::warn!(tab_id = %tab_id, url = %url, error = %e, "Navigation failed");
                // The tab may have been closed while the call was in flight
                if let Err(release) = self.tab_manager.fail_navigation(tab_id) {
                    tracing::debug!(tab_id = %tab_id, error = %release, "Latch not released");
                }
                Err(e)
            }
        }
    }

    /// History failures never fail a navigation
    fn record_visit(&self, page: &PageContent) {
        if let Err(e) = self.history_manager.record_visit(&page.url, &page.title) {
            tracing::warn!(url = %page.url, error = %e, "Failed to record visit");
        }
    }

    // === Embedded document messages ===

    /// Route a raw message posted by the injected script.
    ///
    /// `proxy-navigate` goes to the active tab (or a new tab when `newTab` is
    /// set or nothing is open); `proxy-resource` is answered with a
    /// `proxy-resource-response`, including on relay failure.
    pub async fn handle_message(&self, raw: &str) -> Result<MessageOutcome> {
        let message = InboundMessage::parse(raw).map_err(|e| {
            tracing::warn!(error = %e, "Dropped message from embedded document");
            e
        })?;

        match message {
            InboundMessage::Navigate {
                url,
                method,
                body,
                new_tab,
            } => {
                if method == FormMethod::Post {
                    tracing::warn!(
                        url = %url,
                        body_len = body.as_deref().map_or(0, str::len),
                        "POST form submitted; relay only issues GET, fields are dropped"
                    );
                }

                let active = self.tab_manager.active_tab_id();
                match (new_tab, active) {
                    (false, Some(tab_id)) => Ok(self
                        .navigate_tab(&tab_id, url.as_str())
                        .await?
                        .map_or(MessageOutcome::Ignored, MessageOutcome::Navigated)),
                    _ => Ok(MessageOutcome::Opened(self.open_tab(&url).await?)),
                }
            }
            InboundMessage::Resource { url, element_id } => {
                let reply = match self.relay.relay(RelayRequest::resource(url.as_str())).await {
                    Ok(response) => ResourceResponse::loaded(element_id, response.content),
                    Err(e) => {
                        tracing::debug!(url = %url, error = %e, "Resource relay failed");
                        ResourceResponse::failed(element_id, e.to_string())
                    }
                };
                Ok(MessageOutcome::Resource(reply))
            }
        }
    }

    // === Tabs ===

    pub fn tab_manager(&self) -> &TabManager {
        &self.tab_manager
    }

    pub fn set_active_tab(&self, tab_id: &str) -> Result<()> {
        Ok(self.tab_manager.set_active(tab_id)?)
    }

    /// Returns the tab that is active afterwards
    pub fn close_tab(&self, tab_id: &str) -> Result<Option<String>> {
        Ok(self.tab_manager.remove_tab(tab_id)?)
    }

    pub fn close_all_tabs(&self) {
        self.tab_manager.close_all();
    }

    // === History ===

    pub fn recent_history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.history_manager.recent()?)
    }

    pub fn remove_history_entry(&self, url: &str) -> Result<()> {
        Ok(self.history_manager.remove(url)?)
    }

    pub fn clear_history(&self) -> Result<()> {
        Ok(self.history_manager.clear()?)
    }

    // === Compatibility ===

    pub fn check_compatibility(&self, url: &str) -> (CompatibilityLevel, Option<String>) {
        let checker = self.compatibility.read();
        let level = checker.check(url);
        (level, checker.message(level, url))
    }

    /// Toggle the advisory and remember the choice across restarts
    pub fn set_compatibility_checks(&self, enabled: bool) -> Result<()> {
        self.compatibility.write().set_enabled(enabled);
        self.db.store_flag(COMPATIBILITY_CHECKS_KEY, enabled)?;
        Ok(())
    }

    pub fn compatibility_checks_enabled(&self) -> bool {
        self.compatibility.read().is_enabled()
    }

    // === Config ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Clone for Browser {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: self.db.clone(),
            history_manager: self.history_manager.clone(),
            compatibility: Arc::clone(&self.compatibility),
            tab_manager: self.tab_manager.clone(),
            relay: Arc::clone(&self.relay),
        }
    }
}

fn page_content(response: RelayResponse) -> PageContent {
    PageContent::new(
        response.url,
        response.title.unwrap_or_default(),
        response.content,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ferry_relay::{Mode, RelayError};
    use parking_lot::Mutex;
    use std::path::PathBuf;

    /// Answers every page with a tiny document titled after its URL and
    /// records each request
    #[derive(Default)]
    struct FakeRelay {
        calls: Mutex<Vec<RelayRequest>>,
    }

    #[async_trait]
    impl RelayClient for FakeRelay {
        async fn relay(&self, request: RelayRequest) -> Result<RelayResponse> {
            self.calls.lock().push(request.clone());
            let url = request.url.unwrap_or_default();

            if url.contains("broken") {
                return Err(RelayError::Upstream("connection refused".to_string()).into());
            }

            Ok(match request.mode {
                Mode::Page => RelayResponse {
                    content: format!("<html><head></head><body>{}</body></html>", url),
                    content_type: "text/html".to_string(),
                    url: url.clone(),
                    title: Some(format!("Page {}", url)),
                    base_url: None,
                    status: Some(200),
                },
                Mode::Resource => RelayResponse {
                    content: "data:image/png;base64,AA==".to_string(),
                    content_type: "image/png".to_string(),
                    url,
                    title: None,
                    base_url: None,
                    status: Some(200),
                },
            })
        }
    }

    fn test_browser() -> (Browser, Arc<FakeRelay>) {
        let relay = Arc::new(FakeRelay::default());
        let config = Config::new(PathBuf::from("/tmp/ferry-test"));
        let db = Database::open_in_memory().unwrap();
        (Browser::with_parts(config, db, relay.clone()), relay)
    }

    #[tokio::test]
    async fn test_visit_normalizes_and_records() {
        let (browser, relay) = test_browser();

        let tab = browser.visit("  en.wikipedia.org ", false).await.unwrap();

        assert_eq!(tab.url, "https://en.wikipedia.org/");
        assert_eq!(tab.title, "Page https://en.wikipedia.org/");
        assert_eq!(browser.tab_manager().active_tab_id(), Some(tab.id.clone()));

        let calls = relay.calls.lock();
        assert_eq!(calls[0].url.as_deref(), Some("https://en.wikipedia.org/"));
        assert_eq!(calls[0].mode, Mode::Page);
        drop(calls);

        let history = browser.recent_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].url, "https://en.wikipedia.org/");
    }

    #[tokio::test]
    async fn test_blocked_site_needs_force() {
        let (browser, relay) = test_browser();

        let err = browser.visit("youtube.com", false).await.unwrap_err();
        assert!(matches!(err, CoreError::Incompatible { .. }));
        assert!(relay.calls.lock().is_empty());
        assert!(browser.tab_manager().is_empty());

        let tab = browser.visit("youtube.com", true).await.unwrap();
        assert_eq!(tab.url, "https://youtube.com/");
    }

    #[tokio::test]
    async fn test_configured_host_lists() {
        let relay = Arc::new(FakeRelay::default());
        let mut config = Config::new(PathBuf::from("/tmp/ferry-test"));
        config.blocked_hosts = vec!["intranet.example".to_string()];
        config.limited_hosts = vec!["spa.example".to_string()];
        let db = Database::open_in_memory().unwrap();
        let browser = Browser::with_parts(config, db, relay.clone());

        let err = browser.visit("wiki.intranet.example", false).await.unwrap_err();
        assert!(matches!(err, CoreError::Incompatible { .. }));

        let (level, message) = browser.check_compatibility("https://app.spa.example/");
        assert_eq!(level, CompatibilityLevel::Limited);
        assert!(message.is_some());

        let tab = browser.visit("app.spa.example", false).await.unwrap();
        assert_eq!(tab.url, "https://app.spa.example/");
        assert_eq!(relay.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_compatibility_toggle_persists() {
        let (browser, relay) = test_browser();
        browser.set_compatibility_checks(false).unwrap();
        assert!(!browser.compatibility_checks_enabled());

        let tab = browser.visit("youtube.com", false).await.unwrap();
        assert_eq!(tab.url, "https://youtube.com/");

        let config = Config::new(PathBuf::from("/tmp/ferry-test"));
        let reopened = Browser::with_parts(config, browser.database().clone(), relay);
        assert!(!reopened.compatibility_checks_enabled());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let (browser, _) = test_browser();
        let err = browser.visit("   ", false).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a website URL");
    }

    #[tokio::test]
    async fn test_failed_visit_opens_nothing() {
        let (browser, _) = test_browser();
        let err = browser.visit("broken.example", false).await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
        assert!(browser.tab_manager().is_empty());
        assert!(browser.recent_history().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_back_forward_and_truncation() {
        let (browser, _) = test_browser();
        let tab = browser.visit("https://a.example/", false).await.unwrap();

        for url in ["https://b.example/", "https://c.example/"] {
            browser.navigate_tab(&tab.id, url).await.unwrap().unwrap();
        }

        browser.go_back(&tab.id).await.unwrap().unwrap();
        let back = browser.go_back(&tab.id).await.unwrap().unwrap();
        assert_eq!(back.url, "https://a.example/");
        assert!(browser.go_back(&tab.id).await.unwrap().is_none());

        let tab = browser
            .navigate_tab(&tab.id, "https://d.example/")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            tab.history.entries(),
            &["https://a.example/".to_string(), "https://d.example/".to_string()]
        );
        assert_eq!(tab.history.index(), Some(1));
        assert!(browser.go_forward(&tab.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_back_is_ignored_while_in_flight() {
        let (browser, relay) = test_browser();
        let tab = browser.visit("https://a.example/", false).await.unwrap();
        browser
            .navigate_tab(&tab.id, "https://b.example/")
            .await
            .unwrap()
            .unwrap();
        let calls = relay.calls.lock().len();

        assert!(browser.tab_manager().begin_navigation(&tab.id).unwrap());
        assert!(browser.go_back(&tab.id).await.unwrap().is_none());
        assert_eq!(relay.calls.lock().len(), calls);

        browser.tab_manager().fail_navigation(&tab.id).unwrap();
        let back = browser.go_back(&tab.id).await.unwrap().unwrap();
        assert_eq!(back.url, "https://a.example/");
        assert_eq!(back.history.index(), Some(0));
    }

    #[tokio::test]
    async fn test_failed_navigation_releases_latch() {
        let (browser, _) = test_browser();
        let tab = browser.visit("https://a.example/", false).await.unwrap();

        assert!(browser
            .navigate_tab(&tab.id, "https://broken.example/")
            .await
            .is_err());

        let tab = browser
            .navigate_tab(&tab.id, "https://b.example/")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tab.url, "https://b.example/");
        assert_eq!(tab.history.len(), 2);
    }

    #[tokio::test]
    async fn test_navigate_message_routes_to_active_tab() {
        let (browser, _) = test_browser();
        let first = browser.visit("https://a.example/", false).await.unwrap();

        let outcome = browser
            .handle_message(r#"{"type":"proxy-navigate","url":"https://a.example/next"}"#)
            .await
            .unwrap();
        match outcome {
            MessageOutcome::Navigated(tab) => {
                assert_eq!(tab.id, first.id);
                assert_eq!(tab.url, "https://a.example/next");
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let outcome = browser
            .handle_message(
                r#"{"type":"proxy-navigate","url":"https://popup.example/","newTab":true}"#,
            )
            .await
            .unwrap();
        assert!(matches!(outcome, MessageOutcome::Opened(ref tab) if tab.id != first.id));
        assert_eq!(browser.tab_manager().len(), 2);
    }

    #[tokio::test]
    async fn test_navigate_message_ignored_while_in_flight() {
        let (browser, _) = test_browser();
        let tab = browser.visit("https://a.example/", false).await.unwrap();
        browser.tab_manager().begin_navigation(&tab.id).unwrap();

        let outcome = browser
            .handle_message(r#"{"type":"proxy-navigate","url":"https://a.example/x"}"#)
            .await
            .unwrap();
        assert!(matches!(outcome, MessageOutcome::Ignored));
    }

    #[tokio::test]
    async fn test_resource_message_answers() {
        let (browser, relay) = test_browser();

        let outcome = browser
            .handle_message(
                r#"{"type":"proxy-resource","url":"https://cdn.example/a.png","elementId":"e1"}"#,
            )
            .await
            .unwrap();
        match outcome {
            MessageOutcome::Resource(reply) => {
                assert_eq!(reply.element_id, "e1");
                assert_eq!(reply.content, "data:image/png;base64,AA==");
                assert!(reply.error.is_none());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(relay.calls.lock()[0].mode, Mode::Resource);

        let outcome = browser
            .handle_message(
                r#"{"type":"proxy-resource","url":"https://broken.example/a.png","elementId":"e2"}"#,
            )
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            MessageOutcome::Resource(ResourceResponse { error: Some(_), .. })
        ));
    }

    #[tokio::test]
    async fn test_untrusted_message_rejected() {
        let (browser, relay) = test_browser();
        let err = browser
            .handle_message(r#"{"type":"proxy-navigate","url":"javascript:alert(1)"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidMessage(_)));
        assert!(relay.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_close_tabs() {
        let (browser, _) = test_browser();
        let first = browser.visit("https://a.example/", false).await.unwrap();
        let second = browser.visit("https://b.example/", false).await.unwrap();

        browser.set_active_tab(&first.id).unwrap();
        assert_eq!(browser.close_tab(&first.id).unwrap(), Some(second.id));

        browser.close_all_tabs();
        assert!(browser.tab_manager().is_empty());
        assert_eq!(browser.tab_manager().active_tab_id(), None);
    }
}
