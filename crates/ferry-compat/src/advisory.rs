//! Compatibility levels and the deny-list matcher

use serde::{Deserialize, Serialize};
use url::Url;

/// Host fragments known to break when embedded through the relay.
///
/// Matching is substring based on the lowercased host, so `google.` covers
/// every regional Google domain and `bank` catches most banking sites.
const BLOCKED_FRAGMENTS: &[&str] = &[
    // Google
    "google.com",
    "google.",
    "youtube.com",
    "youtu.be",
    // Streaming / social
    "netflix.com",
    "facebook.com",
    "fb.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "tiktok.com",
    "linkedin.com",
    "amazon.com",
    "reddit.com",
    "discord.com",
    "twitch.tv",
    "spotify.com",
    "github.com",
    // Accounts and payments
    "outlook.com",
    "live.com",
    "paypal.com",
    "banking",
    "bank",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnownSite {
    pub name: &'static str,
    pub url: &'static str,
}

/// Sites that relay reasonably well, offered as suggestions.
pub const COMPATIBLE_EXAMPLES: &[KnownSite] = &[
    KnownSite {
        name: "Wikipedia",
        url: "https://en.wikipedia.org",
    },
    KnownSite {
        name: "BBC News",
        url: "https://www.bbc.com/news",
    },
    KnownSite {
        name: "NPR",
        url: "https://www.npr.org",
    },
    KnownSite {
        name: "The Verge",
        url: "https://www.theverge.com",
    },
    KnownSite {
        name: "Hacker News",
        url: "https://news.ycombinator.com",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityLevel {
    /// Known to refuse embedding; expect a blank page or an error
    Blocked,
    /// Works partially; script-heavy pages may misbehave
    Limited,
    Compatible,
}

impl CompatibilityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompatibilityLevel::Blocked => "blocked",
            CompatibilityLevel::Limited => "limited",
            CompatibilityLevel::Compatible => "compatible",
        }
    }
}

impl std::fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub struct CompatibilityChecker {
    blocked: Vec<String>,
    limited: Vec<String>,
    enabled: bool,
}

impl CompatibilityChecker {
    pub fn new() -> Self {
        Self {
            blocked: BLOCKED_FRAGMENTS.iter().map(|s| s.to_string()).collect(),
            limited: Vec::new(),
            enabled: true,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Add a host fragment to the blocked list
    pub fn block_fragment(&mut self, fragment: &str) {
        let fragment = fragment.trim().to_lowercase();
        if !fragment.is_empty() && !self.blocked.contains(&fragment) {
            self.blocked.push(fragment);
        }
    }

    /// Add a host fragment that is known to work only partially
    pub fn limit_fragment(&mut self, fragment: &str) {
        let fragment = fragment.trim().to_lowercase();
        if !fragment.is_empty() && !self.limited.contains(&fragment) {
            self.limited.push(fragment);
        }
    }

    /// Classify a URL. Unparsable input is reported as compatible; rejecting
    /// it is the relay's job, not the advisory's.
    pub fn check(&self, url: &str) -> CompatibilityLevel {
        if !self.enabled {
            return CompatibilityLevel::Compatible;
        }

        let host = match Url::parse(url) {
            Ok(parsed) => match parsed.host_str() {
                Some(host) => host.to_lowercase(),
                None => return CompatibilityLevel::Compatible,
            },
            Err(_) => return CompatibilityLevel::Compatible,
        };

        if self.blocked.iter().any(|f| host.contains(f.as_str())) {
            tracing::debug!(host = %host, "Host matched compatibility deny-list");
            return CompatibilityLevel::Blocked;
        }

        if self.limited.iter().any(|f| host.contains(f.as_str())) {
            return CompatibilityLevel::Limited;
        }

        CompatibilityLevel::Compatible
    }

    /// Human-readable warning for a level, if one is warranted
    pub fn message(&self, level: CompatibilityLevel, url: &str) -> Option<String> {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| url.to_string());

        match level {
            CompatibilityLevel::Blocked => Some(format!(
                "{} has strict security that prevents proxying. You'll likely see a blank page or error. Try simpler sites like Wikipedia instead.",
                host
            )),
            CompatibilityLevel::Limited => Some(format!(
                "{} relies heavily on scripts and may not display correctly.",
                host
            )),
            CompatibilityLevel::Compatible => None,
        }
    }
}

impl Default for CompatibilityChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_hosts() {
        let checker = CompatibilityChecker::new();

        assert_eq!(
            checker.check("https://www.youtube.com/watch?v=1"),
            CompatibilityLevel::Blocked
        );
        assert_eq!(
            checker.check("https://www.google.co.uk"),
            CompatibilityLevel::Blocked
        );
        assert_eq!(
            checker.check("https://mybank.example"),
            CompatibilityLevel::Blocked
        );
    }

    #[test]
    fn test_compatible_hosts() {
        let checker = CompatibilityChecker::new();

        assert_eq!(
            checker.check("https://en.wikipedia.org"),
            CompatibilityLevel::Compatible
        );
        assert_eq!(checker.check("not a url"), CompatibilityLevel::Compatible);
    }

    #[test]
    fn test_limited_and_disabled() {
        let mut checker = CompatibilityChecker::new();
        checker.limit_fragment("spa.example");
        checker.block_fragment(" Intranet.Example ");
        assert_eq!(
            checker.check("https://wiki.intranet.example/"),
            CompatibilityLevel::Blocked
        );
        assert_eq!(
            checker.check("https://app.spa.example"),
            CompatibilityLevel::Limited
        );

        checker.set_enabled(false);
        assert_eq!(
            checker.check("https://github.com"),
            CompatibilityLevel::Compatible
        );
    }

    #[test]
    fn test_messages() {
        let checker = CompatibilityChecker::new();
        let message = checker
            .message(CompatibilityLevel::Blocked, "https://www.reddit.com/r/rust")
            .unwrap();
        assert!(message.starts_with("www.reddit.com has strict security"));
        assert!(checker
            .message(CompatibilityLevel::Compatible, "https://en.wikipedia.org")
            .is_none());
    }
}
