//! Ferry configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::Result;

const ENV_BIND: &str = "FERRY_BIND";
const ENV_RELAY_ENDPOINT: &str = "FERRY_RELAY_ENDPOINT";
const ENV_DATABASE: &str = "FERRY_DATABASE";
const ENV_HISTORY_LIMIT: &str = "FERRY_HISTORY_LIMIT";
const ENV_UPSTREAM_TIMEOUT: &str = "FERRY_UPSTREAM_TIMEOUT";
const ENV_BLOCKED_HOSTS: &str = "FERRY_BLOCKED_HOSTS";
const ENV_LIMITED_HOSTS: &str = "FERRY_LIMITED_HOSTS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Relay endpoint the client posts to
    pub relay_endpoint: String,
    /// Address the relay server listens on
    pub bind_address: String,
    /// Visit history cap
    pub history_limit: usize,
    /// Upstream fetch timeout; `None` leaves it to the HTTP client
    pub upstream_timeout_secs: Option<u64>,
    /// Consult the compatibility advisory before visiting
    pub compatibility_checks: bool,
    /// Host fragments refused on top of the built-in deny-list
    #[serde(default)]
    pub blocked_hosts: Vec<String>,
    /// Host fragments that only work partially; visits go ahead with a warning
    #[serde(default)]
    pub limited_hosts: Vec<String>,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("ferry.db"),
            relay_endpoint: "http://127.0.0.1:8787/".to_string(),
            bind_address: "127.0.0.1:8787".to_string(),
            history_limit: ferry_navigation::DEFAULT_HISTORY_LIMIT,
            upstream_timeout_secs: None,
            compatibility_checks: true,
            blocked_hosts: Vec::new(),
            limited_hosts: Vec::new(),
        }
    }

    /// Defaults overlaid with `FERRY_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(ENV_BIND) {
            self.bind_address = bind;
        }
        if let Some(endpoint) = lookup(ENV_RELAY_ENDPOINT) {
            url::Url::parse(&endpoint).map_err(|e| {
                CoreError::Config(format!("{} is not a URL: {}", ENV_RELAY_ENDPOINT, e))
            })?;
            self.relay_endpoint = endpoint;
        }
        if let Some(path) = lookup(ENV_DATABASE) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(limit) = lookup(ENV_HISTORY_LIMIT) {
            self.history_limit = match limit.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    return Err(CoreError::Config(format!(
                        "{} must be a positive integer",
                        ENV_HISTORY_LIMIT
                    )))
                }
            };
        }
        if let Some(secs) = lookup(ENV_UPSTREAM_TIMEOUT) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                CoreError::Config(format!("{} must be a number of seconds", ENV_UPSTREAM_TIMEOUT))
            })?;
            // 0 means no explicit timeout
            self.upstream_timeout_secs = (secs > 0).then_some(secs);
        }
        if let Some(hosts) = lookup(ENV_BLOCKED_HOSTS) {
            self.blocked_hosts = host_list(&hosts);
        }
        if let Some(hosts) = lookup(ENV_LIMITED_HOSTS) {
            self.limited_hosts = host_list(&hosts);
        }
        Ok(())
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_secs.map(Duration::from_secs)
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Ferry"))
            .unwrap_or_else(|| PathBuf::from(".ferry"))
    }
}

/// Comma-separated host fragments, blanks dropped
fn host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overlay(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = Config::new(PathBuf::from("/tmp/ferry-test"));
        config.apply_overrides(|key| vars.get(key).cloned())?;
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let config = Config::new(PathBuf::from("/data"));
        assert_eq!(config.database_path, PathBuf::from("/data/ferry.db"));
        assert_eq!(config.bind_address, "127.0.0.1:8787");
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.upstream_timeout(), None);
        assert!(config.compatibility_checks);
    }

    #[test]
    fn test_env_overrides() {
        let config = overlay(&[
            ("FERRY_BIND", "0.0.0.0:9000"),
            ("FERRY_RELAY_ENDPOINT", "https://relay.example/proxy"),
            ("FERRY_HISTORY_LIMIT", "10"),
            ("FERRY_UPSTREAM_TIMEOUT", "30"),
            ("FERRY_LIMITED_HOSTS", " spa.example, ,maps.example "),
        ])
        .unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.relay_endpoint, "https://relay.example/proxy");
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.upstream_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.limited_hosts, vec!["spa.example", "maps.example"]);
        assert!(config.blocked_hosts.is_empty());

        let config = overlay(&[("FERRY_UPSTREAM_TIMEOUT", "0")]).unwrap();
        assert_eq!(config.upstream_timeout_secs, None);
    }

    #[test]
    fn test_bad_env_values() {
        assert!(matches!(
            overlay(&[("FERRY_HISTORY_LIMIT", "lots")]),
            Err(CoreError::Config(_))
        ));
        assert!(matches!(
            overlay(&[("FERRY_HISTORY_LIMIT", "0")]),
            Err(CoreError::Config(_))
        ));
        assert!(overlay(&[("FERRY_RELAY_ENDPOINT", "not a url")]).is_err());
    }
}
