//! Stylesheet `url(...)` rewriting

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::html::rewrite_root_relative_css_urls;

static ANY_CSS_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"url\((?P<open>['"]?)(?P<path>[^)'"]+)(?P<close>['"]?)\)"#)
        .expect("valid css url regex")
});

/// References that already resolve on their own
fn is_self_contained(path: &str) -> bool {
    path.starts_with("data:")
        || path.starts_with("http:")
        || path.starts_with("https:")
        || path.starts_with("//")
}

/// Rewrite a stylesheet so every `url(...)` resolves against `base_url`.
///
/// Root-relative references go first; the general relative rule would
/// otherwise prefix them a second time.
pub fn rewrite_css_urls(css: &str, base_url: &str) -> String {
    let css = rewrite_root_relative_css_urls(css, base_url);

    ANY_CSS_URL
        .replace_all(&css, |caps: &Captures| {
            let (open, path, close) = (&caps["open"], &caps["path"], &caps["close"]);
            if open != close || is_self_contained(path) {
                return caps[0].to_string();
            }
            format!("url({}{}/{}{})", open, base_url, path, close)
        })
        .into_owned()
}
