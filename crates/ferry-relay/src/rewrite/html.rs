//! HTML attribute rewriting
//!
//! Pattern substitution over raw markup, not a DOM parse. Each rule only
//! matches root-relative (`/x`) or protocol-relative (`//x`) references, so
//! output that is already absolute passes through untouched and running the
//! rewrite twice is a no-op.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// `attr="/path"` / `attr='/path'` where the path starts with exactly one slash.
fn root_relative_attr(attrs: &str) -> Regex {
    Regex::new(&format!(
        r#"(?P<attr>{})=(?:"(?P<dq>/(?:[^/"][^"]*)?)"|'(?P<sq>/(?:[^/'][^']*)?)')"#,
        attrs
    ))
    .expect("valid root-relative attribute regex")
}

static HREF_SRC: Lazy<Regex> = Lazy::new(|| root_relative_attr("href|src"));
static FORM_ACTION: Lazy<Regex> = Lazy::new(|| root_relative_attr("action"));
static DATA_SRC_POSTER: Lazy<Regex> = Lazy::new(|| root_relative_attr("data-src|poster"));

static PROTOCOL_RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?P<attr>href|src)=(?:"//(?P<dq>[^"]*)"|'//(?P<sq>[^']*)')"#)
        .expect("valid protocol-relative regex")
});

static SRCSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"srcset=(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#).expect("valid srcset regex")
});

static SRCSET_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<lead>^|[\s,])(?P<path>/[^/\s,][^\s,]*)").expect("valid srcset path regex")
});

pub(crate) static ROOT_RELATIVE_CSS_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"url\((?P<open>['"]?)(?P<path>/(?:[^/)'"][^)'"]*)?)(?P<close>['"]?)\)"#)
        .expect("valid css url regex")
});

static TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").expect("valid title regex")
});

/// Quote character and inner value of a `dq`/`sq` alternation match
fn quoted<'h>(caps: &Captures<'h>) -> (char, &'h str) {
    match caps.name("dq") {
        Some(m) => ('"', m.as_str()),
        None => ('\'', caps.name("sq").map_or("", |m| m.as_str())),
    }
}

fn prefix_root_relative(html: &str, re: &Regex, base_url: &str) -> String {
    re.replace_all(html, |caps: &Captures| {
        let (quote, path) = quoted(caps);
        format!("{}={}{}{}{}", &caps["attr"], quote, base_url, path, quote)
    })
    .into_owned()
}

fn rewrite_protocol_relative(html: &str) -> String {
    PROTOCOL_RELATIVE
        .replace_all(html, |caps: &Captures| {
            let (quote, rest) = quoted(caps);
            format!("{}={}https://{}{}", &caps["attr"], quote, rest, quote)
        })
        .into_owned()
}

fn rewrite_srcset(html: &str, base_url: &str) -> String {
    SRCSET
        .replace_all(html, |caps: &Captures| {
            let (quote, list) = quoted(caps);
            let rewritten = SRCSET_PATH.replace_all(list, |inner: &Captures| {
                format!("{}{}{}", &inner["lead"], base_url, &inner["path"])
            });
            format!("srcset={}{}{}", quote, rewritten, quote)
        })
        .into_owned()
}

/// Rewrite root-relative `url(...)` references. Mismatched quotes are left alone.
pub(crate) fn rewrite_root_relative_css_urls(text: &str, base_url: &str) -> String {
    ROOT_RELATIVE_CSS_URL
        .replace_all(text, |caps: &Captures| {
            let (open, close) = (&caps["open"], &caps["close"]);
            if open != close {
                return caps[0].to_string();
            }
            format!("url({}{}{}{})", open, base_url, &caps["path"], close)
        })
        .into_owned()
}

/// Point every root-relative and protocol-relative reference at the target
/// origin. Rules run in a fixed order: href/src, protocol-relative, srcset,
/// inline `url(...)`, form actions, then `data-src`/`poster`.
pub fn rewrite_html_urls(html: &str, base_url: &str) -> String {
    let html = prefix_root_relative(html, &HREF_SRC, base_url);
    let html = rewrite_protocol_relative(&html);
    let html = rewrite_srcset(&html, base_url);
    let html = rewrite_root_relative_css_urls(&html, base_url);
    let html = prefix_root_relative(&html, &FORM_ACTION, base_url);
    prefix_root_relative(&html, &DATA_SRC_POSTER, base_url)
}

/// Text of the first `<title>`, trimmed; empty when there is none.
pub fn extract_title(html: &str) -> String {
    TITLE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
