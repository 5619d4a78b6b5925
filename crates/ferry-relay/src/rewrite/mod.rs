//! Content rewriting, branched on `(mode, content type)`
//!
//! Nothing in here fails: patterns that do not match leave the text alone,
//! and an unexpected content type falls through to the raw body.

pub mod css;
pub mod encode;
pub mod html;

pub use css::rewrite_css_urls;
pub use encode::to_data_uri;
pub use html::{extract_title, rewrite_html_urls};

use crate::envelope::{Mode, RelayResponse};
use crate::fetch::UpstreamResponse;
use crate::inject::inject_into_head;
use crate::resolver::base_url;

const DEFAULT_RESOURCE_TYPE: &str = "application/octet-stream";

/// Turn a fetched response into the success envelope
pub fn render(mode: Mode, upstream: UpstreamResponse) -> RelayResponse {
    match mode {
        Mode::Resource => render_resource(upstream),
        Mode::Page => render_page(upstream),
    }
}

fn render_resource(upstream: UpstreamResponse) -> RelayResponse {
    let content_type = upstream
        .content_type
        .clone()
        .unwrap_or_else(|| DEFAULT_RESOURCE_TYPE.to_string());

    let content = if content_type.starts_with("image/") {
        to_data_uri(&content_type, &upstream.body)
    } else if content_type.contains("text/css") {
        rewrite_css_urls(&upstream.text(), &base_url(&upstream.final_url))
    } else {
        upstream.text()
    };

    RelayResponse {
        content,
        content_type,
        url: upstream.final_url.to_string(),
        title: None,
        base_url: None,
        status: Some(upstream.status),
    }
}

fn render_page(upstream: UpstreamResponse) -> RelayResponse {
    let content_type = upstream.content_type.clone().unwrap_or_default();

    if !content_type.contains("text/html") {
        return RelayResponse {
            content: upstream.text(),
            content_type,
            url: upstream.final_url.to_string(),
            title: None,
            base_url: None,
            status: Some(upstream.status),
        };
    }

    let base = base_url(&upstream.final_url);
    let page_url = upstream.final_url.to_string();

    let html = rewrite_html_urls(&upstream.text(), &base);
    let title = extract_title(&html);
    let content = inject_into_head(&html, &base, &page_url);

    RelayResponse {
        content,
        content_type: "text/html".to_string(),
        url: page_url,
        title: Some(title),
        base_url: Some(base),
        status: Some(upstream.status),
    }
}
