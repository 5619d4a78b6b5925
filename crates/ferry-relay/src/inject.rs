//! Head injection for relayed documents
//!
//! A relayed page gets three things spliced in right after its opening
//! `<head>`: meta tags that neutralize CSP and frame restrictions, a `<base>`
//! pointing at the target origin, and the interception script below.
//!
//! The script talks to the embedding page with `postMessage`:
//!
//! * `{ type: "proxy-navigate", url, method?, body?, newTab? }` for link
//!   clicks, form submissions and `window.open`
//! * `{ type: "proxy-resource", url, elementId }` to have an image fetched
//!   through the relay, answered by `{ type: "proxy-resource-response",
//!   elementId, content, error? }`

pub const SECURITY_OVERRIDE: &str = concat!(
    r#"<meta http-equiv="Content-Security-Policy" content="default-src * 'unsafe-inline' 'unsafe-eval' data: blob:;">"#,
    "\n",
    r#"<meta http-equiv="X-Frame-Options" content="ALLOWALL">"#,
);

/// Delays after load at which images are scanned again, for lazy content
pub const RESOURCE_RETRY_DELAYS_MS: [u64; 2] = [1000, 3000];

const BASE_PLACEHOLDER: &str = "__FERRY_BASE_URL__";
const PAGE_PLACEHOLDER: &str = "__FERRY_PAGE_URL__";
const RETRY_PLACEHOLDER: &str = "__FERRY_RETRY_DELAYS__";

// Must not contain anything the attribute rewriter matches (root-relative
// href/src, `url(` followed by a path), or injecting twice would change it.
const SCRIPT_TEMPLATE: &str = r#"<script>
(function () {
  var BASE_URL = __FERRY_BASE_URL__;
  var PAGE_URL = __FERRY_PAGE_URL__;
  var RETRY_DELAYS = __FERRY_RETRY_DELAYS__;
  var pending = new Map();
  var counter = 0;

  function post(message) {
    window.parent.postMessage(message, '*');
  }

  function absolute(raw) {
    if (!raw) return null;
    if (raw.indexOf('//') === 0) return 'https:' + raw;
    if (raw.charAt(0) === '/') return BASE_URL + raw;
    try {
      return new URL(raw, PAGE_URL).href;
    } catch (err) {
      return null;
    }
  }

  function skippable(raw) {
    return !raw || raw.indexOf('data:') === 0 || raw.indexOf('blob:') === 0 || raw.indexOf('javascript:') === 0;
  }

  function requestResource(raw, callback) {
    var url = absolute(raw);
    if (!url) {
      callback(null, 'unresolvable');
      return;
    }
    counter += 1;
    var elementId = 'ferry-' + counter + '-' + Math.random().toString(36).slice(2, 9);
    pending.set(elementId, callback);
    post({ type: 'proxy-resource', url: url, elementId: elementId });
  }

  window.addEventListener('message', function (event) {
    if (event.source !== window.parent) return;
    var data = event.data;
    if (!data || data.type !== 'proxy-resource-response' || typeof data.elementId !== 'string') return;
    var callback = pending.get(data.elementId);
    if (!callback) return;
    pending.delete(data.elementId);
    callback(data.content, data.error);
  });

  function relayImage(img) {
    if (img.dataset.ferryState) return;
    var original = img.getAttribute('src') || img.getAttribute('data-src');
    if (skippable(original)) return;

    img.dataset.ferryState = 'pending';
    img.removeAttribute('src');
    img.removeAttribute('srcset');
    img.style.opacity = '0.5';

    requestResource(original, function (content, error) {
      if (content && !error) {
        img.src = content;
        img.dataset.ferryState = 'loaded';
      } else {
        img.src = absolute(original) || original;
        img.dataset.ferryState = 'failed';
      }
      img.style.opacity = '';
    });
  }

  function relayImages(root) {
    if (root.tagName === 'IMG') relayImage(root);
    if (root.querySelectorAll) root.querySelectorAll('img').forEach(relayImage);
  }

  var BACKGROUND = new RegExp('url\\(\\s*[\'"]?([^\'")]+)[\'"]?\\s*\\)');

  function relayBackgrounds() {
    document.querySelectorAll('[style*="background"]').forEach(function (el) {
      if (el.dataset.ferryBackground) return;
      var style = el.getAttribute('style') || '';
      var match = style.match(BACKGROUND);
      if (!match || skippable(match[1])) return;

      el.dataset.ferryBackground = 'pending';
      requestResource(match[1], function (content, error) {
        if (content && !error) {
          el.setAttribute('style', style.replace(match[0], 'url("' + content + '")'));
          el.dataset.ferryBackground = 'loaded';
        } else {
          el.dataset.ferryBackground = 'failed';
        }
      });
    });
  }

  function scan() {
    relayImages(document);
    relayBackgrounds();
  }

  new MutationObserver(function (mutations) {
    mutations.forEach(function (mutation) {
      mutation.addedNodes.forEach(function (node) {
        if (node.nodeType === 1) relayImages(node);
      });
    });
  }).observe(document.documentElement, { childList: true, subtree: true });

  if (document.readyState === 'loading') {
    document.addEventListener('DOMContentLoaded', scan);
  } else {
    scan();
  }
  RETRY_DELAYS.forEach(function (delay) {
    setTimeout(scan, delay);
  });

  document.addEventListener('click', function (event) {
    var link = event.target && event.target.closest ? event.target.closest('a') : null;
    if (!link) return;
    var raw = link.getAttribute('href');
    if (!raw || raw.charAt(0) === '#' || raw.indexOf('javascript:') === 0) return;
    var url = link.href || absolute(raw);
    if (!url) return;
    event.preventDefault();
    event.stopPropagation();
    post({ type: 'proxy-navigate', url: url });
  }, true);

  document.addEventListener('submit', function (event) {
    var form = event.target;
    if (!form || form.tagName !== 'FORM') return;
    event.preventDefault();
    event.stopPropagation();

    var params = new URLSearchParams();
    new FormData(form).forEach(function (value, key) {
      if (typeof value === 'string') params.append(key, value);
    });
    var action = form.action || PAGE_URL;
    var method = (form.getAttribute('method') || 'get').toLowerCase();

    if (method === 'post') {
      post({ type: 'proxy-navigate', url: action, method: 'POST', body: params.toString() });
    } else {
      var query = params.toString();
      var url = query ? action + (action.indexOf('?') === -1 ? '?' : '&') + query : action;
      post({ type: 'proxy-navigate', url: url, method: 'GET' });
    }
  }, true);

  window.open = function (target) {
    var raw = target ? String(target) : '';
    if (raw && raw.indexOf('javascript:') !== 0) {
      var url = absolute(raw);
      if (url) post({ type: 'proxy-navigate', url: url, newTab: true });
    }
    return null;
  };
})();
</script>"#;

/// JSON string literal safe to embed inside a `<script>` element
fn script_string(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace("</", "<\\/")
}

/// The interception script for a document served from `page_url`, whose
/// root-relative references resolve against `base_url`.
pub fn injection_script(base_url: &str, page_url: &str) -> String {
    let delays = RESOURCE_RETRY_DELAYS_MS
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    SCRIPT_TEMPLATE
        .replace(BASE_PLACEHOLDER, &script_string(base_url))
        .replace(PAGE_PLACEHOLDER, &script_string(page_url))
        .replace(RETRY_PLACEHOLDER, &format!("[{}]", delays))
}

/// Splice the override tags, `<base>` and script after the first `<head>`
/// (tried as `<head>`, then `<HEAD>`), or prepend them when neither exists.
pub fn inject_into_head(html: &str, base_url: &str, page_url: &str) -> String {
    let fragment = format!(
        "\n{}\n<base href=\"{}/\">\n{}",
        SECURITY_OVERRIDE,
        base_url,
        injection_script(base_url, page_url)
    );

    for tag in ["<head>", "<HEAD>"] {
        if let Some(pos) = html.find(tag) {
            let split = pos + tag.len();
            let mut out = String::with_capacity(html.len() + fragment.len());
            out.push_str(&html[..split]);
            out.push_str(&fragment);
            out.push_str(&html[split..]);
            return out;
        }
    }

    tracing::debug!("No <head> tag found; prepending injection");
    format!("{}\n{}", fragment.trim_start(), html)
}
