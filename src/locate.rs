//! Element lookup with explicit fallback chains.
//!
//! The application under test renders the same control differently across
//! deployments, so every page object addresses elements through an ordered
//! list of [`Strategy`] values tried in priority order. A chain that finds
//! nothing returns [`Lookup::NotFound`]; missing elements are a value, not an
//! exception, and only the caller decides whether that is fatal.

use eoka::Page;
use tracing::debug;

use crate::{Error, Result};

/// One way of addressing an element.
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    /// A CSS selector; matches only if the element exists and is visible.
    Css(&'static str),
    /// Visible-text search over clickable elements (case-insensitive contains).
    Text(&'static str),
}

/// Outcome of resolving a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A concrete CSS selector for the matched element.
    Found(String),
    NotFound,
}

impl Lookup {
    /// Unwrap the selector or fail with the given context.
    pub fn or_fail(self, what: &str) -> Result<String> {
        match self {
            Lookup::Found(sel) => Ok(sel),
            Lookup::NotFound => Err(Error::AssertionFailed(format!("{what} not found"))),
        }
    }
}

/// Walks the DOM for a clickable element whose text contains the needle and
/// returns a CSS path for it. Adapted to also match menu items, checkboxes
/// and plain divs, which the chat UI uses for most of its controls.
const FIND_BY_TEXT_JS: &str = r#"(() => {
    const needle = __fw_needle.toLowerCase();
    const CLICKABLE = 'a, button, div, span, input, select, [role="button"], [role="menuitem"], [role="checkbox"], [onclick]';
    const path_of = (el) => {
        if (el.id) return '#' + CSS.escape(el.id);
        const parts = [];
        let node = el;
        while (node && node !== document.body) {
            let s = node.tagName.toLowerCase();
            if (node.id) {
                parts.unshift('#' + CSS.escape(node.id));
                break;
            }
            const parent = node.parentElement;
            if (parent) {
                const siblings = Array.from(parent.children).filter(c => c.tagName === node.tagName);
                if (siblings.length > 1) s += ':nth-of-type(' + (siblings.indexOf(node) + 1) + ')';
            }
            parts.unshift(s);
            node = parent;
        }
        return parts.join(' > ');
    };
    const walker = document.createTreeWalker(document.body, NodeFilter.SHOW_ELEMENT, null);
    let best = null;
    while (walker.nextNode()) {
        const el = walker.currentNode;
        if (!el.matches(CLICKABLE)) continue;
        const text = (el.textContent || '').trim().toLowerCase();
        if (!text.includes(needle)) continue;
        const rect = el.getBoundingClientRect();
        if (rect.width < 2 || rect.height < 2) continue;
        // Prefer the innermost (shortest-text) match so we click the control,
        // not a page-sized container that happens to contain the phrase.
        if (!best || text.length < best.len) best = { sel: path_of(el), len: text.length };
    }
    return best ? best.sel : null;
})()"#;

const VISIBLE_JS: &str = r#"(() => {
    const el = document.querySelector(__fw_sel);
    if (!el) return false;
    const rect = el.getBoundingClientRect();
    if (rect.width < 2 || rect.height < 2) return false;
    const style = getComputedStyle(el);
    return style.display !== 'none' && style.visibility !== 'hidden';
})()"#;

pub(crate) fn js_str(s: &str) -> String {
    // Infallible for &str input.
    serde_json::to_string(s).unwrap()
}

/// Try each strategy in order; first hit wins.
pub async fn resolve_first(page: &Page, strategies: &[Strategy]) -> Result<Lookup> {
    for strategy in strategies {
        match strategy {
            Strategy::Css(sel) => {
                if is_visible(page, sel).await? {
                    debug!("resolved via css: {}", sel);
                    return Ok(Lookup::Found((*sel).to_string()));
                }
            }
            Strategy::Text(needle) => {
                if let Some(sel) = find_by_text(page, needle).await? {
                    debug!("resolved via text '{}': {}", needle, sel);
                    return Ok(Lookup::Found(sel));
                }
            }
        }
    }
    Ok(Lookup::NotFound)
}

/// Find a clickable element by visible text. Returns a CSS selector for it.
pub async fn find_by_text(page: &Page, needle: &str) -> Result<Option<String>> {
    let js = format!("var __fw_needle = {}; {}", js_str(needle), FIND_BY_TEXT_JS);
    Ok(page.evaluate(&js).await?)
}

/// Whether any element matches the selector.
pub async fn exists(page: &Page, selector: &str) -> Result<bool> {
    let js = format!("!!document.querySelector({})", js_str(selector));
    Ok(page.evaluate(&js).await?)
}

/// Whether the first match is rendered and visible.
pub async fn is_visible(page: &Page, selector: &str) -> Result<bool> {
    let js = format!("var __fw_sel = {}; {}", js_str(selector), VISIBLE_JS);
    Ok(page.evaluate(&js).await?)
}

/// Read an attribute off the first match.
pub async fn attr(page: &Page, selector: &str, name: &str) -> Result<Option<String>> {
    let js = format!(
        "document.querySelector({})?.getAttribute({}) ?? null",
        js_str(selector),
        js_str(name)
    );
    Ok(page.evaluate(&js).await?)
}

/// Trimmed `textContent` of the first match, empty string if absent.
pub async fn text_of(page: &Page, selector: &str) -> Result<String> {
    let js = format!(
        "(document.querySelector({})?.textContent ?? '').trim()",
        js_str(selector)
    );
    Ok(page.evaluate(&js).await?)
}

/// Count matches for a selector.
pub async fn count(page: &Page, selector: &str) -> Result<u32> {
    let js = format!("document.querySelectorAll({}).length", js_str(selector));
    Ok(page.evaluate(&js).await?)
}

/// Whether the page text currently contains the needle.
pub async fn page_has_text(page: &Page, needle: &str) -> Result<bool> {
    let text = page.text().await?;
    Ok(text.contains(needle))
}

/// Poll until the given text is no longer present on the page.
///
/// The complement of `Page::wait_for_text`, used for transient markers such
/// as the "Thinking..." indicator. Absence at the first poll counts as gone.
pub async fn wait_for_text_gone(page: &Page, needle: &str, timeout_ms: u64) -> Result<()> {
    let deadline = std::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);
    loop {
        if !page_has_text(page, needle).await? {
            return Ok(());
        }
        if std::time::Instant::now() >= deadline {
            return Err(Error::Timeout(format!(
                "'{}' still on page after {}ms",
                needle, timeout_ms
            )));
        }
        page.wait(500).await;
    }
}
