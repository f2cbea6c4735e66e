//! The main chat page: module selection, message send, response verification.

use eoka::Page;
use tracing::{debug, info, warn};

use crate::config::{Settings, TimeoutClass};
use crate::locate::{self, js_str, Strategy};
use crate::matcher;
use crate::{Error, Result};

const MODULE_DROPDOWN: &[Strategy] = &[
    Strategy::Css("button[data-testid=\"module-selector\"]"),
    Strategy::Css("button[aria-haspopup=\"menu\"]"),
    Strategy::Css("button[aria-haspopup=\"listbox\"]"),
];

const MESSAGE_INPUT: &[Strategy] = &[
    Strategy::Css("textarea[placeholder=\"Send a message...\"]"),
    Strategy::Css("textarea[placeholder=\"Ask anything\"]"),
    Strategy::Css("textarea"),
];

/// Containers the assistant response may render under, tried in order. The
/// data-role attribute is the stable one; the class selectors cover deployments
/// that render bare message bubbles.
const RESPONSE_CONTAINERS: &[&str] = &[
    "[data-role=\"assistant\"]",
    "div[class*=\"assistant\"]",
    "div[class*=\"message\"], div[class*=\"response\"]",
];

/// Build the extraction script: last element of the first container chain
/// entry with matches, text joined from its h1/h2/p/li children.
fn response_script() -> String {
    format!(
        r#"(function() {{
            var chains = {chains};
            for (var c = 0; c < chains.length; c++) {{
                var messages = document.querySelectorAll(chains[c]);
                if (messages.length === 0) continue;
                var last = messages[messages.length - 1];
                var parts = [];
                last.querySelectorAll('h1, h2, p, li').forEach(function(el) {{
                    var t = el.innerText.trim();
                    if (t) parts.push(t);
                }});
                var text = parts.length ? parts.join('\n') : last.innerText.trim();
                if (text) return text;
            }}
            return "";
        }})()"#,
        chains = serde_json::to_string(RESPONSE_CONTAINERS).unwrap()
    )
}

/// How many times to page down through a long module menu before giving up.
const MENU_PAGE_LIMIT: u32 = 12;

/// Interval between response-completeness polls.
const STREAM_POLL_MS: u64 = 2_000;
const STREAM_POLL_ROUNDS: u32 = 10;

pub struct ChatPage<'a> {
    page: &'a Page,
    settings: &'a Settings,
}

impl<'a> ChatPage<'a> {
    pub fn new(page: &'a Page, settings: &'a Settings) -> Self {
        Self { page, settings }
    }

    pub fn page(&self) -> &Page {
        self.page
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    /// Open the module dropdown and pick an entry by visible name.
    ///
    /// The menu virtualizes long lists, so entries further down only render
    /// after paging; PageDown is sent until the entry shows up.
    pub async fn select_module(&self, name: &str) -> Result<()> {
        info!("Selecting module: {}", name);
        let dropdown = locate::resolve_first(self.page, MODULE_DROPDOWN)
            .await?
            .or_fail("module dropdown")?;
        self.page.click(&dropdown).await?;
        self.page.wait(500).await;

        for round in 0..MENU_PAGE_LIMIT {
            if let Some(selector) = locate::find_by_text(self.page, name).await? {
                debug!("Module entry found after {} pages", round);
                self.page.click(&selector).await?;
                self.page.wait(1_000).await;
                return Ok(());
            }
            self.page.human().press_key("PageDown").await?;
            self.page.wait(300).await;
        }

        self.debug_screenshot("module-select").await;
        Err(Error::AssertionFailed(format!(
            "module '{}' not found in dropdown",
            name
        )))
    }

    /// Type a message into the chat input and submit it.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        info!("Sending message: {}", text);
        let input = locate::resolve_first(self.page, MESSAGE_INPUT)
            .await?
            .or_fail("message input")?;
        self.page.human_fill(&input, text).await?;

        // The send button carries no stable attributes; it is the last
        // button inside the input's form container.
        let click_send = format!(
            r#"(function() {{
                var input = document.querySelector({sel});
                if (!input) return false;
                var container = input.closest('form') || input.parentElement;
                while (container && !container.querySelector('button')) {{
                    container = container.parentElement;
                }}
                if (!container) return false;
                var buttons = container.querySelectorAll('button');
                if (buttons.length === 0) return false;
                buttons[buttons.length - 1].click();
                return true;
            }})()"#,
            sel = js_str(&input)
        );
        let clicked: bool = self.page.evaluate(&click_send).await?;
        if !clicked {
            return Err(Error::AssertionFailed("send button not found".into()));
        }
        self.page.wait(3_000).await;
        Ok(())
    }

    /// Collect the visible text of the latest assistant message, trying each
    /// response container in priority order.
    pub async fn assistant_text(&self) -> Result<String> {
        let text: String = self.page.evaluate(&response_script()).await?;
        Ok(text)
    }

    /// Wait for the assistant's answer and check it loosely matches the
    /// expectation. Matching passes when any word of `expected` appears in
    /// the response.
    pub async fn verify_assistant_response(&self, expected: &str, retries: u32) -> Result<()> {
        let attempts = retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            debug!("Verifying response (attempt {}/{})", attempt, attempts);

            // A thinking indicator that never clears means the page is
            // wedged; the attempt fails so a retry can reset it.
            if let Err(e) = self.wait_for_thinking_done().await {
                warn!(
                    "Thinking indicator stuck (attempt {}/{}): {}",
                    attempt, attempts, e
                );
                last_error = Some(e);
                self.page.wait(2_000).await;
                continue;
            }

            let mut text = String::new();
            for _ in 0..STREAM_POLL_ROUNDS {
                text = self.assistant_text().await?;
                if !matcher::is_still_streaming(&text) {
                    break;
                }
                self.page.wait(STREAM_POLL_MS).await;
            }

            if matcher::word_subset_matches(expected, &text) {
                info!("Response matched expectation");
                return Ok(());
            }
            warn!(
                "Response did not match (attempt {}/{}), waiting before retry",
                attempt, attempts
            );
            last_error = Some(Error::AssertionFailed(format!(
                "expected words from '{}' in assistant response, got: {}",
                expected, text
            )));
            self.page.wait(2_000).await;
        }

        self.debug_screenshot("verify-response").await;
        Err(last_error
            .unwrap_or_else(|| Error::AssertionFailed("response never verified".into())))
    }

    /// Wait out the visible thinking indicator. A missing indicator is not an
    /// error; some modules answer without one. An indicator that outlives the
    /// wait is.
    async fn wait_for_thinking_done(&self) -> Result<()> {
        // Three default-timeout units: 30s with stock settings.
        let timeout = 3 * self.settings.timeouts.get(TimeoutClass::Default);
        for marker in ["Thinking", "Resolving context"] {
            locate::wait_for_text_gone(self.page, marker, timeout).await?;
        }
        self.page.wait(1_000).await;
        Ok(())
    }

    /// Toggle a labelled workspace checkbox to the wanted state.
    pub async fn set_workspace_checked(&self, label: &str, want: bool) -> Result<()> {
        let timeout = self.settings.timeouts.get(TimeoutClass::Short);
        self.page.wait_for_text(label, timeout).await?;

        let js = format!(
            r#"(function() {{
                var needle = {label};
                var boxes = document.querySelectorAll('button[role="checkbox"]');
                for (var i = 0; i < boxes.length; i++) {{
                    var row = boxes[i].closest('[role="row"]') || boxes[i].parentElement;
                    if (row && row.innerText.includes(needle)) {{
                        var checked = boxes[i].getAttribute('aria-checked') === 'true'
                            || boxes[i].getAttribute('data-state') === 'checked';
                        if (checked !== {want}) boxes[i].click();
                        return true;
                    }}
                }}
                return false;
            }})()"#,
            label = js_str(label),
            want = want
        );
        let found: bool = self.page.evaluate(&js).await?;
        if !found {
            return Err(Error::AssertionFailed(format!(
                "workspace checkbox '{}' not found",
                label
            )));
        }
        self.page.wait(500).await;
        Ok(())
    }

    pub(crate) async fn debug_screenshot(&self, tag: &str) {
        let path = format!(
            "failure-{}-{}.png",
            tag,
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        );
        match self.page.screenshot().await {
            Ok(data) => {
                if let Err(e) = std::fs::write(&path, data) {
                    warn!("Failed to save screenshot: {}", e);
                }
            }
            Err(e) => warn!("Failed to capture screenshot: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_script_tries_every_container() {
        let script = response_script();
        for selector in RESPONSE_CONTAINERS {
            let escaped = serde_json::to_string(selector).unwrap();
            assert!(
                script.contains(&escaped),
                "selector {} missing from response script",
                selector
            );
        }
        assert!(script.contains("continue"));
    }

    #[test]
    fn test_response_containers_lead_with_data_role() {
        assert_eq!(RESPONSE_CONTAINERS[0], "[data-role=\"assistant\"]");
        assert!(RESPONSE_CONTAINERS.len() > 1);
    }
}
