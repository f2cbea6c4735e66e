//! Tool-validation page: enabling agent tools, verifying they fire, and
//! auditing the workspace context checkboxes.

use base64::Engine;
use eoka::Page;
use tracing::{debug, info, warn};

use crate::config::{Settings, TimeoutClass};
use crate::locate::{self, js_str};
use crate::pages::ChatPage;
use crate::retry::{RetryPolicy, RetryState, Step};
use crate::{Error, Result};

/// Agent tools the chat can invoke, keyed by the label the UI reports after
/// a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    WebSearch,
    DeepResearch,
    RelevantContent,
    ClickupTask,
    AutoReasoning,
    GmailSearch,
    NanoBanana,
}

impl Tool {
    /// The identifier shown in the "Tool used:" line.
    pub fn label(&self) -> &'static str {
        match self {
            Self::WebSearch => "webSearchExa",
            Self::DeepResearch => "deepResearch",
            Self::RelevantContent => "findRelevantContent",
            Self::ClickupTask => "getClickupTask",
            Self::AutoReasoning => "autoReasoningTool",
            Self::GmailSearch => "gmailSearchTool",
            // The label carries the app's own spelling.
            Self::NanoBanana => "nanoBannanaStream",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub struct ToolValidationPage<'a> {
    chat: ChatPage<'a>,
}

impl<'a> ToolValidationPage<'a> {
    pub fn new(page: &'a Page, settings: &'a Settings) -> Self {
        Self {
            chat: ChatPage::new(page, settings),
        }
    }

    pub fn chat(&self) -> &ChatPage<'a> {
        &self.chat
    }

    fn page(&self) -> &Page {
        self.chat.page()
    }

    fn settings(&self) -> &Settings {
        self.chat.settings()
    }

    /// Open the settings popover next to the chat input.
    ///
    /// The trigger button has no stable attributes of its own; it sits in the
    /// same container as the hidden file input and carries the popover's
    /// closed-state marker.
    pub async fn open_settings_menu(&self) -> Result<()> {
        let js = r#"(function() {
            var input = document.querySelector('#file-input');
            if (!input || !input.parentElement) return false;
            var button = input.parentElement.querySelector('button[data-state="closed"]');
            if (!button) return false;
            button.click();
            return true;
        })()"#;
        let opened: bool = self.page().evaluate(js).await?;
        if !opened {
            return Err(Error::AssertionFailed("settings menu trigger not found".into()));
        }
        self.page().wait(500).await;
        Ok(())
    }

    /// Turn a tool on through the settings menu. Tools without a menu entry
    /// are always on and need no setup.
    pub async fn enable(&self, tool: Tool) -> Result<()> {
        // Gmail is wired through a workspace checkbox, not the settings menu.
        if tool == Tool::GmailSearch {
            info!("Enabling tool: {}", tool);
            return self.chat.set_workspace_checked("Gmail", true).await;
        }

        let entry = match tool {
            Tool::WebSearch => Some(("More", Some("Web Search"))),
            Tool::DeepResearch => Some(("Deep Research", None)),
            Tool::AutoReasoning => Some(("CU Direct Ingestion", None)),
            Tool::RelevantContent | Tool::ClickupTask | Tool::NanoBanana | Tool::GmailSearch => {
                None
            }
        };
        let Some((first, second)) = entry else {
            debug!("{} needs no explicit enabling", tool);
            return Ok(());
        };

        info!("Enabling tool: {}", tool);
        self.open_settings_menu().await?;
        self.click_menu_entry(first).await?;
        if let Some(second) = second {
            self.click_menu_entry(second).await?;
        }
        self.page().wait(500).await;
        Ok(())
    }

    async fn click_menu_entry(&self, label: &str) -> Result<()> {
        match locate::find_by_text(self.page(), label).await? {
            Some(selector) => {
                self.page().click(&selector).await?;
                self.page().wait(300).await;
                Ok(())
            }
            None => Err(Error::AssertionFailed(format!(
                "menu entry '{}' not found",
                label
            ))),
        }
    }

    /// Wait for the tool-usage report and return the last reported label.
    /// Deep research runs take minutes, so this uses the long timeout.
    pub async fn tool_used_label(&self) -> Result<String> {
        let timeout = self.settings().timeouts.get(TimeoutClass::Long);
        self.page().wait_for_text("Tool used:", timeout).await?;

        let js = r#"(function() {
            var text = document.body.innerText;
            var matches = text.match(/Tool used:\s*(\S+)/g);
            if (!matches || matches.length === 0) return "";
            var last = matches[matches.length - 1];
            return last.replace(/Tool used:\s*/, '');
        })()"#;
        let label: String = self.page().evaluate(js).await?;
        if label.is_empty() {
            return Err(Error::AssertionFailed("tool usage reported without a label".into()));
        }
        Ok(label)
    }

    /// Wait until the chat renders a generated image with real pixel data.
    /// Streaming inserts the img element before the bytes arrive, so this
    /// polls until the src is set and the image has decoded.
    pub async fn verify_generated_image(&self) -> Result<()> {
        let timeout = self.settings().timeouts.get(TimeoutClass::Long);
        let js = r#"(function() {
            var img = document.querySelector('img.max-w-full.h-auto.rounded-lg')
                || document.querySelector('[data-role="assistant"] img');
            if (!img) return false;
            var src = img.getAttribute('src');
            return !!src && src.length > 0 && img.naturalWidth > 0;
        })()"#;

        let deadline = std::time::Instant::now() + std::time::Duration::from_millis(timeout);
        loop {
            let ready: bool = self.page().evaluate(js).await?;
            if ready {
                return Ok(());
            }
            if std::time::Instant::now() >= deadline {
                return Err(Error::Timeout(format!(
                    "no decoded generated image after {}ms",
                    timeout
                )));
            }
            self.page().wait(500).await;
        }
    }

    /// Send a message that should trigger `tool`, verify the UI reports that
    /// tool and the response matches. Failed attempts reload the page and
    /// redo the whole setup.
    pub async fn run_tool_and_verify(
        &self,
        tool: Tool,
        message: &str,
        expected: &str,
        retries: u32,
    ) -> Result<()> {
        let mut state = RetryState::new(RetryPolicy::with_attempts(retries));

        loop {
            let attempt = state.begin();
            info!("Validating {} (attempt {})", tool, attempt);

            match self.attempt_tool(tool, message, expected).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!("{} validation failed: {}", tool, err);
                    match state.record_failure(err) {
                        Step::ResetAndRetry { .. } => {
                            self.page().reload().await?;
                            self.page().wait(state.reload_settle_ms()).await;
                        }
                        Step::GiveUp => {
                            self.chat.debug_screenshot(tool.label()).await;
                            return Err(state.into_last_error());
                        }
                    }
                }
            }
        }
    }

    async fn attempt_tool(&self, tool: Tool, message: &str, expected: &str) -> Result<()> {
        self.enable(tool).await?;
        self.chat.send_message(message).await?;

        let label = self.tool_used_label().await?;
        if label != tool.label() {
            return Err(Error::AssertionFailed(format!(
                "expected tool '{}', UI reported '{}'",
                tool.label(),
                label
            )));
        }
        self.chat.verify_assistant_response(expected, 1).await
    }

    async fn checkbox_counts(&self) -> Result<(u32, u32)> {
        let checked = locate::count(
            self.page(),
            "button[role=\"checkbox\"][aria-checked=\"true\"]",
        )
        .await?;
        let unchecked = locate::count(
            self.page(),
            "button[role=\"checkbox\"][aria-checked=\"false\"]",
        )
        .await?;
        Ok((checked, unchecked))
    }

    /// All context checkboxes are checked. A workspace with no checkboxes
    /// passes vacuously.
    pub async fn verify_all_checked(&self) -> Result<()> {
        let (checked, unchecked) = self.checkbox_counts().await?;
        debug!("Checkboxes: {} checked, {} unchecked", checked, unchecked);
        if unchecked > 0 {
            return Err(Error::AssertionFailed(format!(
                "{} checkboxes still unchecked",
                unchecked
            )));
        }
        Ok(())
    }

    /// No context checkbox is checked.
    pub async fn verify_all_unchecked(&self) -> Result<()> {
        let (checked, _) = self.checkbox_counts().await?;
        if checked > 0 {
            return Err(Error::AssertionFailed(format!(
                "{} checkboxes still checked",
                checked
            )));
        }
        Ok(())
    }

    /// The checkbox next to `label` is in the wanted state.
    pub async fn verify_checkbox_state(&self, label: &str, want_checked: bool) -> Result<()> {
        let js = format!(
            r#"(function() {{
                var needle = {label};
                var boxes = document.querySelectorAll('button[role="checkbox"]');
                for (var i = 0; i < boxes.length; i++) {{
                    var row = boxes[i].closest('[role="row"]') || boxes[i].parentElement;
                    if (row && row.innerText.includes(needle)) {{
                        return boxes[i].getAttribute('aria-checked') === 'true'
                            || boxes[i].getAttribute('data-state') === 'checked';
                    }}
                }}
                return null;
            }})()"#,
            label = js_str(label)
        );
        let state: Option<bool> = self.page().evaluate(&js).await?;
        match state {
            Some(actual) if actual == want_checked => Ok(()),
            Some(actual) => Err(Error::AssertionFailed(format!(
                "checkbox '{}' is {}, expected {}",
                label,
                if actual { "checked" } else { "unchecked" },
                if want_checked { "checked" } else { "unchecked" }
            ))),
            None => Err(Error::AssertionFailed(format!(
                "checkbox '{}' not found",
                label
            ))),
        }
    }

    /// The empty-context banner is visible when nothing is selected.
    pub async fn verify_banner_visible(&self) -> Result<()> {
        let timeout = self.settings().timeouts.get(TimeoutClass::Short);
        self.page()
            .wait_for_text("Select context to work", timeout)
            .await?;
        Ok(())
    }

    /// The empty-context banner clears once context is selected.
    pub async fn verify_banner_hidden(&self) -> Result<()> {
        let timeout = self.settings().timeouts.get(TimeoutClass::Short);
        locate::wait_for_text_gone(self.page(), "Select context to work", timeout).await
    }

    /// Attach a file to the chat input and confirm the upload toast.
    ///
    /// The file input is hidden and eoka has no native file-chooser hook, so
    /// the file is synthesized in-page from base64 bytes and dispatched
    /// through a DataTransfer change event.
    pub async fn upload_file_and_verify(&self, name: &str, bytes: &[u8]) -> Result<()> {
        info!("Uploading file: {} ({} bytes)", name, bytes.len());
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let js = format!(
            r#"(function() {{
                var input = document.querySelector('#file-input');
                if (!input) return false;
                var raw = atob({data});
                var arr = new Uint8Array(raw.length);
                for (var i = 0; i < raw.length; i++) arr[i] = raw.charCodeAt(i);
                var file = new File([arr], {name}, {{ type: 'application/octet-stream' }});
                var dt = new DataTransfer();
                dt.items.add(file);
                input.files = dt.files;
                input.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            data = js_str(&encoded),
            name = js_str(name)
        );
        let dispatched: bool = self.page().evaluate(&js).await?;
        if !dispatched {
            return Err(Error::AssertionFailed("file input not found".into()));
        }

        let timeout = self.settings().timeouts.get(TimeoutClass::Default);
        self.page()
            .wait_for_text("File(s) uploaded successfully!", timeout)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_labels() {
        assert_eq!(Tool::WebSearch.label(), "webSearchExa");
        assert_eq!(Tool::DeepResearch.label(), "deepResearch");
        assert_eq!(Tool::RelevantContent.label(), "findRelevantContent");
        assert_eq!(Tool::ClickupTask.label(), "getClickupTask");
        assert_eq!(Tool::AutoReasoning.label(), "autoReasoningTool");
        assert_eq!(Tool::GmailSearch.label(), "gmailSearchTool");
        assert_eq!(Tool::NanoBanana.label(), "nanoBannanaStream");
    }

    #[test]
    fn test_tool_display_matches_label() {
        assert_eq!(Tool::DeepResearch.to_string(), "deepResearch");
    }
}
