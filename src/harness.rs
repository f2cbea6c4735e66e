//! Browser lifecycle for a test session.

use eoka::{Browser, Page};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::Result;

/// Owns the browser and its single page for the duration of a test.
pub struct Harness {
    browser: Browser,
    page: Page,
}

impl Harness {
    /// Launch a browser configured from settings and open a blank page.
    pub async fn launch(settings: &Settings) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: settings.headless,
            viewport_width: 1280,
            viewport_height: 720,
            ..Default::default()
        };

        debug!("Launching browser (headless: {})", settings.headless);
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Self { browser, page })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Best-effort screenshot for debugging a failed step. Never fails the
    /// test, only logs.
    pub async fn save_failure_screenshot(&self, tag: &str) {
        let path = format!(
            "failure-{}-{}.png",
            tag,
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        );
        info!("Saving failure screenshot to: {}", path);
        match self.page.screenshot().await {
            Ok(data) => {
                if let Err(e) = std::fs::write(&path, data) {
                    warn!("Failed to save screenshot: {}", e);
                }
            }
            Err(e) => warn!("Failed to capture screenshot: {}", e),
        }
    }

    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}
