//! Google OAuth login orchestration.
//!
//! The flow drives the hosted Google sign-in form step by step, watching for
//! obstructions (CAPTCHA, phone verification, an account chooser) after each
//! submit. In CI an obstruction fails the run immediately; in an interactive
//! session the flow pauses so a human can clear it.

use std::fmt;

use eoka::Page;
use tracing::{debug, info, warn};

use crate::config::{LoginMethod, Settings, TimeoutClass};
use crate::locate::{self, Lookup, Strategy};
use crate::session::SessionStore;
use crate::{Error, Result};

/// Something on the Google sign-in path that automation cannot clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Obstruction {
    Captcha,
    PhoneVerification,
    AccountChooser,
}

impl fmt::Display for Obstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Captcha => write!(f, "CAPTCHA challenge"),
            Self::PhoneVerification => write!(f, "phone verification prompt"),
            Self::AccountChooser => write!(f, "account chooser screen"),
        }
    }
}

const GOOGLE_BUTTON: &[Strategy] = &[
    Strategy::Text("Continue with Google"),
    Strategy::Css("button[data-provider=\"google\"]"),
    Strategy::Css("a[href*=\"accounts.google.com\"]"),
];

const EMAIL_INPUT: &[Strategy] = &[
    Strategy::Css("input[aria-label=\"Email or phone\"]"),
    Strategy::Css("input[type=\"email\"]"),
    Strategy::Css("#identifierId"),
];

const PASSWORD_INPUT: &[Strategy] = &[
    Strategy::Css("input[aria-label=\"Enter your password\"]"),
    Strategy::Css("input[type=\"password\"]"),
    Strategy::Css("input[name=\"Passwd\"]"),
];

const NEXT_BUTTON: &[Strategy] = &[
    Strategy::Text("Next"),
    Strategy::Css("#identifierNext button"),
    Strategy::Css("#passwordNext button"),
];

/// Drives login for one page using the configured method.
pub struct LoginFlow<'a> {
    page: &'a Page,
    settings: &'a Settings,
}

impl<'a> LoginFlow<'a> {
    pub fn new(page: &'a Page, settings: &'a Settings) -> Self {
        Self { page, settings }
    }

    /// Run the configured login method to completion.
    pub async fn login(&self) -> Result<()> {
        match self.settings.login_method {
            LoginMethod::Google => self.login_with_google().await,
            LoginMethod::Session => self.login_with_session().await,
            LoginMethod::Direct => self.open_app().await,
        }
    }

    /// Full OAuth round trip through the Google sign-in form.
    pub async fn login_with_google(&self) -> Result<()> {
        let short = self.settings.timeouts.get(TimeoutClass::Short);

        self.open_app().await?;

        info!("Starting Google login as {}", self.settings.username);
        self.click_step(GOOGLE_BUTTON, "google-button").await?;
        self.page.wait_for_network_idle(1_000, short).await?;

        self.fill_step(EMAIL_INPUT, &self.settings.username, "email")
            .await?;
        self.click_step(NEXT_BUTTON, "email-next").await?;
        self.page.wait_for_network_idle(1_000, short).await?;
        self.check_obstructions().await?;

        self.fill_step(PASSWORD_INPUT, &self.settings.password, "password")
            .await?;
        self.click_step(NEXT_BUTTON, "password-next").await?;
        self.page.wait_for_network_idle(1_000, short).await?;
        self.check_obstructions().await?;

        self.wait_for_app().await?;
        info!("Google login complete");
        Ok(())
    }

    /// Restore a previously captured session instead of filling the form.
    pub async fn login_with_session(&self) -> Result<()> {
        let store = SessionStore::new(&self.settings.cookies_file);

        self.open_app().await?;
        store.apply(self.page).await?;
        self.page.reload().await?;
        self.page
            .wait_for_network_idle(1_000, self.settings.timeouts.get(TimeoutClass::Short))
            .await?;

        let url = self.page.url().await?;
        if url.contains("/login") || url.contains("accounts.google.com") {
            return Err(Error::SessionExpired(format!(
                "restored cookies did not authenticate, landed on {}",
                url
            )));
        }
        info!("Session restored from {}", store.path().display());
        Ok(())
    }

    /// Navigate to the app and let the initial load settle.
    async fn open_app(&self) -> Result<()> {
        debug!("Opening {}", self.settings.base_url);
        self.page.goto(&self.settings.base_url).await?;
        self.page
            .wait_for_network_idle(1_000, self.settings.timeouts.get(TimeoutClass::Short))
            .await?;
        Ok(())
    }

    /// Wait until the OAuth redirect lands back on the app.
    async fn wait_for_app(&self) -> Result<()> {
        let timeout = self.settings.timeouts.get(TimeoutClass::Default);
        let host = url::Url::parse(&self.settings.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| {
                Error::Config(format!("invalid base URL '{}'", self.settings.base_url))
            })?;
        self.page.wait_for_url_contains(&host, timeout).await?;
        self.page.wait_for_network_idle(1_000, timeout).await?;
        Ok(())
    }

    async fn click_step(&self, strategies: &[Strategy], step: &'static str) -> Result<()> {
        match locate::resolve_first(self.page, strategies).await {
            Ok(Lookup::Found(selector)) => {
                debug!("{}: clicking {}", step, selector);
                self.page.click(&selector).await?;
                Ok(())
            }
            Ok(Lookup::NotFound) => Err(self.step_error(step, "no selector matched").await),
            Err(e) => Err(self.step_error(step, &e.to_string()).await),
        }
    }

    async fn fill_step(
        &self,
        strategies: &[Strategy],
        value: &str,
        step: &'static str,
    ) -> Result<()> {
        let timeout = self.settings.timeouts.get(TimeoutClass::Short);
        for strategy in strategies {
            if let Strategy::Css(selector) = strategy {
                if self.page.wait_for_visible(selector, timeout).await.is_ok() {
                    self.page.human_fill(selector, value).await?;
                    return Ok(());
                }
            }
        }
        Err(self.step_error(step, "no input field matched").await)
    }

    /// Probe the current page for challenges Google raises on suspicious
    /// sign-ins. In CI these are fatal; interactively the flow pauses for a
    /// human to clear them.
    async fn check_obstructions(&self) -> Result<()> {
        if let Some(kind) = self.detect_obstruction().await {
            warn!("Login obstructed by {}", kind);
            if self.settings.ci {
                let (url, title) = self.page_context().await;
                return Err(Error::Obstructed { kind, url, title });
            }
            self.pause_for_human(kind).await?;
        }
        Ok(())
    }

    async fn detect_obstruction(&self) -> Option<Obstruction> {
        let captcha_probe = r#"
            (function() {
                if (document.querySelector('[data-sitekey]')) return true;
                if (document.querySelector('iframe[src*="recaptcha"]')) return true;
                return false;
            })()
        "#;
        if let Ok(true) = self.page.evaluate::<bool>(captcha_probe).await {
            return Some(Obstruction::Captcha);
        }

        if let Ok(true) = locate::exists(self.page, "input[type=\"tel\"]").await {
            return Some(Obstruction::PhoneVerification);
        }
        if let Ok(true) = locate::page_has_text(self.page, "Verify it's you").await {
            return Some(Obstruction::PhoneVerification);
        }
        if let Ok(true) = locate::page_has_text(self.page, "Choose an account").await {
            return Some(Obstruction::AccountChooser);
        }
        None
    }

    /// Block on stdin until a human confirms the obstruction is cleared.
    async fn pause_for_human(&self, kind: Obstruction) -> Result<()> {
        eprintln!();
        eprintln!("Login blocked by {}.", kind);
        eprintln!("Complete the challenge in the browser window, then press ENTER.");
        tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            let _ = std::io::stdin().read_line(&mut line);
        })
        .await
        .map_err(|e| Error::Config(format!("stdin wait failed: {}", e)))?;
        Ok(())
    }

    async fn step_error(&self, step: &'static str, message: &str) -> Error {
        let (url, title) = self.page_context().await;
        Error::Login {
            step,
            url,
            title,
            message: message.to_string(),
        }
    }

    async fn page_context(&self) -> (String, String) {
        let url = self.page.url().await.unwrap_or_default();
        let title = self.page.title().await.unwrap_or_default();
        (url, title)
    }
}
