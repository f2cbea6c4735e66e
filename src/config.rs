//! Environment-driven configuration.
//!
//! Everything is read once into an explicit [`Settings`] struct and passed by
//! reference to the components that need it. No global state, no re-reads of
//! the environment mid-run.

use std::path::PathBuf;

use tracing::info;

use crate::{Error, Result};

/// Which timeout class an operation falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
    /// Standard element waits.
    Default,
    /// Page-load / network-idle waits.
    Short,
    /// AI response generation and tool-usage verification.
    Long,
}

/// Per-class timeouts in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub default_ms: u64,
    pub short_ms: u64,
    pub long_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_ms: 10_000,
            short_ms: 5_000,
            long_ms: 500_000,
        }
    }
}

impl Timeouts {
    /// Read from `FW_DEFAULT_TIMEOUT`, `FW_SHORT_TIMEOUT`, `FW_LONG_TIMEOUT`.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            default_ms: parse_ms(env_opt("FW_DEFAULT_TIMEOUT"), base.default_ms),
            short_ms: parse_ms(env_opt("FW_SHORT_TIMEOUT"), base.short_ms),
            long_ms: parse_ms(env_opt("FW_LONG_TIMEOUT"), base.long_ms),
        }
    }

    /// Look up a timeout by class.
    pub fn get(&self, class: TimeoutClass) -> u64 {
        match class {
            TimeoutClass::Default => self.default_ms,
            TimeoutClass::Short => self.short_ms,
            TimeoutClass::Long => self.long_ms,
        }
    }
}

/// How a test run authenticates against the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMethod {
    /// Drive the Google OAuth form with credentials.
    #[default]
    Google,
    /// Replay previously captured session cookies.
    Session,
    /// Navigate straight in (deployments with auth disabled).
    Direct,
}

impl LoginMethod {
    /// Parse the `FW_LOGIN_METHOD` value. Unknown values fall back to google.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "session" => Self::Session,
            "direct" => Self::Direct,
            _ => Self::Google,
        }
    }
}

/// Harness configuration, fully resolved at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Application under test.
    pub base_url: String,
    /// QA account email.
    pub username: String,
    /// QA account password.
    pub password: String,
    /// Authentication strategy.
    pub login_method: LoginMethod,
    /// Where captured session cookies live.
    pub cookies_file: PathBuf,
    /// Non-interactive mode: obstructions are fatal, browser is headless.
    pub ci: bool,
    /// Headless browser (defaults to `ci`, overridable via `FW_HEADLESS`).
    pub headless: bool,
    pub timeouts: Timeouts,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "https://staging.ai.future.works/".into(),
            username: String::new(),
            password: String::new(),
            login_method: LoginMethod::default(),
            cookies_file: PathBuf::from("./cookies.json"),
            ci: false,
            headless: false,
            timeouts: Timeouts::default(),
        }
    }
}

impl Settings {
    /// Build settings from the process environment.
    pub fn from_env() -> Self {
        let base = Self::default();
        let ci = env_opt("CI").is_some();
        let headless = env_opt("FW_HEADLESS")
            .map(|v| parse_bool(&v))
            .unwrap_or(ci);
        Self {
            base_url: env_opt("FW_BASE_URL").unwrap_or(base.base_url),
            username: env_opt("FW_QA_USERNAME").unwrap_or_default(),
            password: env_opt("FW_QA_PASSWORD").unwrap_or_default(),
            login_method: env_opt("FW_LOGIN_METHOD")
                .map(|v| LoginMethod::parse(&v))
                .unwrap_or_default(),
            cookies_file: env_opt("FW_COOKIES_FILE")
                .map(PathBuf::from)
                .unwrap_or(base.cookies_file),
            ci,
            headless,
            timeouts: Timeouts::from_env(),
        }
    }

    /// Credentials must be non-empty before the google flow navigates anywhere.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("FW_BASE_URL must not be empty".into()));
        }
        if self.login_method == LoginMethod::Google
            && (self.username.is_empty() || self.password.is_empty())
        {
            return Err(Error::Config(
                "FW_QA_USERNAME and FW_QA_PASSWORD are required for google login".into(),
            ));
        }
        Ok(())
    }

    /// Log the resolved configuration with the password redacted.
    pub fn log_summary(&self) {
        info!("base_url: {}", self.base_url);
        info!(
            "username: {}",
            if self.username.is_empty() {
                "NOT SET"
            } else {
                "***configured***"
            }
        );
        info!(
            "password: {}",
            if self.password.is_empty() {
                "NOT SET"
            } else {
                "***configured***"
            }
        );
        info!("login_method: {:?}", self.login_method);
        info!(
            "timeouts: default={}ms short={}ms long={}ms",
            self.timeouts.default_ms, self.timeouts.short_ms, self.timeouts.long_ms
        );
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Malformed values fall back to the default rather than failing the run.
fn parse_ms(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
