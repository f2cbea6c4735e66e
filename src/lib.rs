//! # fw-e2e
//!
//! End-to-end browser test harness for the Future Works AI chat application.
//! Drives a real Chrome instance through [`eoka`]: OAuth login, module
//! selection, chat round-trips, tool toggles, and DOM assertions. A CI
//! bridge posts a JUnit summary to ClickUp.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fw_e2e::{Harness, LoginFlow, Settings, pages::ChatPage};
//!
//! # #[tokio::main]
//! # async fn main() -> fw_e2e::Result<()> {
//! let settings = Settings::from_env();
//! settings.validate()?;
//!
//! let harness = Harness::launch(&settings).await?;
//! LoginFlow::new(harness.page(), &settings).login().await?;
//!
//! let chat = ChatPage::new(harness.page(), &settings);
//! chat.select_module("gemini-2.5-pro").await?;
//! chat.send_message("What is Smoke Testing?").await?;
//! chat.verify_assistant_response("smoke", 2).await?;
//!
//! harness.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod harness;
pub mod locate;
pub mod login;
pub mod matcher;
pub mod pages;
pub mod report;
pub mod retry;
pub mod session;

mod notify;

pub use config::{LoginMethod, Settings, TimeoutClass, Timeouts};
pub use harness::Harness;
pub use login::{LoginFlow, Obstruction};
pub use notify::{ClickUpNotifier, ReportSettings};
pub use report::{ReportSummary, RunContext};
pub use session::{Cookie, SessionStore};

// Re-export eoka types callers need to launch and drive a browser.
pub use eoka::{Browser, Page, StealthConfig};

/// Result type for fw-e2e operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the application under test.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    #[error("login failed at '{step}' (url: {url}, title: {title}): {message}")]
    Login {
        step: &'static str,
        url: String,
        title: String,
        message: String,
    },

    #[error("login obstructed by {kind} (url: {url}, title: {title})")]
    Obstructed {
        kind: Obstruction,
        url: String,
        title: String,
    },

    #[error("restored session is no longer valid: {0}")]
    SessionExpired(String),

    #[error("clickup api error ({status}): {body}")]
    Notify { status: u16, body: String },
}
