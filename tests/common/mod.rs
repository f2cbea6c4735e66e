//! Shared setup for the end-to-end suites.
//!
//! These suites need Chrome plus real QA credentials in the environment, so
//! every test starts with an `e2e_enabled` guard and is `#[ignore]`d by
//! default. Run with: cargo test -- --ignored

use fw_e2e::{Harness, LoginFlow, Settings};

/// Chrome is installed.
#[allow(dead_code)]
pub fn chrome_available() -> bool {
    if eoka::stealth::patcher::find_chrome().is_err() {
        eprintln!("Chrome not found, skipping test");
        return false;
    }
    true
}

/// Chrome is installed and the configured login method has what it needs.
/// Session and direct logins carry no credentials, so only the Google flow
/// requires FW_QA_USERNAME/FW_QA_PASSWORD.
#[allow(dead_code)]
pub fn e2e_enabled() -> bool {
    if !chrome_available() {
        return false;
    }
    if let Err(e) = Settings::from_env().validate() {
        eprintln!("Settings incomplete, skipping test: {}", e);
        return false;
    }
    true
}

/// Launch a browser and log in with the configured method.
#[allow(dead_code)]
pub async fn logged_in_harness() -> (Harness, Settings) {
    let settings = Settings::from_env();
    settings.validate().expect("incomplete settings");

    let harness = Harness::launch(&settings)
        .await
        .expect("Failed to launch browser");

    let flow = LoginFlow::new(harness.page(), &settings);
    if let Err(e) = flow.login().await {
        harness.save_failure_screenshot("login").await;
        panic!("Login failed: {}", e);
    }

    (harness, settings)
}
