//! Smoke suite: each model module answers a basic QA question.
//!
//! Requires Chrome and QA credentials. Run with:
//! cargo test --test smoke -- --ignored

mod common;

use common::{e2e_enabled, logged_in_harness};
use fw_e2e::pages::ChatPage;

async fn smoke_module(module: &str, question: &str, expected: &str) {
    if !e2e_enabled() {
        return;
    }

    let (harness, settings) = logged_in_harness().await;
    let chat = ChatPage::new(harness.page(), &settings);

    let result = async {
        chat.select_module(module).await?;
        chat.send_message(question).await?;
        chat.verify_assistant_response(expected, 3).await
    }
    .await;

    if let Err(e) = result {
        harness.save_failure_screenshot(module).await;
        panic!("{} smoke test failed: {}", module, e);
    }
    harness.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_gpt_4_1_module() {
    smoke_module("gpt-4.1", "What is Smoke Testing", "smoke").await;
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_grok_4_module() {
    smoke_module("grok-4", "What is Sanity Testing?", "sanity").await;
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_gemini_2_5_pro_module() {
    smoke_module("gemini-2.5-pro", "What is Functional Testing?", "functional").await;
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_gpt_o3_module() {
    smoke_module("gpt-o3", "What is Exploratory Testing?", "exploratory").await;
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_claude_4_sonnet_module() {
    smoke_module("Claude 4 Sonnet", "What is QA Automation Role", "automation").await;
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_deepseek_r1_module() {
    smoke_module("DeepSeek R1", "What is Regression Testing?", "regression").await;
}
