//! Tool validation suite: agent tools fire and report themselves, workspace
//! context checkboxes behave, and file upload works.
//!
//! Requires Chrome and QA credentials. Run with:
//! cargo test --test tool_validation -- --ignored

mod common;

use common::{e2e_enabled, logged_in_harness};
use fw_e2e::pages::{ChatPage, Tool, ToolValidationPage};
use fw_e2e::{Harness, Settings};

const MODULE: &str = "gemini-2.5-pro";

async fn tool_harness() -> (Harness, Settings) {
    let (harness, settings) = logged_in_harness().await;
    let chat = ChatPage::new(harness.page(), &settings);
    chat.select_module(MODULE)
        .await
        .expect("Failed to select module");
    (harness, settings)
}

async fn validate_tool(tool: Tool, message: &str, expected: &str) {
    if !e2e_enabled() {
        return;
    }

    let (harness, settings) = tool_harness().await;
    let tools = ToolValidationPage::new(harness.page(), &settings);

    if let Err(e) = tools.run_tool_and_verify(tool, message, expected, 3).await {
        panic!("{} validation failed: {}", tool, e);
    }
    harness.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_web_search_tool() {
    validate_tool(
        Tool::WebSearch,
        "tell me the latest tourist attractions to visit in italy",
        "visit in Italy",
    )
    .await;
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_deep_research_tool() {
    validate_tool(
        Tool::DeepResearch,
        "can you tell me latest methods to handle hallucinations in gen ai",
        "hallucinations",
    )
    .await;
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_relevant_content_tool() {
    validate_tool(
        Tool::RelevantContent,
        "Whats the current sprint of veltris?",
        "sprint of veltris",
    )
    .await;
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_clickup_task_tool() {
    validate_tool(Tool::ClickupTask, "Tell me the details of 868ffdcnu", "task").await;
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_auto_reasoning_tool() {
    validate_tool(
        Tool::AutoReasoning,
        "Ingest all the tasks for Tejashwini",
        "Tejashwini",
    )
    .await;
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_gmail_search_tool() {
    validate_tool(
        Tool::GmailSearch,
        "Fetch my recent emails from my inbox",
        "email",
    )
    .await;
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_nano_banana_generates_image() {
    if !e2e_enabled() {
        return;
    }

    let (harness, settings) = tool_harness().await;
    let chat = ChatPage::new(harness.page(), &settings);
    let tools = ToolValidationPage::new(harness.page(), &settings);

    let result = async {
        chat.send_message(
            "Generate a high-resolution, photorealistic image of a modern \
             QA engineer's workspace during late evening.",
        )
        .await?;

        let label = tools.tool_used_label().await?;
        assert_eq!(label, Tool::NanoBanana.label());
        tools.verify_generated_image().await
    }
    .await;

    if let Err(e) = result {
        harness.save_failure_screenshot("image-generation").await;
        panic!("Image generation failed: {}", e);
    }
    harness.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_workspace_checkbox_toggling() {
    if !e2e_enabled() {
        return;
    }

    let (harness, settings) = tool_harness().await;
    let chat = ChatPage::new(harness.page(), &settings);
    let tools = ToolValidationPage::new(harness.page(), &settings);

    let result = async {
        chat.set_workspace_checked("Future Works", true).await?;
        tools.verify_checkbox_state("Future Works", true).await?;

        chat.set_workspace_checked("Future Works", false).await?;
        tools.verify_checkbox_state("Future Works", false).await
    }
    .await;

    if let Err(e) = result {
        harness.save_failure_screenshot("checkbox-toggle").await;
        panic!("Checkbox toggling failed: {}", e);
    }
    harness.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_banner_tracks_checkbox_selection() {
    if !e2e_enabled() {
        return;
    }

    let (harness, settings) = tool_harness().await;
    let chat = ChatPage::new(harness.page(), &settings);
    let tools = ToolValidationPage::new(harness.page(), &settings);

    let result = async {
        // With nothing selected the empty-context banner must show.
        chat.set_workspace_checked("Future Works", false).await?;
        tools.verify_all_unchecked().await?;
        tools.verify_banner_visible().await?;

        // Selecting context hides it again.
        chat.set_workspace_checked("Future Works", true).await?;
        tools.verify_checkbox_state("Future Works", true).await?;
        tools.verify_banner_hidden().await
    }
    .await;

    if let Err(e) = result {
        harness.save_failure_screenshot("context-banner").await;
        panic!("Banner validation failed: {}", e);
    }
    harness.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome and QA credentials"]
async fn test_file_upload() {
    if !e2e_enabled() {
        return;
    }

    let (harness, settings) = tool_harness().await;
    let tools = ToolValidationPage::new(harness.page(), &settings);

    let csv = b"name,role\nalice,qa\nbob,dev\n";
    if let Err(e) = tools.upload_file_and_verify("roster.csv", csv).await {
        harness.save_failure_screenshot("file-upload").await;
        panic!("File upload failed: {}", e);
    }
    harness.close().await.expect("Failed to close browser");
}
