//! Posting run summaries to a ClickUp chat room.

use std::path::PathBuf;

use tracing::info;

use crate::report::RunContext;
use crate::{Error, Result};

/// Environment-driven configuration for the report bridge.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub api_token: String,
    pub team_id: String,
    pub room_id: String,
    pub junit_path: PathBuf,
    pub conclusion: String,
    pub workflow: String,
    pub run_id: Option<String>,
    pub run_number: Option<String>,
    pub repository: Option<String>,
    pub server_url: String,
}

impl ReportSettings {
    /// Read settings from the environment. The three ClickUp variables are
    /// required; everything else has a CI-friendly default.
    pub fn from_env() -> Result<Self> {
        let mut missing = Vec::new();
        let mut required = |name: &'static str| {
            let value = std::env::var(name).unwrap_or_default();
            if value.is_empty() {
                missing.push(name);
            }
            value
        };
        let api_token = required("CLICKUP_API_TOKEN");
        let team_id = required("CLICKUP_TEAM_ID");
        let room_id = required("CLICKUP_ROOM_ID");
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let opt = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Ok(Self {
            api_token,
            team_id,
            room_id,
            junit_path: opt("JUNIT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("junit-report.xml")),
            conclusion: opt("RUN_CONCLUSION").unwrap_or_else(|| "unknown".to_string()),
            workflow: opt("GITHUB_WORKFLOW_NAME").unwrap_or_else(|| "E2E Tests".to_string()),
            run_id: opt("GITHUB_RUN_ID"),
            run_number: opt("GITHUB_RUN_NUMBER"),
            repository: opt("GITHUB_REPOSITORY"),
            server_url: opt("GITHUB_SERVER_URL")
                .unwrap_or_else(|| "https://github.com".to_string()),
        })
    }

    /// Link to the CI run, when enough metadata is present to build one.
    pub fn run_url(&self) -> Option<String> {
        match (&self.repository, &self.run_id) {
            (Some(repo), Some(run_id)) => {
                Some(format!("{}/{}/actions/runs/{}", self.server_url, repo, run_id))
            }
            _ => None,
        }
    }

    pub fn run_context(&self) -> RunContext {
        RunContext {
            workflow: self.workflow.clone(),
            run_number: self.run_number.clone(),
            run_url: self.run_url(),
            conclusion: self.conclusion.clone(),
        }
    }
}

/// Thin client for the ClickUp chat message endpoint.
pub struct ClickUpNotifier {
    client: reqwest::Client,
    settings: ReportSettings,
}

impl ClickUpNotifier {
    pub fn new(settings: ReportSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    /// Post a plain-text message to the configured room.
    pub async fn send(&self, content: &str) -> Result<()> {
        let endpoint = format!(
            "https://api.clickup.com/api/v2/room/{}/message?team_id={}",
            self.settings.room_id, self.settings.team_id
        );
        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", &self.settings.api_token)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Notify {
                status: status.as_u16(),
                body,
            });
        }
        info!("ClickUp notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ReportSettings {
        ReportSettings {
            api_token: "pk_test".into(),
            team_id: "123".into(),
            room_id: "456".into(),
            junit_path: "junit-report.xml".into(),
            conclusion: "success".into(),
            workflow: "E2E Tests".into(),
            run_id: Some("99".into()),
            run_number: Some("7".into()),
            repository: Some("org/repo".into()),
            server_url: "https://github.com".into(),
        }
    }

    #[test]
    fn test_run_url_built_from_metadata() {
        assert_eq!(
            settings().run_url().as_deref(),
            Some("https://github.com/org/repo/actions/runs/99")
        );
    }

    #[test]
    fn test_run_url_absent_without_run_id() {
        let mut s = settings();
        s.run_id = None;
        assert_eq!(s.run_url(), None);
    }

    #[test]
    fn test_run_context_carries_conclusion() {
        let ctx = settings().run_context();
        assert_eq!(ctx.conclusion, "success");
        assert_eq!(ctx.run_number.as_deref(), Some("7"));
    }
}
