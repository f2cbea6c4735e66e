//! Session-cookie persistence.
//!
//! Replaying a captured session skips the OAuth form (and any CAPTCHA) on
//! subsequent runs. The on-disk format is a JSON array of cookies; a full
//! storage-state blob (`{"cookies": [...]}`) written by other tooling is also
//! accepted on load. The file is read once at login start and written once by
//! the setup flow, never concurrently.

use std::path::{Path, PathBuf};

use eoka::Page;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Error, Result};

/// One persisted cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Reads and writes the cookie file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load cookies. A missing file is a configuration error pointing at the
    /// setup flow, not an I/O failure.
    pub fn load(&self) -> Result<Vec<Cookie>> {
        if !self.path.exists() {
            return Err(Error::Config(format!(
                "cookie file '{}' not found, run `setup-session` first",
                self.path.display()
            )));
        }
        let content = std::fs::read_to_string(&self.path)?;
        parse_cookie_json(&content)
    }

    /// Write cookies as a pretty JSON array.
    pub fn save(&self, cookies: &[Cookie]) -> Result<()> {
        let json = serde_json::to_string_pretty(cookies)?;
        std::fs::write(&self.path, json)?;
        info!("saved {} cookies to {}", cookies.len(), self.path.display());
        Ok(())
    }

    /// Replay persisted cookies into the page's browsing context.
    pub async fn apply(&self, page: &Page) -> Result<usize> {
        let cookies = self.load()?;
        for cookie in &cookies {
            page.set_cookie(
                &cookie.name,
                &cookie.value,
                cookie.domain.as_deref(),
                cookie.path.as_deref(),
            )
            .await?;
        }
        info!("restored {} session cookies", cookies.len());
        Ok(cookies.len())
    }

    /// Snapshot the page's cookies and persist them.
    ///
    /// Reads `document.cookie`, so HttpOnly cookies are not captured; the
    /// application's session cookies are script-visible, which is what this
    /// needs.
    pub async fn capture(&self, page: &Page, domain: &str) -> Result<usize> {
        let raw: String = page.evaluate("document.cookie").await?;
        let cookies = parse_cookie_header(&raw, domain);
        if cookies.is_empty() {
            warn!("no script-visible cookies to capture");
        }
        self.save(&cookies)?;
        Ok(cookies.len())
    }
}

/// Accept either a bare cookie array or a storage-state object.
fn parse_cookie_json(content: &str) -> Result<Vec<Cookie>> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let cookies = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        serde_json::Value::Object(ref map) if map.contains_key("cookies") => {
            serde_json::from_value(map["cookies"].clone())?
        }
        _ => {
            return Err(Error::Config(
                "cookie file must be a JSON array or a storage-state object".into(),
            ))
        }
    };
    Ok(cookies)
}

/// Split a `document.cookie` string into cookies scoped to `domain`.
fn parse_cookie_header(raw: &str, domain: &str) -> Vec<Cookie> {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name.is_empty() {
                return None;
            }
            Some(Cookie {
                name: name.to_string(),
                value: value.to_string(),
                domain: Some(domain.to_string()),
                path: Some("/".to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("cookies.json"));

        let cookies = vec![
            Cookie {
                name: "sid".into(),
                value: "abc123".into(),
                domain: Some(".future.works".into()),
                path: Some("/".into()),
            },
            Cookie {
                name: "theme".into(),
                value: "dark".into(),
                domain: None,
                path: None,
            },
        ];
        store.save(&cookies).unwrap();
        assert_eq!(store.load().unwrap(), cookies);
    }

    #[test]
    fn test_missing_file_mentions_setup() {
        let store = SessionStore::new("/nonexistent/cookies.json");
        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("setup-session"));
    }

    #[test]
    fn test_storage_state_blob_accepted() {
        let json = r#"{
            "cookies": [{"name": "sid", "value": "xyz", "domain": ".future.works"}],
            "origins": []
        }"#;
        let cookies = parse_cookie_json(json).unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "sid");
        assert_eq!(cookies[0].domain.as_deref(), Some(".future.works"));
        assert_eq!(cookies[0].path, None);
    }

    #[test]
    fn test_unexpected_shape_rejected() {
        assert!(parse_cookie_json(r#""just a string""#).is_err());
        assert!(parse_cookie_json(r#"{"no_cookies_key": true}"#).is_err());
    }

    #[test]
    fn test_parse_cookie_header() {
        let cookies = parse_cookie_header("sid=abc123; theme=dark", "staging.ai.future.works");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name, "sid");
        assert_eq!(cookies[0].value, "abc123");
        assert_eq!(cookies[0].domain.as_deref(), Some("staging.ai.future.works"));
        assert_eq!(cookies[1].name, "theme");
    }

    #[test]
    fn test_parse_cookie_header_empty_and_malformed() {
        assert!(parse_cookie_header("", "d").is_empty());
        assert!(parse_cookie_header("novalue", "d").is_empty());
        // Value may itself contain '='
        let cookies = parse_cookie_header("token=a=b=c", "d");
        assert_eq!(cookies[0].value, "a=b=c");
    }
}
