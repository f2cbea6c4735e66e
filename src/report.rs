//! JUnit XML report parsing and summary rendering.
//!
//! The report is scraped with regular expressions rather than an XML parser:
//! the producer writes a fixed, flat shape (suites, cases, one failure or
//! error node per case) and the summary only needs counts plus failure text.
//! Malformed input degrades to an empty summary instead of failing the
//! notification step.

use std::sync::OnceLock;

use regex::Regex;

/// Maximum failures listed in a rendered summary.
const MAX_LISTED_FAILURES: usize = 10;

/// Maximum characters of failure detail per listed test.
const MAX_DETAIL_CHARS: usize = 300;

fn suite_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<testsuite\b([^>]*)>(.*?)</testsuite>").unwrap())
}

fn case_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<testcase\b([^>]*)>(.*?)</testcase>").unwrap())
}

fn failure_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<failure\b([^>]*)>(.*?)</failure>").unwrap())
}

fn error_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<error\b([^>]*)>(.*?)</error>").unwrap())
}

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"([\w:-]+)="([^"]*)""#).unwrap())
}

fn attr(attrs: &str, name: &str) -> Option<String> {
    attr_re()
        .captures_iter(attrs)
        .find(|c| &c[1] == name)
        .map(|c| c[2].to_string())
}

fn attr_num(attrs: &str, name: &str) -> i64 {
    attr(attrs, name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// One failed or errored test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTest {
    pub suite: String,
    pub name: String,
    /// "failure" or "error", matching the XML element.
    pub kind: &'static str,
    pub message: Option<String>,
    pub details: String,
}

/// Aggregated counts plus every failed case across all suites.
///
/// Counts come from the first (root) suite's attributes; reporters nest
/// per-file suites under a root suite that already carries the totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: i64,
    pub failures: i64,
    pub errors: i64,
    pub skipped: i64,
    pub failed_tests: Vec<FailedTest>,
}

impl ReportSummary {
    pub fn from_xml(xml: &str) -> Self {
        let mut summary = Self::default();
        let mut first = true;

        for suite in suite_re().captures_iter(xml) {
            let attrs = &suite[1];
            let body = &suite[2];

            if first {
                summary.total = attr_num(attrs, "tests");
                summary.failures = attr_num(attrs, "failures");
                summary.errors = attr_num(attrs, "errors");
                summary.skipped = attr_num(attrs, "skipped");
                first = false;
            }

            let suite_name = attr(attrs, "name")
                .or_else(|| attr(attrs, "file"))
                .unwrap_or_else(|| "Unnamed Suite".to_string());

            for case in case_re().captures_iter(body) {
                let case_attrs = &case[1];
                let inner = &case[2];

                let hit = failure_re()
                    .captures(inner)
                    .map(|c| ("failure", c))
                    .or_else(|| error_re().captures(inner).map(|c| ("error", c)));
                let Some((kind, cap)) = hit else { continue };

                summary.failed_tests.push(FailedTest {
                    suite: suite_name.clone(),
                    name: attr(case_attrs, "name")
                        .unwrap_or_else(|| "Unnamed Test".to_string()),
                    kind,
                    message: attr(&cap[1], "message"),
                    details: cap[2].trim().to_string(),
                });
            }
        }
        summary
    }

    pub fn passed(&self) -> i64 {
        (self.total - self.failures - self.errors - self.skipped).max(0)
    }
}

/// CI run metadata for the summary header.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub workflow: String,
    pub run_number: Option<String>,
    pub run_url: Option<String>,
    pub conclusion: String,
}

/// Render the summary as the plain-text message posted to the chat channel.
pub fn render(summary: &ReportSummary, ctx: &RunContext) -> String {
    let mut lines = vec![
        format!("Workflow: {}", ctx.workflow),
        format!(
            "Run: #{} ({})",
            ctx.run_number.as_deref().unwrap_or("N/A"),
            ctx.run_url.as_deref().unwrap_or("N/A")
        ),
        format!("Conclusion: {}", ctx.conclusion),
        format!(
            "Total: {} | Passed: {} | Failed: {} | Errors: {} | Skipped: {}",
            summary.total,
            summary.passed(),
            summary.failures,
            summary.errors,
            summary.skipped
        ),
    ];

    if !summary.failed_tests.is_empty() {
        lines.push("\nFailed Tests:".to_string());
        for (idx, test) in summary.failed_tests.iter().take(MAX_LISTED_FAILURES).enumerate() {
            let details = if test.details.is_empty() {
                test.message
                    .clone()
                    .unwrap_or_else(|| "No stack trace provided.".to_string())
            } else {
                truncate_chars(&test.details, MAX_DETAIL_CHARS)
            };
            lines.push(format!(
                "{}. {} › {}\n   - {}: {}",
                idx + 1,
                test.suite,
                test.name,
                test.kind,
                details
            ));
        }
        if summary.failed_tests.len() > MAX_LISTED_FAILURES {
            lines.push(format!(
                "...and {} more failures.",
                summary.failed_tests.len() - MAX_LISTED_FAILURES
            ));
        }
    } else if summary.total > 0 {
        lines.push("\nAll tests passed ✅".to_string());
    } else {
        lines.push("\nNo tests detected in report.".to_string());
    }

    lines.join("\n")
}

/// Truncate on a char boundary, appending an ellipsis when anything is cut.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push('…');
        out
    }
}
