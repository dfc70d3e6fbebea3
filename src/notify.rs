//! End-of-run webhook notification
//!
//! Posts a condensed summary to a Slack-compatible incoming webhook. Delivery is
//! attempted once; failures are logged and never affect the run's outcome.

use crate::report::{RunSummary, format_duration};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Webhook notifier, built once per run
pub struct SlackNotifier {
    /// `None` when no HTTP client could be built; notifying is then a no-op
    http: Option<reqwest::Client>,
    webhook_url: String,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("commit-audit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| tracing::warn!("Webhook notifications disabled: {}", e))
            .ok();

        Self {
            http,
            webhook_url: webhook_url.into(),
            timeout,
        }
    }

    /// Post the summary. Returns whether the webhook accepted it.
    pub async fn notify(&self, summary: &RunSummary, repo_name: &str) -> bool {
        let Some(http) = &self.http else {
            tracing::warn!("Skipping webhook notification: no HTTP client");
            return false;
        };
        let text = format_message(summary, repo_name);

        let result = http
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&WebhookPayload { text: &text })
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Sent run summary to webhook");
                true
            }
            Ok(response) => {
                tracing::warn!(
                    "Webhook notification rejected with HTTP {}",
                    response.status().as_u16()
                );
                false
            }
            Err(e) => {
                tracing::warn!("Failed to send webhook notification: {}", e);
                false
            }
        }
    }
}

/// Condensed human-readable summary
pub fn format_message(summary: &RunSummary, repo_name: &str) -> String {
    let status = if summary.fail_count > 0 {
        ":warning: suspicious commits found"
    } else if summary.error_count > 0 {
        ":grey_question: completed with errors"
    } else {
        ":white_check_mark: no suspicious commits"
    };

    let mut lines = vec![
        format!("*Commit audit for {}*: {}", repo_name, status),
        format!(
            "Range: {} to {} | Model: {}",
            summary.date_range.start, summary.date_range.end, summary.model_used
        ),
        format!(
            "Commits: {} | PASS: {} | FAIL: {} | ERROR: {}",
            summary.total_commits, summary.pass_count, summary.fail_count, summary.error_count
        ),
    ];

    if summary.total_commits > 0 {
        lines.push(format!(
            "Analysis time: {} (avg {} per commit)",
            format_duration(summary.total_analysis_time_seconds),
            format_duration(summary.average_analysis_time_seconds)
        ));
    }

    lines.join("\n")
}
