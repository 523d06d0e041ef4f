//! Slack webhook notification channel.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::events::{NotifyEvent, Severity};
use crate::NotifyChannel;

/// Environment variable for Slack webhook URL.
const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

/// Slack webhook notification channel.
pub struct SlackChannel {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Create a new Slack channel from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let webhook_url = std::env::var(ENV_SLACK_WEBHOOK_URL).ok();

        if webhook_url.is_some() {
            debug!("Slack notifications enabled");
        } else {
            debug!("Slack notifications disabled (SLACK_WEBHOOK_URL not set)");
        }

        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    /// Create a Slack channel with a specific webhook URL.
    #[must_use]
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url: Some(webhook_url),
            client: reqwest::Client::new(),
        }
    }

    /// Format an event as a Slack webhook payload.
    fn format_payload(event: &NotifyEvent) -> SlackPayload {
        let color = match event.severity() {
            Severity::Info => "#3498db",     // Blue
            Severity::Warning => "#f39c12",  // Orange
            Severity::Critical => "#e74c3c", // Red
        };

        let mut fields = vec![];
        for (name, value) in Self::format_fields(event) {
            fields.push(SlackField {
                title: name,
                value,
                short: true,
            });
        }

        let attachment = SlackAttachment {
            fallback: event.title(),
            color: color.to_string(),
            pretext: None,
            author_name: Some("CodeGuard Pro".to_string()),
            title: event.title(),
            text: Self::format_description(event),
            fields,
            footer: Some(format!(
                "{} | {}",
                event.severity().as_str(),
                event.timestamp().format("%Y-%m-%d %H:%M:%S UTC")
            )),
            ts: Some(event.timestamp().timestamp()),
        };

        SlackPayload {
            attachments: vec![attachment],
        }
    }

    /// Format the description for an event.
    fn format_description(event: &NotifyEvent) -> String {
        match event {
            NotifyEvent::InlineAnalysisCompleted {
                repository,
                pr_number,
                violation_count,
                ..
            } => {
                format!(
                    "Analyzed `{repository}#{pr_number}`\nFound {violation_count} violation(s)"
                )
            }

            NotifyEvent::HealSessionCompleted {
                repository,
                pr_url,
                iterations,
                ..
            } => {
                let pr = pr_url
                    .as_deref()
                    .map_or_else(|| "no PR opened".to_string(), |url| format!("<{url}|pull request>"));
                format!("Healed `{repository}` in {iterations} iteration(s)\n{pr}")
            }

            NotifyEvent::HealSessionFailed {
                repository, reason, ..
            } => {
                format!("Heal session on `{repository}` did not converge\n*Reason:* {reason}")
            }
        }
    }

    /// Format additional fields for an event.
    fn format_fields(event: &NotifyEvent) -> Vec<(String, String)> {
        match event {
            NotifyEvent::InlineAnalysisCompleted {
                repository,
                pr_number,
                violation_count,
                ..
            } => vec![
                ("Repository".to_string(), repository.clone()),
                ("PR".to_string(), format!("#{pr_number}")),
                ("Violations".to_string(), violation_count.to_string()),
            ],

            NotifyEvent::HealSessionCompleted {
                session_id,
                repository,
                iterations,
                context,
                ..
            } => {
                let mut fields = vec![
                    ("Session".to_string(), session_id.clone()),
                    ("Repository".to_string(), repository.clone()),
                    ("Iterations".to_string(), iterations.to_string()),
                ];
                for (key, value) in context {
                    fields.push((key.clone(), value.clone()));
                }
                fields
            }

            NotifyEvent::HealSessionFailed {
                session_id,
                repository,
                severity,
                ..
            } => vec![
                ("Session".to_string(), session_id.clone()),
                ("Repository".to_string(), repository.clone()),
                ("Severity".to_string(), severity.as_str().to_string()),
            ],
        }
    }
}

#[async_trait]
impl NotifyChannel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError> {
        let webhook_url = self
            .webhook_url
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured("SLACK_WEBHOOK_URL".to_string()))?;

        let payload = Self::format_payload(event);

        debug!(channel = "slack", event_type = ?event.title(), "Sending notification");

        let response = self.client.post(webhook_url).json(&payload).send().await?;

        if response.status().is_success() {
            debug!(channel = "slack", "Notification sent successfully");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            warn!(
                channel = "slack",
                status = %status,
                body = %body,
                "Slack webhook request failed"
            );

            Err(ChannelError::Other(format!(
                "Slack returned {status}: {body}"
            )))
        }
    }
}

// =============================================================================
// Slack API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SlackPayload {
    attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment {
    fallback: String,
    color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pretext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_name: Option<String>,
    title: String,
    text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<SlackField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ts: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SlackField {
    title: String,
    value: String,
    short: bool,
}
