//! Notification event types for CodeGuard Pro.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Severity levels for alerts and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational - normal operations
    Info,
    /// Warning - something needs attention
    Warning,
    /// Critical - immediate action required
    Critical,
}

impl Severity {
    /// Get the display color for this severity (Slack attachment hex).
    #[must_use]
    pub const fn color(&self) -> u32 {
        match self {
            Self::Info => 0x0034_98db,     // Blue
            Self::Warning => 0x00f3_9c12,  // Orange
            Self::Critical => 0x00e7_4c3c, // Red
        }
    }

    /// Get display name for this severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }
}

/// Events that can trigger notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifyEvent {
    /// Inline PR analysis finished and a status/review was posted.
    InlineAnalysisCompleted {
        repository: String,
        pr_number: u64,
        violation_count: u32,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    /// An autonomous heal session reached `UPDATE_PR_AND_END` successfully
    /// (tests pass, or the retry budget was exhausted with a best-effort PR).
    HealSessionCompleted {
        session_id: String,
        repository: String,
        pr_url: Option<String>,
        iterations: u32,
        #[serde(default)]
        context: HashMap<String, String>,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    /// A heal session terminated without a usable fix (sandbox error, no
    /// backend response, or the retry budget was exhausted with failing
    /// checks).
    HealSessionFailed {
        session_id: String,
        repository: String,
        reason: String,
        severity: Severity,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },
}

impl NotifyEvent {
    /// Get a short title for this event type.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::InlineAnalysisCompleted {
                repository,
                pr_number,
                ..
            } => format!("Analysis Complete: {repository}#{pr_number}"),
            Self::HealSessionCompleted {
                repository,
                session_id,
                ..
            } => format!("Heal Session Completed: {repository} ({session_id})"),
            Self::HealSessionFailed {
                repository,
                session_id,
                ..
            } => format!("Heal Session Failed: {repository} ({session_id})"),
        }
    }

    /// Get the severity/color for this event.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::InlineAnalysisCompleted { .. } => Severity::Info,
            Self::HealSessionCompleted { .. } => Severity::Info,
            Self::HealSessionFailed { severity, .. } => *severity,
        }
    }

    /// Get the timestamp for this event.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::InlineAnalysisCompleted { timestamp, .. }
            | Self::HealSessionCompleted { timestamp, .. }
            | Self::HealSessionFailed { timestamp, .. } => *timestamp,
        }
    }
}
