//! Healing data model (§3, §6.4): `Fix`, `CIResult`, and the SSE/stored
//! result schema. `Issue`/`BugKind`/`Severity` live in `detect` and are
//! re-exported for convenience.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use detect::model::{BugKind, Issue, IssueSource, Severity};

/// Hard bound on retry cycles through `GENERATE_FIXES` (§3, §8 invariant 1).
pub const MAX_RETRIES: u32 = 5;

/// Every healing commit message begins with this marker (§6.3).
pub const COMMIT_MARKER: &str = "[AI-AGENT]";

/// Identity of the inline check posted for PR analysis (§6.3).
pub const STATUS_CONTEXT: &str = "CodeGuard Pro / Security Analysis";

/// Outcome of one proposed fix (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixStatus {
    Applied,
    Unfixable,
    Skipped,
    Error,
    CommitFailed,
}

/// The evolving buffer staged for one file, carried by the last fix
/// applied to that file in a `GENERATE_FIXES` pass (§3 invariant).
#[derive(Debug, Clone)]
pub struct PendingCommit {
    pub content: String,
}

/// A proposed replacement of one file's content tied to one issue (§3).
#[derive(Debug, Clone)]
pub struct Fix {
    pub file: String,
    pub line: u32,
    pub bug_type: BugKind,
    pub status: FixStatus,
    pub commit_message: String,
    pub explanation: String,
    pub pending_commit: Option<PendingCommit>,
}

/// Overall CI outcome for one monitoring poll (§3, §6.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CiStatus {
    Pending,
    Passed,
    Failed,
    NoCi,
    Skipped,
}

/// One check run or status context observed during CI monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSummary {
    pub name: String,
    pub status: String,
    pub url: Option<String>,
}

/// One parsed failure line attributed (where possible) to a file/line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureLog {
    pub source: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub message: String,
    pub level: String,
}

/// Result of one `CIAgent::wait_for_checks` poll cycle (§4.13).
#[derive(Debug, Clone)]
pub struct CiResult {
    pub status: CiStatus,
    pub checks: Vec<CheckSummary>,
    pub failure_logs: Vec<FailureLog>,
}

/// One row in the append-only CI monitoring timeline (§3, §8 invariant 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiTimelineEntry {
    pub iteration: u32,
    pub timestamp: DateTime<Utc>,
    pub status: CiStatus,
    pub checks: Vec<CheckSummary>,
    pub commit_sha_short: String,
}

/// A progress event emitted by every Orchestrator node (§4.14, §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: String,
    pub timestamp: DateTime<Utc>,
    pub message: Option<String>,
}

impl ProgressEvent {
    #[must_use]
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            timestamp: Utc::now(),
            message: Some(message.into()),
        }
    }
}

/// The final result schema emitted over SSE and persisted (§6.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealResultSchema {
    pub repo: String,
    pub branch_created: String,
    pub total_failures_detected: usize,
    pub total_fixes_applied: usize,
    pub final_ci_status: CiStatus,
    pub retry_count: u32,
    pub execution_time_ms: u64,
    pub pr_url: Option<String>,
    pub issues: Vec<IssueView>,
    pub fixes: Vec<FixView>,
    pub ci_timeline: Vec<CiTimelineEntry>,
}

/// Serializable view of an `Issue` for the result schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueView {
    pub file: String,
    pub line: u32,
    pub bug_type: BugKind,
    pub description: String,
    pub severity: Severity,
    pub source: IssueSource,
}

impl From<&Issue> for IssueView {
    fn from(issue: &Issue) -> Self {
        Self {
            file: issue.file.clone(),
            line: issue.line,
            bug_type: issue.bug_type,
            description: issue.description.clone(),
            severity: issue.severity,
            source: issue.source,
        }
    }
}

/// Serializable view of a `Fix` for the result schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixView {
    pub file: String,
    pub line: u32,
    pub bug_type: BugKind,
    pub status: FixStatus,
    pub commit_message: String,
    pub explanation: String,
}

impl From<&Fix> for FixView {
    fn from(fix: &Fix) -> Self {
        Self {
            file: fix.file.clone(),
            line: fix.line,
            bug_type: fix.bug_type,
            status: fix.status,
            commit_message: fix.commit_message.clone(),
            explanation: fix.explanation.clone(),
        }
    }
}

/// Ensure every healing commit message carries the marker prefix (§4.10).
#[must_use]
pub fn ensure_marker(message: &str) -> String {
    if message.starts_with(COMMIT_MARKER) {
        message.to_string()
    } else {
        format!("{COMMIT_MARKER} {message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_added_when_missing() {
        assert_eq!(ensure_marker("fix typo"), "[AI-AGENT] fix typo");
    }

    #[test]
    fn marker_not_duplicated() {
        assert_eq!(ensure_marker("[AI-AGENT] fix typo"), "[AI-AGENT] fix typo");
    }
}
