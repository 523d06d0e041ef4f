//! In-memory `HealSession` state (§3). Exclusively owns `issues`, `fixes`,
//! and `logs`; only the Orchestrator mutates `status`/`retry_count`.

use std::time::Instant;

use crate::model::{CiStatus, CiTimelineEntry, Fix, Issue, ProgressEvent};

/// One in-flight (or completed) heal session.
pub struct HealSession {
    pub repo_owner: String,
    pub repo_name: String,
    pub default_branch: String,
    pub ai_branch: String,
    pub installation_id: Option<String>,

    pub issues: Vec<Issue>,
    pub fixes: Vec<Fix>,
    pub retry_count: u32,
    pub ci_status: CiStatus,
    pub ci_timeline: Vec<CiTimelineEntry>,
    pub pr_number: Option<u64>,
    pub pr_url: Option<String>,
    pub logs: Vec<ProgressEvent>,
    pub start: Instant,
}

impl HealSession {
    #[must_use]
    pub fn new(
        repo_owner: impl Into<String>,
        repo_name: impl Into<String>,
        default_branch: impl Into<String>,
        ai_branch: impl Into<String>,
        installation_id: Option<String>,
    ) -> Self {
        Self {
            repo_owner: repo_owner.into(),
            repo_name: repo_name.into(),
            default_branch: default_branch.into(),
            ai_branch: ai_branch.into(),
            installation_id,
            issues: Vec::new(),
            fixes: Vec::new(),
            retry_count: 0,
            ci_status: CiStatus::Pending,
            ci_timeline: Vec::new(),
            pr_number: None,
            pr_url: None,
            logs: Vec::new(),
            start: Instant::now(),
        }
    }

    /// Append-only log (§3 invariant).
    pub fn log(&mut self, event: ProgressEvent) {
        self.logs.push(event);
    }

    /// Append-only timeline (§3 invariant).
    pub fn record_timeline(&mut self, entry: CiTimelineEntry) {
        self.ci_timeline.push(entry);
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
