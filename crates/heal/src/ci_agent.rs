//! Polls checks + combined status for a commit with bounded wait (§4.13).

use std::time::Duration;

use scm::types::{Annotation, CheckRun};
use scm::ForgeClient;
use tracing::info;

use crate::error::HealResult;
use crate::model::{CheckSummary, CiResult, CiStatus, FailureLog};

const POLL_INTERVAL: Duration = Duration::from_secs(15);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const IN_PROGRESS_STATUSES: &[&str] = &["queued", "in_progress"];
const FAILED_CONCLUSIONS: &[&str] = &["failure", "timed_out", "cancelled"];

pub struct CiAgent<'a> {
    forge: &'a ForgeClient,
    owner: String,
    repo: String,
}

impl<'a> CiAgent<'a> {
    #[must_use]
    pub fn new(forge: &'a ForgeClient, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            forge,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// `waitForChecks(sha, timeout=300s)` (§4.13). Polls every 15s until
    /// both checks and the combined status reach a terminal state, or the
    /// timeout elapses.
    pub async fn wait_for_checks(&self, sha: &str, timeout: Duration) -> HealResult<CiResult> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let checks = self.forge.list_checks_for_ref(&self.owner, &self.repo, sha).await?;
            let combined = self.forge.get_combined_status_for_ref(&self.owner, &self.repo, sha).await?;

            let checks_done = !checks.is_empty()
                && checks.iter().all(|c| !IN_PROGRESS_STATUSES.contains(&c.status.as_str()));
            let statuses_done =
                !combined.statuses.is_empty() && combined.statuses.iter().all(|s| s.state != "pending");

            if (!checks.is_empty() || !combined.statuses.is_empty()) && checks_done && statuses_done {
                return self.summarize(sha, &checks).await;
            }

            if tokio::time::Instant::now() >= deadline {
                info!(sha, "CI wait timed out");
                return Ok(CiResult {
                    status: CiStatus::Failed,
                    checks: checks.iter().map(to_summary).collect(),
                    failure_logs: vec![FailureLog {
                        source: "ci_agent".to_string(),
                        file: None,
                        line: None,
                        message: "timeout".to_string(),
                        level: "error".to_string(),
                    }],
                });
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn summarize(&self, sha: &str, checks: &[CheckRun]) -> HealResult<CiResult> {
        let combined = self.forge.get_combined_status_for_ref(&self.owner, &self.repo, sha).await?;

        let failed_checks: Vec<&CheckRun> = checks
            .iter()
            .filter(|c| c.conclusion.as_deref().map(|c| FAILED_CONCLUSIONS.contains(&c)).unwrap_or(false))
            .collect();
        let failed_statuses: Vec<_> = combined.statuses.iter().filter(|s| s.state == "failure" || s.state == "error").collect();

        if failed_checks.is_empty() && failed_statuses.is_empty() {
            return Ok(CiResult {
                status: CiStatus::Passed,
                checks: checks.iter().map(to_summary).collect(),
                failure_logs: Vec::new(),
            });
        }

        let mut failure_logs = Vec::new();
        for check in &failed_checks {
            let annotations = self
                .forge
                .list_annotations(&self.owner, &self.repo, check.id)
                .await
                .unwrap_or_default();
            if annotations.is_empty() {
                failure_logs.push(FailureLog {
                    source: check.name.clone(),
                    file: None,
                    line: None,
                    message: format!("{} failed", check.name),
                    level: "error".to_string(),
                });
            } else {
                failure_logs.extend(annotations.iter().map(to_failure_log));
            }
        }
        for status in &failed_statuses {
            failure_logs.push(FailureLog {
                source: status.context.clone(),
                file: None,
                line: None,
                message: status.description.clone().unwrap_or_else(|| format!("{} failed", status.context)),
                level: "error".to_string(),
            });
        }

        Ok(CiResult {
            status: CiStatus::Failed,
            checks: checks.iter().map(to_summary).collect(),
            failure_logs,
        })
    }

    /// `hasCIConfigured(branch)`: whether any check runs exist for the
    /// branch tip.
    pub async fn has_ci_configured(&self, sha: &str) -> HealResult<bool> {
        let checks = self.forge.list_checks_for_ref(&self.owner, &self.repo, sha).await?;
        Ok(!checks.is_empty())
    }
}

#[must_use]
pub fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn to_summary(check: &CheckRun) -> CheckSummary {
    CheckSummary {
        name: check.name.clone(),
        status: check.conclusion.clone().unwrap_or_else(|| check.status.clone()),
        url: check.html_url.clone(),
    }
}

fn to_failure_log(annotation: &Annotation) -> FailureLog {
    FailureLog {
        source: "check_annotation".to_string(),
        file: Some(annotation.path.clone()),
        line: Some(annotation.start_line),
        message: annotation.message.clone(),
        level: annotation.annotation_level.clone().unwrap_or_else(|| "failure".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_five_minutes() {
        assert_eq!(default_timeout(), Duration::from_secs(300));
    }
}
