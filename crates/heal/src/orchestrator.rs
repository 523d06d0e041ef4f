//! The core state machine (§4.14): an explicit `OrchestratorState` plus a
//! `step` transition function. The only conditional path in the flow is
//! at `MonitorCi`; every other edge is a straight line, so the loop below
//! is a `match` over a node enum rather than hidden control flow spread
//! across callbacks.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use scm::ForgeClient;
use tracing::{info, warn};

use crate::branch_manager::BranchManager;
use crate::ci_agent::CiAgent;
use crate::error::HealResult;
use crate::fix_agent::FixBackend;
use crate::model::{
    BugKind, CiStatus, CiTimelineEntry, Fix, FixStatus, Issue, IssueSource, PendingCommit, ProgressEvent,
};
use crate::pr_creator::PrCreator;
use crate::session::HealSession;

/// One node of the healing FSM (§4.14).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Analyze,
    GenerateFixes,
    ApplyCommit,
    OpenPr,
    MonitorCi,
    UpdatePrAndEnd,
    Done,
}

/// Tunable timeouts, all defaulted per §5.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub ci_timeout: Duration,
    pub retry_pause: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            ci_timeout: Duration::from_secs(300),
            retry_pause: Duration::from_secs(5),
        }
    }
}

pub struct Orchestrator<'a> {
    branch_manager: BranchManager<'a>,
    pr_creator: PrCreator<'a>,
    ci_agent: CiAgent<'a>,
    fix_backend: Box<dyn FixBackend>,
    config: OrchestratorConfig,
    emit: Box<dyn Fn(ProgressEvent) + Send + Sync>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        forge: &'a ForgeClient,
        owner: impl Into<String>,
        repo: impl Into<String>,
        fix_backend: Box<dyn FixBackend>,
        config: OrchestratorConfig,
        emit: Box<dyn Fn(ProgressEvent) + Send + Sync>,
    ) -> Self {
        let owner = owner.into();
        let repo = repo.into();
        Self {
            branch_manager: BranchManager::new(forge, owner.clone(), repo.clone()),
            pr_creator: PrCreator::new(forge, owner.clone(), repo.clone()),
            ci_agent: CiAgent::new(forge, owner, repo),
            fix_backend,
            config,
            emit,
        }
    }

    fn emit(&self, session: &mut HealSession, stage: &str, message: impl Into<String>) {
        let event = ProgressEvent::new(stage, message);
        (self.emit)(event.clone());
        session.log(event);
    }

    /// Drives `session` through the FSM to completion. `session.issues`
    /// MUST already hold the precomputed findings (§4.14 node 1) and
    /// `session.ai_branch` must already exist on the forge.
    pub async fn run(&self, mut session: HealSession) -> HealResult<HealSession> {
        let mut state = OrchestratorState::Analyze;

        while state != OrchestratorState::Done {
            state = self.step(&mut session, state).await?;
        }

        Ok(session)
    }

    async fn step(&self, session: &mut HealSession, state: OrchestratorState) -> HealResult<OrchestratorState> {
        match state {
            OrchestratorState::Analyze => self.analyze(session),
            OrchestratorState::GenerateFixes => self.generate_fixes(session).await,
            OrchestratorState::ApplyCommit => self.apply_commit(session).await,
            OrchestratorState::OpenPr => self.open_pr(session).await,
            OrchestratorState::MonitorCi => self.monitor_ci(session).await,
            OrchestratorState::UpdatePrAndEnd => self.update_pr_and_end(session).await,
            OrchestratorState::Done => Ok(OrchestratorState::Done),
        }
    }

    fn analyze(&self, session: &mut HealSession) -> HealResult<OrchestratorState> {
        self.emit(session, "analyze", format!("{} issue(s) to address", session.issues.len()));
        if session.issues.is_empty() {
            session.ci_status = CiStatus::Passed;
            return Ok(OrchestratorState::UpdatePrAndEnd);
        }
        Ok(OrchestratorState::GenerateFixes)
    }

    /// §4.14 node 2. First pass consumes all `issues`; a retry pass
    /// consumes only the CI-sourced issues from the previous `MonitorCi`.
    async fn generate_fixes(&self, session: &mut HealSession) -> HealResult<OrchestratorState> {
        self.emit(session, "generate_fixes", "proposing fixes");

        let targets: Vec<Issue> = if session.retry_count == 0 {
            session.issues.clone()
        } else {
            session.issues.iter().filter(|i| i.source == IssueSource::Ci).cloned().collect()
        };

        let mut by_file: BTreeMap<String, Vec<&Issue>> = BTreeMap::new();
        for issue in &targets {
            by_file.entry(issue.file.clone()).or_default().push(issue);
        }

        let mut new_fixes = Vec::new();
        for (file, issues) in by_file {
            let mut buffer = String::from_utf8_lossy(
                &self
                    .branch_manager
                    .get_file_content(&file, &session.ai_branch)
                    .await
                    .unwrap_or_default(),
            )
            .into_owned();

            let mut last_applied_idx: Option<usize> = None;
            for issue in issues {
                let proposed = self.fix_backend.propose(issue, &buffer).await;
                let status = if proposed.success { FixStatus::Applied } else { FixStatus::Unfixable };
                if proposed.success {
                    buffer = proposed.fixed_code;
                }
                new_fixes.push(Fix {
                    file: file.clone(),
                    line: issue.line,
                    bug_type: issue.bug_type,
                    status,
                    commit_message: proposed.commit_message,
                    explanation: proposed.explanation,
                    pending_commit: None,
                });
                if status == FixStatus::Applied {
                    last_applied_idx = Some(new_fixes.len() - 1);
                }
            }

            if let Some(idx) = last_applied_idx {
                new_fixes[idx].pending_commit = Some(PendingCommit { content: buffer });
            }
        }

        session.fixes.extend(new_fixes);
        Ok(OrchestratorState::ApplyCommit)
    }

    /// §4.14 node 3.
    async fn apply_commit(&self, session: &mut HealSession) -> HealResult<OrchestratorState> {
        self.emit(session, "apply_commit", "committing fixes");

        for fix in &mut session.fixes {
            let Some(pending) = fix.pending_commit.take() else { continue };
            if fix.status != FixStatus::Applied {
                continue;
            }

            match self
                .branch_manager
                .commit_file(&session.ai_branch, &fix.file, pending.content.as_bytes(), &fix.commit_message)
                .await
            {
                Ok(_) => {}
                Err(e) => {
                    warn!(file = %fix.file, error = %e, "commit failed");
                    fix.status = FixStatus::CommitFailed;
                }
            }
        }

        Ok(OrchestratorState::OpenPr)
    }

    /// §4.14 node 4.
    async fn open_pr(&self, session: &mut HealSession) -> HealResult<OrchestratorState> {
        let applied = session.fixes.iter().filter(|f| f.status == FixStatus::Applied).count();

        if applied == 0 {
            session.ci_status = CiStatus::Skipped;
            self.emit(session, "open_pr", "no fixes applied, skipping PR");
            return Ok(OrchestratorState::UpdatePrAndEnd);
        }

        if session.pr_number.is_none() {
            let pr = self.pr_creator.create_pr(session).await?;
            self.emit(session, "open_pr", format!("opened PR #{}", pr.number));
            session.pr_number = Some(pr.number);
            session.pr_url = Some(pr.url);
        }

        Ok(OrchestratorState::MonitorCi)
    }

    /// §4.14 node 5. The only conditional branch in the FSM.
    ///
    /// `retry_count` is bumped once per call regardless of which branch
    /// runs below, so a no-CI repo still ends the session with
    /// `retry_count == 1` (one monitor check), matching the S2 scenario.
    async fn monitor_ci(&self, session: &mut HealSession) -> HealResult<OrchestratorState> {
        let sha = self.branch_manager.get_latest_commit_sha(&session.ai_branch).await?;
        session.retry_count += 1;

        if !self.ci_agent.has_ci_configured(&sha).await? {
            session.ci_status = CiStatus::NoCi;
            session.record_timeline(CiTimelineEntry {
                iteration: session.retry_count,
                timestamp: Utc::now(),
                status: CiStatus::NoCi,
                checks: Vec::new(),
                commit_sha_short: short_sha(&sha),
            });
            self.emit(session, "monitor_ci", "repository has no CI configured");
            return Ok(OrchestratorState::UpdatePrAndEnd);
        }

        self.emit(session, "monitor_ci", format!("waiting for checks (attempt {})", session.retry_count));

        let result = self.ci_agent.wait_for_checks(&sha, self.config.ci_timeout).await?;
        session.ci_status = result.status;
        session.record_timeline(CiTimelineEntry {
            iteration: session.retry_count,
            timestamp: Utc::now(),
            status: result.status,
            checks: result.checks.clone(),
            commit_sha_short: short_sha(&sha),
        });

        if result.status != CiStatus::Failed {
            return Ok(OrchestratorState::UpdatePrAndEnd);
        }

        let ci_issues = classify_failure_logs(&result.failure_logs);
        if !ci_issues.is_empty() {
            session.issues = ci_issues;
        }

        if session.retry_count < crate::model::MAX_RETRIES {
            tokio::time::sleep(self.config.retry_pause).await;
            Ok(OrchestratorState::GenerateFixes)
        } else {
            Ok(OrchestratorState::UpdatePrAndEnd)
        }
    }

    /// §4.14 node 6.
    async fn update_pr_and_end(&self, session: &mut HealSession) -> HealResult<OrchestratorState> {
        if let Some(pr_number) = session.pr_number {
            self.pr_creator.update_pr_body(pr_number, session).await?;
        }
        self.emit(session, "complete", format!("heal complete: {:?}", session.ci_status));
        info!(ci_status = ?session.ci_status, retries = session.retry_count, "heal session finished");
        Ok(OrchestratorState::Done)
    }
}

fn short_sha(sha: &str) -> String {
    sha.chars().take(7).collect()
}

/// §4.14 node 5: classify failed CI logs into fresh `Issue`s, dropping any
/// log line with no file attribution.
fn classify_failure_logs(logs: &[crate::model::FailureLog]) -> Vec<Issue> {
    logs.iter()
        .filter_map(|log| {
            let file = log.file.clone()?;
            Some(Issue {
                file,
                line: log.line.unwrap_or(1),
                bug_type: detect::classify::classify_message(&log.message),
                description: log.message.clone(),
                code_snippet: String::new(),
                severity: crate::model::Severity::Warning,
                source: IssueSource::Ci,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FailureLog;

    #[test]
    fn classify_failure_logs_drops_unattributed_entries() {
        let logs = vec![
            FailureLog {
                source: "jest".to_string(),
                file: Some("app.js".to_string()),
                line: Some(10),
                message: "TypeError: undefined is not a function".to_string(),
                level: "error".to_string(),
            },
            FailureLog {
                source: "jest".to_string(),
                file: None,
                line: None,
                message: "generic failure with no location".to_string(),
                level: "error".to_string(),
            },
        ];
        let issues = classify_failure_logs(&logs);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].bug_type, BugKind::TypeError);
        assert_eq!(issues[0].source, IssueSource::Ci);
    }

    #[test]
    fn short_sha_truncates_to_seven_chars() {
        assert_eq!(short_sha("abcdef1234567890"), "abcdef1");
    }

    /// Drives the full `Analyze -> ... -> Done` cycle against a fake forge
    /// (wiremock) and a mocked `FixBackend`, for a repository with no CI
    /// configured, and asserts the invariants in §8: the retry bound, the
    /// append-only CI timeline, and a committed, reported fix.
    #[tokio::test]
    async fn full_cycle_applies_a_fix_and_ends_with_no_ci() {
        use base64::engine::general_purpose::STANDARD as BASE64;
        use base64::Engine as _;
        use scm::CredentialBroker;
        use serde_json::json;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        use crate::fix_agent::{MockFixBackend, ProposedFix};
        use crate::model::Severity;
        use crate::session::HealSession;

        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/contents/app.js"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": BASE64.encode(b"const x = eval(input);\n"),
                "encoding": "base64",
                "sha": "blob-sha-1",
            })))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/repos/acme/widgets/contents/app.js"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "commit": { "sha": "commit-sha-1", "tree": { "sha": "tree-sha-1" } },
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/repos/acme/widgets/pulls"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 7,
                "html_url": "https://forge.test/acme/widgets/pull/7",
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/git/ref/heads/ai-branch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": { "sha": "abcdef1234567890" },
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/commits/abcdef1234567890/check-runs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "check_runs": [] })))
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/repos/acme/widgets/pulls/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let credentials = std::sync::Arc::new(CredentialBroker::new(
            None,
            None,
            Some("test-token".to_string()),
            server.uri(),
        ));
        let forge = ForgeClient::new(server.uri(), credentials, None);

        let mut fix_backend = MockFixBackend::new();
        fix_backend.expect_propose().returning(|_, content| ProposedFix {
            success: true,
            fixed_code: content.replace("eval(input)", "Function(input)"),
            commit_message: "[AI-AGENT] replace eval with Function".to_string(),
            explanation: "replaced eval() with Function()".to_string(),
        });

        let orchestrator = Orchestrator::new(
            &forge,
            "acme",
            "widgets",
            Box::new(fix_backend),
            OrchestratorConfig::default(),
            Box::new(|_| {}),
        );

        let mut session = HealSession::new("acme", "widgets", "main", "ai-branch", None);
        session.issues.push(Issue {
            file: "app.js".to_string(),
            line: 1,
            bug_type: BugKind::Logic,
            description: "eval() executes arbitrary strings as code".to_string(),
            code_snippet: String::new(),
            severity: Severity::Critical,
            source: IssueSource::Ast,
        });

        let result = orchestrator.run(session).await.unwrap();

        assert!(result.retry_count <= crate::model::MAX_RETRIES);
        assert_eq!(result.retry_count, 1);
        assert_eq!(result.ci_status, CiStatus::NoCi);
        assert_eq!(result.ci_timeline.len(), 1);
        assert_eq!(result.fixes.len(), 1);
        assert_eq!(result.fixes[0].status, FixStatus::Applied);
        assert_eq!(result.pr_number, Some(7));
    }
}
