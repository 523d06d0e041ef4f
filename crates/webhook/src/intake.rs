//! `POST /webhook`: signature verification + event routing (§4.15).
//!
//! Two event kinds matter to the core: `pull_request` (drives inline
//! analysis) and `installation` (upserts projects). Everything else is
//! acknowledged and ignored, mirroring the teacher's router shape of one
//! `match` over an event-type header rather than per-event endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use scm::types::{ReviewComment, StatusState};
use store::model::{AnalysisStatus, Project, Violation as StoredViolation};

use crate::error::IntakeError;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-signature-256";
const EVENT_HEADER: &str = "x-event";

const REVIEW_COMMENT_CAP: usize = 20;
const ISSUE_COMMENT_FALLBACK_CAP: usize = 10;

/// `POST /webhook` (§4.15, §6.2). Returns 200 with `{received, event, ...}`,
/// 400 on a malformed body, 401 on a bad signature.
pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, IntakeError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    if !state.config.development_mode {
        let secret = state
            .config
            .webhook_secret
            .as_deref()
            .ok_or(IntakeError::BadSignature)?;
        let signature = signature.ok_or(IntakeError::BadSignature)?;
        if !crate::signature::verify_signature(&body, signature, secret) {
            return Err(IntakeError::BadSignature);
        }
    }

    let event = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| IntakeError::Malformed(format!("invalid JSON body: {e}")))?;

    let response = match event.as_str() {
        "pull_request" => handle_pull_request(&state, &payload).await?,
        "installation" => handle_installation(&state, &payload).await?,
        "ping" => json!({ "received": true, "event": "ping" }),
        other => {
            info!(event = other, "ignoring unrecognized webhook event");
            json!({ "received": true, "event": other, "ignored": true })
        }
    };

    Ok(Json(response))
}

fn repo_from_payload(payload: &Value) -> Result<(String, String), IntakeError> {
    if let Some(full_name) = payload["repository"]["full_name"].as_str() {
        if let Some((owner, name)) = full_name.split_once('/') {
            return Ok((owner.to_string(), name.to_string()));
        }
    }
    let owner = payload["repository"]["owner"]["login"]
        .as_str()
        .ok_or_else(|| IntakeError::Malformed("missing repository.owner.login".to_string()))?;
    let name = payload["repository"]["name"]
        .as_str()
        .ok_or_else(|| IntakeError::Malformed("missing repository.name".to_string()))?;
    Ok((owner.to_string(), name.to_string()))
}

/// `pull_request` events (§4.15): `opened`/`synchronize`/`reopened` create
/// an analysis record (PENDING) and run inline analysis asynchronously;
/// anything else (e.g. `closed`, S5) is acknowledged and ignored.
async fn handle_pull_request(state: &Arc<AppState>, payload: &Value) -> Result<Value, IntakeError> {
    let action = payload["action"].as_str().unwrap_or_default().to_string();
    let (owner, repo) = repo_from_payload(payload)?;

    if !matches!(action.as_str(), "opened" | "synchronize" | "reopened") {
        return Ok(json!({ "received": true, "event": "pull_request", "action": action, "ignored": true }));
    }

    let pr_number = payload["pull_request"]["number"]
        .as_u64()
        .or_else(|| payload["number"].as_u64())
        .ok_or_else(|| IntakeError::Malformed("missing pull_request.number".to_string()))?;
    let head_sha = payload["pull_request"]["head"]["sha"]
        .as_str()
        .ok_or_else(|| IntakeError::Malformed("missing pull_request.head.sha".to_string()))?
        .to_string();

    let project = get_or_create_project(state, &owner, &repo).await?;
    let analysis = state
        .store
        .create_analysis(project.id, &head_sha, pr_number)
        .await?;

    let analysis_id = analysis.id;
    let state = Arc::clone(state);
    let (owner_bg, repo_bg, head_sha_bg) = (owner.clone(), repo.clone(), head_sha.clone());
    tokio::spawn(async move {
        if let Err(e) = run_inline_analysis(&state, &owner_bg, &repo_bg, pr_number, &head_sha_bg, analysis_id).await {
            error!(owner = %owner_bg, repo = %repo_bg, pr_number, error = %e, "inline analysis failed");
            let _ = state.store.update_analysis_status(analysis_id, AnalysisStatus::Failure).await;
        }
    });

    Ok(json!({
        "received": true,
        "event": "pull_request",
        "action": action,
        "analysis_id": analysis_id,
    }))
}

async fn get_or_create_project(state: &AppState, owner: &str, name: &str) -> Result<Project, IntakeError> {
    if let Some(project) = state.store.get_project_by_repo(owner, name).await? {
        return Ok(project);
    }
    // No prior `installation` webhook on record for this repo; upsert with
    // an empty installation id rather than fail the PR event outright.
    state
        .store
        .upsert_installation("", &[(owner.to_string(), name.to_string())])
        .await?;
    state
        .store
        .get_project_by_repo(owner, name)
        .await?
        .ok_or_else(|| IntakeError::Internal("project creation raced out from under us".to_string()))
}

/// Runs the regex-detector pass over every supported changed file, persists
/// violations, and posts the status + review/comment (§4.15).
async fn run_inline_analysis(
    state: &Arc<AppState>,
    owner: &str,
    repo: &str,
    pr_number: u64,
    head_sha: &str,
    analysis_id: Uuid,
) -> Result<(), IntakeError> {
    let bootstrap = state.forge_client(None);
    let installation_id = bootstrap.list_installation(owner, repo).await.ok();
    let forge = state.forge_client(installation_id);

    if let Err(e) = forge
        .create_commit_status(
            owner,
            repo,
            head_sha,
            StatusState::Pending,
            "Analyzing changed files",
            heal::model::STATUS_CONTEXT,
            state.config.target_url.as_deref(),
        )
        .await
    {
        warn!(error = %e, "failed to post pending status");
    }

    let files = forge.list_pr_files(owner, repo, pr_number).await?;
    let grammars = detect::grammar::GrammarRegistry::new();

    let mut raw_violations = Vec::new();
    for file in &files {
        if file.status == "removed" {
            continue;
        }
        let Some(extension) = std::path::Path::new(&file.filename)
            .extension()
            .and_then(|e| e.to_str())
        else {
            continue;
        };
        if grammars.language_for_extension(extension).is_none() {
            continue;
        }
        let Ok(content) = forge.get_file_content(owner, repo, &file.filename, head_sha).await else {
            continue;
        };
        let text = String::from_utf8_lossy(&content.content);
        raw_violations.extend(detect::regex_detector::scan(&text, &file.filename));
    }

    let stored: Vec<StoredViolation> = raw_violations
        .iter()
        .map(|v| StoredViolation {
            analysis_id: analysis_id.to_string(),
            rule_id: v.rule_id.clone(),
            file: v.file.clone(),
            line: v.line,
            message: v.message.clone(),
        })
        .collect();
    state.store.record_violations(stored.clone()).await?;

    if stored.is_empty() {
        forge
            .create_commit_status(
                owner,
                repo,
                head_sha,
                StatusState::Success,
                "No issues found",
                heal::model::STATUS_CONTEXT,
                state.config.target_url.as_deref(),
            )
            .await?;
        forge
            .create_issue_comment(owner, repo, pr_number, "CodeGuard Pro found no issues in this pull request.")
            .await?;
    } else {
        forge
            .create_commit_status(
                owner,
                repo,
                head_sha,
                StatusState::Failure,
                &format!("{} issue(s) found", stored.len()),
                heal::model::STATUS_CONTEXT,
                state.config.target_url.as_deref(),
            )
            .await?;

        let capped: Vec<&StoredViolation> = stored.iter().take(REVIEW_COMMENT_CAP).collect();
        let comments: Vec<ReviewComment> = capped
            .iter()
            .map(|v| ReviewComment {
                path: v.file.clone(),
                line: v.line,
                body: v.message.clone(),
            })
            .collect();

        if let Err(e) = forge.create_review(owner, repo, pr_number, head_sha, &comments).await {
            warn!(error = %e, "review API failed, falling back to an issue comment");
            let body = summarize_violations(&stored);
            forge.create_issue_comment(owner, repo, pr_number, &body).await?;
        }
    }

    state.store.update_analysis_status(analysis_id, AnalysisStatus::Success).await?;

    state.notifier.notify(notify::NotifyEvent::InlineAnalysisCompleted {
        repository: format!("{owner}/{repo}"),
        pr_number,
        violation_count: stored.len() as u32,
        timestamp: chrono::Utc::now(),
    });

    Ok(())
}

/// Truncates at 10 items + "and N more" for the issue-comment fallback
/// (§5 bounded work).
fn summarize_violations(violations: &[StoredViolation]) -> String {
    let mut body = format!("CodeGuard Pro found {} issue(s) in this pull request:\n\n", violations.len());
    for v in violations.iter().take(ISSUE_COMMENT_FALLBACK_CAP) {
        body.push_str(&format!("- `{}:{}`: {}\n", v.file, v.line, v.message));
    }
    let remaining = violations.len().saturating_sub(ISSUE_COMMENT_FALLBACK_CAP);
    if remaining > 0 {
        body.push_str(&format!("\n...and {remaining} more\n"));
    }
    body
}

/// `installation` events (§4.15). `created`/`added` upsert projects and
/// seed default rules only for newly created ones (idempotent, §8
/// invariant 7 / S6); `removed`/`deleted` are logged only.
async fn handle_installation(state: &AppState, payload: &Value) -> Result<Value, IntakeError> {
    let action = payload["action"].as_str().unwrap_or_default().to_string();
    let installation_id = payload["installation"]["id"]
        .as_u64()
        .map(|id| id.to_string())
        .unwrap_or_default();

    match action.as_str() {
        "created" | "added" => {
            let repos = extract_repos(payload, &action);
            let created = state.store.upsert_installation(&installation_id, &repos).await?;

            for ((owner, name), was_created) in repos.iter().zip(created) {
                if !was_created {
                    continue;
                }
                if let Some(project) = state.store.get_project_by_repo(owner, name).await? {
                    state.store.seed_default_rules(project.id).await?;
                }
            }

            Ok(json!({ "received": true, "event": "installation", "action": action, "repos": repos.len() }))
        }
        "removed" | "deleted" => {
            info!(installation_id, action = %action, "installation removed");
            Ok(json!({ "received": true, "event": "installation", "action": action }))
        }
        other => Ok(json!({ "received": true, "event": "installation", "action": other, "ignored": true })),
    }
}

/// `created` carries `repositories`; `added` carries `repositories_added`.
fn extract_repos(payload: &Value, action: &str) -> Vec<(String, String)> {
    let key = if action == "added" { "repositories_added" } else { "repositories" };
    payload[key]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|repo| {
            let full_name = repo["full_name"].as_str()?;
            let (owner, name) = full_name.split_once('/')?;
            Some((owner.to_string(), name.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_from_payload_parses_full_name() {
        let payload = json!({ "repository": { "full_name": "acme/widgets" } });
        assert_eq!(repo_from_payload(&payload).unwrap(), ("acme".to_string(), "widgets".to_string()));
    }

    #[test]
    fn extract_repos_reads_repositories_added_for_the_added_action() {
        let payload = json!({
            "repositories_added": [
                { "full_name": "acme/widgets" },
                { "full_name": "acme/gadgets" },
            ]
        });
        let repos = extract_repos(&payload, "added");
        assert_eq!(repos, vec![
            ("acme".to_string(), "widgets".to_string()),
            ("acme".to_string(), "gadgets".to_string()),
        ]);
    }

    #[test]
    fn summarize_violations_truncates_at_ten_with_a_remainder_note() {
        let violations: Vec<StoredViolation> = (0..12)
            .map(|i| StoredViolation {
                analysis_id: "a".to_string(),
                rule_id: "r".to_string(),
                file: format!("f{i}.js"),
                line: 1,
                message: "m".to_string(),
            })
            .collect();
        let body = summarize_violations(&violations);
        assert!(body.contains("and 2 more"));
    }
}
