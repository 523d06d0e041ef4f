//! Typed client over the subset of the forge REST surface the core needs (§4.2).

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::credentials::CredentialBroker;
use crate::error::{ForgeError, ForgeResult};
use crate::types::{
    Annotation, BlobInfo, CheckRun, CombinedStatus, CommitInfo, FileContent, PrFile, PrInfo,
    RefInfo, RepoInfo, ReviewComment, StatusState, TreeEntry, TreeInfo,
};

const MAX_RETRIES: u32 = 3;

/// Typed client over the forge's refs/blobs/trees/commits/contents/checks/
/// statuses/PRs/reviews surface. Every call attaches a freshly-broked
/// installation token and retries transient transport/5xx failures with
/// exponential backoff before surfacing an [`ForgeError::Upstream`].
pub struct ForgeClient {
    http: reqwest::Client,
    api_base: String,
    credentials: Arc<CredentialBroker>,
    installation_id: Option<String>,
}

impl ForgeClient {
    /// Build a client scoped to one installation (or none, for the
    /// fallback-token path).
    #[must_use]
    pub fn new(
        api_base: impl Into<String>,
        credentials: Arc<CredentialBroker>,
        installation_id: Option<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            credentials,
            installation_id,
        }
    }

    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> ForgeResult<Value> {
        let token = self.credentials.token(self.installation_id.as_deref()).await?;
        let url = format!("{}{path}", self.api_base);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut req = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&token)
                .header("Accept", "application/vnd.github+json")
                .header("User-Agent", "codeguard-pro");
            if let Some(b) = &body {
                req = req.json(b);
            }

            let result = req.send().await;

            let resp = match result {
                Ok(resp) => resp,
                Err(e) if attempt < MAX_RETRIES => {
                    warn!(attempt, error = %e, "transport error, retrying");
                    tokio::time::sleep(backoff(attempt)).await;
                    continue;
                }
                Err(e) => return Err(ForgeError::Upstream(e.to_string())),
            };

            let status = resp.status();
            if status.is_success() {
                if status == StatusCode::NO_CONTENT {
                    return Ok(Value::Null);
                }
                return resp.json::<Value>().await.map_err(ForgeError::from_json);
            }

            if status.is_server_error() && attempt < MAX_RETRIES {
                warn!(attempt, %status, "upstream 5xx, retrying");
                tokio::time::sleep(backoff(attempt)).await;
                continue;
            }

            let text = resp.text().await.unwrap_or_default();
            return Err(map_status_error(status, text));
        }
    }

    // -- repo / refs --------------------------------------------------

    /// `getRepo(owner,name) -> {defaultBranch, id}`
    pub async fn get_repo(&self, owner: &str, name: &str) -> ForgeResult<RepoInfo> {
        let path = format!("/repos/{owner}/{name}");
        let v = self.request(Method::GET, &path, None).await?;
        Ok(RepoInfo {
            id: v["id"].as_u64().unwrap_or_default(),
            default_branch: v["default_branch"].as_str().unwrap_or("main").to_string(),
        })
    }

    /// `getRef(owner,name,ref) -> {sha}`
    pub async fn get_ref(&self, owner: &str, name: &str, git_ref: &str) -> ForgeResult<RefInfo> {
        let path = format!("/repos/{owner}/{name}/git/ref/{git_ref}");
        let v = self.request(Method::GET, &path, None).await?;
        Ok(RefInfo {
            sha: v["object"]["sha"].as_str().unwrap_or_default().to_string(),
        })
    }

    /// `createRef`
    pub async fn create_ref(
        &self,
        owner: &str,
        name: &str,
        ref_name: &str,
        sha: &str,
    ) -> ForgeResult<RefInfo> {
        let path = format!("/repos/{owner}/{name}/git/refs");
        let body = json!({ "ref": format!("refs/{ref_name}"), "sha": sha });
        let v = self.request(Method::POST, &path, Some(body)).await?;
        Ok(RefInfo {
            sha: v["object"]["sha"].as_str().unwrap_or(sha).to_string(),
        })
    }

    /// `deleteRef`
    pub async fn delete_ref(&self, owner: &str, name: &str, git_ref: &str) -> ForgeResult<()> {
        let path = format!("/repos/{owner}/{name}/git/refs/{git_ref}");
        match self.request(Method::DELETE, &path, None).await {
            Ok(_) => Ok(()),
            Err(ForgeError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// `updateRef(sha)`
    pub async fn update_ref(
        &self,
        owner: &str,
        name: &str,
        git_ref: &str,
        sha: &str,
        force: bool,
    ) -> ForgeResult<RefInfo> {
        let path = format!("/repos/{owner}/{name}/git/refs/{git_ref}");
        let body = json!({ "sha": sha, "force": force });
        let v = self.request(Method::PATCH, &path, Some(body)).await?;
        Ok(RefInfo {
            sha: v["object"]["sha"].as_str().unwrap_or(sha).to_string(),
        })
    }

    // -- commits / trees / blobs ---------------------------------------

    /// `getCommit(sha) -> {tree_sha}`
    pub async fn get_commit(&self, owner: &str, name: &str, sha: &str) -> ForgeResult<CommitInfo> {
        let path = format!("/repos/{owner}/{name}/git/commits/{sha}");
        let v = self.request(Method::GET, &path, None).await?;
        Ok(CommitInfo {
            sha: v["sha"].as_str().unwrap_or(sha).to_string(),
            tree_sha: v["tree"]["sha"].as_str().unwrap_or_default().to_string(),
        })
    }

    /// `createCommit(tree,parents,msg) -> {sha}`
    pub async fn create_commit(
        &self,
        owner: &str,
        name: &str,
        tree_sha: &str,
        parents: &[String],
        message: &str,
    ) -> ForgeResult<CommitInfo> {
        let path = format!("/repos/{owner}/{name}/git/commits");
        let body = json!({ "message": message, "tree": tree_sha, "parents": parents });
        let v = self.request(Method::POST, &path, Some(body)).await?;
        Ok(CommitInfo {
            sha: v["sha"].as_str().unwrap_or_default().to_string(),
            tree_sha: v["tree"]["sha"].as_str().unwrap_or(tree_sha).to_string(),
        })
    }

    /// `createBlob(bytes) -> {sha}`
    pub async fn create_blob(&self, owner: &str, name: &str, bytes: &[u8]) -> ForgeResult<BlobInfo> {
        let path = format!("/repos/{owner}/{name}/git/blobs");
        let body = json!({ "content": BASE64.encode(bytes), "encoding": "base64" });
        let v = self.request(Method::POST, &path, Some(body)).await?;
        Ok(BlobInfo {
            sha: v["sha"].as_str().unwrap_or_default().to_string(),
        })
    }

    /// `createTree(base, entries) -> {sha}`
    pub async fn create_tree(
        &self,
        owner: &str,
        name: &str,
        base_tree: &str,
        entries: &[TreeEntry],
    ) -> ForgeResult<TreeInfo> {
        let path = format!("/repos/{owner}/{name}/git/trees");
        let body = json!({ "base_tree": base_tree, "tree": entries });
        let v = self.request(Method::POST, &path, Some(body)).await?;
        Ok(TreeInfo {
            sha: v["sha"].as_str().unwrap_or_default().to_string(),
        })
    }

    // -- contents --------------------------------------------------------

    /// `getFileContent(owner,name,path,ref) -> {content_bytes, sha}`
    pub async fn get_file_content(
        &self,
        owner: &str,
        name: &str,
        file_path: &str,
        git_ref: &str,
    ) -> ForgeResult<FileContent> {
        let encoded_path = urlencoding::encode(file_path);
        let path = format!("/repos/{owner}/{name}/contents/{encoded_path}?ref={git_ref}");
        let v = self.request(Method::GET, &path, None).await?;
        let encoded = v["content"].as_str().unwrap_or_default().replace('\n', "");
        let content = BASE64
            .decode(encoded)
            .map_err(|e| ForgeError::Validation(format!("bad base64 content: {e}")))?;
        Ok(FileContent {
            content,
            sha: v["sha"].as_str().unwrap_or_default().to_string(),
        })
    }

    /// `createOrUpdateFile(path, content_b64, ref, msg, prior_sha?)`
    pub async fn create_or_update_file(
        &self,
        owner: &str,
        name: &str,
        file_path: &str,
        content: &[u8],
        branch: &str,
        message: &str,
        prior_sha: Option<&str>,
    ) -> ForgeResult<CommitInfo> {
        let encoded_path = urlencoding::encode(file_path);
        let path = format!("/repos/{owner}/{name}/contents/{encoded_path}");
        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content),
            "branch": branch,
        });
        if let Some(sha) = prior_sha {
            body["sha"] = json!(sha);
        }
        let v = self.request(Method::PUT, &path, Some(body)).await?;
        Ok(CommitInfo {
            sha: v["commit"]["sha"].as_str().unwrap_or_default().to_string(),
            tree_sha: v["commit"]["tree"]["sha"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        })
    }

    // -- PR file listing ---------------------------------------------------

    /// `listPRFiles(owner,name,pr) -> [{filename,status}]`
    pub async fn list_pr_files(&self, owner: &str, name: &str, pr: u64) -> ForgeResult<Vec<PrFile>> {
        let path = format!("/repos/{owner}/{name}/pulls/{pr}/files?per_page=100");
        let v = self.request(Method::GET, &path, None).await?;
        let files = v
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|f| PrFile {
                filename: f["filename"].as_str().unwrap_or_default().to_string(),
                status: f["status"].as_str().unwrap_or_default().to_string(),
            })
            .collect();
        Ok(files)
    }

    // -- statuses / checks / PRs / reviews ---------------------------------

    /// `createCommitStatus(sha, state, description, context, target_url?)`
    pub async fn create_commit_status(
        &self,
        owner: &str,
        name: &str,
        sha: &str,
        state: StatusState,
        description: &str,
        context: &str,
        target_url: Option<&str>,
    ) -> ForgeResult<()> {
        let path = format!("/repos/{owner}/{name}/statuses/{sha}");
        let mut body = json!({
            "state": state,
            "description": description,
            "context": context,
        });
        if let Some(url) = target_url {
            body["target_url"] = json!(url);
        }
        self.request(Method::POST, &path, Some(body)).await?;
        Ok(())
    }

    /// `createPR(head,base,title,body) -> {number,url}`
    pub async fn create_pr(
        &self,
        owner: &str,
        name: &str,
        head: &str,
        base: &str,
        title: &str,
        body_text: &str,
    ) -> ForgeResult<PrInfo> {
        let path = format!("/repos/{owner}/{name}/pulls");
        let body = json!({ "head": head, "base": base, "title": title, "body": body_text });
        let v = self.request(Method::POST, &path, Some(body)).await?;
        Ok(PrInfo {
            number: v["number"].as_u64().unwrap_or_default(),
            url: v["html_url"].as_str().unwrap_or_default().to_string(),
        })
    }

    /// `updatePR(n, body)`
    pub async fn update_pr(&self, owner: &str, name: &str, pr: u64, body_text: &str) -> ForgeResult<()> {
        let path = format!("/repos/{owner}/{name}/pulls/{pr}");
        let body = json!({ "body": body_text });
        self.request(Method::PATCH, &path, Some(body)).await?;
        Ok(())
    }

    /// `createReview(pr, commit_sha, comments, event="COMMENT")`
    pub async fn create_review(
        &self,
        owner: &str,
        name: &str,
        pr: u64,
        commit_sha: &str,
        comments: &[ReviewComment],
    ) -> ForgeResult<()> {
        let path = format!("/repos/{owner}/{name}/pulls/{pr}/reviews");
        let body = json!({
            "commit_id": commit_sha,
            "event": "COMMENT",
            "comments": comments,
        });
        self.request(Method::POST, &path, Some(body)).await?;
        Ok(())
    }

    /// `createIssueComment(pr, body)`
    pub async fn create_issue_comment(&self, owner: &str, name: &str, pr: u64, body_text: &str) -> ForgeResult<()> {
        let path = format!("/repos/{owner}/{name}/issues/{pr}/comments");
        let body = json!({ "body": body_text });
        self.request(Method::POST, &path, Some(body)).await?;
        Ok(())
    }

    /// `listChecksForRef(sha)`
    pub async fn list_checks_for_ref(&self, owner: &str, name: &str, sha: &str) -> ForgeResult<Vec<CheckRun>> {
        let path = format!("/repos/{owner}/{name}/commits/{sha}/check-runs");
        let v = self.request(Method::GET, &path, None).await?;
        let runs = v["check_runs"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|c| CheckRun {
                id: c["id"].as_u64().unwrap_or_default(),
                name: c["name"].as_str().unwrap_or_default().to_string(),
                status: c["status"].as_str().unwrap_or_default().to_string(),
                conclusion: c["conclusion"].as_str().map(str::to_string),
                html_url: c["html_url"].as_str().map(str::to_string),
            })
            .collect();
        Ok(runs)
    }

    /// `listAnnotations(check_id)`
    pub async fn list_annotations(&self, owner: &str, name: &str, check_id: u64) -> ForgeResult<Vec<Annotation>> {
        let path = format!("/repos/{owner}/{name}/check-runs/{check_id}/annotations");
        let v = self.request(Method::GET, &path, None).await?;
        let annotations = v
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|a| Annotation {
                path: a["path"].as_str().unwrap_or_default().to_string(),
                start_line: a["start_line"].as_u64().unwrap_or_default() as u32,
                message: a["message"].as_str().unwrap_or_default().to_string(),
                annotation_level: a["annotation_level"].as_str().map(str::to_string),
            })
            .collect();
        Ok(annotations)
    }

    /// `getCombinedStatusForRef(sha)`
    pub async fn get_combined_status_for_ref(
        &self,
        owner: &str,
        name: &str,
        sha: &str,
    ) -> ForgeResult<CombinedStatus> {
        let path = format!("/repos/{owner}/{name}/commits/{sha}/status");
        let v = self.request(Method::GET, &path, None).await?;
        serde_json::from_value(v).map_err(ForgeError::from)
    }

    /// `listInstallation(repo) -> installation_id`
    pub async fn list_installation(&self, owner: &str, name: &str) -> ForgeResult<String> {
        let path = format!("/repos/{owner}/{name}/installation");
        let v = self.request(Method::GET, &path, None).await?;
        v["id"]
            .as_u64()
            .map(|id| id.to_string())
            .ok_or_else(|| ForgeError::NotFound(format!("no installation found for {owner}/{name}")))
    }
}

impl ForgeError {
    fn from_json(e: reqwest::Error) -> Self {
        ForgeError::Upstream(format!("failed to decode response: {e}"))
    }
}

fn map_status_error(status: StatusCode, body: String) -> ForgeError {
    match status {
        StatusCode::NOT_FOUND => ForgeError::NotFound(body),
        StatusCode::CONFLICT => ForgeError::Conflict(body),
        StatusCode::UNAUTHORIZED => ForgeError::Unauthorized(body),
        StatusCode::FORBIDDEN => ForgeError::Forbidden(body),
        StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => ForgeError::Validation(body),
        _ => {
            debug!(%status, "mapping unclassified status to Upstream");
            ForgeError::Upstream(format!("{status}: {body}"))
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(200u64.saturating_mul(1 << attempt.min(6)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialBroker;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_against(server: &MockServer) -> ForgeClient {
        let creds = Arc::new(CredentialBroker::new(
            None,
            None,
            Some("test-token".to_string()),
            server.uri(),
        ));
        ForgeClient::new(server.uri(), creds, None)
    }

    #[tokio::test]
    async fn get_repo_parses_default_branch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 42,
                "default_branch": "main",
            })))
            .mount(&server)
            .await;

        let client = client_against(&server).await;
        let repo = client.get_repo("acme", "widgets").await.unwrap();
        assert_eq!(repo.id, 42);
        assert_eq!(repo.default_branch, "main");
    }

    #[tokio::test]
    async fn not_found_maps_to_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such repo"))
            .mount(&server)
            .await;

        let client = client_against(&server).await;
        let err = client.get_repo("acme", "missing").await.unwrap_err();
        assert!(matches!(err, ForgeError::NotFound(_)));
    }

    #[tokio::test]
    async fn retries_5xx_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1,
                "default_branch": "main",
            })))
            .mount(&server)
            .await;

        let client = client_against(&server).await;
        let repo = client.get_repo("acme", "flaky").await.unwrap();
        assert_eq!(repo.id, 1);
    }
}
