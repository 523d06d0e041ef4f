//! Opens and updates the healing PR (§4.12), rendering its body from
//! current session state with `handlebars` — the teacher's established
//! engine for generated markdown bodies.

use handlebars::Handlebars;
use scm::types::PrInfo;
use scm::ForgeClient;
use serde_json::json;

use crate::error::HealResult;
use crate::model::{CiStatus, FixStatus};
use crate::session::HealSession;

const PR_BODY_TEMPLATE: &str = r#"## CodeGuard Pro automated healing

**Issues detected:** {{issue_count}}
**Fixes applied:** {{applied_count}}
**Retry:** {{retry_count}} / {{max_retries}}
**CI status:** {{ci_status}}

### Fixes by file
{{#each files}}
- `{{this.path}}`
{{#each this.fixes}}
  - {{this.status}}: {{this.commit_message}}
{{/each}}
{{/each}}

### CI timeline
{{#each timeline}}
- iteration {{this.iteration}} ({{this.timestamp}}): {{this.status}}
{{/each}}
"#;

pub struct PrCreator<'a> {
    forge: &'a ForgeClient,
    owner: String,
    repo: String,
    templates: Handlebars<'static>,
}

impl<'a> PrCreator<'a> {
    #[must_use]
    pub fn new(forge: &'a ForgeClient, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        let mut templates = Handlebars::new();
        templates
            .register_template_string("pr_body", PR_BODY_TEMPLATE)
            .expect("PR body template is valid handlebars");
        Self {
            forge,
            owner: owner.into(),
            repo: repo.into(),
            templates,
        }
    }

    /// Opens a PR from the healing branch to the default branch (§4.12,
    /// §4.14 node 4: only called the first time a fix is applied).
    pub async fn create_pr(&self, session: &HealSession) -> HealResult<PrInfo> {
        let title = format!("CodeGuard Pro: automated fixes for {}", session.repo_name);
        let body = self.render_body(session);
        let pr = self
            .forge
            .create_pr(&self.owner, &self.repo, &session.ai_branch, &session.default_branch, &title, &body)
            .await?;
        Ok(pr)
    }

    pub async fn update_pr_body(&self, pr_number: u64, session: &HealSession) -> HealResult<()> {
        let body = self.render_body(session);
        self.forge.update_pr(&self.owner, &self.repo, pr_number, &body).await?;
        Ok(())
    }

    fn render_body(&self, session: &HealSession) -> String {
        let applied_count = session
            .fixes
            .iter()
            .filter(|f| f.status == FixStatus::Applied)
            .count();

        let mut by_file: std::collections::BTreeMap<String, Vec<&crate::model::Fix>> =
            std::collections::BTreeMap::new();
        for fix in &session.fixes {
            by_file.entry(fix.file.clone()).or_default().push(fix);
        }
        let files: Vec<_> = by_file
            .into_iter()
            .map(|(path, fixes)| {
                json!({
                    "path": path,
                    "fixes": fixes.iter().map(|f| json!({
                        "status": status_label(f.status),
                        "commit_message": f.commit_message,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();

        let timeline: Vec<_> = session
            .ci_timeline
            .iter()
            .map(|t| {
                json!({
                    "iteration": t.iteration,
                    "timestamp": t.timestamp.to_rfc3339(),
                    "status": status_label_ci(t.status),
                })
            })
            .collect();

        let data = json!({
            "issue_count": session.issues.len(),
            "applied_count": applied_count,
            "retry_count": session.retry_count,
            "max_retries": crate::model::MAX_RETRIES,
            "ci_status": status_label_ci(session.ci_status),
            "files": files,
            "timeline": timeline,
        });

        self.templates
            .render("pr_body", &data)
            .unwrap_or_else(|_| "CodeGuard Pro automated healing".to_string())
    }
}

fn status_label(status: FixStatus) -> &'static str {
    match status {
        FixStatus::Applied => "applied",
        FixStatus::Unfixable => "unfixable",
        FixStatus::Skipped => "skipped",
        FixStatus::Error => "error",
        FixStatus::CommitFailed => "commit_failed",
    }
}

fn status_label_ci(status: CiStatus) -> &'static str {
    match status {
        CiStatus::Pending => "PENDING",
        CiStatus::Passed => "PASSED",
        CiStatus::Failed => "FAILED",
        CiStatus::NoCi => "NO_CI",
        CiStatus::Skipped => "SKIPPED",
    }
}
