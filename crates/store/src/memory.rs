//! In-memory `Store` implementation, grounded on the teacher's
//! `Arc<RwLock<HashMap<..>>>` tracked-state idiom.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use detect::model::{RuleCategory, Severity};

use crate::error::StoreResult;
use crate::model::{Analysis, AnalysisStatus, Project, Rule, Violation};
use crate::Store;

#[derive(Default)]
struct State {
    projects_by_repo: HashMap<(String, String), Uuid>,
    projects: HashMap<Uuid, Project>,
    rules: HashMap<Uuid, Vec<Rule>>,
    analyses: HashMap<Uuid, Analysis>,
    violations: Vec<Violation>,
}

/// Test/dev-mode `Store` backed by process memory. Nothing survives a
/// restart — acceptable since the spec treats the relational layer as an
/// opaque external collaborator (§1).
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn upsert_installation(
        &self,
        installation_id: &str,
        repos: &[(String, String)],
    ) -> StoreResult<Vec<bool>> {
        let mut state = self.state.write().await;
        let mut created = Vec::with_capacity(repos.len());

        for (owner, name) in repos {
            let key = (owner.clone(), name.clone());
            if let Some(id) = state.projects_by_repo.get(&key) {
                if let Some(project) = state.projects.get_mut(id) {
                    project.installation_id = installation_id.to_string();
                }
                created.push(false);
                continue;
            }

            let id = Uuid::new_v4();
            state.projects_by_repo.insert(key, id);
            state.projects.insert(
                id,
                Project {
                    id,
                    repo_owner: owner.clone(),
                    repo_name: name.clone(),
                    installation_id: installation_id.to_string(),
                },
            );
            created.push(true);
        }

        Ok(created)
    }

    async fn get_project_by_repo(&self, owner: &str, name: &str) -> StoreResult<Option<Project>> {
        let state = self.state.read().await;
        let key = (owner.to_string(), name.to_string());
        Ok(state
            .projects_by_repo
            .get(&key)
            .and_then(|id| state.projects.get(id))
            .cloned())
    }

    async fn seed_default_rules(&self, project_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.rules.entry(project_id).or_insert_with(default_rule_set);
        Ok(())
    }

    async fn list_rules(&self, project_id: Uuid) -> StoreResult<Vec<Rule>> {
        let state = self.state.read().await;
        Ok(state.rules.get(&project_id).cloned().unwrap_or_default())
    }

    async fn create_analysis(
        &self,
        project_id: Uuid,
        commit_hash: &str,
        pr_number: u64,
    ) -> StoreResult<Analysis> {
        let mut state = self.state.write().await;
        let analysis = Analysis {
            id: Uuid::new_v4(),
            project_id,
            commit_hash: commit_hash.to_string(),
            pr_number,
            status: AnalysisStatus::Pending,
            created_at: Utc::now(),
        };
        state.analyses.insert(analysis.id, analysis.clone());
        Ok(analysis)
    }

    async fn update_analysis_status(&self, id: Uuid, status: AnalysisStatus) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if let Some(analysis) = state.analyses.get_mut(&id) {
            analysis.status = status;
        }
        Ok(())
    }

    async fn record_violations(&self, violations: Vec<Violation>) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.violations.extend(violations);
        Ok(())
    }
}

fn default_rule_set() -> Vec<Rule> {
    vec![
        Rule {
            id: "seed-sec-001".to_string(),
            name: "no-hardcoded-secrets".to_string(),
            category: RuleCategory::Security,
            severity: Severity::Critical,
            language: "*".to_string(),
            pattern_source: String::new(),
            message: "hardcoded credential-like literal".to_string(),
        },
        Rule {
            id: "seed-bp-001".to_string(),
            name: "no-empty-catch".to_string(),
            category: RuleCategory::BestPractice,
            severity: Severity::Warning,
            language: "*".to_string(),
            pattern_source: String::new(),
            message: "empty catch block silently swallows errors".to_string(),
        },
        Rule {
            id: "seed-style-001".to_string(),
            name: "no-debug-statements".to_string(),
            category: RuleCategory::Style,
            severity: Severity::Info,
            language: "*".to_string(),
            pattern_source: String::new(),
            message: "debug statement left in source".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn installation_upsert_is_idempotent() {
        let store = InMemoryStore::new();
        let repos = vec![("acme".to_string(), "widgets".to_string())];

        let first = store.upsert_installation("inst-1", &repos).await.unwrap();
        assert_eq!(first, vec![true]);

        let second = store.upsert_installation("inst-1", &repos).await.unwrap();
        assert_eq!(second, vec![false]);

        let project = store.get_project_by_repo("acme", "widgets").await.unwrap();
        assert!(project.is_some());
    }

    #[tokio::test]
    async fn seeding_is_idempotent_and_only_for_new_projects() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();
        store.seed_default_rules(id).await.unwrap();
        store.seed_default_rules(id).await.unwrap();
        let rules = store.list_rules(id).await.unwrap();
        assert_eq!(rules.len(), 3);
    }

    #[tokio::test]
    async fn analysis_lifecycle() {
        let store = InMemoryStore::new();
        let project_id = Uuid::new_v4();
        let analysis = store.create_analysis(project_id, "abc123", 7).await.unwrap();
        assert_eq!(analysis.status, AnalysisStatus::Pending);

        store
            .update_analysis_status(analysis.id, AnalysisStatus::Success)
            .await
            .unwrap();
    }
}
