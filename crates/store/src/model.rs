//! Persisted entities the core treats as opaque (§3): `Project`,
//! `Installation`, `Analysis`. `Rule` and `Violation` live in `detect` and
//! are re-exported here since that's the shape this trait persists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use detect::model::{Rule, Violation};

/// An external repository this service has been installed on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub repo_owner: String,
    pub repo_name: String,
    pub installation_id: String,
}

/// Opaque installation identifier, upserted on `installation.created/added`
/// webhooks (§4.15).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installation {
    pub id: String,
    pub repo_owner: String,
    pub repo_name: String,
}

/// Lifecycle status of one inline PR analysis (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Pending,
    Success,
    Failure,
}

/// A persisted inline analysis run. Transitions exactly once from
/// `Pending` to `Success` or `Failure` (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Uuid,
    pub project_id: Uuid,
    pub commit_hash: String,
    pub pr_number: u64,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
}
