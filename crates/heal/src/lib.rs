//! Healing orchestrator crate (§3, §4.9–§4.16): analyze a repository's
//! failures and static-analysis findings, then drive a bounded
//! fix → commit → PR → CI → retry loop.

pub mod branch_manager;
pub mod ci_agent;
pub mod context;
pub mod error;
pub mod fix_agent;
pub mod model;
pub mod naming;
pub mod orchestrator;
pub mod pr_creator;
pub mod repo_clone;
pub mod session;

pub use branch_manager::BranchManager;
pub use ci_agent::CiAgent;
pub use error::{HealError, HealResult};
pub use fix_agent::{FixBackend, LlmFixBackend, ProposedFix, RuleFixBackend};
pub use model::{
    CiResult, CiStatus, CiTimelineEntry, Fix, FixStatus, HealResultSchema, Issue, ProgressEvent, MAX_RETRIES,
};
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorState};
pub use pr_creator::PrCreator;
pub use repo_clone::{clone_repo, ClonedRepo};
pub use session::HealSession;
