//! Error taxonomy for the healing orchestrator (§7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HealError {
    #[error("invalid heal request: {0}")]
    Validation(String),

    #[error(transparent)]
    Forge(#[from] scm::ForgeError),

    #[error("sandbox error: {0}")]
    Sandbox(#[from] sandbox::SandboxError),

    #[error("fix generation failed: {0}")]
    FixGeneration(String),

    #[error("unrecoverable error: {0}")]
    Fatal(String),
}

pub type HealResult<T> = Result<T, HealError>;
