//! Error taxonomy for sandboxed execution (§4.7, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    /// No container runtime binary (`docker`/`podman`) was found on `PATH`.
    #[error("no container runtime available")]
    RuntimeUnavailable,

    /// The container exceeded its wall-clock budget and was force-killed.
    #[error("sandbox timed out after {0}s")]
    Timeout(u64),

    /// Spawning or waiting on the container process failed.
    #[error("sandbox process error: {0}")]
    Process(String),

    /// The source tree could not be staged into the sandbox mount.
    #[error("failed to stage source tree: {0}")]
    Stage(String),
}

pub type SandboxResult<T> = Result<T, SandboxError>;
