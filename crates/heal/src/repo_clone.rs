//! Clones a repository into a scratch directory ahead of orchestration.
//! Shells out to the `git` binary directly, the same process-spawn idiom
//! `sandbox::Sandbox` uses for its container runtime probes.

use std::process::Stdio;
use std::time::Duration;

use tempfile::TempDir;

use crate::error::{HealError, HealResult};

const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(120);

/// A shallow clone of a repository, held alive for the lifetime of one
/// heal session. Dropping it removes the scratch directory.
pub struct ClonedRepo {
    dir: TempDir,
}

impl ClonedRepo {
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

/// `git clone --depth 1 <url> <dir>`, bounded by `timeout`.
pub async fn clone_repo(url: &str, branch: Option<&str>, timeout: Duration) -> HealResult<ClonedRepo> {
    let dir = TempDir::new().map_err(|e| HealError::Fatal(format!("failed to create scratch dir: {e}")))?;

    let mut command = tokio::process::Command::new("git");
    command
        .arg("clone")
        .arg("--depth")
        .arg("1")
        .arg("--single-branch");
    if let Some(branch) = branch {
        command.arg("--branch").arg(branch);
    }
    command
        .arg(url)
        .arg(dir.path())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| HealError::Fatal("git clone timed out".to_string()))?
        .map_err(|e| HealError::Fatal(format!("failed to spawn git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(HealError::Fatal(format!("git clone failed: {stderr}")));
    }

    Ok(ClonedRepo { dir })
}

#[must_use]
pub fn default_clone_timeout() -> Duration {
    DEFAULT_CLONE_TIMEOUT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_two_minutes() {
        assert_eq!(default_clone_timeout(), Duration::from_secs(120));
    }
}
