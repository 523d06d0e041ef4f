//! Orchestrates project-type detection, test discovery, sandboxed
//! execution, and failure parsing (§4.8).

use std::path::Path;
use std::process::Stdio;

use tracing::{info, warn};

use crate::discovery::discover_test_files;
use crate::failures::{parse, Failure};
use crate::project::{detect_project_type, ProjectType};
use crate::sandbox::{Sandbox, SandboxOutput};

/// Result of one `TestRunner::run` invocation.
#[derive(Debug, Clone, Default)]
pub struct TestRunResult {
    pub project_type_detected: bool,
    pub test_files_found: usize,
    pub raw_output: String,
    pub failures: Vec<Failure>,
    pub ran_in_sandbox: bool,
}

pub struct TestRunner {
    sandbox: Option<Sandbox>,
}

impl TestRunner {
    /// Build a runner, detecting the container runtime once. If none is
    /// available the runner falls back to direct execution — explicit and
    /// logged, per §4.7's fallback allowance.
    pub async fn new() -> Self {
        match Sandbox::detect().await {
            Ok(sandbox) => Self { sandbox: Some(sandbox) },
            Err(e) => {
                warn!(error = %e, "container runtime unavailable, falling back to direct execution");
                Self { sandbox: None }
            }
        }
    }

    /// Run the repository's native test command and parse failures.
    pub async fn run(&self, repo_local_path: &str) -> TestRunResult {
        let path = Path::new(repo_local_path);
        let project_type = detect_project_type(path);
        if project_type == ProjectType::Unknown {
            return TestRunResult {
                project_type_detected: false,
                ..Default::default()
            };
        }

        let test_files = discover_test_files(path, project_type);
        if test_files.is_empty() {
            info!(repo_local_path, "no test files discovered, skipping run");
            return TestRunResult {
                project_type_detected: true,
                ..Default::default()
            };
        }

        let (output, ran_in_sandbox) = self.execute(repo_local_path, project_type).await;
        let combined = format!("{}\n{}", output.stdout, output.stderr);
        let failures = if output.timed_out {
            vec![Failure {
                file: None,
                line: None,
                message: "sandbox timed out before tests completed".to_string(),
            }]
        } else {
            parse(&combined, project_type)
        };

        TestRunResult {
            project_type_detected: true,
            test_files_found: test_files.len(),
            raw_output: combined,
            failures,
            ran_in_sandbox,
        }
    }

    async fn execute(&self, repo_local_path: &str, project_type: ProjectType) -> (SandboxOutput, bool) {
        if let Some(sandbox) = &self.sandbox {
            if let Ok(output) = sandbox.run_tests(repo_local_path, project_type).await {
                return (output, true);
            }
            warn!("sandbox run failed, falling back to direct execution");
        }
        (direct_execute(repo_local_path, project_type).await, false)
    }
}

async fn direct_execute(repo_local_path: &str, project_type: ProjectType) -> SandboxOutput {
    let command = match project_type {
        ProjectType::Node => "npm test",
        ProjectType::Python => "python -m pytest",
        ProjectType::Java => "mvn -q test",
        ProjectType::Go => "go test ./...",
        ProjectType::Rust => "cargo test",
        ProjectType::Make => "make test",
        ProjectType::Unknown => "true",
    };

    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(repo_local_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    match output {
        Ok(output) => SandboxOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
            timed_out: false,
        },
        Err(e) => SandboxOutput {
            stderr: e.to_string(),
            exit_code: -1,
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_project_type_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TestRunner { sandbox: None };
        let result = runner.run(dir.path().to_str().unwrap()).await;
        assert!(!result.project_type_detected);
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn no_test_files_yields_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let runner = TestRunner { sandbox: None };
        let result = runner.run(dir.path().to_str().unwrap()).await;
        assert!(result.project_type_detected);
        assert_eq!(result.test_files_found, 0);
    }
}
