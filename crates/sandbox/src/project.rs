//! Project-type detection (§4.8 step 1).

use std::path::Path;

/// The kind of project a repository's marker files imply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectType {
    Node,
    Python,
    Java,
    Go,
    Rust,
    Make,
    Unknown,
}

/// Probe marker files in the order spec.md §4.8 requires: node, python,
/// java, go, rust, make, else unknown. First match wins.
#[must_use]
pub fn detect_project_type(repo_path: &Path) -> ProjectType {
    let has = |name: &str| repo_path.join(name).exists();

    if has("package.json") {
        ProjectType::Node
    } else if has("requirements.txt") || has("setup.py") || has("pyproject.toml") || has("Pipfile") {
        ProjectType::Python
    } else if has("pom.xml") || has("build.gradle") {
        ProjectType::Java
    } else if has("go.mod") {
        ProjectType::Go
    } else if has("Cargo.toml") {
        ProjectType::Rust
    } else if has("Makefile") {
        ProjectType::Make
    } else {
        ProjectType::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn detects_node_before_others() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        std::fs::write(dir.path().join("Makefile"), "").unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::Node);
    }

    #[test]
    fn unknown_when_no_markers_present() {
        let dir = tempdir().unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::Unknown);
    }
}
