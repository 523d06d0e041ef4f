//! Bounded test-file discovery (§4.8 step 2).

use std::path::Path;

use walkdir::WalkDir;

use crate::project::ProjectType;

const MAX_DEPTH: usize = 8;
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
];

/// Walk the tree (skipping the standard ignore list, depth-capped) looking
/// for files matching the project type's test-file patterns.
#[must_use]
pub fn discover_test_files(repo_path: &Path, project_type: ProjectType) -> Vec<String> {
    WalkDir::new(repo_path)
        .max_depth(MAX_DEPTH)
        .into_iter()
        .filter_entry(|e| {
            e.file_name()
                .to_str()
                .map(|name| !SKIP_DIRS.contains(&name))
                .unwrap_or(true)
        })
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| matches_test_pattern(e.file_name().to_str().unwrap_or(""), project_type))
        .map(|e| e.path().to_string_lossy().into_owned())
        .collect()
}

fn matches_test_pattern(filename: &str, project_type: ProjectType) -> bool {
    match project_type {
        ProjectType::Node => {
            filename.contains(".test.") || filename.contains(".spec.") || filename.ends_with("__tests__")
        }
        ProjectType::Python => filename.starts_with("test_") || filename.ends_with("_test.py"),
        ProjectType::Java => filename.ends_with("Test.java") || filename.ends_with("Tests.java"),
        ProjectType::Go => filename.ends_with("_test.go"),
        ProjectType::Rust => filename.ends_with(".rs"),
        ProjectType::Make | ProjectType::Unknown => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn finds_jest_style_tests_and_skips_node_modules() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("app.test.js"), "").unwrap();
        std::fs::create_dir(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules/lib.test.js"), "").unwrap();

        let found = discover_test_files(dir.path(), ProjectType::Node);
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("app.test.js"));
    }
}
