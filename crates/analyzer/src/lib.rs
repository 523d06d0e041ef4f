//! Walks a repository's working tree, runs `detect::AstEngine` (with a
//! regex fallback) per file, and classifies raw violations into typed
//! `Issue`s (§4.9).

use std::path::Path;

use walkdir::WalkDir;

use detect::ast_engine::{AnalyzeOptions, AstEngine};
use detect::classify::classify_violation;
use detect::grammar::GrammarRegistry;
use detect::model::{Issue, IssueSource, RawViolation, RuleCategory};
use detect::regex_detector;
use detect::rules::QueryRegistry;

const MAX_DEPTH: usize = 10;
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
const CATEGORIES: &[RuleCategory] = &[
    RuleCategory::Security,
    RuleCategory::BestPractice,
    RuleCategory::Style,
    RuleCategory::Naming,
    RuleCategory::Performance,
];

/// Walks the working tree (excluding test-looking paths) and classifies
/// every finding into an `Issue` the healing orchestrator can act on.
pub struct RepoAnalyzer {
    grammars: GrammarRegistry,
    queries: QueryRegistry,
}

impl RepoAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        let grammars = GrammarRegistry::new();
        let queries = QueryRegistry::load(&grammars);
        Self { grammars, queries }
    }

    /// Analyze every non-test source file under `repo_path`.
    #[must_use]
    pub fn analyze(&self, repo_path: &Path) -> Vec<Issue> {
        let engine = AstEngine::new(&self.grammars, &self.queries);
        let mut issues = Vec::new();

        for entry in WalkDir::new(repo_path)
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
        {
            let path = entry.path();
            let rel = path
                .strip_prefix(repo_path)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned();

            if looks_like_test(&rel) {
                continue;
            }

            let Ok(content) = std::fs::read_to_string(path) else {
                continue;
            };

            for violation in self.analyze_file(&engine, &content, &rel) {
                issues.push(to_issue(violation));
            }
        }

        issues
    }

    fn analyze_file(&self, engine: &AstEngine<'_>, content: &str, rel_path: &str) -> Vec<RawViolation> {
        let options = AnalyzeOptions {
            language: None,
            categories: Some(CATEGORIES.to_vec()),
            rule_ids: None,
        };
        let result = engine.analyze(content, rel_path, &options);

        if result.violations.is_empty() && (!result.ast_supported || result.error.is_some()) {
            return regex_detector::scan(content, rel_path);
        }
        result.violations
    }
}

impl Default for RepoAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn looks_like_test(rel_path: &str) -> bool {
    let lower = rel_path.to_lowercase();
    lower.contains("test") || lower.contains("spec") || lower.contains("__tests__")
}

fn to_issue(violation: RawViolation) -> Issue {
    let bug_type = classify_violation(&violation);
    let source = match violation.engine {
        "regex" => IssueSource::Regex,
        _ => IssueSource::Ast,
    };
    Issue {
        file: violation.file,
        line: violation.line,
        bug_type,
        description: violation.message,
        code_snippet: violation.snippet,
        severity: violation.severity,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn skips_test_looking_paths() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("app.test.js"), "console.log('x')").unwrap();
        let analyzer = RepoAnalyzer::new();
        let issues = analyzer.analyze(dir.path());
        assert!(issues.is_empty());
    }

    #[test]
    fn finds_debug_print_via_regex_fallback_for_unsupported_extension() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("script.rb"), "eval(\"puts 1\")\n").unwrap();
        let analyzer = RepoAnalyzer::new();
        let issues = analyzer.analyze(dir.path());
        assert!(issues.iter().any(|i| i.description.contains("eval")));
    }
}
