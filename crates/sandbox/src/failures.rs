//! Per-language test-failure parsing (§4.8), reproducing the parsing rules
//! table exactly. Each parser is a pure function over captured stdout+stderr.

use std::sync::LazyLock;

use regex::Regex;

use crate::project::ProjectType;

/// One parsed test failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub message: String,
}

static JEST_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*●\s*(.+)$").unwrap());
static STACK_FRAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"at .*\(([^():]+):(\d+):\d+\)").unwrap());

static PY_FAILED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^FAILED\s+(\S+)::(\S+)").unwrap());
static PY_TRACEBACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"File "([^"]+)", line (\d+)"#).unwrap());

static JAVA_RESULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Tests run:\s*(\d+),.*Failures:\s*(\d+)").unwrap());
static JAVA_RUNNING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Running\s+([\w.]+)").unwrap());

static GO_FAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^--- FAIL:\s*(\S+)").unwrap());
static GO_LOCATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\S+\.go):(\d+):").unwrap());

static GENERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(error|fail).*?([\w./-]+\.\w+):(\d+)").unwrap());

/// Parse captured combined stdout+stderr into deduplicated failures, using
/// the language-specific parser for `project_type`.
#[must_use]
pub fn parse(combined_output: &str, project_type: ProjectType) -> Vec<Failure> {
    let raw = match project_type {
        ProjectType::Node => parse_node(combined_output),
        ProjectType::Python => parse_python(combined_output),
        ProjectType::Java => parse_java(combined_output),
        ProjectType::Go => parse_go(combined_output),
        ProjectType::Rust | ProjectType::Make | ProjectType::Unknown => parse_generic(combined_output),
    };
    dedup(raw)
}

fn parse_node(output: &str) -> Vec<Failure> {
    let lines: Vec<&str> = output.lines().collect();
    let mut failures = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = JEST_BLOCK.captures(line) {
            let name = caps[1].trim().to_string();
            // The stack frame naming file/line usually follows within a few lines.
            let location = lines[i..(i + 20).min(lines.len())]
                .iter()
                .find_map(|l| STACK_FRAME.captures(l));
            match location {
                Some(loc) => failures.push(Failure {
                    file: Some(loc[1].to_string()),
                    line: loc[2].parse().ok(),
                    message: name,
                }),
                None => failures.push(Failure {
                    file: None,
                    line: None,
                    message: name,
                }),
            }
        }
    }
    failures
}

fn parse_python(output: &str) -> Vec<Failure> {
    let lines: Vec<&str> = output.lines().collect();
    let mut failures = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = PY_FAILED.captures(line) {
            let message = format!("{}::{}", &caps[1], &caps[2]);
            let location = lines[..i].iter().rev().find_map(|l| PY_TRACEBACK.captures(l));
            match location {
                Some(loc) => failures.push(Failure {
                    file: Some(loc[1].to_string()),
                    line: loc[2].parse().ok(),
                    message,
                }),
                None => failures.push(Failure {
                    file: Some(caps[1].to_string()),
                    line: None,
                    message,
                }),
            }
        }
    }
    failures
}

fn parse_java(output: &str) -> Vec<Failure> {
    let lines: Vec<&str> = output.lines().collect();
    let mut failures = Vec::new();
    let mut current_class: Option<String> = None;

    for line in &lines {
        if let Some(caps) = JAVA_RUNNING.captures(line) {
            current_class = Some(caps[1].to_string());
        }
        if let Some(caps) = JAVA_RESULT.captures(line) {
            let failure_count: u32 = caps[2].parse().unwrap_or(0);
            if failure_count > 0 {
                let class = current_class.clone().unwrap_or_default();
                let file = class.replace('.', "/") + ".java";
                failures.push(Failure {
                    file: Some(file),
                    line: None,
                    message: format!("{failure_count} test failure(s) in {class}"),
                });
            }
        }
    }
    failures
}

fn parse_go(output: &str) -> Vec<Failure> {
    let lines: Vec<&str> = output.lines().collect();
    let mut failures = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = GO_FAIL.captures(line) {
            let name = caps[1].to_string();
            let location = lines[(i + 1)..(i + 5).min(lines.len())]
                .iter()
                .find_map(|l| GO_LOCATION.captures(l));
            match location {
                Some(loc) => failures.push(Failure {
                    file: Some(loc[1].to_string()),
                    line: loc[2].parse().ok(),
                    message: name,
                }),
                None => failures.push(Failure {
                    file: None,
                    line: None,
                    message: name,
                }),
            }
        }
    }
    failures
}

fn parse_generic(output: &str) -> Vec<Failure> {
    output
        .lines()
        .filter_map(|line| {
            GENERIC.captures(line).map(|caps| Failure {
                file: Some(caps[2].to_string()),
                line: caps[3].parse().ok(),
                message: line.trim().to_string(),
            })
        })
        .collect()
}

fn dedup(failures: Vec<Failure>) -> Vec<Failure> {
    let mut seen = std::collections::HashSet::new();
    failures
        .into_iter()
        .filter(|f| seen.insert((f.file.clone(), f.line)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_jest_failure_with_stack_frame() {
        let output = "● renders correctly\n\n  expect(received).toBe(expected)\n\n  at Object.<anonymous> (src/app.test.js:42:10)\n";
        let failures = parse(output, ProjectType::Node);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].file.as_deref(), Some("src/app.test.js"));
        assert_eq!(failures[0].line, Some(42));
    }

    #[test]
    fn parses_pytest_traceback() {
        let output = "FAILED tests/test_app.py::test_add\nTraceback (most recent call last):\n  File \"tests/test_app.py\", line 10\n    assert add(1, 2) == 4\n";
        let failures = parse(output, ProjectType::Python);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].line, Some(10));
    }

    #[test]
    fn parses_go_fail_with_followup_location() {
        let output = "--- FAIL: TestAdd (0.00s)\n    app_test.go:15: expected 4 got 3\n";
        let failures = parse(output, ProjectType::Go);
        assert_eq!(failures[0].file.as_deref(), Some("app_test.go"));
        assert_eq!(failures[0].line, Some(15));
    }

    #[test]
    fn dedup_collapses_repeat_file_line_pairs() {
        let raw = vec![
            Failure { file: Some("a.go".into()), line: Some(1), message: "x".into() },
            Failure { file: Some("a.go".into()), line: Some(1), message: "y".into() },
        ];
        assert_eq!(dedup(raw).len(), 1);
    }
}
