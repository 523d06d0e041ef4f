//! Shared finding types (§3): `Issue`, `BugKind`, `Severity`, `Rule`, `Violation`.
//!
//! These live in `detect` rather than the `heal` crate so that both
//! `analyzer::RepoAnalyzer` and `heal::CIAgent` can classify findings into
//! the same [`BugKind`] set without `analyzer` depending on `heal` (which in
//! turn depends on `analyzer`). See `DESIGN.md` for the recorded rationale.

use serde::{Deserialize, Serialize};

/// Category of a classified finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BugKind {
    Syntax,
    Linting,
    Logic,
    TypeError,
    Import,
    Indentation,
}

/// Severity of a finding or rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Where a finding originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSource {
    Ast,
    Regex,
    Test,
    Ci,
}

/// A normalized, classified finding the orchestrator can act on.
///
/// Immutable after classification: once built, an `Issue`'s fields are
/// never mutated in place — a retry produces a fresh `Issue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub file: String,
    pub line: u32,
    pub bug_type: BugKind,
    pub description: String,
    pub code_snippet: String,
    pub severity: Severity,
    pub source: IssueSource,
}

/// Rule category, as stored/seeded for the inline PR analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCategory {
    Security,
    Naming,
    Style,
    BestPractice,
    Performance,
}

/// A detection rule: either a tree-sitter query or a regex, carrying the
/// metadata needed to report and toggle it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub category: RuleCategory,
    pub severity: Severity,
    pub language: String,
    pub pattern_source: String,
    pub message: String,
}

/// One raw finding from a detector, before classification into an `Issue`.
#[derive(Debug, Clone)]
pub struct RawViolation {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub rule_id: String,
    pub rule_category: Option<RuleCategory>,
    pub message: String,
    pub snippet: String,
    pub line_text: String,
    pub severity: Severity,
    pub engine: &'static str,
    /// A detector-declared bug kind (the regex catalog carries one per
    /// entry, §4.6); when present, classification keeps it rather than
    /// re-deriving one from the message (§4.9 precedence rule 1).
    pub declared_bug_type: Option<BugKind>,
}

/// A finding persisted against a PR analysis (§3, distinct from `Issue`:
/// this is the row shape the opaque `Store` keeps, not the in-memory
/// healing finding).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub analysis_id: String,
    pub rule_id: String,
    pub file: String,
    pub line: u32,
    pub message: String,
}
