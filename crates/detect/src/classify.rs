//! Shared bug-kind classification (§4.9, §4.14 node 5, §8 invariant 3).
//!
//! Both `analyzer::RepoAnalyzer` (classifying a raw AST/regex violation) and
//! `heal`'s CI-failure handling (classifying a CI failure log line) need the
//! identical precedence rules, so both live here rather than duplicated in
//! two crates that would otherwise need to agree by convention alone.

use crate::model::{BugKind, RawViolation, RuleCategory};

/// Classify a raw violation into a `BugKind`, first match wins (§4.9).
///
/// Never returns `None`: every violation gets a kind (§8 invariant 3).
#[must_use]
pub fn classify_violation(violation: &RawViolation) -> BugKind {
    if let Some(declared) = violation.declared_bug_type {
        return declared;
    }

    let message = violation.message.to_lowercase();

    if contains_any(&message, &["syntax", "unexpected token", "parsing error"]) {
        return BugKind::Syntax;
    }
    if contains_any(&message, &["import", "require", "module not found"]) {
        return BugKind::Import;
    }
    if contains_any(
        &message,
        &["type", "undefined", "null reference", "incompatible"],
    ) {
        return BugKind::TypeError;
    }
    if contains_any(&message, &["indent", "whitespace", "tab", "spacing"]) {
        return BugKind::Indentation;
    }
    if matches!(
        violation.rule_category,
        Some(RuleCategory::Style | RuleCategory::Naming)
    ) || contains_any(&message, &["lint", "naming", "convention", "unused"])
    {
        return BugKind::Linting;
    }

    BugKind::Logic
}

/// Classify a CI failure-log message into a `BugKind` (§4.14 node 5).
///
/// A narrower substring set than [`classify_violation`]: CI failure logs
/// carry no rule category, only free-text compiler/test-runner output.
#[must_use]
pub fn classify_message(message: &str) -> BugKind {
    let message = message.to_lowercase();

    if contains_any(&message, &["syntax"]) {
        return BugKind::Syntax;
    }
    if contains_any(&message, &["import", "module"]) {
        return BugKind::Import;
    }
    if contains_any(&message, &["type", "undefined"]) {
        return BugKind::TypeError;
    }
    if contains_any(&message, &["indent", "whitespace"]) {
        return BugKind::Indentation;
    }
    if contains_any(&message, &["lint"]) {
        return BugKind::Linting;
    }

    BugKind::Logic
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;

    fn violation(message: &str, category: Option<RuleCategory>) -> RawViolation {
        RawViolation {
            file: "app.js".to_string(),
            line: 1,
            column: 0,
            end_line: 1,
            end_column: 0,
            rule_id: "test".to_string(),
            rule_category: category,
            message: message.to_string(),
            snippet: String::new(),
            line_text: String::new(),
            severity: Severity::Warning,
            engine: "ast",
            declared_bug_type: None,
        }
    }

    #[test]
    fn classifies_syntax_before_import() {
        let v = violation("unexpected token, module not found", None);
        assert_eq!(classify_violation(&v), BugKind::Syntax);
    }

    #[test]
    fn style_category_wins_precedence() {
        let v = violation("some message", Some(RuleCategory::Style));
        assert_eq!(classify_violation(&v), BugKind::Linting);
    }

    #[test]
    fn falls_through_to_logic() {
        let v = violation("off by one in loop bound", None);
        assert_eq!(classify_violation(&v), BugKind::Logic);
    }

    #[test]
    fn ci_message_classification_never_panics_on_empty() {
        assert_eq!(classify_message(""), BugKind::Logic);
    }

    #[test]
    fn ci_message_classifies_type_error() {
        assert_eq!(
            classify_message("TypeError: x is undefined"),
            BugKind::TypeError
        );
    }
}
