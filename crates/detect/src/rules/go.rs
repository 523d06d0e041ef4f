//! Go rule catalog.

use super::RuleSpec;
use crate::model::{RuleCategory, Severity};

pub const RULES: &[RuleSpec] = &[RuleSpec {
    id: "go-bp-001",
    name: "no-ignored-error",
    category: RuleCategory::BestPractice,
    severity: Severity::Warning,
    language: "go",
    pattern_source: r#"(assignment_statement left: (expression_list (identifier) @target (#eq? @target "_")))"#,
    message: "error return value discarded with _",
}];
