//! Java rule catalog.

use super::RuleSpec;
use crate::model::{RuleCategory, Severity};

pub const RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "java-bp-001",
        name: "no-empty-catch",
        category: RuleCategory::BestPractice,
        severity: Severity::Warning,
        language: "java",
        pattern_source: r#"(catch_clause body: (block . ) @target)"#,
        message: "empty catch block silently swallows errors",
    },
    RuleSpec {
        id: "java-sec-001",
        name: "no-print-stack-trace",
        category: RuleCategory::Security,
        severity: Severity::Info,
        language: "java",
        pattern_source: r#"(method_invocation name: (identifier) @target (#eq? @target "printStackTrace"))"#,
        message: "printStackTrace() leaks internals to stdout; use a logger",
    },
];
