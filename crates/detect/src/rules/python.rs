//! Python rule catalog.

use super::RuleSpec;
use crate::model::{RuleCategory, Severity};

pub const RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "py-sec-001",
        name: "no-eval",
        category: RuleCategory::Security,
        severity: Severity::Critical,
        language: "python",
        pattern_source: r#"(call function: (identifier) @target (#eq? @target "eval"))"#,
        message: "avoid eval(), it executes arbitrary strings as code",
    },
    RuleSpec {
        id: "py-sec-002",
        name: "no-bare-except",
        category: RuleCategory::Security,
        severity: Severity::Warning,
        language: "python",
        pattern_source: r#"(except_clause . ":" ) @target"#,
        message: "bare except swallows all exceptions, including SystemExit",
    },
    RuleSpec {
        id: "py-style-001",
        name: "no-mutable-default-arg",
        category: RuleCategory::Style,
        severity: Severity::Warning,
        language: "python",
        pattern_source: r#"(default_parameter value: (list) @target)"#,
        message: "mutable default argument is shared across calls",
    },
];
