//! JavaScript/JSX rule catalog.

use super::RuleSpec;
use crate::model::{RuleCategory, Severity};

pub const RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "js-sec-001",
        name: "no-eval",
        category: RuleCategory::Security,
        severity: Severity::Critical,
        language: "js",
        pattern_source: r#"(call_expression function: (identifier) @target (#eq? @target "eval"))"#,
        message: "avoid eval(), it executes arbitrary strings as code",
    },
    RuleSpec {
        id: "js-sec-002",
        name: "no-new-function",
        category: RuleCategory::Security,
        severity: Severity::Warning,
        language: "js",
        pattern_source: r#"(new_expression constructor: (identifier) @target (#eq? @target "Function"))"#,
        message: "Function constructor behaves like eval()",
    },
    RuleSpec {
        id: "js-style-001",
        name: "no-var",
        category: RuleCategory::Style,
        severity: Severity::Info,
        language: "js",
        pattern_source: r#"(variable_declaration "var" @target)"#,
        message: "prefer let/const over var",
    },
    RuleSpec {
        id: "js-bp-001",
        name: "no-empty-catch",
        category: RuleCategory::BestPractice,
        severity: Severity::Warning,
        language: "js",
        pattern_source: r#"(catch_clause body: (statement_block . ) @target)"#,
        message: "empty catch block silently swallows errors",
    },
    RuleSpec {
        id: "js-naming-001",
        name: "camel-case-functions",
        category: RuleCategory::Naming,
        severity: Severity::Info,
        language: "js",
        pattern_source: r#"(function_declaration name: (identifier) @target (#match? @target "^[A-Z]"))"#,
        message: "function names should be camelCase, not PascalCase",
    },
];
