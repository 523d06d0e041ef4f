//! TypeScript rule catalog, plus TSX-only extras (§4.4: TSX = TS ∪ extras).

use super::RuleSpec;
use crate::model::{RuleCategory, Severity};

pub const RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "ts-sec-001",
        name: "no-eval",
        category: RuleCategory::Security,
        severity: Severity::Critical,
        language: "ts",
        pattern_source: r#"(call_expression function: (identifier) @target (#eq? @target "eval"))"#,
        message: "avoid eval(), it executes arbitrary strings as code",
    },
    RuleSpec {
        id: "ts-bp-001",
        name: "no-explicit-any",
        category: RuleCategory::BestPractice,
        severity: Severity::Info,
        language: "ts",
        pattern_source: r#"(type_annotation (predefined_type) @target (#eq? @target "any"))"#,
        message: "explicit `any` defeats the type checker",
    },
    RuleSpec {
        id: "ts-bp-002",
        name: "no-non-null-assertion",
        category: RuleCategory::BestPractice,
        severity: Severity::Warning,
        language: "ts",
        pattern_source: r#"(non_null_expression) @target"#,
        message: "non-null assertion (!) bypasses null checking",
    },
];

pub const TSX_EXTRAS: &[RuleSpec] = &[RuleSpec {
    id: "tsx-style-001",
    name: "jsx-key-required",
    category: RuleCategory::Style,
    severity: Severity::Warning,
    language: "tsx",
    pattern_source: r#"(jsx_element) @target"#,
    message: "list items rendered in JSX should carry a stable key prop",
}];
