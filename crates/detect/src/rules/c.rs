//! C rule catalog.

use super::RuleSpec;
use crate::model::{RuleCategory, Severity};

pub const RULES: &[RuleSpec] = &[RuleSpec {
    id: "c-sec-001",
    name: "no-gets",
    category: RuleCategory::Security,
    severity: Severity::Critical,
    language: "c",
    pattern_source: r#"(call_expression function: (identifier) @target (#eq? @target "gets"))"#,
    message: "gets() cannot bound its input and is inherently unsafe",
}];
