//! AST- and regex-based violation detection: lazy grammar loading, a
//! compiled rule catalog, the tree-sitter engine, and the regex fallback
//! (§4.3–§4.6).

pub mod ast_engine;
pub mod classify;
pub mod error;
pub mod grammar;
pub mod model;
pub mod regex_detector;
pub mod rules;

pub use ast_engine::{AnalyzeOptions, AnalyzeResult, AstEngine};
pub use error::{DetectError, DetectResult};
pub use grammar::GrammarRegistry;
pub use model::{BugKind, Issue, IssueSource, RawViolation, Rule, RuleCategory, Severity, Violation};
pub use rules::QueryRegistry;
