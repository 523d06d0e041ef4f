//! Error taxonomy for the detection engine.

use thiserror::Error;

/// Errors surfaced by [`crate::ast_engine::AstEngine`], [`crate::grammar::GrammarRegistry`]
/// and [`crate::rules::QueryRegistry`].
#[derive(Debug, Error)]
pub enum DetectError {
    /// The file's language could not be determined, or has no grammar.
    #[error("unsupported language for {0}")]
    UnsupportedLanguage(String),

    /// Parsing the source into a tree failed.
    #[error("parse failed: {0}")]
    ParseFailed(String),

    /// A rule's query source failed to compile against its grammar.
    #[error("query compilation failed for rule {rule_id}: {source}")]
    QueryCompilation {
        rule_id: String,
        source: tree_sitter::QueryError,
    },

    /// A regex pattern in the catalog failed to compile.
    #[error("invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result alias for detection operations.
pub type DetectResult<T> = Result<T, DetectError>;
