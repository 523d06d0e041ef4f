//! Tree-sitter based violation engine (§4.5).

use std::time::Instant;

use tree_sitter::{Parser, QueryCursor};

use crate::grammar::GrammarRegistry;
use crate::model::{RawViolation, RuleCategory};
use crate::rules::QueryRegistry;

const MAX_SNIPPET_LEN: usize = 120;
const SUPPRESSION_MARKERS: &[&str] = &["codeguard-ignore", "noqa", "eslint-disable", "@suppress"];

/// Options narrowing an [`AstEngine::analyze`] call to a subset of rules.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub language: Option<String>,
    pub categories: Option<Vec<RuleCategory>>,
    pub rule_ids: Option<Vec<String>>,
}

/// Result of one file's AST analysis. Timing fields are populated even on
/// error paths (§4.5).
#[derive(Debug, Default)]
pub struct AnalyzeResult {
    pub violations: Vec<RawViolation>,
    pub language: Option<String>,
    pub ast_supported: bool,
    pub parse_time_ms: u64,
    pub query_time_ms: u64,
    pub rules_checked: usize,
    pub error: Option<String>,
}

/// Parses source to a tree, compiles queries, extracts target captures,
/// applies suppression, produces violations.
pub struct AstEngine<'a> {
    grammars: &'a GrammarRegistry,
    queries: &'a QueryRegistry,
}

impl<'a> AstEngine<'a> {
    #[must_use]
    pub fn new(grammars: &'a GrammarRegistry, queries: &'a QueryRegistry) -> Self {
        Self { grammars, queries }
    }

    /// `analyze(source, filename, options) -> AnalyzeResult` (§4.5 algorithm).
    #[must_use]
    pub fn analyze(&self, source: &str, filename: &str, options: &AnalyzeOptions) -> AnalyzeResult {
        let lang_id = options
            .language
            .clone()
            .or_else(|| self.language_from_filename(filename));

        let Some(lang_id) = lang_id else {
            return AnalyzeResult {
                ast_supported: false,
                ..Default::default()
            };
        };

        let Some((canonical, language)) = self.grammars.language(&lang_id) else {
            return AnalyzeResult {
                ast_supported: false,
                ..Default::default()
            };
        };

        let parse_start = Instant::now();
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&language) {
            return AnalyzeResult {
                language: Some(canonical.to_string()),
                ast_supported: true,
                parse_time_ms: elapsed_ms(parse_start),
                error: Some(e.to_string()),
                ..Default::default()
            };
        }

        let Some(tree) = parser.parse(source, None) else {
            return AnalyzeResult {
                language: Some(canonical.to_string()),
                ast_supported: true,
                parse_time_ms: elapsed_ms(parse_start),
                error: Some("parse failed".to_string()),
                ..Default::default()
            };
        };
        let parse_time_ms = elapsed_ms(parse_start);

        let rules = self.queries.get_queries(
            canonical,
            options.categories.as_deref(),
            options.rule_ids.as_deref(),
        );
        if rules.is_empty() {
            return AnalyzeResult {
                language: Some(canonical.to_string()),
                ast_supported: true,
                parse_time_ms,
                ..Default::default()
            };
        }

        let query_start = Instant::now();
        let lines: Vec<&str> = source.lines().collect();
        let mut violations = Vec::new();
        let mut cursor = QueryCursor::new();

        for compiled in &rules {
            let capture_names = compiled.query.capture_names();
            let target_index = capture_names
                .iter()
                .position(|name| *name == "target")
                .unwrap_or(0) as u32;

            for query_match in cursor.matches(&compiled.query, tree.root_node(), source.as_bytes()) {
                let Some(capture) = query_match
                    .captures
                    .iter()
                    .find(|c| c.index == target_index)
                    .or_else(|| query_match.captures.first())
                else {
                    continue;
                };

                let node = capture.node;
                let start = node.start_position();
                let end = node.end_position();
                let line = start.row as u32 + 1;

                if is_suppressed(&lines, start.row) {
                    continue;
                }

                let line_text = lines.get(start.row).unwrap_or(&"").trim().to_string();
                let snippet = truncate(node.utf8_text(source.as_bytes()).unwrap_or_default());

                violations.push(RawViolation {
                    file: filename.to_string(),
                    line,
                    column: start.column as u32,
                    end_line: end.row as u32 + 1,
                    end_column: end.column as u32,
                    rule_id: compiled.rule.id.clone(),
                    rule_category: Some(compiled.rule.category),
                    message: compiled.rule.message.clone(),
                    snippet,
                    line_text,
                    severity: compiled.rule.severity,
                    engine: "ast",
                    declared_bug_type: None,
                });
            }
        }

        AnalyzeResult {
            violations,
            language: Some(canonical.to_string()),
            ast_supported: true,
            parse_time_ms,
            query_time_ms: elapsed_ms(query_start),
            rules_checked: rules.len(),
            error: None,
        }
    }

    fn language_from_filename(&self, filename: &str) -> Option<String> {
        let ext = filename.rsplit('.').next()?;
        self.grammars
            .language_for_extension(ext)
            .map(str::to_string)
    }
}

fn is_suppressed(lines: &[&str], row: usize) -> bool {
    let current = lines.get(row).copied().unwrap_or_default();
    let previous = row.checked_sub(1).and_then(|r| lines.get(r)).copied().unwrap_or_default();
    SUPPRESSION_MARKERS
        .iter()
        .any(|marker| current.contains(marker) || previous.contains(marker))
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_SNIPPET_LEN {
        text.to_string()
    } else {
        let mut truncated: String = text.chars().take(MAX_SNIPPET_LEN).collect();
        truncated.push('…');
        truncated
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_language_reports_not_supported() {
        let grammars = GrammarRegistry::new();
        let queries = QueryRegistry::load(&grammars);
        let engine = AstEngine::new(&grammars, &queries);
        let result = engine.analyze("print('hi')", "notes.txt", &AnalyzeOptions::default());
        assert!(!result.ast_supported);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn timing_is_populated_on_success() {
        let grammars = GrammarRegistry::new();
        let queries = QueryRegistry::load(&grammars);
        let engine = AstEngine::new(&grammars, &queries);
        let result = engine.analyze("const x = 1;\n", "app.js", &AnalyzeOptions::default());
        assert!(result.ast_supported);
    }
}
