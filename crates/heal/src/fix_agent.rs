//! Converts one issue + surrounding context into a replacement file
//! (§4.10). `FixBackend` is the single polymorphic capability the
//! Orchestrator holds as `Box<dyn FixBackend>`; it never branches on
//! which implementation is active (§9 design note).

use async_trait::async_trait;
use handlebars::Handlebars;
use serde_json::json;
use tracing::{debug, warn};

use crate::context::ContextGatherer;
use crate::model::{ensure_marker, BugKind, Issue};

const MIN_LENGTH_RATIO: f64 = 0.3;
const MAX_LENGTH_RATIO: f64 = 3.0;

const FIX_PROMPT_TEMPLATE: &str = r"Fix the following issue.

File: {{file}}
Line: {{line}}
Bug type: {{bug_type}}
Description: {{description}}

Context around the offending line:
```
{{context}}
```

Full current file content:
```
{{full_content}}
```

Respond with exactly these three sections:
===FIXED_CODE_START===
<the complete fixed file content>
===FIXED_CODE_END===
===COMMIT_MESSAGE===
<one-line commit message>
===EXPLANATION===
<short explanation of the fix>
";

/// Outcome of one fix-generation attempt.
#[derive(Debug, Clone)]
pub struct ProposedFix {
    pub success: bool,
    pub fixed_code: String,
    pub commit_message: String,
    pub explanation: String,
}

/// Polymorphic "propose replacement" capability (§4.10, §9).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FixBackend: Send + Sync {
    async fn propose(&self, issue: &Issue, full_file_content: &str) -> ProposedFix;
}

/// LLM-backed fix generation. Falls back to treating a single fenced code
/// block as the replacement when strict section parsing fails, and
/// rejects implausible-length replacements (§4.10, §8 invariant 6).
pub struct LlmFixBackend {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    templates: Handlebars<'static>,
}

impl LlmFixBackend {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut templates = Handlebars::new();
        templates.set_strict_mode(false);
        templates
            .register_template_string("fix", FIX_PROMPT_TEMPLATE)
            .expect("fix prompt template is valid handlebars");

        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            templates,
        }
    }

    fn render_prompt(&self, issue: &Issue, full_file_content: &str) -> String {
        let context = ContextGatherer::around_line(full_file_content, issue.line);
        let data = json!({
            "file": issue.file,
            "line": issue.line,
            "bug_type": format!("{:?}", issue.bug_type),
            "description": issue.description,
            "context": context.snippet,
            "full_content": full_file_content,
        });
        self.templates
            .render("fix", &data)
            .unwrap_or_else(|_| full_file_content.to_string())
    }

    async fn call_llm(&self, prompt: &str) -> Option<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .ok()?;

        if !resp.status().is_success() {
            warn!(status = %resp.status(), "LLM call failed");
            return None;
        }

        let value: serde_json::Value = resp.json().await.ok()?;
        value["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
    }
}

#[async_trait]
impl FixBackend for LlmFixBackend {
    async fn propose(&self, issue: &Issue, full_file_content: &str) -> ProposedFix {
        let prompt = self.render_prompt(issue, full_file_content);

        let Some(response) = self.call_llm(&prompt).await else {
            return unsuccessful();
        };

        let parsed = parse_llm_response(&response).or_else(|| fenced_block_fallback(&response));

        let Some((fixed_code, commit_message, explanation)) = parsed else {
            debug!("LLM response did not parse, falling back to rule-based fix");
            return unsuccessful();
        };

        if !length_sane(full_file_content, &fixed_code) {
            warn!("LLM fix rejected: length ratio outside [0.3x, 3x]");
            return unsuccessful();
        }

        ProposedFix {
            success: true,
            fixed_code,
            commit_message: ensure_marker(&commit_message),
            explanation,
        }
    }
}

fn unsuccessful() -> ProposedFix {
    ProposedFix {
        success: false,
        fixed_code: String::new(),
        commit_message: String::new(),
        explanation: String::new(),
    }
}

fn length_sane(original: &str, fixed: &str) -> bool {
    if original.is_empty() {
        return true;
    }
    let ratio = fixed.len() as f64 / original.len() as f64;
    (MIN_LENGTH_RATIO..=MAX_LENGTH_RATIO).contains(&ratio)
}

fn parse_llm_response(response: &str) -> Option<(String, String, String)> {
    let code = extract_between(response, "===FIXED_CODE_START===", "===FIXED_CODE_END===")?;
    let commit_message = extract_between(response, "===COMMIT_MESSAGE===", "===EXPLANATION===")
        .unwrap_or_default();
    let explanation = response
        .split("===EXPLANATION===")
        .nth(1)
        .unwrap_or_default()
        .trim()
        .to_string();

    Some((code.trim().to_string(), commit_message.trim().to_string(), explanation))
}

fn extract_between(text: &str, start: &str, end: &str) -> Option<String> {
    let after_start = text.split(start).nth(1)?;
    let before_end = after_start.split(end).next()?;
    Some(before_end.to_string())
}

fn fenced_block_fallback(response: &str) -> Option<(String, String, String)> {
    let mut parts = response.splitn(2, "```");
    parts.next();
    let rest = parts.next()?;
    let after_lang = rest.splitn(2, '\n').nth(1).unwrap_or(rest);
    let code = after_lang.split("```").next()?.trim().to_string();
    Some((code, "automated fix".to_string(), "parsed from fenced code block".to_string()))
}

/// Deterministic per-`BugKind` rule-based fallback (§4.10), used when no
/// LLM key is configured or the LLM path is rejected.
pub struct RuleFixBackend;

#[async_trait]
impl FixBackend for RuleFixBackend {
    async fn propose(&self, issue: &Issue, full_file_content: &str) -> ProposedFix {
        let lines: Vec<&str> = full_file_content.lines().collect();
        let idx = issue.line.saturating_sub(1) as usize;
        if idx >= lines.len() {
            return unsuccessful();
        }

        let Some((fixed_line, explanation)) = mutate_line(lines[idx], issue.bug_type) else {
            return unsuccessful();
        };
        let mut new_lines: Vec<String> = lines.iter().map(|l| (*l).to_string()).collect();
        new_lines[idx] = fixed_line;

        ProposedFix {
            success: true,
            fixed_code: new_lines.join("\n"),
            commit_message: ensure_marker(&commit_message_for(issue.bug_type)),
            explanation,
        }
    }
}

/// Returns `None` when no deterministic mutation applies to `line`, so
/// `propose` can report an honest `success: false` rather than committing
/// a byte-for-byte unchanged line as a fix.
fn mutate_line(line: &str, bug_type: BugKind) -> Option<(String, String)> {
    match bug_type {
        BugKind::Syntax => {
            if line.trim_end().ends_with(';') || line.trim().is_empty() {
                None
            } else {
                Some((format!("{line};"), "added missing statement terminator".to_string()))
            }
        }
        BugKind::Linting => {
            if line.contains("console.log") || line.contains("console.debug") || line.trim_start().starts_with("print(") {
                Some((format!("// {line}"), "commented out debug statement".to_string()))
            } else {
                None
            }
        }
        BugKind::Logic => {
            if line.contains("eval(") {
                Some((line.replacen("eval(", "Function(", 1), "replaced eval() with Function()".to_string()))
            } else if line.contains("==") && !line.contains("===") {
                Some((line.replacen("==", "===", 1), "replaced loose equality with strict equality".to_string()))
            } else if looks_like_secret(line) {
                Some((mask_secret(line), "replaced hardcoded secret with environment lookup".to_string()))
            } else {
                None
            }
        }
        BugKind::TypeError => {
            if line.contains("?.") {
                None
            } else {
                Some((insert_optional_chaining(line), "inserted optional chaining to guard against undefined".to_string()))
            }
        }
        BugKind::Import => Some((format!("// {line}"), "commented out broken import".to_string())),
        BugKind::Indentation => {
            if line.contains('\t') {
                Some((line.replace('\t', "    "), "converted tabs to 4 spaces".to_string()))
            } else {
                None
            }
        }
    }
}

fn looks_like_secret(line: &str) -> bool {
    let lower = line.to_lowercase();
    ["api_key", "secret", "password", "token"].iter().any(|k| lower.contains(k)) && line.contains('=')
}

fn mask_secret(line: &str) -> String {
    if let Some(eq_pos) = line.find('=') {
        format!("{} = process.env.SECRET_VALUE", &line[..eq_pos].trim_end())
    } else {
        line.to_string()
    }
}

fn insert_optional_chaining(line: &str) -> String {
    if line.contains("?.") {
        line.to_string()
    } else {
        line.replacen('.', "?.", 1)
    }
}

fn commit_message_for(bug_type: BugKind) -> String {
    match bug_type {
        BugKind::Syntax => "fix syntax error".to_string(),
        BugKind::Linting => "fix linting issue".to_string(),
        BugKind::Logic => "fix logic issue".to_string(),
        BugKind::TypeError => "fix type error".to_string(),
        BugKind::Import => "fix broken import".to_string(),
        BugKind::Indentation => "fix indentation".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IssueSource, Severity};

    fn issue(bug_type: BugKind, line: u32) -> Issue {
        Issue {
            file: "app.js".to_string(),
            line,
            bug_type,
            description: "test".to_string(),
            code_snippet: String::new(),
            severity: Severity::Warning,
            source: IssueSource::Ast,
        }
    }

    #[tokio::test]
    async fn rule_backend_replaces_eval_with_function() {
        let backend = RuleFixBackend;
        let content = "const x = eval(input);\n";
        let fix = backend.propose(&issue(BugKind::Logic, 1), content).await;
        assert!(fix.success);
        assert!(fix.fixed_code.contains("Function(input)"));
        assert!(fix.commit_message.starts_with("[AI-AGENT]"));
    }

    #[tokio::test]
    async fn rule_backend_converts_tabs_to_spaces() {
        let backend = RuleFixBackend;
        let content = "\tconst x = 1;\n";
        let fix = backend.propose(&issue(BugKind::Indentation, 1), content).await;
        assert!(fix.fixed_code.starts_with("    "));
    }

    #[test]
    fn length_sanity_rejects_wildly_different_sizes() {
        assert!(!length_sane("short", "a".repeat(1000).as_str()));
        assert!(length_sane("hello world", "hello there world"));
    }

    #[tokio::test]
    async fn rule_backend_reports_failure_when_no_mutation_applies() {
        let backend = RuleFixBackend;
        let content = "const x = doSomething();\n";
        let fix = backend.propose(&issue(BugKind::Logic, 1), content).await;
        assert!(!fix.success);
        assert!(fix.fixed_code.is_empty());
    }

    #[test]
    fn strict_section_parsing_extracts_all_three_parts() {
        let response = "===FIXED_CODE_START===\nconst x = 1;\n===FIXED_CODE_END===\n===COMMIT_MESSAGE===\nfix thing\n===EXPLANATION===\nbecause reasons\n";
        let (code, msg, explanation) = parse_llm_response(response).unwrap();
        assert_eq!(code, "const x = 1;");
        assert_eq!(msg, "fix thing");
        assert_eq!(explanation, "because reasons");
    }
}
