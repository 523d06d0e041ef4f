//! Line-by-line regex fallback detector (§4.6).
//!
//! Used when `AstEngine` reports an unsupported language or returns empty
//! due to an error, and as the simpler/faster path for inline PR analysis.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{BugKind, RawViolation, Severity};

#[derive(Clone, Copy)]
struct RegexRule {
    pattern: &'static str,
    message: &'static str,
    bug_type: BugKind,
    severity: Severity,
}

macro_rules! rule {
    ($pattern:expr, $message:expr, $bug_type:expr, $severity:expr) => {
        RegexRule {
            pattern: $pattern,
            message: $message,
            bug_type: $bug_type,
            severity: $severity,
        }
    };
}

static CATALOG: LazyLock<Vec<(RegexRule, Regex)>> = LazyLock::new(|| {
    RAW_CATALOG
        .iter()
        .copied()
        .filter_map(|rule| {
            Regex::new(rule.pattern)
                .map(|compiled| (rule, compiled))
                .map_err(|e| tracing::warn!(pattern = rule.pattern, error = %e, "dropping invalid regex rule"))
                .ok()
        })
        .collect()
});

const RAW_CATALOG: &[RegexRule] = &[
    // -- secrets --------------------------------------------------------
    rule!(r#"(?i)(api[_-]?key|secret|password|token)\s*[:=]\s*['"][A-Za-z0-9+/=_-]{8,}['"]"#, "hardcoded credential-like literal", BugKind::Logic, Severity::Critical),
    rule!(r"sk_live_[A-Za-z0-9]{16,}", "Stripe live secret key committed", BugKind::Logic, Severity::Critical),
    rule!(r"AKIA[0-9A-Z]{16}", "AWS access key id committed", BugKind::Logic, Severity::Critical),
    rule!(r"-----BEGIN (RSA |EC )?PRIVATE KEY-----", "private key material committed", BugKind::Logic, Severity::Critical),
    rule!(r"(?i)bearer\s+[A-Za-z0-9\-._~+/]{20,}", "bearer token committed", BugKind::Logic, Severity::Critical),
    // -- weak crypto ------------------------------------------------------
    rule!(r#"createHash\(\s*['"]md5['"]\s*\)"#, "MD5 is not collision-resistant", BugKind::Logic, Severity::Warning),
    rule!(r#"createHash\(\s*['"]sha1['"]\s*\)"#, "SHA1 is deprecated for integrity checks", BugKind::Logic, Severity::Warning),
    rule!(r"hashlib\.md5\(", "MD5 is not collision-resistant", BugKind::Logic, Severity::Warning),
    rule!(r"DES/|DESede/|RC4", "use of a broken or weak cipher", BugKind::Logic, Severity::Critical),
    // -- insecure randomness -----------------------------------------------
    rule!(r"Math\.random\(\)", "Math.random() is not cryptographically secure", BugKind::Logic, Severity::Info),
    rule!(r"\brandom\.random\(\)", "random.random() is not cryptographically secure", BugKind::Logic, Severity::Info),
    rule!(r"\bnew Random\(\)", "java.util.Random is not cryptographically secure", BugKind::Logic, Severity::Info),
    // -- TLS/SSL disabled --------------------------------------------------
    rule!(r"rejectUnauthorized\s*:\s*false", "TLS certificate validation disabled", BugKind::Logic, Severity::Critical),
    rule!(r"verify\s*=\s*False", "TLS certificate validation disabled", BugKind::Logic, Severity::Critical),
    rule!(r"ALLOW_ALL_HOSTNAME_VERIFIER|TrustAllCerts", "TLS hostname/certificate verification bypassed", BugKind::Logic, Severity::Critical),
    rule!(r"NODE_TLS_REJECT_UNAUTHORIZED\s*=\s*['\"]?0", "TLS verification disabled process-wide", BugKind::Logic, Severity::Critical),
    // -- XSS ---------------------------------------------------------------
    rule!(r"dangerouslySetInnerHTML", "raw HTML injection without sanitization", BugKind::Logic, Severity::Warning),
    rule!(r"\.innerHTML\s*=", "assigning untrusted content to innerHTML enables XSS", BugKind::Logic, Severity::Warning),
    rule!(r"document\.write\(", "document.write() with untrusted input enables XSS", BugKind::Logic, Severity::Warning),
    // -- eval / exec ---------------------------------------------------------
    rule!(r"\beval\s*\(", "eval() executes arbitrary strings as code", BugKind::Logic, Severity::Critical),
    rule!(r"\bexec\s*\(", "exec() executes arbitrary strings as code", BugKind::Logic, Severity::Critical),
    rule!(r"new Function\(", "Function constructor behaves like eval()", BugKind::Logic, Severity::Warning),
    rule!(r"pickle\.loads?\(", "unpickling untrusted data allows arbitrary code execution", BugKind::Logic, Severity::Critical),
    // -- SQL injection -------------------------------------------------------
    rule!(r#"(?i)(SELECT|INSERT|UPDATE|DELETE).{0,80}["']\s*\+\s*\w"#, "string-concatenated SQL query risks injection", BugKind::Logic, Severity::Critical),
    rule!(r#"execute\(\s*f['"]"#, "f-string interpolated SQL risks injection", BugKind::Logic, Severity::Critical),
    rule!(r"\$\{.*\}\s*`.*(SELECT|INSERT|UPDATE|DELETE)", "template-literal SQL risks injection", BugKind::Logic, Severity::Critical),
    // -- command injection ----------------------------------------------------
    rule!(r"child_process\.exec\(", "exec() with untrusted input risks command injection; prefer execFile", BugKind::Logic, Severity::Critical),
    rule!(r"os\.system\(", "os.system() with untrusted input risks command injection", BugKind::Logic, Severity::Critical),
    rule!(r"subprocess\.(call|run|Popen)\([^)]*shell\s*=\s*True", "shell=True with untrusted input risks command injection", BugKind::Logic, Severity::Critical),
    rule!(r"Runtime\.getRuntime\(\)\.exec\(", "Runtime.exec() with untrusted input risks command injection", BugKind::Logic, Severity::Critical),
    // -- CORS -------------------------------------------------------------
    rule!(r#"Access-Control-Allow-Origin['"]?\s*[:,]\s*['"]\*['"]"#, "wildcard CORS origin allows any site to read responses", BugKind::Logic, Severity::Warning),
    rule!(r#"cors\(\s*\{\s*origin\s*:\s*['"]\*['"]"#, "wildcard CORS origin allows any site to read responses", BugKind::Logic, Severity::Warning),
    // -- debug statements ---------------------------------------------------
    rule!(r"console\.(log|debug)\(", "debug statement left in source", BugKind::Linting, Severity::Info),
    rule!(r"\bprint\(", "debug print left in source", BugKind::Linting, Severity::Info),
    rule!(r"System\.out\.println\(", "debug print left in source", BugKind::Linting, Severity::Info),
    rule!(r"fmt\.Println\(", "debug print left in source", BugKind::Linting, Severity::Info),
    rule!(r"\bdebugger\b", "debugger statement left in source", BugKind::Linting, Severity::Info),
    // -- TODO / FIXME -------------------------------------------------------
    rule!(r"(?i)//\s*(TODO|FIXME|HACK)\b", "unresolved TODO/FIXME marker", BugKind::Linting, Severity::Info),
    rule!(r"(?i)#\s*(TODO|FIXME|HACK)\b", "unresolved TODO/FIXME marker", BugKind::Linting, Severity::Info),
    // -- empty catch ----------------------------------------------------------
    rule!(r"catch\s*\([^)]*\)\s*\{\s*\}", "empty catch block silently swallows errors", BugKind::Logic, Severity::Warning),
    rule!(r"except\s*:\s*pass\b", "bare except with pass silently swallows errors", BugKind::Logic, Severity::Warning),
    // -- var / let, loose equality ----------------------------------------------
    rule!(r"\bvar\s+\w+\s*=", "prefer let/const over var", BugKind::Linting, Severity::Info),
    rule!(r"[^=!]==[^=]", "loose equality (==); prefer strict equality (===)", BugKind::Logic, Severity::Info),
    rule!(r"[^!]!=[^=]", "loose inequality (!=); prefer strict inequality (!==)", BugKind::Logic, Severity::Info),
    // -- syntax / import smells reachable without a grammar -----------------------
    rule!(r"^\s*import\s+\*\s+as\s+\w+\s+from\s+['\"]\.\.?/", "wildcard relative import obscures what's used", BugKind::Import, Severity::Info),
    rule!(r"require\(['\"]\.\./\.\./\.\./", "deep relative require suggests a missing module boundary", BugKind::Import, Severity::Info),
    // -- indentation ----------------------------------------------------------
    rule!(r"^\t+ +\S", "mixed tabs and spaces in indentation", BugKind::Indentation, Severity::Info),
];

/// Runs the catalog against `content` line by line, for languages the AST
/// engine doesn't support or as an error fallback.
#[must_use]
pub fn scan(content: &str, filename: &str) -> Vec<RawViolation> {
    let mut violations = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        for (rule, compiled) in CATALOG.iter() {
            let Some(m) = compiled.find(line) else {
                continue;
            };
            violations.push(RawViolation {
                file: filename.to_string(),
                line: line_no as u32 + 1,
                column: m.start() as u32,
                end_line: line_no as u32 + 1,
                end_column: m.end() as u32,
                rule_id: format!("regex:{}", rule.message),
                rule_category: None,
                message: rule.message.to_string(),
                snippet: line.trim().chars().take(120).collect(),
                line_text: line.trim().to_string(),
                severity: rule.severity,
                engine: "regex",
                declared_bug_type: Some(rule.bug_type),
            });
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_hardcoded_secret_and_weak_hash() {
        let content = "const api_key = \"sk_live_abcdefghij1234\";\nconst h = crypto.createHash('md5');\n";
        let violations = scan(content, "app.js");
        assert!(violations.iter().any(|v| v.message.contains("Stripe")));
        assert!(violations.iter().any(|v| v.message.contains("MD5")));
    }

    #[test]
    fn empty_content_yields_no_violations() {
        assert!(scan("", "empty.js").is_empty());
    }
}
