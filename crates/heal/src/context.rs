//! Extracts the ±15-line window around an issue for the fix prompt
//! (§4.10), grounded on the teacher's fault-tolerant multi-source gather
//! shape: a small builder that never panics on out-of-range lines.

const CONTEXT_RADIUS: usize = 15;

/// A snippet of source centered on `issue.line`, clamped to the file's
/// bounds.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    pub start_line: u32,
    pub end_line: u32,
    pub snippet: String,
}

/// Extracts context windows around a line number from full file content.
pub struct ContextGatherer;

impl ContextGatherer {
    /// Extract ±15 lines of context around `line` (1-indexed), clamped to
    /// the file's actual line range.
    #[must_use]
    pub fn around_line(content: &str, line: u32) -> ContextWindow {
        let lines: Vec<&str> = content.lines().collect();
        if lines.is_empty() {
            return ContextWindow {
                start_line: 0,
                end_line: 0,
                snippet: String::new(),
            };
        }

        let center = line.saturating_sub(1) as usize;
        let start = center.saturating_sub(CONTEXT_RADIUS);
        let end = (center + CONTEXT_RADIUS).min(lines.len().saturating_sub(1));

        let snippet = lines[start..=end].join("\n");
        ContextWindow {
            start_line: start as u32 + 1,
            end_line: end as u32 + 1,
            snippet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_file_start() {
        let content = (1..=5).map(|n| format!("line {n}")).collect::<Vec<_>>().join("\n");
        let window = ContextGatherer::around_line(&content, 2);
        assert_eq!(window.start_line, 1);
    }

    #[test]
    fn clamps_to_file_end() {
        let content = (1..=5).map(|n| format!("line {n}")).collect::<Vec<_>>().join("\n");
        let window = ContextGatherer::around_line(&content, 5);
        assert_eq!(window.end_line, 5);
    }

    #[test]
    fn empty_content_yields_empty_window() {
        let window = ContextGatherer::around_line("", 10);
        assert!(window.snippet.is_empty());
    }
}
