//! Lazily-loaded tree-sitter grammars, keyed by language id (§4.3).

use std::collections::HashMap;
use std::sync::OnceLock;

use tree_sitter::Language;

/// Supported language identifiers. `jsx`/`cjs` map to `js`.
pub const SUPPORTED_LANGUAGES: &[&str] = &["js", "ts", "tsx", "python", "java", "go", "c"];

fn language_for(id: &str) -> Option<Language> {
    match id {
        "js" | "jsx" | "cjs" => Some(tree_sitter_javascript::language()),
        "ts" => Some(tree_sitter_typescript::language_typescript()),
        "tsx" => Some(tree_sitter_typescript::language_tsx()),
        "python" | "py" => Some(tree_sitter_python::language()),
        "java" => Some(tree_sitter_java::language()),
        "go" => Some(tree_sitter_go::language()),
        "c" => Some(tree_sitter_c::language()),
        _ => None,
    }
}

/// Memoises one grammar per language id and maps file extensions to ids.
///
/// Grammars are cheap `Language` handles (a vtable pointer into the
/// generated parser); memoising avoids re-deriving them per file, matching
/// the teacher's "load once, reuse" idiom for process-wide caches.
pub struct GrammarRegistry {
    cache: OnceLock<HashMap<&'static str, Language>>,
}

impl GrammarRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: OnceLock::new(),
        }
    }

    fn loaded(&self) -> &HashMap<&'static str, Language> {
        self.cache.get_or_init(|| {
            let mut map = HashMap::new();
            for id in ["js", "ts", "tsx", "python", "java", "go", "c"] {
                if let Some(lang) = language_for(id) {
                    map.insert(id, lang);
                }
            }
            map
        })
    }

    /// Resolve a canonical language id (normalizing `jsx`/`cjs` to `js`) and
    /// its memoised grammar.
    #[must_use]
    pub fn language(&self, id: &str) -> Option<(&'static str, Language)> {
        let canonical = canonicalize(id);
        self.loaded()
            .get(canonical)
            .map(|lang| (canonical, lang.clone()))
    }

    /// Map a file extension to a language id, or `None` if unsupported.
    #[must_use]
    pub fn language_for_extension(&self, extension: &str) -> Option<&'static str> {
        let id = match extension.trim_start_matches('.') {
            "js" | "mjs" | "cjs" | "jsx" => "js",
            "ts" | "mts" => "ts",
            "tsx" => "tsx",
            "py" => "python",
            "java" => "java",
            "go" => "go",
            "c" | "h" => "c",
            _ => return None,
        };
        self.loaded().contains_key(id).then_some(id)
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn canonicalize(id: &str) -> &'static str {
    match id {
        "jsx" | "cjs" | "js" => "js",
        "ts" => "ts",
        "tsx" => "tsx",
        "python" | "py" => "python",
        "java" => "java",
        "go" => "go",
        "c" => "c",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_extensions() {
        let registry = GrammarRegistry::new();
        assert_eq!(registry.language_for_extension(".jsx"), Some("js"));
        assert_eq!(registry.language_for_extension(".py"), Some("python"));
        assert_eq!(registry.language_for_extension(".rb"), None);
    }

    #[test]
    fn memoises_language_handle() {
        let registry = GrammarRegistry::new();
        let (id1, _) = registry.language("js").expect("js grammar loads");
        let (id2, _) = registry.language("jsx").expect("jsx canonicalizes to js");
        assert_eq!(id1, id2);
    }
}
