//! Per-language rule catalogs, embedded at build time (§4.4).

mod c;
mod go;
mod java;
mod javascript;
mod python;
mod typescript;

use std::collections::HashMap;

use tree_sitter::{Language, Query};

use crate::error::DetectError;
use crate::grammar::GrammarRegistry;
use crate::model::{Rule, RuleCategory, Severity};

/// One statically-embedded catalog entry, before allocation into a [`Rule`].
#[derive(Clone, Copy)]
pub struct RuleSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub category: RuleCategory,
    pub severity: Severity,
    pub language: &'static str,
    pub pattern_source: &'static str,
    pub message: &'static str,
}

impl RuleSpec {
    fn into_rule(self) -> Rule {
        Rule {
            id: self.id.to_string(),
            name: self.name.to_string(),
            category: self.category,
            severity: self.severity,
            language: self.language.to_string(),
            pattern_source: self.pattern_source.to_string(),
            message: self.message.to_string(),
        }
    }
}

/// All rules for a given canonical language id. `tsx` is the union of the
/// `ts` catalog plus `tsx`-specific extras (§4.4).
pub(crate) fn catalog_for(language: &str) -> Vec<Rule> {
    let specs: Vec<RuleSpec> = match language {
        "js" => javascript::RULES.iter().copied().collect(),
        "ts" => typescript::RULES.iter().copied().collect(),
        "tsx" => typescript::RULES
            .iter()
            .copied()
            .chain(typescript::TSX_EXTRAS.iter().copied())
            .collect(),
        "python" => python::RULES.iter().copied().collect(),
        "java" => java::RULES.iter().copied().collect(),
        "go" => go::RULES.iter().copied().collect(),
        "c" => c::RULES.iter().copied().collect(),
        _ => Vec::new(),
    };
    specs.into_iter().map(RuleSpec::into_rule).collect()
}

/// A rule whose query compiled successfully at startup.
pub struct CompiledRule {
    pub rule: Rule,
    pub query: Query,
}

/// Holds the rule catalog, compiled once per language at startup (§4.4).
///
/// A query whose compilation fails is logged and excluded from live scans
/// rather than aborting startup — "never allow a bad query to take down
/// the engine" (§4.4).
pub struct QueryRegistry {
    rules: HashMap<String, Rule>,
    compiled: HashMap<&'static str, Vec<CompiledRule>>,
}

impl QueryRegistry {
    /// Load and compile the catalog against the registry's grammars.
    #[must_use]
    pub fn load(grammars: &GrammarRegistry) -> Self {
        let mut rules = HashMap::new();
        let mut compiled: HashMap<&'static str, Vec<CompiledRule>> = HashMap::new();

        for &lang_id in crate::grammar::SUPPORTED_LANGUAGES {
            let Some((canonical, language)) = grammars.language(lang_id) else {
                continue;
            };
            let mut compiled_for_lang = Vec::new();
            for rule in catalog_for(lang_id) {
                rules.insert(rule.id.clone(), rule.clone());
                match compile_query(&language, &rule) {
                    Ok(query) => compiled_for_lang.push(CompiledRule { rule, query }),
                    Err(err) => {
                        tracing::warn!(rule_id = %rule.id, error = %err, "excluding rule with bad query");
                    }
                }
            }
            compiled.insert(canonical, compiled_for_lang);
        }

        Self { rules, compiled }
    }

    /// `getQueries(lang, categories?, ids?) -> Rule[]` (filtered compiled rules).
    #[must_use]
    pub fn get_queries(
        &self,
        language: &str,
        categories: Option<&[RuleCategory]>,
        ids: Option<&[String]>,
    ) -> Vec<&CompiledRule> {
        self.compiled
            .get(language)
            .into_iter()
            .flatten()
            .filter(|c| categories.map_or(true, |cats| cats.contains(&c.rule.category)))
            .filter(|c| ids.map_or(true, |ids| ids.contains(&c.rule.id)))
            .collect()
    }

    /// `getRuleById(id) -> Rule`
    #[must_use]
    pub fn get_rule_by_id(&self, id: &str) -> Option<&Rule> {
        self.rules.get(id)
    }

    /// Total number of rules whose query failed to compile and were excluded.
    #[must_use]
    pub fn excluded_count(&self) -> usize {
        let compiled: usize = self.compiled.values().map(Vec::len).sum();
        self.rules.len().saturating_sub(compiled)
    }
}

fn compile_query(language: &Language, rule: &Rule) -> Result<Query, DetectError> {
    Query::new(language, &rule.pattern_source).map_err(|source| DetectError::QueryCompilation {
        rule_id: rule.id.clone(),
        source,
    })
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}
