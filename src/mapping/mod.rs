pub mod catalog;

use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize};

use crate::error::CarecomplyError;

pub use catalog::{FallbackRule, Standard, StandardsCatalog, TriggerRule};

/// A proposed link between a text excerpt and a compliance standard.
/// `confidence` is a heuristic score in [0,1], not a calibrated probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSuggestion {
    pub standard_id: String,
    pub confidence: f64,
    pub snippet: String,
}

/// Heuristic matcher from free text to catalog standards. Trigger keywords
/// are matched case-insensitively as substrings; suggestions come out in
/// trigger declaration order, one per fired rule.
pub struct MappingSuggester {
    catalog: StandardsCatalog,
    automaton: AhoCorasick,
}

impl MappingSuggester {
    /// Build the suggester over the built-in catalog.
    pub fn new() -> Self {
        Self::with_catalog(StandardsCatalog::default_catalog())
            .expect("built-in standards catalog should be valid")
    }

    /// Build from a custom catalog. Rejects inconsistent catalogs.
    pub fn with_catalog(catalog: StandardsCatalog) -> crate::error::Result<Self> {
        catalog.validate()?;
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(catalog.triggers.iter().map(|t| t.keyword.as_str()))
            .map_err(|e| CarecomplyError::InvalidCatalog {
                reason: format!("trigger automaton build failed: {e}"),
            })?;
        Ok(Self { catalog, automaton })
    }

    pub fn catalog(&self) -> &StandardsCatalog {
        &self.catalog
    }

    /// Suggest standards for a block of text. Always returns at least one
    /// suggestion; if no trigger fires, the fallback standard is suggested
    /// with low confidence and a snippet from the head of the text.
    pub fn suggest(&self, text: &str) -> Vec<MappingSuggestion> {
        let mut fired = vec![false; self.catalog.triggers.len()];
        for mat in self.automaton.find_overlapping_iter(text) {
            fired[mat.pattern().as_usize()] = true;
        }

        let mut suggestions = Vec::new();
        for (rule, _) in self
            .catalog
            .triggers
            .iter()
            .zip(&fired)
            .filter(|(_, fired)| **fired)
        {
            suggestions.push(MappingSuggestion {
                standard_id: rule.standard_id.clone(),
                confidence: rule.confidence,
                snippet: rule.snippet_template.replace("{keyword}", &rule.keyword),
            });
        }

        if suggestions.is_empty() {
            suggestions.push(MappingSuggestion {
                standard_id: self.catalog.fallback.standard_id.clone(),
                confidence: self.catalog.fallback.confidence,
                snippet: head_snippet(text, 50),
            });
        }

        tracing::debug!(suggestions = suggestions.len(), "mapping pass complete");
        suggestions
    }
}

impl Default for MappingSuggester {
    fn default() -> Self {
        Self::new()
    }
}

/// First `max_chars` characters of the text, char-boundary safe.
fn head_snippet(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
