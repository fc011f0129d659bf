use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CarecomplyError, Result};

/// One entry in the fixed catalog of compliance standards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standard {
    pub id: String,
    pub description: String,
}

/// Keyword trigger: if `keyword` occurs in the text (case-insensitive
/// substring), suggest `standard_id` with this confidence. The snippet is
/// rendered from `snippet_template` with `{keyword}` substituted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRule {
    pub keyword: String,
    pub standard_id: String,
    pub confidence: f64,
    #[serde(default = "default_snippet_template")]
    pub snippet_template: String,
}

/// Emitted when no trigger fires, so every call yields at least one
/// suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackRule {
    pub standard_id: String,
    #[serde(default = "default_fallback_confidence")]
    pub confidence: f64,
}

fn default_snippet_template() -> String {
    "policy text mentions \"{keyword}\"".into()
}

fn default_fallback_confidence() -> f64 {
    0.1
}

/// The standards catalog plus its trigger rules. Loaded as configuration so
/// the catalog can grow without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardsCatalog {
    pub standards: Vec<Standard>,
    pub triggers: Vec<TriggerRule>,
    pub fallback: FallbackRule,
}

impl StandardsCatalog {
    /// The built-in catalog used when no catalog file is configured.
    pub fn default_catalog() -> Self {
        let standards = vec![
            standard("1.A.1", "Written Policy for Health and Safety"),
            standard("1.A.2", "Staff Training and Competency Records"),
            standard("2.B.3", "Annual Policy Review and Attestation"),
            standard("3.C.1", "Privacy and Confidentiality of Health Information"),
            standard("4.D.2", "Incident Reporting and Follow-up"),
            standard("5.E.1", "Infection Prevention and Control"),
            standard("6.F.4", "Medication Handling and Storage"),
            standard("GEN-1", "General Documentation Evidence"),
        ];
        let triggers = vec![
            trigger("safety", "1.A.1", 0.6),
            trigger("policy", "1.A.1", 0.5),
            trigger("training", "1.A.2", 0.6),
            trigger("competency", "1.A.2", 0.55),
            trigger("review", "2.B.3", 0.5),
            trigger("attestation", "2.B.3", 0.6),
            trigger("privacy", "3.C.1", 0.7),
            trigger("confidential", "3.C.1", 0.6),
            trigger("protected health information", "3.C.1", 0.75),
            trigger("incident", "4.D.2", 0.6),
            trigger("reporting", "4.D.2", 0.45),
            trigger("infection", "5.E.1", 0.7),
            trigger("hygiene", "5.E.1", 0.5),
            trigger("medication", "6.F.4", 0.6),
        ];
        Self {
            standards,
            triggers,
            fallback: FallbackRule {
                standard_id: "GEN-1".into(),
                confidence: default_fallback_confidence(),
            },
        }
    }

    /// Load a catalog from a YAML file. Returns the built-in catalog if the
    /// file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default_catalog());
        }
        let contents = std::fs::read_to_string(path)?;
        let catalog: Self =
            serde_yaml::from_str(&contents).map_err(|e| CarecomplyError::ConfigParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check internal consistency: every rule must reference a cataloged
    /// standard, keywords must be non-empty, confidences must lie in [0,1].
    pub fn validate(&self) -> Result<()> {
        for rule in &self.triggers {
            if rule.keyword.is_empty() {
                return Err(CarecomplyError::InvalidCatalog {
                    reason: format!("empty keyword for standard {}", rule.standard_id),
                });
            }
            if !(0.0..=1.0).contains(&rule.confidence) {
                return Err(CarecomplyError::InvalidCatalog {
                    reason: format!(
                        "confidence {} out of range for keyword {:?}",
                        rule.confidence, rule.keyword
                    ),
                });
            }
            if !self.has_standard(&rule.standard_id) {
                return Err(CarecomplyError::InvalidCatalog {
                    reason: format!("unknown standard {} for keyword {:?}", rule.standard_id, rule.keyword),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.fallback.confidence) {
            return Err(CarecomplyError::InvalidCatalog {
                reason: format!("fallback confidence {} out of range", self.fallback.confidence),
            });
        }
        if !self.has_standard(&self.fallback.standard_id) {
            return Err(CarecomplyError::InvalidCatalog {
                reason: format!("unknown fallback standard {}", self.fallback.standard_id),
            });
        }
        Ok(())
    }

    fn has_standard(&self, id: &str) -> bool {
        self.standards.iter().any(|s| s.id == id)
    }
}

fn standard(id: &str, description: &str) -> Standard {
    Standard {
        id: id.into(),
        description: description.into(),
    }
}

fn trigger(keyword: &str, standard_id: &str, confidence: f64) -> TriggerRule {
    TriggerRule {
        keyword: keyword.into(),
        standard_id: standard_id.into(),
        confidence,
        snippet_template: default_snippet_template(),
    }
}
