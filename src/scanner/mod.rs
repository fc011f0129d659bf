pub mod patterns;

use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

use crate::error::CarecomplyError;

pub use patterns::{default_patterns, PhiKind};

/// One detected PHI occurrence. `offset` is a byte offset into the scanned
/// text; `text[offset..offset + value.len()]` equals `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: PhiKind,
    pub value: String,
    pub offset: usize,
}

/// Aggregate scan outcome. `has_phi` is true iff `findings` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub has_phi: bool,
    pub findings: Vec<Finding>,
}

impl ScanResult {
    /// Build a result from collected findings, deriving `has_phi`.
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        Self {
            has_phi: !findings.is_empty(),
            findings,
        }
    }
}

/// Regex-classifier over free text. Patterns are scanned in table order;
/// all matches for one kind are appended before moving to the next.
pub struct PhiScanner {
    regex_set: RegexSet,
    patterns: Vec<(PhiKind, Regex)>,
}

impl PhiScanner {
    /// Build the scanner over the built-in pattern table.
    pub fn new() -> Self {
        Self::with_patterns(default_patterns()).expect("built-in PHI patterns should compile")
    }

    /// Build from a custom pattern table.
    pub fn with_patterns(patterns: Vec<(PhiKind, String)>) -> crate::error::Result<Self> {
        let compiled = patterns
            .iter()
            .map(|(kind, p)| {
                Regex::new(p)
                    .map(|re| (*kind, re))
                    .map_err(|e| CarecomplyError::InvalidPattern {
                        kind: kind.to_string(),
                        reason: e.to_string(),
                    })
            })
            .collect::<crate::error::Result<Vec<_>>>()?;
        let regex_set = RegexSet::new(patterns.iter().map(|(_, p)| p)).map_err(|e| {
            CarecomplyError::InvalidPattern {
                kind: "pattern table".into(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            regex_set,
            patterns: compiled,
        })
    }

    /// Scan arbitrary text for PHI-shaped tokens. Total over any string
    /// input; empty input returns an empty result.
    pub fn scan(&self, text: &str) -> ScanResult {
        // Use the RegexSet for fast matching, then the individual regexes
        // for match positions.
        let matching: Vec<usize> = self.regex_set.matches(text).into_iter().collect();
        if matching.is_empty() {
            return ScanResult::from_findings(Vec::new());
        }

        let mut findings = Vec::new();
        for &idx in &matching {
            let (kind, re) = &self.patterns[idx];
            for mat in re.find_iter(text) {
                findings.push(Finding {
                    kind: *kind,
                    value: mat.as_str().to_string(),
                    offset: mat.start(),
                });
            }
        }

        tracing::debug!(findings = findings.len(), "phi scan complete");
        ScanResult::from_findings(findings)
    }
}

impl Default for PhiScanner {
    fn default() -> Self {
        Self::new()
    }
}
