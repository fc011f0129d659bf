use serde::{Deserialize, Serialize};

/// The PHI-shaped token classes the scanner recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhiKind {
    Date,
    Email,
    Phone,
    Ssn,
    Zip,
}

impl std::fmt::Display for PhiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhiKind::Date => write!(f, "DATE"),
            PhiKind::Email => write!(f, "EMAIL"),
            PhiKind::Phone => write!(f, "PHONE"),
            PhiKind::Ssn => write!(f, "SSN"),
            PhiKind::Zip => write!(f, "ZIP"),
        }
    }
}

/// Default pattern table, one entry per kind, in the order findings are
/// enumerated. The table is data so new kinds are additive.
pub fn default_patterns() -> Vec<(PhiKind, String)> {
    vec![
        // Slash-delimited dates. No calendar validation: 12/34/5678 matches.
        (PhiKind::Date, r"\d{1,2}/\d{1,2}/\d{2,4}".into()),
        // local@domain.tld, case-insensitive.
        (
            PhiKind::Email,
            r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}".into(),
        ),
        // NANP 10-digit numbers: optional +1, optional space/dot/hyphen
        // separators, optional parens around the area code.
        (
            PhiKind::Phone,
            r"(?:\+?1[-. ]?)?(?:\(\d{3}\)[-. ]?|\d{3}[-. ]?)\d{3}[-. ]?\d{4}".into(),
        ),
        (PhiKind::Ssn, r"\b\d{3}-\d{2}-\d{4}\b".into()),
        (PhiKind::Zip, r"\b\d{5}(?:-\d{4})?\b".into()),
    ]
}
