//! Integration tests for the compliance mapping suggester.

use std::io::Write;

use carecomply::mapping::{MappingSuggester, StandardsCatalog};
use carecomply::suggest_mappings;

// ---------------------------------------------------------------------------
// Suggestion guarantees
// ---------------------------------------------------------------------------

#[test]
fn always_at_least_one_suggestion() {
    for input in ["", "x", "totally unrelated memo", "safety review"] {
        let suggestions = suggest_mappings(input);
        assert!(
            !suggestions.is_empty(),
            "no suggestions for {input:?}"
        );
    }
}

#[test]
fn safety_and_review_both_trigger() {
    let suggestions = suggest_mappings("Our safety policy requires annual review");

    let safety = suggestions
        .iter()
        .find(|s| s.standard_id == "1.A.1")
        .expect("safety standard suggested");
    let review = suggestions
        .iter()
        .find(|s| s.standard_id == "2.B.3")
        .expect("review standard suggested");

    let fallback_confidence = 0.1;
    assert!(safety.confidence > fallback_confidence);
    assert!(review.confidence > fallback_confidence);
}

#[test]
fn fallback_snippet_comes_from_text_head() {
    let text = "a long facilities memo that mentions nothing from the catalog at all, \
                continuing well past the excerpt cutoff so the snippet is a prefix";
    let suggestions = suggest_mappings(text);

    assert_eq!(suggestions.len(), 1);
    let fallback = &suggestions[0];
    assert!((fallback.confidence - 0.1).abs() < f64::EPSILON);
    assert!(text.starts_with(&fallback.snippet));
    assert!(fallback.snippet.chars().count() <= 50);
}

#[test]
fn confidence_stays_in_unit_interval() {
    for input in ["", "safety training privacy incident medication review"] {
        for s in suggest_mappings(input) {
            assert!((0.0..=1.0).contains(&s.confidence));
        }
    }
}

#[test]
fn suggesting_twice_is_identical() {
    let suggester = MappingSuggester::new();
    let text = "privacy and confidentiality training for new staff";
    assert_eq!(suggester.suggest(text), suggester.suggest(text));
}

// ---------------------------------------------------------------------------
// Catalog loading
// ---------------------------------------------------------------------------

#[test]
fn catalog_loads_from_yaml() {
    let yaml = r#"
standards:
  - id: "H-1"
    description: "Hand Hygiene Protocol"
  - id: "H-9"
    description: "General Evidence"
triggers:
  - keyword: "hygiene"
    standard_id: "H-1"
    confidence: 0.8
fallback:
  standard_id: "H-9"
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let catalog = StandardsCatalog::load_from(file.path()).unwrap();
    let suggester = MappingSuggester::with_catalog(catalog).unwrap();

    let suggestions = suggester.suggest("hand hygiene audit");
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].standard_id, "H-1");
    assert!((suggestions[0].confidence - 0.8).abs() < f64::EPSILON);

    // Unset optional fields fall back to serde defaults.
    let fallback = suggester.suggest("nothing relevant");
    assert_eq!(fallback[0].standard_id, "H-9");
    assert!((fallback[0].confidence - 0.1).abs() < f64::EPSILON);
}

#[test]
fn inconsistent_catalog_is_rejected() {
    let yaml = r#"
standards:
  - id: "H-1"
    description: "Hand Hygiene Protocol"
triggers:
  - keyword: "hygiene"
    standard_id: "MISSING"
    confidence: 0.8
fallback:
  standard_id: "H-1"
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    assert!(StandardsCatalog::load_from(file.path()).is_err());
}
