//! Core text-analysis and background-task engine for a healthcare
//! compliance learning-management application.
//!
//! Three components, usable independently of any web framework:
//!
//! - [`scanner`] -- regex-classifier detecting PHI-shaped tokens (dates,
//!   emails, phone numbers, SSNs, ZIP codes) in free text.
//! - [`mapping`] -- heuristic keyword matcher scoring free text against a
//!   catalog of compliance standards, with evidence snippets.
//! - [`jobs`] -- non-blocking async task runner with persisted state,
//!   driving document-to-course generation; tasks always reach a terminal
//!   state (`completed`, `failed`, or `cancelled`).
//!
//! The scanner and suggester are pure functions over text:
//!
//! ```
//! let result = carecomply::scan_text("SSN 123-45-6789, ZIP 90210");
//! assert!(result.has_phi);
//!
//! let suggestions = carecomply::suggest_mappings("annual safety training");
//! assert!(!suggestions.is_empty());
//! ```

pub mod config;
pub mod error;
pub mod jobs;
pub mod mapping;
pub mod scanner;

pub use config::JobsConfig;
pub use error::{CarecomplyError, Result};
pub use jobs::{
    idempotency_key, CourseRecord, CourseStatus, JobRunner, MemoryStore, Persistence, Task,
    TaskStatus, TaskType,
};
pub use mapping::{MappingSuggester, MappingSuggestion, Standard, StandardsCatalog, TriggerRule};
pub use scanner::{Finding, PhiKind, PhiScanner, ScanResult};

/// Scan text for PHI with the default pattern table.
pub fn scan_text(text: &str) -> ScanResult {
    PhiScanner::new().scan(text)
}

/// Suggest compliance-standard mappings with the built-in catalog.
pub fn suggest_mappings(text: &str) -> Vec<MappingSuggestion> {
    MappingSuggester::new().suggest(text)
}
