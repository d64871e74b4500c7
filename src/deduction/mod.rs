//! Natural-deduction proof checking: script reading, scope frames, reference
//! visibility and the inference rules.

mod checker;
pub mod rules;
pub mod scope;
pub mod script;
pub mod table;

pub use checker::{CaseReport, ProofChecker, ProofReport, Verdict};
pub use rules::Rule;
pub use script::{split_cases, ProofCase, Reference};

/// Checks a single proof with the default options.
pub fn check_proof(source: &str) -> Verdict {
    ProofChecker::default().check_source(source).verdict
}
