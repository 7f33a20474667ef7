//! Free-text verdict classification, kept only for contract-compatibility
//! tests.
//!
//! An earlier iteration of the verifier asked the model for a plain yes/no
//! answer and keyword-matched the reply. Schema-constrained output replaced
//! it; nothing on the runtime path calls this module. It stays so the test
//! suite can show the structured path covers every answer the keyword
//! heuristic understood, plus the rephrasings it got wrong.

/// Tri-state reading of a free-text answer.
///
/// The old heuristic collapsed `Indeterminate` into a defaulted "no", which
/// made "could not parse" indistinguishable from "explicitly no". Callers that
/// want the old behavior can map `Indeterminate` to `NoMatch` themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeTextVerdict {
    Match,
    NoMatch,
    Indeterminate,
}

const POSITIVE_MARKERS: [&str; 3] = ["yes", "it does", "shows a black baseball hat"];
const NEGATIVE_MARKERS: [&str; 3] = ["no", "it does not", "does not show"];

/// Keyword classification over the lower-cased model answer.
///
/// Negative markers are checked first since "it does not" contains "it does".
/// The substring matching is as naive as the original: "unknown" contains
/// "no", so hedged answers misclassify. That fragility is exactly why the
/// schema path superseded this one.
pub fn classify_free_text(answer: &str) -> FreeTextVerdict {
    let lowered = answer.to_lowercase();
    if NEGATIVE_MARKERS.iter().any(|m| lowered.contains(m)) {
        return FreeTextVerdict::NoMatch;
    }
    if POSITIVE_MARKERS.iter().any(|m| lowered.contains(m)) {
        return FreeTextVerdict::Match;
    }
    FreeTextVerdict::Indeterminate
}
