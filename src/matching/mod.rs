//! Attribute matching.
//!
//! The selector only talks to the `AttributeMatcher` trait. `SchemaMatcher`
//! is the implementation driven by an `AttributeSchema`; callers with their
//! own compatibility rules can plug in a different one.

pub mod explain;
pub mod matcher;
pub mod schema;

pub use explain::{
    DiscardedCandidate, ExplanationBuilder, LoggingExplanation, NoExplanation,
    TraceDiscardedCandidates,
};
pub use matcher::SchemaMatcher;
pub use schema::{AttributeRules, AttributeSchema, CompatibilityRule, DisambiguationRule};

use anyhow::Result;
use thiserror::Error;

use crate::core::attribute::{AttributeSet, AttributeType, HasAttributes};

/// Compatibility and disambiguation service shared by concurrent selections.
///
/// Implementations must not keep per-call state; anything that accumulates
/// during a call goes through the `ExplanationBuilder` argument.
pub trait AttributeMatcher: Send + Sync {
    /// Return the indices (ascending) of the candidates that are compatible
    /// with `requested`, narrowed by the schema's disambiguation rules.
    fn match_candidates(
        &self,
        candidates: &[&AttributeSet],
        requested: &AttributeSet,
        explain: &mut dyn ExplanationBuilder,
    ) -> Result<Vec<usize>>;

    /// Whether `candidate` satisfies every attribute of `requested` it defines.
    fn is_matching(&self, candidate: &AttributeSet, requested: &AttributeSet) -> Result<bool>;

    /// Whether every attribute defined by both sets is compatible in at least
    /// one direction.
    fn are_mutually_compatible(&self, a: &AttributeSet, b: &AttributeSet) -> Result<bool>;
}

/// Run `match_candidates` over anything with attributes and return the
/// surviving items in their original order.
pub fn match_multiple_candidates<'a, T: HasAttributes>(
    matcher: &dyn AttributeMatcher,
    candidates: &'a [T],
    requested: &AttributeSet,
    explain: &mut dyn ExplanationBuilder,
) -> Result<Vec<&'a T>> {
    let sets: Vec<&AttributeSet> = candidates.iter().map(HasAttributes::attributes).collect();
    let indices = matcher.match_candidates(&sets, requested, explain)?;
    indices
        .into_iter()
        .map(|i| {
            candidates.get(i).ok_or_else(|| {
                anyhow::anyhow!(
                    "attribute matcher returned candidate {} of {}",
                    i,
                    candidates.len()
                )
            })
        })
        .collect()
}

/// Errors raised by `SchemaMatcher` when values contradict the schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("attribute `{attribute}` is declared as {declared} but has {found} value `{value}`")]
    TypeMismatch {
        attribute: String,
        declared: AttributeType,
        found: AttributeType,
        value: String,
    },
}
