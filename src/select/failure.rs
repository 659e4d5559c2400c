//! Selection failures and the handler that builds them.
//!
//! Failures are only constructed on the failure path. They hold plain
//! descriptions rather than references into the producer, so a failure can
//! outlive the selection call and be shared across threads.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::core::attribute::{AttributeSet, HasAttributes};
use crate::core::variant::{ProducerVariantSet, Variant};
use crate::matching::TraceDiscardedCandidates;
use crate::transform::TransformedVariant;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// A candidate as shown in a failure: a name and its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub name: String,
    pub attributes: AttributeSet,
}

impl Candidate {
    fn variant(variant: &Variant) -> Self {
        Candidate {
            name: variant.id().to_string(),
            attributes: variant.attributes().clone(),
        }
    }

    fn chain(chain: &TransformedVariant) -> Self {
        let actions: Vec<String> = chain
            .steps()
            .iter()
            .map(|step| step.definition().to_string())
            .collect();
        Candidate {
            name: format!("{} via {}", chain.root().id(), actions.join(" -> ")),
            attributes: chain.attributes().clone(),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.attributes)
    }
}

/// Why a selection produced no artifact set.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum SelectionFailure {
    #[error("multiple variants of `{producer}` match the requested attributes {requested}")]
    #[diagnostic(
        code(harbour::variants::ambiguous_variants),
        help("request an attribute that tells the candidates apart")
    )]
    AmbiguousVariants {
        producer: String,
        requested: AttributeSet,
        candidates: Vec<Candidate>,
        explanations: Vec<String>,
    },

    #[error("multiple transform chains can turn a variant of `{producer}` into {requested}")]
    #[diagnostic(
        code(harbour::variants::ambiguous_transforms),
        help("remove one of the competing transforms or request a more specific attribute")
    )]
    AmbiguousTransforms {
        producer: String,
        requested: AttributeSet,
        candidates: Vec<Candidate>,
    },

    #[error("no variant of `{producer}` is compatible with {requested}")]
    #[diagnostic(
        code(harbour::variants::no_compatible_artifact),
        help("register a transform that produces the requested attributes")
    )]
    NoCompatibleArtifact {
        producer: String,
        requested: AttributeSet,
        variants: Vec<Candidate>,
    },

    #[error("could not select a variant of `{producer}` for {requested}")]
    #[diagnostic(code(harbour::variants::unknown_selection_failure))]
    UnknownSelection {
        producer: String,
        requested: AttributeSet,
        #[source]
        cause: Box<dyn StdError + Send + Sync>,
    },
}

impl SelectionFailure {
    /// Stable machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SelectionFailure::AmbiguousVariants { .. } => "ambiguous-variants",
            SelectionFailure::AmbiguousTransforms { .. } => "ambiguous-transforms",
            SelectionFailure::NoCompatibleArtifact { .. } => "no-compatible-artifact",
            SelectionFailure::UnknownSelection { .. } => "unknown-selection-failure",
        }
    }

    /// The candidates listed by the failure (empty for unknown failures).
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            SelectionFailure::AmbiguousVariants { candidates, .. }
            | SelectionFailure::AmbiguousTransforms { candidates, .. } => candidates,
            SelectionFailure::NoCompatibleArtifact { variants, .. } => variants,
            SelectionFailure::UnknownSelection { .. } => &[],
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            SelectionFailure::AmbiguousVariants {
                candidates,
                explanations,
                ..
            } => {
                let mut diag = diag.with_context_list("candidates:", candidates);
                if !explanations.is_empty() {
                    diag = diag.with_context_list("discarded:", explanations);
                }
                diag.with_suggestion(suggestions::ADD_DISAMBIGUATING_ATTRIBUTE)
                    .with_suggestion(suggestions::ADD_DISAMBIGUATION_RULE)
            }

            SelectionFailure::AmbiguousTransforms { candidates, .. } => diag
                .with_context_list("candidate chains:", candidates)
                .with_suggestion(suggestions::REMOVE_TRANSFORM)
                .with_suggestion(suggestions::ADD_DISAMBIGUATING_ATTRIBUTE),

            SelectionFailure::NoCompatibleArtifact { variants, .. } => {
                let diag = if variants.is_empty() {
                    diag.with_context("the producer offers no variants")
                } else {
                    diag.with_context_list("available variants:", variants)
                };
                diag.with_suggestion(suggestions::CHECK_REQUEST)
                    .with_suggestion(suggestions::REGISTER_TRANSFORM)
            }

            SelectionFailure::UnknownSelection { cause, .. } => diag
                .with_context(format!("caused by: {}", cause))
                .with_suggestion(suggestions::REPORT_BUG),
        }
    }
}

/// Factory for structured selection failures.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResolutionFailureHandler;

impl ResolutionFailureHandler {
    pub fn new() -> Self {
        ResolutionFailureHandler
    }

    /// Several variants match directly. `trace` holds the explanation pass,
    /// whose indices refer to `producer.variants()`.
    pub fn ambiguous_artifacts_failure(
        &self,
        producer: &ProducerVariantSet,
        requested: &AttributeSet,
        matches: &[&Arc<Variant>],
        trace: &TraceDiscardedCandidates,
    ) -> SelectionFailure {
        let variants = producer.variants();
        let explanations = trace
            .discarded()
            .iter()
            .filter_map(|discard| {
                variants
                    .get(discard.candidate)
                    .map(|variant| format!("{}: {}", variant.describe(), discard))
            })
            .collect();
        SelectionFailure::AmbiguousVariants {
            producer: producer.name().to_string(),
            requested: requested.clone(),
            candidates: matches.iter().map(|v| Candidate::variant(v)).collect(),
            explanations,
        }
    }

    pub fn ambiguous_artifact_transforms_failure(
        &self,
        producer: &ProducerVariantSet,
        requested: &AttributeSet,
        candidates: &[TransformedVariant],
    ) -> SelectionFailure {
        SelectionFailure::AmbiguousTransforms {
            producer: producer.name().to_string(),
            requested: requested.clone(),
            candidates: candidates.iter().map(Candidate::chain).collect(),
        }
    }

    pub fn no_compatible_artifact_failure(
        &self,
        producer: &ProducerVariantSet,
        requested: &AttributeSet,
        variants: &[Arc<Variant>],
    ) -> SelectionFailure {
        SelectionFailure::NoCompatibleArtifact {
            producer: producer.name().to_string(),
            requested: requested.clone(),
            variants: variants.iter().map(|v| Candidate::variant(v)).collect(),
        }
    }

    pub fn unknown_artifact_variant_selection_failure(
        &self,
        producer: &ProducerVariantSet,
        requested: &AttributeSet,
        cause: anyhow::Error,
    ) -> SelectionFailure {
        SelectionFailure::UnknownSelection {
            producer: producer.name().to_string(),
            requested: requested.clone(),
            cause: cause.into(),
        }
    }
}
