//! Variant selection.
//!
//! Picks the producer variant that matches a request, or the transform
//! chain that turns one into a match. The selector is pure with respect to
//! its inputs and holds only read-only collaborators, so one instance serves
//! any number of concurrent callers.

pub mod failure;

pub use failure::{Candidate, ResolutionFailureHandler, SelectionFailure};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use rayon::prelude::*;
use thiserror::Error;

use crate::artifacts::{
    NoUpstreamDependencies, ResolvedArtifactSet, TransformExecutor, TransformedArtifactSet,
    UpstreamDependencyResolver,
};
use crate::core::attribute::{AttributeSet, HasAttributes};
use crate::core::variant::ProducerVariantSet;
use crate::matching::{
    match_multiple_candidates, AttributeMatcher, ExplanationBuilder, LoggingExplanation,
    NoExplanation, TraceDiscardedCandidates,
};
use crate::transform::{find_transformed_variants, TransformRegistry, TransformedVariant};
use crate::util::Config;

/// Why `try_select` did not produce an artifact set.
#[derive(Debug, Error)]
pub enum SelectError {
    /// A selection decision: ambiguity or no match.
    #[error(transparent)]
    Failure(#[from] SelectionFailure),

    /// A collaborator failed.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// One entry of a batch passed to `VariantSelector::select_all`.
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    pub producer: ProducerVariantSet,
    pub requested: AttributeSet,
    pub allow_no_matching_variants: bool,
}

/// Selects artifacts by attribute matching, falling back to transform chains.
#[derive(Clone)]
pub struct VariantSelector {
    matcher: Arc<dyn AttributeMatcher>,
    registry: Arc<TransformRegistry>,
    executor: Arc<dyn TransformExecutor>,
    dependencies: Arc<dyn UpstreamDependencyResolver>,
    failures: ResolutionFailureHandler,
    explain_discarded: bool,
    jobs: Option<usize>,
}

impl VariantSelector {
    pub fn new(
        matcher: Arc<dyn AttributeMatcher>,
        registry: Arc<TransformRegistry>,
        executor: Arc<dyn TransformExecutor>,
    ) -> Self {
        VariantSelector {
            matcher,
            registry,
            executor,
            dependencies: Arc::new(NoUpstreamDependencies),
            failures: ResolutionFailureHandler::new(),
            explain_discarded: true,
            jobs: None,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Arc<dyn UpstreamDependencyResolver>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_config(mut self, config: &Config) -> Self {
        self.explain_discarded = config.explain_discarded();
        self.jobs = config.jobs();
        self
    }

    pub fn matcher(&self) -> &dyn AttributeMatcher {
        self.matcher.as_ref()
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    /// Select artifacts for `requested` from `producer`.
    ///
    /// Never fails here: any failure is returned as a `Broken` set and
    /// surfaces when the set is realized. A panicking collaborator counts as
    /// an unexpected failure, so it cannot take down other selections.
    pub fn select(
        &self,
        producer: &ProducerVariantSet,
        requested: &AttributeSet,
        allow_no_matching_variants: bool,
    ) -> ResolvedArtifactSet {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.try_select(producer, requested, allow_no_matching_variants)
        }))
        .unwrap_or_else(|payload| {
            Err(SelectError::Unexpected(anyhow!(
                "selection panicked: {}",
                panic_message(&*payload)
            )))
        });

        match outcome {
            Ok(set) => set,
            Err(SelectError::Failure(failure)) => {
                tracing::debug!("Selection from `{}` failed: {}", producer.name(), failure);
                ResolvedArtifactSet::broken(failure)
            }
            Err(SelectError::Unexpected(cause)) => {
                tracing::warn!(
                    "Unexpected error selecting a variant of `{}`: {:#}",
                    producer.name(),
                    cause
                );
                ResolvedArtifactSet::broken(
                    self.failures
                        .unknown_artifact_variant_selection_failure(producer, requested, cause),
                )
            }
        }
    }

    /// Like `select`, but returns failures synchronously.
    pub fn try_select(
        &self,
        producer: &ProducerVariantSet,
        requested: &AttributeSet,
        allow_no_matching_variants: bool,
    ) -> Result<ResolvedArtifactSet, SelectError> {
        if self.explain_discarded {
            self.do_select(producer, requested, allow_no_matching_variants, &mut LoggingExplanation)
        } else {
            self.do_select(producer, requested, allow_no_matching_variants, &mut NoExplanation)
        }
    }

    /// Run independent selections in parallel. Results keep input order.
    pub fn select_all(&self, requests: &[SelectionRequest]) -> Vec<ResolvedArtifactSet> {
        let run = || -> Vec<ResolvedArtifactSet> {
            requests
                .par_iter()
                .map(|r| self.select(&r.producer, &r.requested, r.allow_no_matching_variants))
                .collect()
        };
        match self.jobs {
            Some(jobs) => match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
                Ok(pool) => pool.install(run),
                Err(e) => {
                    tracing::warn!("Failed to build a {}-thread pool: {}", jobs, e);
                    run()
                }
            },
            None => run(),
        }
    }

    /// Every minimal transform chain for `requested`, before disambiguation.
    pub fn transform_candidates(
        &self,
        producer: &ProducerVariantSet,
        requested: &AttributeSet,
    ) -> Result<Vec<TransformedVariant>> {
        let effective = requested.concat(producer.overridden_attributes());
        find_transformed_variants(
            self.matcher.as_ref(),
            self.registry.registrations(),
            producer.variants(),
            &effective,
        )
    }

    fn do_select(
        &self,
        producer: &ProducerVariantSet,
        requested: &AttributeSet,
        allow_no_matching_variants: bool,
        explain: &mut dyn ExplanationBuilder,
    ) -> Result<ResolvedArtifactSet, SelectError> {
        let matcher = self.matcher.as_ref();
        let effective = requested.concat(producer.overridden_attributes());
        let variants = producer.variants();

        let matches = match_multiple_candidates(matcher, variants, &effective, explain)?;
        if let [only] = matches.as_slice() {
            tracing::debug!("Selected variant `{}` of `{}`", only.id(), producer.name());
            return Ok(ResolvedArtifactSet::Direct(Arc::clone(only)));
        }
        if matches.len() > 1 {
            // Ambiguous: match again, this time collecting why the others lost.
            let mut trace = TraceDiscardedCandidates::new();
            let matches = match_multiple_candidates(matcher, variants, &effective, &mut trace)?;
            return Err(self
                .failures
                .ambiguous_artifacts_failure(producer, &effective, &matches, &trace)
                .into());
        }

        let mut candidates = find_transformed_variants(
            matcher,
            self.registry.registrations(),
            variants,
            &effective,
        )?;
        tracing::debug!(
            "No variant of `{}` matches {}; found {} transform chain(s)",
            producer.name(),
            effective,
            candidates.len()
        );

        if candidates.len() > 1 {
            candidates = try_disambiguate(matcher, candidates, &effective, explain)?;
        }

        match candidates.len() {
            0 if allow_no_matching_variants => Ok(ResolvedArtifactSet::Empty),
            0 => Err(self
                .failures
                .no_compatible_artifact_failure(producer, &effective, variants)
                .into()),
            1 => {
                let chain = candidates.remove(0);
                tracing::debug!("Selected transform chain {}", chain);
                Ok(ResolvedArtifactSet::Transformed(TransformedArtifactSet::new(
                    chain,
                    Arc::clone(&self.dependencies),
                    Arc::clone(&self.executor),
                )))
            }
            _ => Err(self
                .failures
                .ambiguous_artifact_transforms_failure(producer, &effective, &candidates)
                .into()),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Reduce competing transform chains to the smallest defensible set.
///
/// Schema disambiguation runs first. If several chains survive, the last one
/// is the pivot: chains mutually compatible with it are interchangeable with
/// it and dropped, incompatible ones are kept. The pivot comes first, then
/// the kept chains in input order. Applying this again gives the same set.
pub fn try_disambiguate(
    matcher: &dyn AttributeMatcher,
    candidates: Vec<TransformedVariant>,
    requested: &AttributeSet,
    explain: &mut dyn ExplanationBuilder,
) -> Result<Vec<TransformedVariant>> {
    let matches: Vec<TransformedVariant> =
        match_multiple_candidates(matcher, &candidates, requested, explain)?
            .into_iter()
            .cloned()
            .collect();
    if matches.len() == 1 {
        return Ok(matches);
    }

    let Some((pivot, others)) = matches.split_last() else {
        anyhow::bail!(
            "attribute matcher discarded all {} transform chains for {}",
            candidates.len(),
            requested
        );
    };

    let mut different = Vec::with_capacity(matches.len());
    different.push(pivot.clone());
    for candidate in others {
        if !matcher.are_mutually_compatible(candidate.attributes(), pivot.attributes())? {
            different.push(candidate.clone());
        }
    }

    if different.len() > 1 {
        tracing::debug!(
            "{} transform chains remain incompatible with {}",
            different.len(),
            pivot
        );
    }
    Ok(different)
}
