//! Test utilities and instrumented collaborators for unit tests.
//!
//! The selector only sees trait objects, so tests swap in collaborators
//! that count calls, fail on demand, or record what they executed.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::test_support::*;
//!
//! let matcher = Arc::new(CountingMatcher::default());
//! let selector = VariantSelector::new(matcher.clone(), Arc::new(jar_to_classes_registry()),
//!     Arc::new(RecordingExecutor::new()));
//! selector.select(&producer("lib", [variant("jar", &[("format", "jar")])]), &format("jar"), false);
//! assert_eq!(matcher.match_calls(), 1);
//! ```

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use anyhow::{bail, Result};

pub use fixtures::*;

use crate::artifacts::{DryRunExecutor, TransformExecutor};
use crate::core::attribute::AttributeSet;
use crate::core::variant::Artifact;
use crate::matching::{AttributeMatcher, ExplanationBuilder, SchemaMatcher};
use crate::transform::TransformDefinition;

/// Wraps a `SchemaMatcher` and counts calls per method.
#[derive(Debug, Default)]
pub struct CountingMatcher {
    inner: SchemaMatcher,
    match_calls: AtomicUsize,
    is_matching_calls: AtomicUsize,
    compatible_calls: AtomicUsize,
}

impl CountingMatcher {
    pub fn new(inner: SchemaMatcher) -> Self {
        CountingMatcher {
            inner,
            ..Self::default()
        }
    }

    pub fn match_calls(&self) -> usize {
        self.match_calls.load(Ordering::SeqCst)
    }

    pub fn is_matching_calls(&self) -> usize {
        self.is_matching_calls.load(Ordering::SeqCst)
    }

    pub fn compatible_calls(&self) -> usize {
        self.compatible_calls.load(Ordering::SeqCst)
    }
}

impl AttributeMatcher for CountingMatcher {
    fn match_candidates(
        &self,
        candidates: &[&AttributeSet],
        requested: &AttributeSet,
        explain: &mut dyn ExplanationBuilder,
    ) -> Result<Vec<usize>> {
        self.match_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.match_candidates(candidates, requested, explain)
    }

    fn is_matching(&self, candidate: &AttributeSet, requested: &AttributeSet) -> Result<bool> {
        self.is_matching_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.is_matching(candidate, requested)
    }

    fn are_mutually_compatible(&self, a: &AttributeSet, b: &AttributeSet) -> Result<bool> {
        self.compatible_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.are_mutually_compatible(a, b)
    }
}

/// A matcher whose every call fails with the same message.
#[derive(Debug, Clone)]
pub struct FailingMatcher {
    message: String,
}

impl FailingMatcher {
    pub fn new(message: impl Into<String>) -> Self {
        FailingMatcher {
            message: message.into(),
        }
    }
}

impl AttributeMatcher for FailingMatcher {
    fn match_candidates(
        &self,
        _: &[&AttributeSet],
        _: &AttributeSet,
        _: &mut dyn ExplanationBuilder,
    ) -> Result<Vec<usize>> {
        bail!("{}", self.message)
    }

    fn is_matching(&self, _: &AttributeSet, _: &AttributeSet) -> Result<bool> {
        bail!("{}", self.message)
    }

    fn are_mutually_compatible(&self, _: &AttributeSet, _: &AttributeSet) -> Result<bool> {
        bail!("{}", self.message)
    }
}

/// Delegates to a `SchemaMatcher`, but panics whenever the request is
/// `trigger`.
#[derive(Debug, Clone)]
pub struct PanickingMatcher {
    inner: SchemaMatcher,
    trigger: AttributeSet,
}

impl PanickingMatcher {
    pub fn on(trigger: AttributeSet) -> Self {
        PanickingMatcher {
            inner: SchemaMatcher::default(),
            trigger,
        }
    }

    fn check(&self, requested: &AttributeSet) {
        if *requested == self.trigger {
            panic!("matcher gave up on {}", requested);
        }
    }
}

impl AttributeMatcher for PanickingMatcher {
    fn match_candidates(
        &self,
        candidates: &[&AttributeSet],
        requested: &AttributeSet,
        explain: &mut dyn ExplanationBuilder,
    ) -> Result<Vec<usize>> {
        self.check(requested);
        self.inner.match_candidates(candidates, requested, explain)
    }

    fn is_matching(&self, candidate: &AttributeSet, requested: &AttributeSet) -> Result<bool> {
        self.check(requested);
        self.inner.is_matching(candidate, requested)
    }

    fn are_mutually_compatible(&self, a: &AttributeSet, b: &AttributeSet) -> Result<bool> {
        self.inner.are_mutually_compatible(a, b)
    }
}

/// Executor that records each action it runs and names outputs like
/// `DryRunExecutor` does.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<String>>,
    dependencies: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions executed so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of the dependency artifacts passed so far, in order.
    pub fn dependency_names(&self) -> Vec<String> {
        self.dependencies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TransformExecutor for RecordingExecutor {
    fn execute(
        &self,
        definition: &TransformDefinition,
        inputs: &[Artifact],
        dependencies: &[Artifact],
    ) -> Result<Vec<Artifact>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(definition.action().to_string());
        self.dependencies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(dependencies.iter().map(|d| d.name.clone()));
        DryRunExecutor.execute(definition, inputs, dependencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_matcher_delegates() {
        let matcher = CountingMatcher::default();
        let red = attrs(&[("color", "red")]);

        assert!(matcher.is_matching(&red, &red).unwrap());
        assert!(matcher.are_mutually_compatible(&red, &red).unwrap());
        assert_eq!(matcher.is_matching_calls(), 1);
        assert_eq!(matcher.compatible_calls(), 1);
        assert_eq!(matcher.match_calls(), 0);
    }

    #[test]
    fn test_failing_matcher_fails_everything() {
        let matcher = FailingMatcher::new("nope");
        let empty = AttributeSet::empty();

        assert_eq!(matcher.is_matching(&empty, &empty).unwrap_err().to_string(), "nope");
        assert!(matcher.are_mutually_compatible(&empty, &empty).is_err());
    }

    #[test]
    fn test_recording_executor_records_actions() {
        let executor = RecordingExecutor::new();
        let out = executor
            .execute(&TransformDefinition::new("unzip"), &[Artifact::new("a.jar", "a.jar")], &[])
            .unwrap();

        assert_eq!(executor.calls(), vec!["unzip"]);
        assert_eq!(out[0].name, "a.jar@unzip");
    }
}
