//! Harbour variants - attribute-based artifact selection for Harbour
//!
//! Given the variants a producer offers and the attributes a consumer
//! requests, this crate picks the matching variant, or finds the shortest
//! chains of registered transforms that turn a variant into a match.
//! Results are lazy artifact sets: transforms run, and failures surface,
//! only when the set is realized.

pub mod artifacts;
pub mod core;
pub mod matching;
pub mod select;
pub mod transform;
pub mod util;

/// Test fixtures and instrumented collaborators.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides counting and failing matchers and a recording executor.
#[cfg(test)]
pub mod test_support;

pub use artifacts::{ArtifactError, DryRunExecutor, ResolvedArtifactSet, TransformExecutor};
pub use crate::core::{
    Artifact, AttributeSet, AttributeValue, ProducerVariantSet, SelectionManifest, Variant,
};
pub use matching::{AttributeMatcher, AttributeSchema, SchemaMatcher};
pub use select::{SelectError, SelectionFailure, VariantSelector};
pub use transform::{TransformDefinition, TransformRegistration, TransformRegistry};
pub use util::Config;
