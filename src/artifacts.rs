//! Resolved artifact sets: the lazy result of a selection.
//!
//! A set is built during selection and realized later, when the consumer
//! actually needs files. Building never fails; a failed selection is carried
//! as `Broken` and surfaces on `realize()`.

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::core::attribute::HasAttributes;
use crate::core::variant::{Artifact, Variant};
use crate::select::SelectionFailure;
use crate::transform::{TransformDefinition, TransformedVariant};

/// Runs one transform action over its input artifacts.
pub trait TransformExecutor: Send + Sync {
    fn execute(
        &self,
        definition: &TransformDefinition,
        inputs: &[Artifact],
        dependencies: &[Artifact],
    ) -> anyhow::Result<Vec<Artifact>>;
}

/// Supplies the upstream artifacts a transform step depends on, besides its
/// primary input.
pub trait UpstreamDependencyResolver: Send + Sync {
    fn dependencies_for(
        &self,
        variant: &TransformedVariant,
        step: usize,
    ) -> anyhow::Result<Vec<Artifact>>;
}

/// Resolver for transforms that take no upstream dependencies.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUpstreamDependencies;

impl UpstreamDependencyResolver for NoUpstreamDependencies {
    fn dependencies_for(&self, _: &TransformedVariant, _: usize) -> anyhow::Result<Vec<Artifact>> {
        Ok(Vec::new())
    }
}

/// Executor that performs no work and names each output
/// `<input>@<action>`, for plans and previews.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunExecutor;

impl TransformExecutor for DryRunExecutor {
    fn execute(
        &self,
        definition: &TransformDefinition,
        inputs: &[Artifact],
        _dependencies: &[Artifact],
    ) -> anyhow::Result<Vec<Artifact>> {
        Ok(inputs
            .iter()
            .map(|input| {
                let name = format!("{}@{}", input.name, definition.action());
                let file = PathBuf::from("transforms")
                    .join(definition.action().as_str())
                    .join(&name);
                Artifact::new(name, file)
            })
            .collect())
    }
}

/// Errors raised while realizing an artifact set.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The selection itself failed; the same failure every time.
    #[error(transparent)]
    Selection(Arc<SelectionFailure>),

    #[error("failed to resolve dependencies of transform `{transform}` for {variant}")]
    Dependencies {
        transform: String,
        variant: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("transform `{transform}` failed for {variant}")]
    Transform {
        transform: String,
        variant: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl ArtifactError {
    /// The deferred selection failure, if that is what this is.
    pub fn selection_failure(&self) -> Option<&SelectionFailure> {
        match self {
            ArtifactError::Selection(failure) => Some(failure),
            _ => None,
        }
    }
}

/// A transform chain bound to the collaborators that will execute it.
#[derive(Clone)]
pub struct TransformedArtifactSet {
    variant: TransformedVariant,
    dependencies: Arc<dyn UpstreamDependencyResolver>,
    executor: Arc<dyn TransformExecutor>,
}

impl TransformedArtifactSet {
    pub fn new(
        variant: TransformedVariant,
        dependencies: Arc<dyn UpstreamDependencyResolver>,
        executor: Arc<dyn TransformExecutor>,
    ) -> Self {
        TransformedArtifactSet {
            variant,
            dependencies,
            executor,
        }
    }

    pub fn variant(&self) -> &TransformedVariant {
        &self.variant
    }

    /// Run every step in order, feeding each step the previous outputs.
    pub fn realize(&self) -> Result<Vec<Artifact>, ArtifactError> {
        let mut current = self.variant.root().artifacts().to_vec();
        for (index, step) in self.variant.steps().iter().enumerate() {
            let definition = step.definition();
            let dependencies = self
                .dependencies
                .dependencies_for(&self.variant, index)
                .map_err(|e| ArtifactError::Dependencies {
                    transform: definition.to_string(),
                    variant: self.variant.describe(),
                    source: e.into(),
                })?;
            tracing::debug!(
                "Running transform `{}` on {} artifact(s) of `{}`",
                definition,
                current.len(),
                self.variant.root().id()
            );
            current = self
                .executor
                .execute(definition, &current, &dependencies)
                .map_err(|e| ArtifactError::Transform {
                    transform: definition.to_string(),
                    variant: self.variant.describe(),
                    source: e.into(),
                })?;
        }
        Ok(current)
    }
}

impl fmt::Debug for TransformedArtifactSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformedArtifactSet")
            .field("variant", &self.variant.describe())
            .finish_non_exhaustive()
    }
}

/// The outcome of one selection.
#[derive(Debug, Clone)]
pub enum ResolvedArtifactSet {
    /// A producer variant matched directly.
    Direct(Arc<Variant>),
    /// A transform chain produces the requested attributes.
    Transformed(TransformedArtifactSet),
    /// Nothing matched and the caller accepted that.
    Empty,
    /// Selection failed; realizing re-raises the failure.
    Broken(Arc<SelectionFailure>),
}

impl ResolvedArtifactSet {
    pub fn broken(failure: SelectionFailure) -> Self {
        ResolvedArtifactSet::Broken(Arc::new(failure))
    }

    /// Materialize the artifacts. Transforms execute here, not earlier.
    pub fn realize(&self) -> Result<Vec<Artifact>, ArtifactError> {
        match self {
            ResolvedArtifactSet::Direct(variant) => Ok(variant.artifacts().to_vec()),
            ResolvedArtifactSet::Transformed(set) => set.realize(),
            ResolvedArtifactSet::Empty => Ok(Vec::new()),
            ResolvedArtifactSet::Broken(failure) => {
                Err(ArtifactError::Selection(Arc::clone(failure)))
            }
        }
    }

    pub fn failure(&self) -> Option<&SelectionFailure> {
        match self {
            ResolvedArtifactSet::Broken(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn is_broken(&self) -> bool {
        matches!(self, ResolvedArtifactSet::Broken(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResolvedArtifactSet::Direct(_) => "direct",
            ResolvedArtifactSet::Transformed(_) => "transformed",
            ResolvedArtifactSet::Empty => "empty",
            ResolvedArtifactSet::Broken(_) => "broken",
        }
    }

    /// One-line summary for logs and the CLI.
    pub fn describe(&self) -> String {
        match self {
            ResolvedArtifactSet::Direct(variant) => format!("variant {}", variant.describe()),
            ResolvedArtifactSet::Transformed(set) => format!("chain {}", set.variant().describe()),
            ResolvedArtifactSet::Empty => "no artifacts".to_string(),
            ResolvedArtifactSet::Broken(failure) => format!("failed: {}", failure),
        }
    }

    /// Attributes of what was selected, if anything was.
    pub fn attributes(&self) -> Option<&crate::core::attribute::AttributeSet> {
        match self {
            ResolvedArtifactSet::Direct(variant) => Some(variant.attributes()),
            ResolvedArtifactSet::Transformed(set) => Some(set.variant().attributes()),
            ResolvedArtifactSet::Empty | ResolvedArtifactSet::Broken(_) => None,
        }
    }
}
