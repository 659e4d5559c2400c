//! Producer variants and their artifacts.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::core::attribute::{AttributeSet, HasAttributes};
use crate::util::InternedString;

/// Identity of a variant within its producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantId(InternedString);

impl VariantId {
    pub fn new(name: impl Into<InternedString>) -> Self {
        VariantId(name.into())
    }

    pub fn as_str(&self) -> &'static str {
        self.0.as_str()
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A single file produced by a variant or a transform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Artifact {
    pub name: String,
    pub file: PathBuf,
}

impl Artifact {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Artifact {
            name: name.into(),
            file: file.into(),
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.file.display())
    }
}

/// A producer-side option: an identity, attributes, and the artifacts it provides.
#[derive(Debug, Clone)]
pub struct Variant {
    id: VariantId,
    attributes: AttributeSet,
    artifacts: Vec<Artifact>,
}

impl Variant {
    pub fn new(id: impl Into<InternedString>, attributes: AttributeSet) -> Self {
        Variant {
            id: VariantId::new(id),
            attributes,
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn with_artifacts(mut self, artifacts: impl IntoIterator<Item = Artifact>) -> Self {
        self.artifacts.extend(artifacts);
        self
    }

    pub fn id(&self) -> VariantId {
        self.id
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// `name {attr=value, ...}`, used in diagnostics.
    pub fn describe(&self) -> String {
        format!("{} {}", self.id, self.attributes)
    }
}

impl HasAttributes for Variant {
    fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }
}

impl HasAttributes for Arc<Variant> {
    fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }
}

/// Errors building a producer variant set.
#[derive(Debug, Error)]
pub enum VariantSetError {
    #[error("producer `{producer}` declares variant `{variant}` more than once")]
    DuplicateVariant {
        producer: String,
        variant: VariantId,
    },
}

/// The variants a producer offers, in declaration order.
///
/// Overridden attributes are merged on top of every request matched against
/// this set.
#[derive(Debug, Clone)]
pub struct ProducerVariantSet {
    name: InternedString,
    variants: Arc<[Arc<Variant>]>,
    overridden: AttributeSet,
}

impl ProducerVariantSet {
    pub fn new(
        name: impl Into<InternedString>,
        variants: impl IntoIterator<Item = Variant>,
    ) -> Result<Self, VariantSetError> {
        let name = name.into();
        let mut seen = HashSet::new();
        let mut collected = Vec::new();
        for variant in variants {
            if !seen.insert(variant.id()) {
                return Err(VariantSetError::DuplicateVariant {
                    producer: name.to_string(),
                    variant: variant.id(),
                });
            }
            collected.push(Arc::new(variant));
        }
        Ok(ProducerVariantSet {
            name,
            variants: collected.into(),
            overridden: AttributeSet::empty(),
        })
    }

    pub fn with_overridden_attributes(mut self, overridden: AttributeSet) -> Self {
        self.overridden = overridden;
        self
    }

    pub fn name(&self) -> InternedString {
        self.name
    }

    pub fn variants(&self) -> &[Arc<Variant>] {
        &self.variants
    }

    pub fn overridden_attributes(&self) -> &AttributeSet {
        &self.overridden
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

impl fmt::Display for ProducerVariantSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.name, f)
    }
}
