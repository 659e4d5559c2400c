//! Artifact transform registrations and chain search.
//!
//! Key principle: registration order never changes which chains are valid,
//! only the order in which they are enumerated.

pub mod chain;
pub mod graph;

pub use chain::{find_transformed_variants, TransformedVariant};
pub use graph::TransformGraph;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::core::attribute::AttributeSet;
use crate::util::InternedString;

/// The opaque part of a registration: which action to run, with what parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformDefinition {
    action: InternedString,
    parameters: BTreeMap<String, String>,
}

impl TransformDefinition {
    pub fn new(action: impl Into<InternedString>) -> Self {
        TransformDefinition {
            action: action.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn action(&self) -> InternedString {
        self.action
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }
}

impl fmt::Display for TransformDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.action)?;
        if !self.parameters.is_empty() {
            let params: Vec<String> = self
                .parameters
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, "({})", params.join(", "))?;
        }
        Ok(())
    }
}

/// A registered conversion from attributes matching `from` to exactly `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRegistration {
    from: AttributeSet,
    to: AttributeSet,
    definition: TransformDefinition,
}

impl TransformRegistration {
    pub fn new(from: AttributeSet, to: AttributeSet, definition: TransformDefinition) -> Self {
        TransformRegistration {
            from,
            to,
            definition,
        }
    }

    pub fn from(&self) -> &AttributeSet {
        &self.from
    }

    pub fn to(&self) -> &AttributeSet {
        &self.to
    }

    pub fn definition(&self) -> &TransformDefinition {
        &self.definition
    }
}

impl fmt::Display for TransformRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.definition, self.from, self.to)
    }
}

/// Ordered collection of transform registrations.
///
/// Built once and then shared read-only (`Arc<TransformRegistry>`) between
/// concurrent selections.
#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    registrations: Vec<Arc<TransformRegistration>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a registration. Later registrations are enumerated later.
    pub fn register(&mut self, registration: TransformRegistration) -> &mut Self {
        self.registrations.push(Arc::new(registration));
        self
    }

    pub fn registrations(&self) -> &[Arc<TransformRegistration>] {
        &self.registrations
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl FromIterator<TransformRegistration> for TransformRegistry {
    fn from_iter<I: IntoIterator<Item = TransformRegistration>>(iter: I) -> Self {
        TransformRegistry {
            registrations: iter.into_iter().map(Arc::new).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(value: &str) -> AttributeSet {
        AttributeSet::empty().with("format", value)
    }

    #[test]
    fn test_registry_preserves_order() {
        let mut registry = TransformRegistry::new();
        registry
            .register(TransformRegistration::new(
                format("jar"),
                format("classes"),
                TransformDefinition::new("unzip"),
            ))
            .register(TransformRegistration::new(
                format("classes"),
                format("dex"),
                TransformDefinition::new("dex"),
            ));

        let actions: Vec<_> = registry
            .registrations()
            .iter()
            .map(|r| r.definition().action().as_str())
            .collect();
        assert_eq!(actions, vec!["unzip", "dex"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_display() {
        let registration = TransformRegistration::new(
            format("jar"),
            format("classes"),
            TransformDefinition::new("unzip").with_parameter("level", "9"),
        );

        assert_eq!(
            registration.to_string(),
            "unzip(level=9): {format=jar} -> {format=classes}"
        );
    }
}
