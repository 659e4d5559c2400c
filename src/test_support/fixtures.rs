//! Test fixtures for common selection scenarios.

use std::sync::Arc;

use crate::core::attribute::AttributeSet;
use crate::core::variant::{Artifact, ProducerVariantSet, Variant};
use crate::matching::{AttributeRules, AttributeSchema, SchemaMatcher};
use crate::transform::{TransformDefinition, TransformRegistration, TransformRegistry};

/// Build an attribute set of string values.
pub fn attrs(pairs: &[(&str, &str)]) -> AttributeSet {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

/// `{format=<value>}`
pub fn format(value: &str) -> AttributeSet {
    attrs(&[("format", value)])
}

/// A variant with one artifact named `<id>.bin`.
pub fn variant(id: &str, pairs: &[(&str, &str)]) -> Variant {
    Variant::new(id, attrs(pairs)).with_artifact(Artifact::new(
        format!("{}.bin", id),
        format!("build/{}.bin", id),
    ))
}

pub fn producer(name: &str, variants: impl IntoIterator<Item = Variant>) -> ProducerVariantSet {
    ProducerVariantSet::new(name, variants).unwrap()
}

pub fn transform(action: &str, from: &[(&str, &str)], to: &[(&str, &str)]) -> TransformRegistration {
    TransformRegistration::new(attrs(from), attrs(to), TransformDefinition::new(action))
}

pub fn registry_of(registrations: impl IntoIterator<Item = TransformRegistration>) -> TransformRegistry {
    registrations.into_iter().collect()
}

/// One transform: `{format=jar}` to `{format=classes}`.
pub fn jar_to_classes_registry() -> TransformRegistry {
    registry_of([transform("unzip", &[("format", "jar")], &[("format", "classes")])])
}

/// Matcher with no declared rules: exact matching only.
pub fn schema_matcher() -> Arc<SchemaMatcher> {
    Arc::new(SchemaMatcher::default())
}

/// Matcher where `debug=true` also accepts `line` and `full`.
pub fn debug_matcher() -> Arc<SchemaMatcher> {
    Arc::new(SchemaMatcher::new(
        AttributeSchema::new()
            .attribute("debug", AttributeRules::new().accepting("true", ["line", "full"])),
    ))
}
