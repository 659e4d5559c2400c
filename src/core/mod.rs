//! Core data structures for variant selection.
//!
//! - Typed attributes and immutable attribute sets
//! - Producer variants and their artifacts
//! - Selection manifests

pub mod attribute;
pub mod manifest;
pub mod variant;

pub use attribute::{Attribute, AttributeSet, AttributeType, AttributeValue, HasAttributes};
pub use manifest::{ManifestError, SelectionManifest};
pub use variant::{Artifact, ProducerVariantSet, Variant, VariantId};
