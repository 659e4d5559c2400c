//! Selection manifest parsing.
//!
//! A selection manifest is a TOML file describing one selection problem:
//! the consumer's attribute schema, the producer and its variants, the
//! registered transforms and a default request.
//!
//! ```toml
//! [schema]
//! precedence = ["usage"]
//!
//! [schema.attributes.debug]
//! type = "string"
//! compatible = { true = ["line", "full"] }
//! prefer = ["full", "line"]
//!
//! [producer]
//! name = "lib"
//!
//! [[producer.variants]]
//! id = "jar"
//! attributes = { format = "jar" }
//! artifacts = ["build/lib.jar"]
//!
//! [[transforms]]
//! action = "unzip"
//! from = { format = "jar" }
//! to = { format = "classes" }
//!
//! [request]
//! format = "classes"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::core::attribute::{AttributeParseError, AttributeSet, AttributeType, AttributeValue};
use crate::core::variant::{Artifact, ProducerVariantSet, Variant, VariantSetError};
use crate::matching::{AttributeRules, AttributeSchema};
use crate::transform::{TransformDefinition, TransformRegistration, TransformRegistry};
use crate::util::InternedString;

/// Errors reading a selection manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for attribute `{attribute}`")]
    InvalidValue {
        attribute: String,
        #[source]
        source: AttributeParseError,
    },

    #[error("attribute `{attribute}` has a {found} value; expected a string, bool or integer")]
    UnsupportedValue {
        attribute: String,
        found: &'static str,
    },

    #[error("attribute `{attribute}` is declared as {declared} but the manifest gives a {found}")]
    WrongType {
        attribute: String,
        declared: AttributeType,
        found: AttributeType,
    },

    #[error("semver compatibility needs a version attribute, but `{attribute}` is not one")]
    SemverOnNonVersion { attribute: String },

    #[error("invalid request `{raw}`: expected `name=value`")]
    InvalidRequest { raw: String },

    #[error(transparent)]
    Variants(#[from] VariantSetError),
}

/// On-disk form of the manifest.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    schema: RawSchema,
    producer: RawProducer,
    #[serde(default)]
    transforms: Vec<RawTransform>,
    #[serde(default)]
    request: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    #[serde(default)]
    precedence: Vec<String>,
    #[serde(default)]
    attributes: BTreeMap<String, RawAttribute>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawAttribute {
    #[serde(rename = "type")]
    ty: Option<AttributeType>,
    /// Requested value to extra acceptable candidate values.
    #[serde(default)]
    compatible: BTreeMap<String, Vec<toml::Value>>,
    #[serde(default)]
    semver_compatible: bool,
    #[serde(default)]
    prefer: Vec<toml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProducer {
    name: String,
    #[serde(default)]
    overrides: BTreeMap<String, toml::Value>,
    #[serde(default)]
    variants: Vec<RawVariant>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVariant {
    id: String,
    #[serde(default)]
    attributes: BTreeMap<String, toml::Value>,
    #[serde(default)]
    artifacts: Vec<RawArtifact>,
}

/// An artifact is either a bare path or a `{ name, file }` table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawArtifact {
    Path(PathBuf),
    Detailed { name: String, file: PathBuf },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTransform {
    action: String,
    #[serde(default)]
    from: BTreeMap<String, toml::Value>,
    #[serde(default)]
    to: BTreeMap<String, toml::Value>,
    #[serde(default)]
    parameters: BTreeMap<String, String>,
}

/// A parsed selection manifest.
#[derive(Debug, Clone)]
pub struct SelectionManifest {
    schema: AttributeSchema,
    producer: ProducerVariantSet,
    registry: TransformRegistry,
    request: AttributeSet,
}

impl SelectionManifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse manifest content. `path` is only used in error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ManifestError> {
        let raw: RawManifest = toml::from_str(content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let schema = convert_schema(&raw.schema)?;
        let values = ValueReader { schema: &schema };

        let mut variants = Vec::with_capacity(raw.producer.variants.len());
        for raw_variant in &raw.producer.variants {
            let attributes = values.set(&raw_variant.attributes)?;
            let artifacts = raw_variant.artifacts.iter().map(convert_artifact);
            variants.push(Variant::new(raw_variant.id.as_str(), attributes).with_artifacts(artifacts));
        }
        let producer = ProducerVariantSet::new(raw.producer.name.as_str(), variants)?
            .with_overridden_attributes(values.set(&raw.producer.overrides)?);

        let mut registry = TransformRegistry::new();
        for raw_transform in &raw.transforms {
            let definition = raw_transform
                .parameters
                .iter()
                .fold(TransformDefinition::new(raw_transform.action.as_str()), |def, (k, v)| {
                    def.with_parameter(k.as_str(), v.as_str())
                });
            registry.register(TransformRegistration::new(
                values.set(&raw_transform.from)?,
                values.set(&raw_transform.to)?,
                definition,
            ));
        }

        let request = values.set(&raw.request)?;

        tracing::debug!(
            "Loaded manifest {}: {} variant(s), {} transform(s)",
            path.display(),
            producer.len(),
            registry.len()
        );

        Ok(SelectionManifest {
            schema,
            producer,
            registry,
            request,
        })
    }

    pub fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    pub fn producer(&self) -> &ProducerVariantSet {
        &self.producer
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    /// The default request from the `[request]` table.
    pub fn request(&self) -> &AttributeSet {
        &self.request
    }

    /// The default request with `name=value` overrides applied in order.
    pub fn request_with<S: AsRef<str>>(&self, overrides: &[S]) -> Result<AttributeSet, ManifestError> {
        let mut request = self.request.clone();
        for raw in overrides {
            let (name, value) = self.parse_request_entry(raw.as_ref())?;
            request = request.with(name, value);
        }
        Ok(request)
    }

    /// Parse one `name=value` entry, typed by the schema when declared.
    pub fn parse_request_entry(
        &self,
        raw: &str,
    ) -> Result<(InternedString, AttributeValue), ManifestError> {
        let (name, value) = raw
            .split_once('=')
            .map(|(n, v)| (n.trim(), v.trim()))
            .filter(|(n, _)| !n.is_empty())
            .ok_or_else(|| ManifestError::InvalidRequest {
                raw: raw.to_string(),
            })?;
        let value = ValueReader {
            schema: &self.schema,
        }
        .text(name, value)?;
        Ok((InternedString::new(name), value))
    }
}

fn convert_artifact(raw: &RawArtifact) -> Artifact {
    match raw {
        RawArtifact::Path(file) => {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            Artifact::new(name, file.clone())
        }
        RawArtifact::Detailed { name, file } => Artifact::new(name.clone(), file.clone()),
    }
}

fn convert_schema(raw: &RawSchema) -> Result<AttributeSchema, ManifestError> {
    let mut schema = AttributeSchema::new().with_precedence(raw.precedence.iter().map(String::as_str));

    // Types first, so rule values below are read with the declared type.
    let mut typed = AttributeSchema::new();
    for (name, attr) in &raw.attributes {
        if let Some(ty) = attr.ty {
            typed = typed.attribute(name.as_str(), AttributeRules::typed(ty));
        }
    }
    let values = ValueReader { schema: &typed };

    for (name, attr) in &raw.attributes {
        let mut rules = attr.ty.map(AttributeRules::typed).unwrap_or_default();
        for (requested, accepted) in &attr.compatible {
            let requested = values.text(name, requested)?;
            let accepted = accepted
                .iter()
                .map(|v| values.value(name, v))
                .collect::<Result<Vec<_>, _>>()?;
            rules = rules.accepting(requested, accepted);
        }
        if attr.semver_compatible {
            if attr.ty != Some(AttributeType::Version) {
                return Err(ManifestError::SemverOnNonVersion {
                    attribute: name.clone(),
                });
            }
            rules = rules.semver_compatible();
        }
        if !attr.prefer.is_empty() {
            let order = attr
                .prefer
                .iter()
                .map(|v| values.value(name, v))
                .collect::<Result<Vec<_>, _>>()?;
            rules = rules.preferring(order);
        }
        schema = schema.attribute(name.as_str(), rules);
    }
    Ok(schema)
}

/// Reads manifest values using the schema's declared types.
///
/// Declared attributes are parsed as their type. For undeclared ones, TOML
/// bools and integers keep their type and text is inferred, so `"true"` and
/// `true` are the same value.
struct ValueReader<'a> {
    schema: &'a AttributeSchema,
}

impl ValueReader<'_> {
    fn set(&self, table: &BTreeMap<String, toml::Value>) -> Result<AttributeSet, ManifestError> {
        table
            .iter()
            .map(|(name, value)| Ok::<_, ManifestError>((name.as_str(), self.value(name, value)?)))
            .collect()
    }

    fn value(&self, name: &str, value: &toml::Value) -> Result<AttributeValue, ManifestError> {
        let found = match value {
            toml::Value::String(s) => return self.text(name, s),
            toml::Value::Boolean(b) => AttributeValue::Bool(*b),
            toml::Value::Integer(i) => AttributeValue::Integer(*i),
            other => {
                return Err(ManifestError::UnsupportedValue {
                    attribute: name.to_string(),
                    found: other.type_str(),
                })
            }
        };
        match self.schema.declared_type(name) {
            Some(declared) if declared != found.ty() => Err(ManifestError::WrongType {
                attribute: name.to_string(),
                declared,
                found: found.ty(),
            }),
            _ => Ok(found),
        }
    }

    fn text(&self, name: &str, raw: &str) -> Result<AttributeValue, ManifestError> {
        match self.schema.declared_type(name) {
            Some(ty) => AttributeValue::parse(ty, raw).map_err(|source| ManifestError::InvalidValue {
                attribute: name.to_string(),
                source,
            }),
            None => Ok(AttributeValue::infer(raw)),
        }
    }
}
