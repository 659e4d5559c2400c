//! Typed attributes and immutable attribute sets.
//!
//! An attribute is a named key with a value type. Variants describe
//! themselves with an `AttributeSet`; consumers request one. Sets are
//! immutable and cheap to clone; every merge builds a new set.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use semver::Version;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::util::hash::Fingerprint;
use crate::util::InternedString;

/// The value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Bool,
    Integer,
    Version,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::String => write!(f, "string"),
            AttributeType::Bool => write!(f, "bool"),
            AttributeType::Integer => write!(f, "integer"),
            AttributeType::Version => write!(f, "version"),
        }
    }
}

/// A named, typed attribute key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attribute {
    name: InternedString,
    ty: AttributeType,
}

impl Attribute {
    pub fn new(name: impl Into<InternedString>, ty: AttributeType) -> Self {
        Attribute {
            name: name.into(),
            ty,
        }
    }

    pub fn of(name: impl Into<InternedString>, value: &AttributeValue) -> Self {
        Attribute::new(name, value.ty())
    }

    pub fn name(&self) -> InternedString {
        self.name
    }

    pub fn ty(&self) -> AttributeType {
        self.ty
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.ty)
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeValue {
    String(InternedString),
    Bool(bool),
    Integer(i64),
    Version(Version),
}

impl AttributeValue {
    pub fn ty(&self) -> AttributeType {
        match self {
            AttributeValue::String(_) => AttributeType::String,
            AttributeValue::Bool(_) => AttributeType::Bool,
            AttributeValue::Integer(_) => AttributeType::Integer,
            AttributeValue::Version(_) => AttributeType::Version,
        }
    }

    /// Parse a textual value as the given type.
    pub fn parse(ty: AttributeType, raw: &str) -> Result<Self, AttributeParseError> {
        let invalid = || AttributeParseError {
            ty,
            raw: raw.to_string(),
        };
        Ok(match ty {
            AttributeType::String => AttributeValue::String(InternedString::new(raw)),
            AttributeType::Bool => AttributeValue::Bool(raw.parse().map_err(|_| invalid())?),
            AttributeType::Integer => AttributeValue::Integer(raw.parse().map_err(|_| invalid())?),
            AttributeType::Version => {
                AttributeValue::Version(Version::parse(raw).map_err(|_| invalid())?)
            }
        })
    }

    /// Infer the type of an untyped textual value: `true`/`false` are bools,
    /// integers are integers, anything else is a string.
    pub fn infer(raw: &str) -> Self {
        if let Ok(b) = bool::from_str(raw) {
            AttributeValue::Bool(b)
        } else if let Ok(i) = i64::from_str(raw) {
            AttributeValue::Integer(i)
        } else {
            AttributeValue::String(InternedString::new(raw))
        }
    }

    fn fingerprint_tag(&self) -> u8 {
        match self {
            AttributeValue::String(_) => b's',
            AttributeValue::Bool(_) => b'b',
            AttributeValue::Integer(_) => b'i',
            AttributeValue::Version(_) => b'v',
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{}", s),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Version(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeValue::String(s) => serializer.serialize_str(s),
            AttributeValue::Bool(b) => serializer.serialize_bool(*b),
            AttributeValue::Integer(i) => serializer.serialize_i64(*i),
            AttributeValue::Version(v) => serializer.collect_str(v),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(InternedString::new(s))
    }
}

impl From<InternedString> for AttributeValue {
    fn from(s: InternedString) -> Self {
        AttributeValue::String(s)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<Version> for AttributeValue {
    fn from(v: Version) -> Self {
        AttributeValue::Version(v)
    }
}

/// A textual value could not be read as its declared type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{raw}` is not a valid {ty} value")]
pub struct AttributeParseError {
    pub ty: AttributeType,
    pub raw: String,
}

/// An immutable mapping from attribute name to typed value.
///
/// Entries are kept sorted by name, so iteration, display and fingerprints
/// are deterministic.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct AttributeSet {
    entries: Arc<BTreeMap<InternedString, AttributeValue>>,
}

impl AttributeSet {
    pub fn empty() -> Self {
        AttributeSet::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = InternedString> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InternedString, &AttributeValue)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Return a new set with one attribute added or replaced.
    pub fn with(&self, name: impl Into<InternedString>, value: impl Into<AttributeValue>) -> Self {
        let mut entries = (*self.entries).clone();
        entries.insert(name.into(), value.into());
        AttributeSet {
            entries: Arc::new(entries),
        }
    }

    /// Merge `overrides` on top of this set. Keys present in both take the
    /// value from `overrides`. Neither input changes.
    pub fn concat(&self, overrides: &AttributeSet) -> Self {
        if overrides.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return overrides.clone();
        }
        let mut entries = (*self.entries).clone();
        entries.extend(overrides.iter().map(|(k, v)| (k, v.clone())));
        AttributeSet {
            entries: Arc::new(entries),
        }
    }

    /// SHA-256 over the sorted, type-tagged entries.
    pub fn fingerprint(&self) -> String {
        let mut fp = Fingerprint::new();
        for (name, value) in self.iter() {
            fp.update_tagged(b'k', &name);
            fp.update_tagged(value.fingerprint_tag(), &value.to_string());
        }
        fp.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeSet
where
    K: Into<InternedString>,
    V: Into<AttributeValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        AttributeSet {
            entries: Arc::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        f.write_str("}")
    }
}

impl fmt::Debug for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for AttributeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name.as_str(), value)?;
        }
        map.end()
    }
}

/// Anything that exposes an attribute set for matching.
pub trait HasAttributes {
    fn attributes(&self) -> &AttributeSet;
}

impl HasAttributes for AttributeSet {
    fn attributes(&self) -> &AttributeSet {
        self
    }
}
