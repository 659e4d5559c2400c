//! Attribute schema: per-attribute types, compatibility and disambiguation rules.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::core::attribute::{AttributeType, AttributeValue};
use crate::util::InternedString;

/// When is a candidate value acceptable for a requested value?
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CompatibilityRule {
    /// Only equal values are compatible.
    #[default]
    Exact,
    /// Equal values, plus the listed extra candidate values per requested value.
    Accepts(HashMap<AttributeValue, HashSet<AttributeValue>>),
    /// Version values are compatible under caret semantics
    /// (`1.2.0` accepts `1.4.1`, rejects `2.0.0`); others need equality.
    SemverCompatible,
}

/// How to choose among several compatible candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DisambiguationRule {
    #[default]
    None,
    /// Earlier values win over later ones; unlisted values lose to listed ones.
    PreferOrder(Vec<AttributeValue>),
}

/// Everything the schema knows about one attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRules {
    pub ty: Option<AttributeType>,
    pub compatibility: CompatibilityRule,
    pub disambiguation: DisambiguationRule,
}

impl AttributeRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typed(ty: AttributeType) -> Self {
        AttributeRules {
            ty: Some(ty),
            ..Self::default()
        }
    }

    /// Also accept `candidates` when `requested` is asked for.
    pub fn accepting<I, V>(mut self, requested: impl Into<AttributeValue>, candidates: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<AttributeValue>,
    {
        let mut map = match self.compatibility {
            CompatibilityRule::Accepts(map) => map,
            _ => HashMap::new(),
        };
        map.entry(requested.into())
            .or_default()
            .extend(candidates.into_iter().map(Into::into));
        self.compatibility = CompatibilityRule::Accepts(map);
        self
    }

    pub fn semver_compatible(mut self) -> Self {
        self.compatibility = CompatibilityRule::SemverCompatible;
        self
    }

    pub fn preferring<I, V>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<AttributeValue>,
    {
        self.disambiguation =
            DisambiguationRule::PreferOrder(order.into_iter().map(Into::into).collect());
        self
    }
}

/// The consumer-side attribute schema.
#[derive(Debug, Clone, Default)]
pub struct AttributeSchema {
    rules: BTreeMap<InternedString, AttributeRules>,
    precedence: Vec<InternedString>,
}

impl AttributeSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: impl Into<InternedString>, rules: AttributeRules) -> Self {
        self.rules.insert(name.into(), rules);
        self
    }

    /// Attributes to disambiguate on first, in order.
    pub fn with_precedence<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<InternedString>,
    {
        self.precedence = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn rules(&self, name: &str) -> Option<&AttributeRules> {
        self.rules.get(name)
    }

    pub fn declared_type(&self, name: &str) -> Option<AttributeType> {
        self.rules.get(name).and_then(|r| r.ty)
    }

    pub fn declared(&self) -> impl Iterator<Item = (InternedString, &AttributeRules)> + '_ {
        self.rules.iter().map(|(k, v)| (*k, v))
    }

    /// Order `names` by precedence: listed names first in listed order, then
    /// the remaining names sorted.
    pub fn ordered(&self, names: impl IntoIterator<Item = InternedString>) -> Vec<InternedString> {
        let mut rest: Vec<InternedString> = names.into_iter().collect();
        rest.sort();
        rest.dedup();
        let mut ordered: Vec<InternedString> = self
            .precedence
            .iter()
            .filter(|name| rest.contains(name))
            .copied()
            .collect();
        rest.retain(|name| !ordered.contains(name));
        ordered.append(&mut rest);
        ordered
    }
}
