//! `AttributeMatcher` implementation driven by an `AttributeSchema`.

use std::sync::Arc;

use anyhow::Result;
use semver::{Comparator, Op, Version, VersionReq};

use crate::core::attribute::{Attribute, AttributeSet, AttributeValue};
use crate::matching::explain::{ExplanationBuilder, NoExplanation};
use crate::matching::schema::{AttributeSchema, CompatibilityRule, DisambiguationRule};
use crate::matching::{AttributeMatcher, MatchError};
use crate::util::InternedString;

/// Matches attribute sets using the rules declared in a schema.
///
/// Attributes a candidate does not define never disqualify it. Values of the
/// wrong declared type are errors, not mismatches.
#[derive(Debug, Clone, Default)]
pub struct SchemaMatcher {
    schema: Arc<AttributeSchema>,
}

impl SchemaMatcher {
    pub fn new(schema: AttributeSchema) -> Self {
        SchemaMatcher {
            schema: Arc::new(schema),
        }
    }

    pub fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    fn check_type(&self, name: InternedString, value: &AttributeValue) -> Result<(), MatchError> {
        match self.schema.declared_type(&name) {
            Some(declared) if declared != value.ty() => Err(MatchError::TypeMismatch {
                attribute: name.to_string(),
                declared,
                found: value.ty(),
                value: value.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn value_matches(
        &self,
        name: InternedString,
        requested: &AttributeValue,
        candidate: &AttributeValue,
    ) -> Result<bool, MatchError> {
        self.check_type(name, requested)?;
        self.check_type(name, candidate)?;

        if requested == candidate {
            return Ok(true);
        }
        if requested.ty() != candidate.ty() {
            return Ok(false);
        }

        let rule = self.schema.rules(&name).map(|r| &r.compatibility);
        Ok(match (rule, requested, candidate) {
            (Some(CompatibilityRule::Accepts(accepted)), _, _) => accepted
                .get(requested)
                .is_some_and(|values| values.contains(candidate)),
            (
                Some(CompatibilityRule::SemverCompatible),
                AttributeValue::Version(wanted),
                AttributeValue::Version(found),
            ) => caret(wanted).matches(found),
            _ => false,
        })
    }

    fn check_candidate(
        &self,
        index: usize,
        candidate: &AttributeSet,
        requested: &AttributeSet,
        explain: &mut dyn ExplanationBuilder,
    ) -> Result<bool, MatchError> {
        let mut matched = true;
        for (name, wanted) in requested.iter() {
            let Some(found) = candidate.get(&name) else {
                continue;
            };
            if self.value_matches(name, wanted, found)? {
                continue;
            }
            matched = false;
            if explain.can_skip_explanation() {
                explain.candidate_does_not_match_attributes(index, requested);
                break;
            }
            explain.candidate_attribute_does_not_match(
                index,
                &Attribute::of(name, wanted),
                wanted,
                found,
            );
        }
        Ok(matched)
    }

    fn disambiguate(
        &self,
        candidates: &[&AttributeSet],
        requested: &AttributeSet,
        mut remaining: Vec<usize>,
    ) -> Vec<usize> {
        for name in self.schema.ordered(requested.keys()) {
            if remaining.len() == 1 {
                return remaining;
            }
            let wanted = requested.get(&name);
            remaining = narrow(remaining, |i| candidates[i].get(&name) == wanted);
            remaining = self.prefer(name, candidates, remaining);
        }

        let extra: Vec<InternedString> = remaining
            .iter()
            .flat_map(|&i| candidates[i].keys())
            .filter(|name| !requested.contains(name))
            .filter(|name| {
                self.schema
                    .rules(name)
                    .is_some_and(|r| r.disambiguation != DisambiguationRule::None)
            })
            .collect();
        for name in self.schema.ordered(extra) {
            if remaining.len() == 1 {
                break;
            }
            remaining = self.prefer(name, candidates, remaining);
        }
        remaining
    }

    fn prefer(
        &self,
        name: InternedString,
        candidates: &[&AttributeSet],
        remaining: Vec<usize>,
    ) -> Vec<usize> {
        let Some(DisambiguationRule::PreferOrder(order)) =
            self.schema.rules(&name).map(|r| &r.disambiguation)
        else {
            return remaining;
        };
        let rank = |i: usize| {
            candidates[i]
                .get(&name)
                .and_then(|value| order.iter().position(|preferred| preferred == value))
        };
        match remaining.iter().filter_map(|&i| rank(i)).min() {
            Some(best) => narrow(remaining, |i| rank(i) == Some(best)),
            None => remaining,
        }
    }
}

/// Keep the candidates accepted by `keep`, unless that would keep none.
fn narrow(remaining: Vec<usize>, keep: impl Fn(usize) -> bool) -> Vec<usize> {
    let kept: Vec<usize> = remaining.iter().copied().filter(|&i| keep(i)).collect();
    if kept.is_empty() {
        remaining
    } else {
        kept
    }
}

fn caret(version: &Version) -> VersionReq {
    VersionReq {
        comparators: vec![Comparator {
            op: Op::Caret,
            major: version.major,
            minor: Some(version.minor),
            patch: Some(version.patch),
            pre: version.pre.clone(),
        }],
    }
}

impl AttributeMatcher for SchemaMatcher {
    fn match_candidates(
        &self,
        candidates: &[&AttributeSet],
        requested: &AttributeSet,
        explain: &mut dyn ExplanationBuilder,
    ) -> Result<Vec<usize>> {
        let mut compatible = Vec::new();
        for (index, candidate) in candidates.iter().enumerate() {
            if self.check_candidate(index, candidate, requested, explain)? {
                compatible.push(index);
            }
        }
        if compatible.len() <= 1 {
            return Ok(compatible);
        }
        Ok(self.disambiguate(candidates, requested, compatible))
    }

    fn is_matching(&self, candidate: &AttributeSet, requested: &AttributeSet) -> Result<bool> {
        Ok(self.check_candidate(0, candidate, requested, &mut NoExplanation)?)
    }

    fn are_mutually_compatible(&self, a: &AttributeSet, b: &AttributeSet) -> Result<bool> {
        for (name, left) in a.iter() {
            let Some(right) = b.get(&name) else {
                continue;
            };
            if !self.value_matches(name, left, right)? && !self.value_matches(name, right, left)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attribute::AttributeType;
    use crate::matching::explain::TraceDiscardedCandidates;
    use crate::matching::schema::AttributeRules;

    fn set(pairs: &[(&str, &str)]) -> AttributeSet {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn debug_schema() -> SchemaMatcher {
        SchemaMatcher::new(
            AttributeSchema::new()
                .attribute("debug", AttributeRules::new().accepting("true", ["line", "full"])),
        )
    }

    #[test]
    fn test_missing_attributes_are_compatible() {
        let matcher = SchemaMatcher::default();
        let requested = set(&[("format", "jar"), ("usage", "api")]);

        assert!(matcher.is_matching(&set(&[("format", "jar")]), &requested).unwrap());
        assert!(matcher.is_matching(&AttributeSet::empty(), &requested).unwrap());
        assert!(!matcher.is_matching(&set(&[("format", "aar")]), &requested).unwrap());
    }

    #[test]
    fn test_accepts_rule_is_directional() {
        let matcher = debug_schema();

        assert!(matcher
            .is_matching(&set(&[("debug", "full")]), &set(&[("debug", "true")]))
            .unwrap());
        assert!(!matcher
            .is_matching(&set(&[("debug", "true")]), &set(&[("debug", "full")]))
            .unwrap());
    }

    #[test]
    fn test_mutual_compatibility() {
        let matcher = debug_schema();

        // One direction suffices.
        assert!(matcher
            .are_mutually_compatible(&set(&[("debug", "full")]), &set(&[("debug", "true")]))
            .unwrap());
        assert!(!matcher
            .are_mutually_compatible(&set(&[("debug", "full")]), &set(&[("debug", "line")]))
            .unwrap());
        // Disjoint keys never conflict.
        assert!(matcher
            .are_mutually_compatible(&set(&[("debug", "full")]), &set(&[("format", "jar")]))
            .unwrap());
    }

    #[test]
    fn test_semver_compatibility() {
        let matcher = SchemaMatcher::new(AttributeSchema::new().attribute(
            "jvm",
            AttributeRules::typed(AttributeType::Version).semver_compatible(),
        ));
        let requested = AttributeSet::empty().with("jvm", Version::new(1, 2, 0));

        let newer = AttributeSet::empty().with("jvm", Version::new(1, 4, 1));
        let major = AttributeSet::empty().with("jvm", Version::new(2, 0, 0));
        let older = AttributeSet::empty().with("jvm", Version::new(1, 1, 9));

        assert!(matcher.is_matching(&newer, &requested).unwrap());
        assert!(!matcher.is_matching(&major, &requested).unwrap());
        assert!(!matcher.is_matching(&older, &requested).unwrap());
    }

    #[test]
    fn test_declared_type_mismatch_is_an_error() {
        let matcher = SchemaMatcher::new(
            AttributeSchema::new().attribute("debug", AttributeRules::typed(AttributeType::Bool)),
        );

        let err = matcher
            .is_matching(&set(&[("debug", "yes")]), &AttributeSet::empty().with("debug", true))
            .unwrap_err();

        assert!(err.to_string().contains("declared as bool but has string value `yes`"));
    }

    #[test]
    fn test_explanation_reports_each_mismatch() {
        let matcher = SchemaMatcher::default();
        let a = set(&[("color", "blue"), ("size", "l")]);
        let b = set(&[("color", "red"), ("size", "s")]);
        let requested = set(&[("color", "red"), ("size", "s")]);
        let mut trace = TraceDiscardedCandidates::new();

        let matches = matcher.match_candidates(&[&a, &b], &requested, &mut trace).unwrap();

        assert_eq!(matches, vec![1]);
        assert_eq!(trace.discarded().len(), 2);
        assert_eq!(trace.discarded_candidates(), vec![0]);
    }

    #[test]
    fn test_exact_value_preferred_over_compatible() {
        let matcher = debug_schema();
        let exact = set(&[("debug", "true")]);
        let compatible = set(&[("debug", "full")]);

        let matches = matcher
            .match_candidates(&[&compatible, &exact], &set(&[("debug", "true")]), &mut NoExplanation)
            .unwrap();

        assert_eq!(matches, vec![1]);
    }

    #[test]
    fn test_prefer_order_on_extra_attribute() {
        let matcher = SchemaMatcher::new(
            AttributeSchema::new()
                .attribute("linkage", AttributeRules::new().preferring(["static", "shared"])),
        );
        let shared = set(&[("format", "lib"), ("linkage", "shared")]);
        let fixed = set(&[("format", "lib"), ("linkage", "static")]);

        let matches = matcher
            .match_candidates(&[&shared, &fixed], &set(&[("format", "lib")]), &mut NoExplanation)
            .unwrap();

        assert_eq!(matches, vec![1]);
    }

    #[test]
    fn test_undecidable_candidates_all_survive_in_order() {
        let matcher = debug_schema();
        let line = set(&[("debug", "line")]);
        let full = set(&[("debug", "full")]);

        let matches = matcher
            .match_candidates(&[&line, &full], &set(&[("debug", "true")]), &mut NoExplanation)
            .unwrap();

        assert_eq!(matches, vec![0, 1]);
    }
}
