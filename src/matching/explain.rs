//! Explanation builders: observers of why candidates were discarded.
//!
//! A fresh builder is created for every matching call and passed in by
//! `&mut`, so concurrent selections never share one.

use std::collections::HashSet;
use std::fmt;

use crate::core::attribute::{Attribute, AttributeSet, AttributeValue};

/// Receives discard events from an `AttributeMatcher`.
pub trait ExplanationBuilder {
    /// When true the matcher may stop at the first mismatch of a candidate
    /// and skip reporting it.
    fn can_skip_explanation(&self) -> bool {
        true
    }

    /// The candidate at `candidate` does not satisfy `requested` as a whole.
    fn candidate_does_not_match_attributes(&mut self, _candidate: usize, _requested: &AttributeSet) {}

    /// One attribute of the candidate at `candidate` is incompatible.
    fn candidate_attribute_does_not_match(
        &mut self,
        _candidate: usize,
        _attribute: &Attribute,
        _requested: &AttributeValue,
        _found: &AttributeValue,
    ) {
    }
}

/// Ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExplanation;

impl ExplanationBuilder for NoExplanation {}

/// Cheap-path builder: writes discards to the debug log when it is enabled
/// and otherwise lets the matcher skip explanation work.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingExplanation;

impl ExplanationBuilder for LoggingExplanation {
    fn can_skip_explanation(&self) -> bool {
        !tracing::enabled!(tracing::Level::DEBUG)
    }

    fn candidate_does_not_match_attributes(&mut self, candidate: usize, requested: &AttributeSet) {
        tracing::debug!("candidate #{} does not match {}", candidate, requested);
    }

    fn candidate_attribute_does_not_match(
        &mut self,
        candidate: usize,
        attribute: &Attribute,
        requested: &AttributeValue,
        found: &AttributeValue,
    ) {
        tracing::debug!(
            "candidate #{}: attribute `{}` requested {} but found {}",
            candidate,
            attribute.name(),
            requested,
            found
        );
    }
}

/// Why one candidate was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardedCandidate {
    pub candidate: usize,
    pub attribute: Option<Attribute>,
    pub requested: Option<AttributeValue>,
    pub found: Option<AttributeValue>,
}

impl fmt::Display for DiscardedCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.attribute, &self.requested, &self.found) {
            (Some(attribute), Some(requested), Some(found)) => write!(
                f,
                "attribute `{}` requested {} but found {}",
                attribute.name(),
                requested,
                found
            ),
            _ => f.write_str("does not match the requested attributes"),
        }
    }
}

/// Diagnostic-pass builder that records every discard, one entry per
/// candidate and attribute.
#[derive(Debug, Default)]
pub struct TraceDiscardedCandidates {
    discarded: Vec<DiscardedCandidate>,
    seen: HashSet<(usize, Option<Attribute>)>,
}

impl TraceDiscardedCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discarded(&self) -> &[DiscardedCandidate] {
        &self.discarded
    }

    /// Indices of discarded candidates, ascending and without repeats.
    pub fn discarded_candidates(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.discarded.iter().map(|d| d.candidate).collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    pub fn into_discarded(self) -> Vec<DiscardedCandidate> {
        self.discarded
    }

    fn record(&mut self, entry: DiscardedCandidate) {
        if self.seen.insert((entry.candidate, entry.attribute)) {
            self.discarded.push(entry);
        }
    }
}

impl ExplanationBuilder for TraceDiscardedCandidates {
    fn can_skip_explanation(&self) -> bool {
        false
    }

    fn candidate_does_not_match_attributes(&mut self, candidate: usize, _requested: &AttributeSet) {
        self.record(DiscardedCandidate {
            candidate,
            attribute: None,
            requested: None,
            found: None,
        });
    }

    fn candidate_attribute_does_not_match(
        &mut self,
        candidate: usize,
        attribute: &Attribute,
        requested: &AttributeValue,
        found: &AttributeValue,
    ) {
        self.record(DiscardedCandidate {
            candidate,
            attribute: Some(*attribute),
            requested: Some(requested.clone()),
            found: Some(found.clone()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attribute::AttributeType;

    #[test]
    fn test_trace_deduplicates_per_attribute() {
        let mut trace = TraceDiscardedCandidates::new();
        let color = Attribute::new("color", AttributeType::String);

        trace.candidate_attribute_does_not_match(1, &color, &"red".into(), &"blue".into());
        trace.candidate_attribute_does_not_match(1, &color, &"red".into(), &"blue".into());
        trace.candidate_does_not_match_attributes(1, &AttributeSet::empty());
        trace.candidate_does_not_match_attributes(0, &AttributeSet::empty());

        assert_eq!(trace.discarded().len(), 3);
        assert_eq!(trace.discarded_candidates(), vec![0, 1]);
        assert_eq!(
            trace.discarded()[0].to_string(),
            "attribute `color` requested red but found blue"
        );
    }

    #[test]
    fn test_trace_never_skips() {
        assert!(!TraceDiscardedCandidates::new().can_skip_explanation());
        assert!(NoExplanation.can_skip_explanation());
    }
}
