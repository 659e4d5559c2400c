//! Transform chain search.
//!
//! Breadth-first over (root variant, attributes) nodes. Level `n` holds
//! every node reachable from a root with exactly `n` registrations applied,
//! so shorter chains are always found before longer ones.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use crate::core::attribute::{AttributeSet, HasAttributes};
use crate::core::variant::{Variant, VariantId};
use crate::matching::AttributeMatcher;
use crate::transform::TransformRegistration;

/// A root variant plus the registrations applied to it, in order.
///
/// The attributes are exactly the `to` set of the last step.
#[derive(Debug, Clone)]
pub struct TransformedVariant {
    root: Arc<Variant>,
    steps: Vec<Arc<TransformRegistration>>,
}

impl TransformedVariant {
    /// Returns `None` for an empty chain.
    pub fn new(root: Arc<Variant>, steps: Vec<Arc<TransformRegistration>>) -> Option<Self> {
        if steps.is_empty() {
            return None;
        }
        Some(TransformedVariant { root, steps })
    }

    pub fn root(&self) -> &Arc<Variant> {
        &self.root
    }

    pub fn steps(&self) -> &[Arc<TransformRegistration>] {
        &self.steps
    }

    /// Number of transforms in the chain (at least one).
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// `root --a--> --b--> {attrs}`, used in diagnostics.
    pub fn describe(&self) -> String {
        let mut out = self.root.id().to_string();
        for step in &self.steps {
            out.push_str(&format!(" --{}-->", step.definition().action()));
        }
        out.push(' ');
        out.push_str(&self.attributes().to_string());
        out
    }
}

impl HasAttributes for TransformedVariant {
    fn attributes(&self) -> &AttributeSet {
        // `steps` is never empty; see `new`.
        self.steps
            .last()
            .map(|step| step.to())
            .unwrap_or_else(|| self.root.attributes())
    }
}

/// Chains are the same candidate only if they start at the same root and
/// apply the very same registrations in the same order.
impl PartialEq for TransformedVariant {
    fn eq(&self, other: &Self) -> bool {
        self.root.id() == other.root.id()
            && self.steps.len() == other.steps.len()
            && self
                .steps
                .iter()
                .zip(&other.steps)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

impl Eq for TransformedVariant {}

impl fmt::Display for TransformedVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

struct Node {
    root: usize,
    attributes: AttributeSet,
    steps: Vec<Arc<TransformRegistration>>,
}

/// Find every minimal chain of registrations that turns some variant's
/// attributes into a set compatible with `requested`.
///
/// A root that reaches the request in `n` steps is not explored further, so
/// no longer chain from the same root is ever returned. Nodes are keyed by
/// (root identity, attribute fingerprint); a key seen on an earlier level is
/// never expanded again, which bounds the search even when registrations form
/// cycles. Nodes sharing a key on the same level are all kept, so every
/// route through a shared intermediate set is returned. Results are ordered by chain length, then root order, then
/// registration order.
pub fn find_transformed_variants(
    matcher: &dyn AttributeMatcher,
    registrations: &[Arc<TransformRegistration>],
    variants: &[Arc<Variant>],
    requested: &AttributeSet,
) -> Result<Vec<TransformedVariant>> {
    let mut visited: HashSet<(VariantId, String)> = HashSet::new();
    let mut frontier: Vec<Node> = Vec::with_capacity(variants.len());
    for (root, variant) in variants.iter().enumerate() {
        visited.insert((variant.id(), variant.attributes().fingerprint()));
        frontier.push(Node {
            root,
            attributes: variant.attributes().clone(),
            steps: Vec::new(),
        });
    }

    let mut results = Vec::new();
    let mut depth = 0;
    while !frontier.is_empty() && !registrations.is_empty() {
        depth += 1;
        let mut next = Vec::new();
        let mut level_keys: HashSet<(VariantId, String)> = HashSet::new();
        let mut satisfied: HashSet<usize> = HashSet::new();

        for node in &frontier {
            let root = &variants[node.root];
            for registration in registrations {
                if !matcher.is_matching(&node.attributes, registration.from())? {
                    continue;
                }
                let key = (root.id(), registration.to().fingerprint());
                if visited.contains(&key) {
                    continue;
                }

                let mut steps = node.steps.clone();
                steps.push(Arc::clone(registration));

                // Keys seen on this level still expand: two routes into the
                // same attributes are two distinct chains.
                level_keys.insert(key);
                if matcher.is_matching(registration.to(), requested)? {
                    satisfied.insert(node.root);
                    results.extend(TransformedVariant::new(Arc::clone(root), steps));
                } else {
                    next.push(Node {
                        root: node.root,
                        attributes: registration.to().clone(),
                        steps,
                    });
                }
            }
        }

        tracing::trace!(
            "transform search level {}: {} candidates, {} nodes to expand",
            depth,
            results.len(),
            next.len()
        );

        visited.extend(level_keys);
        next.retain(|node| !satisfied.contains(&node.root));
        frontier = next;
    }

    Ok(results)
}
