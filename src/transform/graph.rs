//! Transform registry as a graph of attribute sets.
//!
//! Nodes are distinct attribute sets (keyed by fingerprint), edges are
//! registrations. Variant attribute sets are included so the roots of
//! every chain are visible.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::core::attribute::{AttributeSet, HasAttributes};
use crate::core::variant::Variant;
use crate::transform::{TransformRegistration, TransformRegistry};

#[derive(Debug, Clone, Default)]
pub struct TransformGraph {
    graph: DiGraph<AttributeSet, Arc<TransformRegistration>>,
    nodes: HashMap<String, NodeIndex>,
    roots: HashSet<NodeIndex>,
}

impl TransformGraph {
    pub fn new(registry: &TransformRegistry, variants: &[Arc<Variant>]) -> Self {
        let mut graph = TransformGraph::default();
        for variant in variants {
            let node = graph.node(variant.attributes());
            graph.roots.insert(node);
        }
        for registration in registry.registrations() {
            let from = graph.node(registration.from());
            let to = graph.node(registration.to());
            graph.graph.add_edge(from, to, Arc::clone(registration));
        }
        graph
    }

    fn node(&mut self, attributes: &AttributeSet) -> NodeIndex {
        let key = attributes.fingerprint();
        if let Some(&node) = self.nodes.get(&key) {
            return node;
        }
        let node = self.graph.add_node(attributes.clone());
        self.nodes.insert(key, node);
        node
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether some variant has exactly these attributes.
    pub fn is_root(&self, attributes: &AttributeSet) -> bool {
        self.nodes
            .get(&attributes.fingerprint())
            .is_some_and(|node| self.roots.contains(node))
    }

    /// Render as Graphviz DOT. Variant nodes are drawn as boxes.
    pub fn to_dot(&self) -> String {
        format!(
            "{}",
            Dot::with_attr_getters(
                &self.graph,
                &[Config::EdgeNoLabel, Config::NodeNoLabel],
                &|_, edge| format!("label = \"{}\"", escape(&edge.weight().definition().to_string())),
                &|_, (idx, attributes)| {
                    let shape = if self.roots.contains(&idx) { "box" } else { "ellipse" };
                    format!("label = \"{}\" shape = {}", escape(&attributes.to_string()), shape)
                },
            )
        )
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn test_nodes_are_deduplicated_by_attributes() {
        let registry = registry_of([
            transform("unzip", &[("format", "jar")], &[("format", "classes")]),
            transform("dex", &[("format", "classes")], &[("format", "dex")]),
            transform("extract", &[("format", "jar")], &[("format", "classes")]),
        ]);
        let producer = producer("lib", [variant("jar", &[("format", "jar")])]);

        let graph = TransformGraph::new(&registry, producer.variants());

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.is_root(&format("jar")));
        assert!(!graph.is_root(&format("dex")));
    }

    #[test]
    fn test_dot_output() {
        let registry = jar_to_classes_registry();
        let producer = producer("lib", [variant("jar", &[("format", "jar")])]);

        let dot = TransformGraph::new(&registry, producer.variants()).to_dot();

        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("label = \"{format=jar}\" shape = box"));
        assert!(dot.contains("label = \"{format=classes}\" shape = ellipse"));
        assert!(dot.contains("0 -> 1 [ label = \"unzip\""));
    }
}
