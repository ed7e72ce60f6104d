//! Markers: non-semantic annotations attached to node ids
//!
//! A marker records something about a node (a search hit, a parse error, a
//! generated-code flag) without touching the node itself: attaching one
//! never rewrites the tree, never changes node identity, and never affects
//! printing or structural equality. Search visitors report hits exclusively
//! through markers, which downstream consumers read out as
//! `(NodeId, Marker)` pairs after the traversal.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tree::{Node, NodeId};

/// A typed, immutable annotation on one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Marker {
    /// A search visitor matched this node
    SearchResult { description: String },
    /// The front end recovered from a parse error at this node
    ParseError {
        message: String,
        /// Byte offsets into the original text, if known
        range: Option<(u32, u32)>,
    },
    /// This node was produced by code generation
    Generated,
    /// Tool-specific annotation with a free-form payload
    Custom { key: String, payload: Value },
}

/// Append-only accumulator of markers, keyed by node id.
///
/// Per node, markers form an ordered set: insertion order is preserved and
/// an identical marker attached twice is recorded once.
#[derive(Debug, Clone, Default)]
pub struct MarkerBus {
    entries: IndexMap<NodeId, Vec<Marker>>,
}

impl MarkerBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a marker to a node id. Returns `false` if the identical
    /// marker was already attached to that node.
    pub fn attach(&mut self, id: NodeId, marker: Marker) -> bool {
        let markers = self.entries.entry(id).or_default();
        if markers.contains(&marker) {
            return false;
        }
        markers.push(marker);
        true
    }

    /// Record a search hit against a node and hand the node back untouched.
    ///
    /// This is the finder-visitor idiom: the node (and the printed output)
    /// is unaffected, only the marker set grows.
    pub fn search(&mut self, node: &Arc<Node>, description: impl Into<String>) -> Arc<Node> {
        self.attach(
            node.id(),
            Marker::SearchResult {
                description: description.into(),
            },
        );
        Arc::clone(node)
    }

    /// Markers attached to one node, in attachment order
    pub fn markers(&self, id: NodeId) -> &[Marker] {
        self.entries.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_markers(&self, id: NodeId) -> bool {
        !self.markers(id).is_empty()
    }

    /// All `(node id, marker)` pairs, grouped by node in attachment order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Marker)> {
        self.entries
            .iter()
            .flat_map(|(id, markers)| markers.iter().map(move |marker| (*id, marker)))
    }

    /// Total number of attached markers
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeKind, TreeBuilder, print};
    use serde_json::json;

    #[test]
    fn attach_is_an_ordered_set_per_node() {
        let node = TreeBuilder::new(NodeKind::Statement).token("", "a;").build();
        let mut bus = MarkerBus::new();
        assert!(bus.attach(node.id(), Marker::Generated));
        assert!(bus.attach(
            node.id(),
            Marker::SearchResult {
                description: "hit".into()
            }
        ));
        // duplicate is dropped
        assert!(!bus.attach(node.id(), Marker::Generated));

        let markers = bus.markers(node.id());
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0], Marker::Generated);
    }

    #[test]
    fn search_leaves_node_and_printed_text_untouched() {
        let node = TreeBuilder::new(NodeKind::Statement)
            .prefix("  ")
            .token("", "a;")
            .build();
        let before = print(&node);

        let mut bus = MarkerBus::new();
        let returned = bus.search(&node, "matched **/a.java");

        assert!(Arc::ptr_eq(&node, &returned));
        assert_eq!(print(&returned), before);
        assert!(bus.has_markers(node.id()));
    }

    #[test]
    fn iter_yields_pairs_in_attachment_order() {
        let a = TreeBuilder::new(NodeKind::Statement).token("", "a;").build();
        let b = TreeBuilder::new(NodeKind::Statement).token("", "b;").build();
        let mut bus = MarkerBus::new();
        bus.attach(a.id(), Marker::Generated);
        bus.attach(
            b.id(),
            Marker::ParseError {
                message: "unexpected token".into(),
                range: Some((3, 5)),
            },
        );
        bus.attach(
            a.id(),
            Marker::Custom {
                key: "owner".into(),
                payload: json!({"team": "platform"}),
            },
        );

        let pairs: Vec<_> = bus.iter().collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].0, a.id());
        assert_eq!(pairs[1].0, a.id());
        assert_eq!(pairs[2].0, b.id());
        assert_eq!(bus.len(), 3);
    }

    #[test]
    fn markers_serialize_for_reporting() {
        let marker = Marker::SearchResult {
            description: "find: deprecated api".into(),
        };
        let json = serde_json::to_value(&marker).unwrap();
        assert_eq!(json["kind"], "search-result");
    }
}
