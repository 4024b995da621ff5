//! Node selection and one-hop neighborhood highlighting.

use std::collections::HashSet;

use super::types::{EdgeId, Graph, NodeId};

/// Selection state machine. Clicking a node selects it, clicking it again
/// (or deselecting) returns to `Idle`, clicking another node moves the
/// selection directly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
	/// Nothing selected.
	#[default]
	Idle,
	/// Exactly one node selected.
	NodeSelected(NodeId),
}

impl Selection {
	/// Next state after clicking node `id`.
	pub fn click(&self, id: NodeId) -> Self {
		match self {
			Self::NodeSelected(current) if *current == id => Self::Idle,
			_ => Self::NodeSelected(id),
		}
	}

	/// Next state after clicking empty canvas.
	pub fn deselect(&self) -> Self {
		Self::Idle
	}

	/// Selected node, if any.
	pub fn selected(&self) -> Option<&NodeId> {
		match self {
			Self::Idle => None,
			Self::NodeSelected(id) => Some(id),
		}
	}

	/// Drops a selection whose node is not part of `graph`.
	pub fn retain_in(self, graph: &Graph) -> Self {
		match self {
			Self::NodeSelected(id) if !graph.contains(&id) => Self::Idle,
			other => other,
		}
	}
}

/// How an element should be painted relative to the current selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emphasis {
	/// Nothing is selected; paint at full opacity.
	Neutral,
	/// Part of the selected neighborhood.
	Highlighted,
	/// Outside the selected neighborhood.
	Dimmed,
}

/// One-hop neighborhood of the selected node. Both sets are empty while
/// idle, which means "dim nothing".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightSet {
	nodes: HashSet<NodeId>,
	edges: HashSet<EdgeId>,
}

impl HighlightSet {
	/// The selected node, every node one edge away in either direction, and
	/// every edge touching the selected node. A selection missing from
	/// `graph` yields the empty set.
	pub fn for_selection(graph: &Graph, selected: Option<&NodeId>) -> Self {
		let Some(selected) = selected.filter(|id| graph.contains(id)) else {
			return Self::default();
		};

		let mut set = Self::default();
		set.nodes.insert(selected.clone());
		for (id, edge) in graph.edges_with_ids() {
			if let Some(other) = edge.other(selected) {
				set.nodes.insert(other.clone());
				set.edges.insert(id);
			}
		}
		set
	}

	/// Whether anything is selected.
	pub fn is_active(&self) -> bool {
		!self.nodes.is_empty()
	}

	/// Highlighted node ids.
	pub fn nodes(&self) -> &HashSet<NodeId> {
		&self.nodes
	}

	/// Highlighted edge ids.
	pub fn edges(&self) -> &HashSet<EdgeId> {
		&self.edges
	}

	/// Whether `id` is in the neighborhood.
	pub fn contains_node(&self, id: &NodeId) -> bool {
		self.nodes.contains(id)
	}

	/// Whether edge `id` touches the selected node.
	pub fn contains_edge(&self, id: EdgeId) -> bool {
		self.edges.contains(&id)
	}

	/// Paint emphasis for node `id`.
	pub fn node_emphasis(&self, id: &NodeId) -> Emphasis {
		match (self.is_active(), self.nodes.contains(id)) {
			(false, _) => Emphasis::Neutral,
			(true, true) => Emphasis::Highlighted,
			(true, false) => Emphasis::Dimmed,
		}
	}

	/// Paint emphasis for edge `id`.
	pub fn edge_emphasis(&self, id: EdgeId) -> Emphasis {
		match (self.is_active(), self.edges.contains(&id)) {
			(false, _) => Emphasis::Neutral,
			(true, true) => Emphasis::Highlighted,
			(true, false) => Emphasis::Dimmed,
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::Map;

	use super::*;
	use crate::graph::types::{Edge, Node, NodeKind};

	fn chain() -> Graph {
		// a -> b -> c, plus isolated d
		let nodes = ["a", "b", "c", "d"]
			.into_iter()
			.map(|id| Node::new(id.into(), NodeKind::Strategy, id, Map::new()))
			.collect();
		let edges = vec![
			Edge::new("a".into(), "b".into(), "involves"),
			Edge::new("b".into(), "c".into(), "involves"),
		];
		Graph::from_parts(nodes, edges)
	}

	#[test]
	fn click_toggles_and_switches() {
		let idle = Selection::Idle;
		let a = idle.click("a".into());
		assert_eq!(a, Selection::NodeSelected("a".into()));
		assert_eq!(a.click("b".into()), Selection::NodeSelected("b".into()));
		assert_eq!(a.click("a".into()), Selection::Idle);
		assert_eq!(a.deselect(), Selection::Idle);
	}

	#[test]
	fn highlight_is_one_hop_only() {
		let graph = chain();
		let set = HighlightSet::for_selection(&graph, Some(&"a".into()));
		assert!(set.contains_node(&"a".into()));
		assert!(set.contains_node(&"b".into()));
		assert!(!set.contains_node(&"c".into()));
		assert_eq!(set.edges().len(), 1);
		assert!(set.contains_edge(EdgeId(0)));
	}

	#[test]
	fn incoming_edges_count_as_neighbors() {
		let graph = chain();
		let set = HighlightSet::for_selection(&graph, Some(&"c".into()));
		assert!(set.contains_node(&"b".into()));
		assert!(set.contains_edge(EdgeId(1)));
	}

	#[test]
	fn isolated_node_highlights_only_itself() {
		let graph = chain();
		let set = HighlightSet::for_selection(&graph, Some(&"d".into()));
		assert_eq!(set.nodes().len(), 1);
		assert!(set.edges().is_empty());
	}

	#[test]
	fn idle_dims_nothing() {
		let graph = chain();
		let set = HighlightSet::for_selection(&graph, None);
		assert!(!set.is_active());
		for node in graph.nodes() {
			assert_eq!(set.node_emphasis(&node.id), Emphasis::Neutral);
		}
		assert_eq!(set.edge_emphasis(EdgeId(0)), Emphasis::Neutral);
	}

	#[test]
	fn stale_selection_is_dropped() {
		let graph = chain();
		let stale = Selection::NodeSelected("gone".into());
		assert!(!HighlightSet::for_selection(&graph, stale.selected()).is_active());
		assert_eq!(stale.retain_in(&graph), Selection::Idle);
	}
}
