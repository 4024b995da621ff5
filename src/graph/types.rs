//! Core graph data model: typed nodes, typed directed edges, and the
//! immutable [`Graph`] produced by one build.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Node identifier, namespaced by the contributing entity kind
/// (`persona_<id>`, `company_<slug>`, ...).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
	/// Build an id from a kind prefix and the entity's own key.
	pub fn namespaced(prefix: &str, key: &str) -> Self {
		Self(format!("{prefix}_{key}"))
	}

	/// The raw id.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NodeId {
	fn from(s: &str) -> Self {
		Self(s.to_owned())
	}
}

/// Position of an edge in its graph's edge list. Parallel edges between the
/// same pair are distinct, so edges are identified by index, not endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub usize);

impl fmt::Display for EdgeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "e{}", self.0)
	}
}

/// Fixed set of vertex kinds shown in the knowledge graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
	/// A strategy execution.
	Execution,
	/// A company named by an execution.
	Company,
	/// A leader persona, keyed by name.
	Leader,
	/// A persona within an execution.
	Persona,
	/// A defense pattern.
	Defense,
	/// A generated strategy.
	Strategy,
	/// An architecture layer.
	LayerComponent,
}

impl NodeKind {
	/// Every kind, in legend order.
	pub const ALL: [Self; 7] = [
		Self::Execution,
		Self::Company,
		Self::Leader,
		Self::Persona,
		Self::Defense,
		Self::Strategy,
		Self::LayerComponent,
	];

	/// Stable key, also used as the cluster key for by-kind clustering.
	pub fn key(self) -> &'static str {
		match self {
			Self::Execution => "execution",
			Self::Company => "company",
			Self::Leader => "leader",
			Self::Persona => "persona",
			Self::Defense => "defense",
			Self::Strategy => "strategy",
			Self::LayerComponent => "layer-component",
		}
	}

	/// Human-readable name.
	pub fn label(self) -> &'static str {
		match self {
			Self::Execution => "Execution",
			Self::Company => "Company",
			Self::Leader => "Leader",
			Self::Persona => "Persona",
			Self::Defense => "Defense Pattern",
			Self::Strategy => "Strategy",
			Self::LayerComponent => "Architecture Layer",
		}
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.key())
	}
}

/// A typed, labeled vertex. `degree`, `size_tier` and `cluster` are filled in
/// by the builder; normalizers leave them at their defaults.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
	/// Unique within one graph.
	pub id: NodeId,
	/// Entity kind.
	pub kind: NodeKind,
	/// Display label.
	pub label: String,
	/// Source record, kept verbatim for the detail panel.
	pub payload: Map<String, Value>,
	/// Number of incident edges.
	pub degree: u32,
	/// Radius units derived from `degree`.
	pub size_tier: u32,
	/// Cluster key when clustering is on.
	pub cluster: Option<String>,
}

impl Node {
	/// Fresh node with zero degree, tier 0 and no cluster.
	pub fn new(id: NodeId, kind: NodeKind, label: impl Into<String>, payload: Map<String, Value>) -> Self {
		Self {
			id,
			kind,
			label: label.into(),
			payload,
			degree: 0,
			size_tier: 0,
			cluster: None,
		}
	}

	/// String-valued payload field, if present and non-blank.
	pub fn field(&self, key: &str) -> Option<&str> {
		self.payload
			.get(key)
			.and_then(Value::as_str)
			.map(str::trim)
			.filter(|s| !s.is_empty())
	}
}

/// Directed, typed connection. Direction matters for construction only.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
	/// Origin node.
	pub source: NodeId,
	/// Destination node.
	pub target: NodeId,
	/// Relation type, e.g. `has_persona`.
	pub relation: String,
}

impl Edge {
	/// Edge from `source` to `target`.
	pub fn new(source: NodeId, target: NodeId, relation: impl Into<String>) -> Self {
		Self {
			source,
			target,
			relation: relation.into(),
		}
	}

	/// Whether either endpoint is `id`.
	pub fn touches(&self, id: &NodeId) -> bool {
		&self.source == id || &self.target == id
	}

	/// The endpoint opposite `id`, or `None` if the edge does not touch it.
	pub fn other(&self, id: &NodeId) -> Option<&NodeId> {
		if &self.source == id {
			Some(&self.target)
		} else if &self.target == id {
			Some(&self.source)
		} else {
			None
		}
	}
}

/// Result of one build. Replaced wholesale on every rebuild, never patched.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Graph {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	#[serde(skip)]
	index: HashMap<NodeId, usize>,
}

impl Graph {
	/// Assemble a graph from already-validated parts.
	pub(crate) fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
		let index = nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();
		Self { nodes, edges, index }
	}

	/// Nodes in build order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Edges in build order; position is the [`EdgeId`].
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Number of nodes.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Number of edges.
	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	/// Whether the graph has no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Node with `id`.
	pub fn node(&self, id: &NodeId) -> Option<&Node> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	/// Position of node `id` in [`Graph::nodes`].
	pub fn node_index(&self, id: &NodeId) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Whether node `id` is present.
	pub fn contains(&self, id: &NodeId) -> bool {
		self.index.contains_key(id)
	}

	/// Edge at `id`.
	pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
		self.edges.get(id.0)
	}

	/// Edges with their ids, in build order.
	pub fn edges_with_ids(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
		self.edges.iter().enumerate().map(|(i, e)| (EdgeId(i), e))
	}

	/// Counts for the legend.
	pub fn stats(&self) -> GraphStats {
		let mut stats = GraphStats::default();
		for node in &self.nodes {
			*stats.nodes_by_kind.entry(node.kind).or_default() += 1;
		}
		for edge in &self.edges {
			*stats.edges_by_relation.entry(edge.relation.clone()).or_default() += 1;
		}
		stats
	}
}

/// Per-kind node counts and per-relation edge counts, for legends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
	/// Node count per kind.
	pub nodes_by_kind: BTreeMap<NodeKind, usize>,
	/// Edge count per relation.
	pub edges_by_relation: BTreeMap<String, usize>,
}
