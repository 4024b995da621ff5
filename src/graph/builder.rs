//! Full, deterministic graph construction from filtered record sets.

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::error::GraphError;
use super::filter::FilterState;
use super::normalize::{self, NodeSet, NormalizeContext};
use super::records::{Record, RecordKind, RecordSets};
use super::resolve::{CompanyNameResolver, JoinTable, RelationshipResolver};
use super::scale::DegreeSizer;
use super::types::{Edge, Graph, Node, NodeId};

/// Node attribute used for cluster background shading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClusterBy {
	/// Node kind.
	#[default]
	Kind,
	/// `phase` payload field.
	Phase,
	/// `layer_type` payload field.
	LayerType,
	/// `status` payload field.
	Status,
}

impl ClusterBy {
	/// Every choice, in menu order.
	pub const ALL: [Self; 4] = [Self::Kind, Self::Phase, Self::LayerType, Self::Status];

	/// Human-readable name for menus.
	pub fn label(self) -> &'static str {
		match self {
			Self::Kind => "Type",
			Self::Phase => "Phase",
			Self::LayerType => "Layer type",
			Self::Status => "Status",
		}
	}

	/// Stable key used in saved views and `<option>` values.
	pub fn key(self) -> &'static str {
		match self {
			Self::Kind => "kind",
			Self::Phase => "phase",
			Self::LayerType => "layerType",
			Self::Status => "status",
		}
	}

	/// Inverse of [`ClusterBy::key`].
	pub fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|c| c.key() == key)
	}

	fn cluster_of(self, node: &Node) -> Option<String> {
		match self {
			Self::Kind => Some(node.kind.key().to_owned()),
			Self::Phase => node.field("phase").map(str::to_ascii_lowercase),
			Self::LayerType => node.field("layer_type").map(str::to_ascii_lowercase),
			Self::Status => node.field("status").map(str::to_ascii_lowercase),
		}
	}
}

/// Builds a [`Graph`] from record sets. Pure with respect to its inputs: the
/// same records and filters always yield the same nodes and edges in the same
/// order.
#[derive(Clone, Debug)]
pub struct GraphBuilder<R = CompanyNameResolver> {
	sizer: DegreeSizer,
	cluster_by: Option<ClusterBy>,
	resolver: R,
}

impl Default for GraphBuilder {
	fn default() -> Self {
		Self::new(DegreeSizer::default())
	}
}

impl GraphBuilder {
	/// Builder sizing nodes with `sizer` and resolving companies by name.
	pub fn new(sizer: DegreeSizer) -> Self {
		Self {
			sizer,
			cluster_by: None,
			resolver: CompanyNameResolver,
		}
	}
}

impl<R: RelationshipResolver> GraphBuilder<R> {
	/// Swap the strategy-to-company resolver.
	pub fn with_resolver<S: RelationshipResolver>(self, resolver: S) -> GraphBuilder<S> {
		GraphBuilder {
			sizer: self.sizer,
			cluster_by: self.cluster_by,
			resolver,
		}
	}

	/// Assign clusters from `cluster_by`, or leave every node unclustered.
	pub fn with_clustering(mut self, cluster_by: Option<ClusterBy>) -> Self {
		self.cluster_by = cluster_by;
		self
	}

	/// Normalize the admitted records into a graph. Fails only if an edge
	/// would reference a node the build did not produce.
	pub fn build(&self, records: &RecordSets, filters: &FilterState) -> Result<Graph, GraphError> {
		for kind in records.unknown_kinds() {
			warn!("ignoring unsupported record kind `{kind}`");
		}

		let mut nodes = NodeSet::default();
		let mut edges: Vec<Edge> = Vec::new();
		let mut joins = JoinTable::default();
		let mut skipped = 0usize;

		for kind in RecordKind::ALL {
			let admitted: Vec<&Record> = records
				.get(kind)
				.iter()
				.filter(|r| filters.admits(kind, r))
				.collect();

			if kind == RecordKind::Strategy {
				let companies = nodes.company_refs();
				joins = self.resolver.resolve(&admitted, &companies);
				debug!("resolved {} strategy targets", joins.len());
			}

			let entry = normalize::entry(kind);
			for record in admitted {
				let ctx = NormalizeContext {
					nodes: &nodes,
					joins: &joins,
				};
				match (entry.normalize)(record, ctx) {
					Ok(contribution) => {
						for node in contribution.nodes {
							nodes.insert(node);
						}
						edges.extend(contribution.edges);
					}
					Err(err) => {
						skipped += 1;
						warn!("skipping record: {err}");
					}
				}
			}
		}

		for edge in &edges {
			if !nodes.contains(&edge.source) || !nodes.contains(&edge.target) {
				return Err(GraphError::DanglingEdge {
					from: edge.source.clone(),
					to: edge.target.clone(),
					relation: edge.relation.clone(),
				});
			}
		}

		let degrees = degree_counts(&edges);
		let mut nodes = nodes.into_vec();
		for node in &mut nodes {
			node.degree = degrees.get(&node.id).copied().unwrap_or(0);
			node.size_tier = self.sizer.size_of(node.degree);
			let cluster = self.cluster_by.and_then(|c| c.cluster_of(node));
			node.cluster = cluster;
		}

		debug!(
			"built graph from {} records: {} nodes, {} edges, {} records skipped",
			records.total(),
			nodes.len(),
			edges.len(),
			skipped
		);
		Ok(Graph::from_parts(nodes, edges))
	}
}

/// Edges touching each node; a self-loop counts once.
fn degree_counts(edges: &[Edge]) -> HashMap<&NodeId, u32> {
	let mut counts: HashMap<&NodeId, u32> = HashMap::new();
	for edge in edges {
		*counts.entry(&edge.source).or_default() += 1;
		if edge.target != edge.source {
			*counts.entry(&edge.target).or_default() += 1;
		}
	}
	counts
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;
	use crate::graph::filter::EntityType;
	use crate::graph::resolve::CompanyRef;

	fn records() -> RecordSets {
		RecordSets::from_json(
			&json!({
				"executions": [
					{"id": "e1", "name": "Acme turnaround", "company": "Acme", "phase": "discovery", "impact": "high"},
					{"id": "e2", "name": "Acme pricing", "company": "acme", "phase": "delivery", "impact": "low"}
				],
				"personas": [
					{"id": "p1", "execution_id": "e1", "name": "Dana Reyes", "persona_type": "leader"},
					{"id": "p2", "execution_id": "e2", "name": "Dana Reyes", "persona_type": "leader"},
					{"id": "p3", "name": "Orphan"}
				],
				"defense_patterns": [
					{"id": "d1", "execution_id": "e1", "name": "Price war", "severity": "high"}
				],
				"strategies": [
					{"id": "s1", "execution_id": "e1", "title": "Undercut Acme", "status": "active"}
				],
				"architecture_layers": [
					{"id": "l1", "name": "Data", "layer_type": "data"},
					{"id": "l2", "name": "Agents", "layer_type": "agent"}
				],
				"interfaces": [
					{"source_layer_id": "l1", "target_layer_id": "l2", "interface_type": "data"},
					{"source_layer_id": "l1", "target_layer_id": "l2", "interface_type": "control"}
				],
				"notifications": [{"id": 1}]
			})
			.to_string(),
		)
		.unwrap()
	}

	fn ids(graph: &Graph) -> Vec<&str> {
		graph.nodes().iter().map(|n| n.id.as_str()).collect()
	}

	#[test]
	fn shared_nodes_are_emitted_once_but_keep_every_edge() {
		let graph = GraphBuilder::default().build(&records(), &FilterState::default()).unwrap();

		assert_eq!(
			ids(&graph),
			vec![
				"execution_e1",
				"company_acme",
				"execution_e2",
				"persona_p1",
				"leader_dana-reyes",
				"persona_p2",
				"defense_d1",
				"strategy_s1",
				"layer_l1",
				"layer_l2",
			]
		);
		let company = graph.node(&"company_acme".into()).unwrap();
		// involves from e1 and e2, targets from s1
		assert_eq!(company.degree, 3);
		let leader = graph.node(&"leader_dana-reyes".into()).unwrap();
		assert_eq!(leader.degree, 2);
	}

	#[test]
	fn parallel_edges_are_kept() {
		let graph = GraphBuilder::default().build(&records(), &FilterState::default()).unwrap();
		let layer_edges: Vec<_> = graph
			.edges()
			.iter()
			.filter(|e| e.source.as_str() == "layer_l1")
			.map(|e| e.relation.as_str())
			.collect();
		assert_eq!(layer_edges, vec!["data", "control"]);
		assert_eq!(graph.node(&"layer_l2".into()).unwrap().degree, 2);
	}

	#[test]
	fn degree_drives_size_tier() {
		let graph = GraphBuilder::default().build(&records(), &FilterState::default()).unwrap();
		let sizer = DegreeSizer::default();
		for node in graph.nodes() {
			assert_eq!(node.size_tier, sizer.size_of(node.degree));
		}
	}

	#[test]
	fn phase_filter_drops_children_edges() {
		let filters = FilterState::default().with_phase(Some("delivery".into()));
		let graph = GraphBuilder::default().build(&records(), &filters).unwrap();
		assert!(graph.node(&"execution_e1".into()).is_none());
		let defense = graph.node(&"defense_d1".into()).unwrap();
		assert_eq!(defense.degree, 0);
	}

	#[test]
	fn entity_type_layer_keeps_interfaces() {
		let filters = FilterState::default().with_entity_type(Some(EntityType::Layer));
		let graph = GraphBuilder::default().build(&records(), &filters).unwrap();
		assert_eq!(ids(&graph), vec!["layer_l1", "layer_l2"]);
		assert_eq!(graph.edge_count(), 2);
	}

	#[test]
	fn clusters_follow_the_configured_attribute() {
		let builder = GraphBuilder::default().with_clustering(Some(ClusterBy::LayerType));
		let graph = builder.build(&records(), &FilterState::default()).unwrap();
		assert_eq!(graph.node(&"layer_l2".into()).unwrap().cluster.as_deref(), Some("agent"));
		assert_eq!(graph.node(&"execution_e1".into()).unwrap().cluster, None);

		let unclustered = GraphBuilder::default().build(&records(), &FilterState::default()).unwrap();
		assert!(unclustered.nodes().iter().all(|n| n.cluster.is_none()));
	}

	#[test]
	fn custom_resolver_replaces_name_matching() {
		struct NoJoins;
		impl RelationshipResolver for NoJoins {
			fn resolve(&self, _: &[&Record], _: &[CompanyRef<'_>]) -> JoinTable {
				JoinTable::default()
			}
		}
		let graph = GraphBuilder::default()
			.with_resolver(NoJoins)
			.build(&records(), &FilterState::default())
			.unwrap();
		assert!(graph.edges().iter().all(|e| e.relation != normalize::TARGETS));
	}
}
