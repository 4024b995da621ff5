//! End-to-end scenarios over the public engine API: normalization of an
//! execution with personas, entity-type filtering, isolated selection and
//! the saved-view round trip.

use std::collections::BTreeMap;

use pollster::block_on;
use pretty_assertions::assert_eq;
use serde_json::json;
use strategy_graph::graph::{
	ClusterBy, EdgeStylePreset, EngineConfig, EntityType, FilterState, GraphBuilder, GraphController, HighlightSet,
	Graph, LoadOutcome, MemoryStore, NodeId, NodeKind, NodeStylePreset, Notice, RecordKind, RecordSets, ViewPersistence,
	VisualConfig,
};

fn execution_with_personas() -> RecordSets {
	RecordSets::from_json(
		&json!({
			"executions": [{"id": "e1", "name": "Turnaround", "phase": "discovery"}],
			"personas": [
				{"id": "p1", "execution_id": "e1", "name": "Dana Whitfield", "persona_type": "leader"},
				{"id": "p2", "execution_id": "e1", "name": "Buyer", "persona_type": "company"}
			],
			"defense_patterns": [
				{"id": "d1", "execution_id": "e1", "name": "Price anchoring", "severity": "high"},
				{"id": "d2", "execution_id": "e1", "name": "Lock-in", "severity": "low"}
			]
		})
		.to_string(),
	)
	.expect("valid records")
}

fn relation_counts(graph: &Graph) -> BTreeMap<String, usize> {
	graph.stats().edges_by_relation
}

#[test]
fn execution_with_two_personas_normalizes_to_four_nodes() {
	let records = execution_with_personas().with(RecordKind::DefensePattern, Vec::new());
	let graph = GraphBuilder::default().build(&records, &FilterState::default()).expect("build");

	let ids: Vec<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
	assert_eq!(ids, vec!["execution_e1", "persona_p1", "leader_dana-whitfield", "persona_p2"]);

	let relations = relation_counts(&graph);
	assert_eq!(relations.get("has_persona"), Some(&2));
	assert_eq!(relations.get("involves"), Some(&1));
	assert!(graph.edge_count() >= 3);
	// no company on the execution, so the company persona represents nothing
	assert_eq!(relations.get("represents"), None);
}

#[test]
fn defense_filter_drops_parent_edges() {
	let filters = FilterState::default().with_entity_type(Some(EntityType::Defense));
	let graph = GraphBuilder::default().build(&execution_with_personas(), &filters).expect("build");

	let stats = graph.stats();
	assert_eq!(stats.nodes_by_kind.get(&NodeKind::Execution), None);
	assert_eq!(stats.nodes_by_kind.get(&NodeKind::Persona), None);
	assert_eq!(stats.nodes_by_kind.get(&NodeKind::Defense), Some(&2));
	assert_eq!(graph.node_count(), 2);
	assert_eq!(graph.edge_count(), 0);
	assert!(graph.nodes().iter().all(|n| n.degree == 0));
}

#[test]
fn isolated_selection_highlights_only_itself() {
	let records = RecordSets::from_json(
		&json!({
			"architecture_layers": [
				{"id": "a", "name": "Portal"},
				{"id": "b", "name": "API"},
				{"id": "c", "name": "Archive"}
			],
			"interfaces": [{"source_layer_id": "a", "target_layer_id": "b", "interface_type": "control"}]
		})
		.to_string(),
	)
	.expect("valid records");
	let graph = GraphBuilder::default().build(&records, &FilterState::default()).expect("build");

	let lonely = NodeId::from("layer_c");
	assert_eq!(graph.node(&lonely).map(|n| n.degree), Some(0));
	let set = HighlightSet::for_selection(&graph, Some(&lonely));
	assert_eq!(set.nodes().iter().collect::<Vec<_>>(), vec![&lonely]);
	assert!(set.edges().is_empty());
}

#[test]
fn saved_view_round_trips_exactly() {
	let views = ViewPersistence::new(MemoryStore::new());
	let filters = FilterState::default()
		.with_phase(Some("discovery".into()))
		.with_entity_type(Some(EntityType::Strategy))
		.with_search(Some("growth".into()));
	let visual = VisualConfig {
		zoom: 0.1 + 0.2,
		center_x: -1234.5678901234,
		center_y: 1e-7,
		clustering_enabled: true,
		cluster_by: ClusterBy::LayerType,
		node_style_preset: NodeStylePreset::ByStatus,
		link_style_preset: EdgeStylePreset::Uniform,
	};

	let id = block_on(views.save("Board pack", &filters, &visual)).expect("save");
	let loaded = block_on(views.load(&id)).expect("load");

	assert_eq!(loaded.filters, filters);
	assert_eq!(loaded.visual_config, visual);
	assert_eq!(
		serde_json::to_string(&loaded.visual_config).expect("serialize"),
		serde_json::to_string(&visual).expect("serialize"),
	);
	assert_eq!(
		serde_json::to_string(&loaded.filters).expect("serialize"),
		serde_json::to_string(&filters).expect("serialize"),
	);
}

#[test]
fn controller_applies_loaded_view_and_rebuilds() {
	let views = ViewPersistence::new(MemoryStore::new());
	let saved_filters = FilterState::default().with_entity_type(Some(EntityType::Defense));
	let visual = VisualConfig {
		zoom: 2.5,
		..VisualConfig::default()
	};
	let id = block_on(views.save("defenses", &saved_filters, &visual)).expect("save");

	let mut ctl = GraphController::new(&EngineConfig::default());
	ctl.set_records(execution_with_personas());
	assert_eq!(ctl.graph().node_count(), 6);

	let ticket = ctl.begin_load();
	let outcome = ctl.finish_load(ticket, block_on(views.load(&id)));
	assert_eq!(outcome, LoadOutcome::Applied);
	assert_eq!(ctl.filters(), &saved_filters);
	assert_eq!(ctl.visual().zoom, 2.5);
	assert_eq!(ctl.graph().node_count(), 2);
}

#[test]
fn failed_save_leaves_state_untouched() {
	let views = ViewPersistence::new(MemoryStore::new());
	views.store().set_failing(true);

	let mut ctl = GraphController::new(&EngineConfig::default());
	ctl.set_records(execution_with_personas());
	let before = (ctl.filters().clone(), ctl.visual().clone());

	let result = block_on(views.save("anything", ctl.filters(), ctl.visual()));
	ctl.finish_save("anything", &result);

	assert!(result.is_err());
	assert_eq!((ctl.filters().clone(), ctl.visual().clone()), before);
	assert!(matches!(ctl.notice(), Some(Notice::Error(_))));
}
