//! Single owner of the current graph, selection and view configuration.
//!
//! Every user control is a plain setter that replaces one piece of state.
//! The graph is rebuilt from scratch whenever its inputs change and reused
//! otherwise; selection and highlight are re-derived after each rebuild so
//! they never point at nodes from an older build.

use std::sync::Arc;

use log::{error, warn};
use serde_json::{Map, Value};

use super::builder::{ClusterBy, GraphBuilder};
use super::config::EngineConfig;
use super::error::ViewError;
use super::filter::FilterState;
use super::highlight::{HighlightSet, Selection};
use super::records::RecordSets;
use super::style::{EdgeStylePreset, NodeStylePreset, StyleResolver};
use super::types::{Graph, NodeId, NodeKind};
use super::view::{SavedView, ViewId, VisualConfig};

/// Short-lived message for the user, e.g. a failed save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
	/// Something worth mentioning, e.g. a completed save.
	Info(String),
	/// A user action failed; state was left as it was.
	Error(String),
}

/// What the detail panel shows for the selected node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDetail {
	/// Selected node.
	pub id: NodeId,
	/// Entity kind, for the panel heading.
	pub kind: NodeKind,
	/// Display name.
	pub label: String,
	/// Incident edge count.
	pub degree: u32,
	/// Source record fields, shown verbatim.
	pub payload: Map<String, Value>,
}

/// Handle for an in-flight view load. Only the most recent ticket may apply
/// its result, and only if no setter ran in the meantime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Result of [`GraphController::finish_load`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
	/// Filters and visual config were replaced by the loaded view.
	Applied,
	/// A newer load or a user change superseded this one.
	Stale,
	/// The store returned an error; nothing changed.
	Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct BuildKey {
	records_rev: u64,
	filters: FilterState,
	clustering: Option<ClusterBy>,
}

/// Owns records, filters, visual config, the built graph and the selection.
pub struct GraphController {
	builder: GraphBuilder,
	styles: StyleResolver,
	records: Arc<RecordSets>,
	records_rev: u64,
	filters: FilterState,
	visual: VisualConfig,
	graph: Arc<Graph>,
	built_for: Option<BuildKey>,
	selection: Selection,
	highlight: HighlightSet,
	seq: u64,
	notice: Option<Notice>,
}

impl GraphController {
	/// Empty controller; call [`GraphController::set_records`] to populate it.
	pub fn new(config: &EngineConfig) -> Self {
		Self {
			builder: GraphBuilder::new(config.size_table.clone()),
			styles: StyleResolver::new(config.opacity, &config.size_table),
			records: Arc::default(),
			records_rev: 0,
			filters: FilterState::default(),
			visual: VisualConfig::default(),
			graph: Arc::default(),
			built_for: None,
			selection: Selection::Idle,
			highlight: HighlightSet::default(),
			seq: 0,
			notice: None,
		}
	}

	// ---- accessors ----

	/// Graph for the current records and filters.
	pub fn graph(&self) -> &Arc<Graph> {
		&self.graph
	}

	/// Active filters.
	pub fn filters(&self) -> &FilterState {
		&self.filters
	}

	/// Camera, clustering and style presets.
	pub fn visual(&self) -> &VisualConfig {
		&self.visual
	}

	/// Current selection state.
	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	/// Highlight derived from the selection.
	pub fn highlight(&self) -> &HighlightSet {
		&self.highlight
	}

	/// Resolver built from the configured opacity and size table.
	pub fn styles(&self) -> &StyleResolver {
		&self.styles
	}

	/// Pending user-facing message, if any.
	pub fn notice(&self) -> Option<&Notice> {
		self.notice.as_ref()
	}

	/// Clear the pending message.
	pub fn dismiss_notice(&mut self) {
		self.notice = None;
	}

	/// Detail panel content for the selected node.
	pub fn selected_detail(&self) -> Option<NodeDetail> {
		let node = self.graph.node(self.selection.selected()?)?;
		Some(NodeDetail {
			id: node.id.clone(),
			kind: node.kind,
			label: node.label.clone(),
			degree: node.degree,
			payload: node.payload.clone(),
		})
	}

	// ---- inputs ----

	/// Replace the upstream records. Always rebuilds.
	pub fn set_records(&mut self, records: RecordSets) {
		self.records = Arc::new(records);
		self.records_rev += 1;
		self.rebuild();
	}

	/// Replace all filters and rebuild.
	pub fn set_filters(&mut self, filters: FilterState) {
		self.seq += 1;
		self.filters = filters;
		self.rebuild();
	}

	/// Switch node coloring. Does not rebuild.
	pub fn set_node_preset(&mut self, preset: NodeStylePreset) {
		self.seq += 1;
		self.visual.node_style_preset = preset;
	}

	/// Switch edge styling. Does not rebuild.
	pub fn set_link_preset(&mut self, preset: EdgeStylePreset) {
		self.seq += 1;
		self.visual.link_style_preset = preset;
	}

	/// Turn clustering on or off, or change its key. Rebuilds.
	pub fn set_clustering(&mut self, enabled: bool, cluster_by: ClusterBy) {
		self.seq += 1;
		self.visual.clustering_enabled = enabled;
		self.visual.cluster_by = cluster_by;
		self.rebuild();
	}

	/// Record the camera reported by the render driver. Camera moves do not
	/// invalidate in-flight loads.
	pub fn set_camera(&mut self, zoom: f64, center_x: f64, center_y: f64) {
		self.visual.zoom = zoom;
		self.visual.center_x = center_x;
		self.visual.center_y = center_y;
	}

	/// Handle a click on node `id`.
	pub fn click(&mut self, id: NodeId) {
		self.selection = self.selection.click(id);
		self.refresh_highlight();
	}

	/// Handle a click on empty canvas.
	pub fn deselect(&mut self) {
		self.selection = self.selection.deselect();
		self.refresh_highlight();
	}

	// ---- saved views ----

	/// Start a view load. Any earlier ticket becomes stale.
	pub fn begin_load(&mut self) -> LoadTicket {
		self.seq += 1;
		LoadTicket(self.seq)
	}

	/// Apply a finished load if it is still the latest request. A failed load
	/// leaves filters and visual config untouched.
	pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<SavedView, ViewError>) -> LoadOutcome {
		if ticket.0 != self.seq {
			warn!("discarding stale view load");
			return LoadOutcome::Stale;
		}
		match result {
			Ok(view) => {
				self.filters = view.filters;
				self.visual = view.visual_config;
				self.notice = Some(Notice::Info(format!("Loaded view \"{}\"", view.name)));
				self.rebuild();
				LoadOutcome::Applied
			}
			Err(err) => {
				self.notice = Some(Notice::Error(format!("Could not load view: {err}")));
				LoadOutcome::Failed
			}
		}
	}

	/// Report a finished save. State is never changed by a save.
	pub fn finish_save(&mut self, name: &str, result: &Result<ViewId, ViewError>) {
		self.notice = Some(match result {
			Ok(_) => Notice::Info(format!("Saved view \"{}\"", name.trim())),
			Err(err) => Notice::Error(format!("Could not save view: {err}")),
		});
	}

	// ---- internals ----

	fn rebuild(&mut self) {
		let key = BuildKey {
			records_rev: self.records_rev,
			filters: self.filters.clone(),
			clustering: self.visual.clustering(),
		};
		if self.built_for.as_ref() == Some(&key) {
			return;
		}

		let builder = self.builder.clone().with_clustering(key.clustering);
		match builder.build(&self.records, &self.filters) {
			Ok(graph) => {
				self.graph = Arc::new(graph);
				self.built_for = Some(key);
				self.selection = std::mem::take(&mut self.selection).retain_in(&self.graph);
				self.refresh_highlight();
			}
			Err(err) => {
				error!("graph rebuild failed: {err}");
				self.notice = Some(Notice::Error(format!("Graph could not be rebuilt: {err}")));
			}
		}
	}

	fn refresh_highlight(&mut self) {
		self.highlight = HighlightSet::for_selection(&self.graph, self.selection.selected());
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::graph::filter::EntityType;

	fn records() -> RecordSets {
		RecordSets::from_json(
			&json!({
				"executions": [{"id": "e1", "name": "Turnaround", "company": "Acme", "phase": "discovery"}],
				"personas": [{"id": "p1", "execution_id": "e1", "name": "Dana", "persona_type": "leader"}],
				"defense_patterns": [{"id": "d1", "execution_id": "e1", "name": "Lock-in", "severity": "high"}]
			})
			.to_string(),
		)
		.unwrap()
	}

	fn controller() -> GraphController {
		let mut ctl = GraphController::new(&EngineConfig::default());
		ctl.set_records(records());
		ctl
	}

	#[test]
	fn rebuild_is_memoized_on_inputs() {
		let mut ctl = controller();
		let before = Arc::clone(ctl.graph());
		ctl.set_filters(FilterState::default());
		assert!(Arc::ptr_eq(&before, ctl.graph()));

		ctl.set_node_preset(NodeStylePreset::ByStatus);
		assert!(Arc::ptr_eq(&before, ctl.graph()));

		ctl.set_records(records());
		assert!(!Arc::ptr_eq(&before, ctl.graph()));
	}

	#[test]
	fn filtering_out_the_selection_clears_highlight() {
		let mut ctl = controller();
		ctl.click("execution_e1".into());
		assert!(ctl.highlight().is_active());
		assert_eq!(ctl.selected_detail().map(|d| d.kind), Some(NodeKind::Execution));

		ctl.set_filters(FilterState::default().with_entity_type(Some(EntityType::Defense)));
		assert_eq!(ctl.selection(), &Selection::Idle);
		assert!(!ctl.highlight().is_active());
		assert!(ctl.selected_detail().is_none());
	}

	#[test]
	fn highlight_is_recomputed_against_new_build() {
		let mut ctl = controller();
		ctl.click("defense_d1".into());
		assert_eq!(ctl.highlight().nodes().len(), 2);

		ctl.set_filters(FilterState::default().with_entity_type(Some(EntityType::Defense)));
		assert_eq!(ctl.selection(), &Selection::NodeSelected("defense_d1".into()));
		assert_eq!(ctl.highlight().nodes().len(), 1);
		assert!(ctl.highlight().edges().is_empty());
	}

	#[test]
	fn stale_load_is_discarded() {
		let mut ctl = controller();
		let ticket = ctl.begin_load();
		let newer_filters = FilterState::default().with_phase(Some("discovery".into()));
		ctl.set_filters(newer_filters.clone());

		let view = SavedView {
			name: "old".into(),
			filters: FilterState::default().with_entity_type(Some(EntityType::Persona)),
			visual_config: VisualConfig::default(),
		};
		assert_eq!(ctl.finish_load(ticket, Ok(view)), LoadOutcome::Stale);
		assert_eq!(ctl.filters(), &newer_filters);
	}

	#[test]
	fn only_latest_load_applies() {
		let mut ctl = controller();
		let first = ctl.begin_load();
		let second = ctl.begin_load();
		let view = |entity| SavedView {
			name: "v".into(),
			filters: FilterState::default().with_entity_type(Some(entity)),
			visual_config: VisualConfig::default(),
		};
		assert_eq!(ctl.finish_load(second, Ok(view(EntityType::Persona))), LoadOutcome::Applied);
		assert_eq!(ctl.finish_load(first, Ok(view(EntityType::Defense))), LoadOutcome::Stale);
		assert_eq!(ctl.filters().entity_type, Some(EntityType::Persona));
		// the persona and the leader it names; the execution is filtered out
		assert_eq!(ctl.graph().node_count(), 2);
		assert_eq!(ctl.graph().edge_count(), 0);
	}

	#[test]
	fn failed_load_keeps_state_and_notifies() {
		let mut ctl = controller();
		let filters = FilterState::default().with_impact(Some("high".into()));
		ctl.set_filters(filters.clone());
		let ticket = ctl.begin_load();
		let outcome = ctl.finish_load(ticket, Err(ViewError::Store("offline".into())));
		assert_eq!(outcome, LoadOutcome::Failed);
		assert_eq!(ctl.filters(), &filters);
		assert!(matches!(ctl.notice(), Some(Notice::Error(_))));
	}

	#[test]
	fn failed_save_keeps_visual_config() {
		let mut ctl = controller();
		ctl.set_link_preset(EdgeStylePreset::Uniform);
		ctl.finish_save("v", &Err(ViewError::EmptyName));
		assert_eq!(ctl.visual().link_style_preset, EdgeStylePreset::Uniform);
		assert!(matches!(ctl.notice(), Some(Notice::Error(_))));
		ctl.dismiss_notice();
		assert!(ctl.notice().is_none());
	}

	#[test]
	fn clustering_toggle_rebuilds_with_clusters() {
		let mut ctl = controller();
		assert!(ctl.graph().nodes().iter().all(|n| n.cluster.is_none()));
		ctl.set_clustering(true, ClusterBy::Kind);
		assert_eq!(
			ctl.graph().node(&"persona_p1".into()).and_then(|n| n.cluster.clone()).as_deref(),
			Some("persona")
		);
	}
}
