use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::types::Camera;
use crate::graph::{Graph, HighlightSet, LayoutConfig, NodeId};

pub const HIT_RADIUS: f64 = 12.0;
/// Screen pixels a press may travel and still count as a click.
pub const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node: Option<usize>,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Eased transition between "nothing selected" and the current highlight.
/// `fading` keeps the last active set alive while dimming fades out.
#[derive(Clone, Debug, Default)]
pub struct HighlightAnim {
	pub current: HighlightSet,
	pub fading: HighlightSet,
	pub selected: Option<NodeId>,
	pub t: f64,
	delay_t: f64,
}

impl HighlightAnim {
	/// The set the painter should use this frame.
	pub fn effective(&self) -> &HighlightSet {
		if self.current.is_active() {
			&self.current
		} else {
			&self.fading
		}
	}
}

/// Nodes sharing a cluster key, for the background underlay.
#[derive(Clone, Debug)]
pub struct ClusterGroup {
	pub key: String,
	pub members: Vec<usize>,
}

/// Layout simulation plus the per-build lookup tables the painter needs.
/// Rebuilt wholesale whenever a new graph arrives; positions survive for
/// nodes whose ids are still present.
pub struct ForceGraphState {
	pub sim: ForceGraph<usize, ()>,
	pub graph: Arc<Graph>,
	/// Latest simulated position per node, indexed like `graph.nodes()`.
	pub positions: Vec<(f64, f64)>,
	/// Node indices of each edge's endpoints, indexed like `graph.edges()`.
	pub endpoints: Vec<(usize, usize)>,
	/// Sum of both endpoints' size tiers per edge.
	pub pair_tiers: Vec<u32>,
	pub clusters: Vec<ClusterGroup>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub highlight: HighlightAnim,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
	layout: LayoutConfig,
}

impl ForceGraphState {
	pub fn new(graph: Arc<Graph>, layout: LayoutConfig, width: f64, height: f64) -> Self {
		let mut state = Self {
			sim: ForceGraph::new(simulation_parameters(&layout)),
			graph: Arc::default(),
			positions: Vec::new(),
			endpoints: Vec::new(),
			pair_tiers: Vec::new(),
			clusters: Vec::new(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			highlight: HighlightAnim::default(),
			width,
			height,
			animation_running: true,
			flow_time: 0.0,
			layout,
		};
		state.load_graph(graph);
		state
	}

	/// Swap in a freshly built graph. Stale highlight state is dropped.
	pub fn load_graph(&mut self, graph: Arc<Graph>) {
		let previous: HashMap<&NodeId, (f64, f64)> = self
			.graph
			.nodes()
			.iter()
			.zip(&self.positions)
			.map(|(n, &p)| (&n.id, p))
			.collect();

		let mut sim = ForceGraph::new(simulation_parameters(&self.layout));
		let mut sim_idx: Vec<DefaultNodeIdx> = Vec::with_capacity(graph.node_count());
		let mut positions = Vec::with_capacity(graph.node_count());
		let count = graph.node_count().max(1) as f64;

		for (i, node) in graph.nodes().iter().enumerate() {
			let (x, y) = previous.get(&node.id).copied().unwrap_or_else(|| {
				let angle = (i as f64) * 2.0 * PI / count;
				(100.0 * angle.cos(), 100.0 * angle.sin())
			});
			positions.push((x, y));
			sim_idx.push(sim.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: 10.0 + self.layout.mass_per_tier * node.size_tier as f32,
				is_anchor: false,
				user_data: i,
			}));
		}

		let mut endpoints = Vec::with_capacity(graph.edge_count());
		let mut pair_tiers = Vec::with_capacity(graph.edge_count());
		for edge in graph.edges() {
			// endpoints are guaranteed by the builder
			let (Some(s), Some(t)) = (graph.node_index(&edge.source), graph.node_index(&edge.target)) else {
				continue;
			};
			endpoints.push((s, t));
			pair_tiers.push(graph.nodes()[s].size_tier + graph.nodes()[t].size_tier);
			if s != t {
				sim.add_edge(sim_idx[s], sim_idx[t], EdgeData::default());
			}
		}

		let mut groups: Vec<ClusterGroup> = Vec::new();
		for (i, node) in graph.nodes().iter().enumerate() {
			let Some(key) = &node.cluster else {
				continue;
			};
			match groups.iter_mut().find(|g| &g.key == key) {
				Some(group) => group.members.push(i),
				None => groups.push(ClusterGroup {
					key: key.clone(),
					members: vec![i],
				}),
			}
		}

		self.sim = sim;
		self.positions = positions;
		self.endpoints = endpoints;
		self.pair_tiers = pair_tiers;
		self.clusters = groups;
		self.graph = graph;
		self.drag = DragState::default();
		self.highlight = HighlightAnim::default();
	}

	/// Retarget the highlight. The selected node keeps its ring while a
	/// deselection fades out.
	pub fn set_highlight(&mut self, next: HighlightSet, selected: Option<NodeId>) {
		let was_active = self.highlight.current.is_active();
		if was_active && !next.is_active() {
			self.highlight.fading = std::mem::take(&mut self.highlight.current);
		} else {
			self.highlight.selected = selected;
			self.highlight.fading = HighlightSet::default();
			if !was_active {
				self.highlight.delay_t = 0.0;
			}
		}
		self.highlight.current = next;
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn radius_of(&self, idx: usize) -> f64 {
		self.graph.nodes()[idx].size_tier as f64
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		// last match wins: later nodes paint on top
		self.positions
			.iter()
			.enumerate()
			.filter(|&(i, &(x, y))| {
				let (dx, dy) = (x - gx, y - gy);
				(dx * dx + dy * dy).sqrt() < HIT_RADIUS.max(self.radius_of(i) + 2.0)
			})
			.map(|(i, _)| i)
			.last()
	}

	pub fn node_id(&self, idx: usize) -> Option<&NodeId> {
		self.graph.nodes().get(idx).map(|n| &n.id)
	}

	pub fn move_node(&mut self, idx: usize, x: f32, y: f32) {
		self.sim.visit_nodes_mut(|node| {
			if node.data.user_data == idx {
				node.data.x = x;
				node.data.y = y;
				node.data.is_anchor = true;
			}
		});
		if let Some(p) = self.positions.get_mut(idx) {
			*p = (x as f64, y as f64);
		}
	}

	pub fn camera(&self) -> Camera {
		let (center_x, center_y) = self.screen_to_graph(self.width / 2.0, self.height / 2.0);
		Camera {
			zoom: self.transform.k,
			center_x,
			center_y,
		}
	}

	pub fn set_camera(&mut self, camera: Camera) {
		let k = camera.zoom.clamp(0.1, 10.0);
		self.transform.k = k;
		self.transform.x = self.width / 2.0 - camera.center_x * k;
		self.transform.y = self.height / 2.0 - camera.center_y * k;
	}

	pub fn tick(&mut self, dt: f32) {
		self.sim.update(dt);
		self.flow_time += dt as f64;

		let positions = &mut self.positions;
		self.sim.visit_nodes(|node| {
			if let Some(p) = positions.get_mut(node.data.user_data) {
				*p = (node.x() as f64, node.y() as f64);
			}
		});

		let anim = &mut self.highlight;
		let dt = dt as f64;
		if anim.current.is_active() {
			let (delay, speed) = (0.08, 1.8);
			anim.delay_t = (anim.delay_t + dt).min(delay);
			if anim.delay_t >= delay {
				anim.t += (1.0 - anim.t) * speed * dt;
			}
		} else {
			anim.t += (0.0 - anim.t) * 1.26 * dt;
			if anim.t < 0.01 {
				anim.t = 0.0;
				anim.fading = HighlightSet::default();
				anim.selected = None;
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

fn simulation_parameters(layout: &LayoutConfig) -> SimulationParameters {
	SimulationParameters {
		force_charge: layout.force_charge,
		force_spring: layout.force_spring,
		force_max: layout.force_max,
		node_speed: layout.node_speed,
		damping_factor: layout.damping_factor,
	}
}
