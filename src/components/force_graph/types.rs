use crate::graph::{EdgeStylePreset, NodeStylePreset, VisualConfig};

/// Preset choices the painter reads every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaintSettings {
	pub node_preset: NodeStylePreset,
	pub link_preset: EdgeStylePreset,
	pub clusters: bool,
}

impl From<&VisualConfig> for PaintSettings {
	fn from(v: &VisualConfig) -> Self {
		Self {
			node_preset: v.node_style_preset,
			link_preset: v.link_style_preset,
			clusters: v.clustering_enabled,
		}
	}
}

/// Zoom factor and the graph-space point shown at the canvas center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
	pub zoom: f64,
	pub center_x: f64,
	pub center_y: f64,
}

impl Camera {
	pub fn approx_eq(&self, other: &Camera) -> bool {
		(self.zoom - other.zoom).abs() < 1e-6
			&& (self.center_x - other.center_x).abs() < 1e-3
			&& (self.center_y - other.center_y).abs() < 1e-3
	}
}

impl From<&VisualConfig> for Camera {
	fn from(v: &VisualConfig) -> Self {
		Self {
			zoom: v.zoom,
			center_x: v.center_x,
			center_y: v.center_y,
		}
	}
}
