//! Engine configuration. Every field has a default, so a partial JSON
//! document only needs to name what it overrides.

use serde::{Deserialize, Serialize};

use super::scale::DegreeSizer;
use super::style::Opacity;

/// Force-directed layout parameters handed to the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	/// Repulsion between every node pair.
	pub force_charge: f32,
	/// Edge spring stiffness.
	pub force_spring: f32,
	/// Upper bound on any single force.
	pub force_max: f32,
	/// Velocity scale applied each tick.
	pub node_speed: f32,
	/// Per-tick velocity decay.
	pub damping_factor: f32,
	/// Node mass per size tier unit.
	pub mass_per_tier: f32,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
			mass_per_tier: 2.0,
		}
	}
}

/// Everything the engine reads at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Degree to size tier table.
	pub size_table: DegreeSizer,
	/// Alpha levels for neutral, dimmed and highlighted elements.
	pub opacity: Opacity,
	/// Simulation parameters.
	pub layout: LayoutConfig,
	/// localStorage key holding the browser's saved views.
	pub view_storage_key: String,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			size_table: DegreeSizer::default(),
			opacity: Opacity::default(),
			layout: LayoutConfig::default(),
			view_storage_key: "strategy-graph.saved-views".to_owned(),
		}
	}
}

impl EngineConfig {
	/// Parse a (possibly partial) JSON configuration document.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}
}
