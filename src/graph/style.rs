//! Style presets: pure mappings from nodes and edges to paint parameters.
//!
//! Every preset is total. Attribute values a preset does not know resolve to
//! [`NEUTRAL`], never to an error.

use serde::{Deserialize, Serialize};

use super::highlight::Emphasis;
use super::scale::DegreeSizer;
use super::types::{Edge, Node, NodeKind};

/// Opaque RGB color; opacity travels separately as `alpha`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
}

impl Color {
	/// Color from its channels.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b }
	}

	/// CSS color string for canvas fill/stroke styles.
	pub fn css(&self, alpha: f64) -> String {
		format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha.clamp(0.0, 1.0))
	}

	/// `#rrggbb`, for legend swatches.
	pub fn hex(&self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}

// d3 category10
/// Categorical palette (d3 category10).
pub const PALETTE: [Color; 10] = [
	Color::rgb(31, 119, 180),
	Color::rgb(255, 127, 14),
	Color::rgb(44, 160, 44),
	Color::rgb(214, 39, 40),
	Color::rgb(148, 103, 189),
	Color::rgb(140, 86, 75),
	Color::rgb(227, 119, 194),
	Color::rgb(127, 127, 127),
	Color::rgb(188, 189, 34),
	Color::rgb(23, 190, 207),
];

/// Fallback for values a preset does not know.
pub const NEUTRAL: Color = Color::rgb(127, 127, 127);
/// Stroke of every edge under the uniform preset.
pub const UNIFORM_EDGE: Color = Color::rgb(100, 180, 255);
/// Stroke of every edge under the intensity preset.
pub const INTENSITY_EDGE: Color = Color::rgb(255, 160, 80);

/// Fill for `kind` under the by-type preset.
pub fn kind_color(kind: NodeKind) -> Color {
	match kind {
		NodeKind::Execution => PALETTE[0],
		NodeKind::Company => PALETTE[1],
		NodeKind::Leader => PALETTE[2],
		NodeKind::Defense => PALETTE[3],
		NodeKind::Persona => PALETTE[4],
		NodeKind::LayerComponent => PALETTE[8],
		NodeKind::Strategy => PALETTE[9],
	}
}

// =============================================================================
// STATUS / IMPACT
// =============================================================================

/// Lifecycle status read from a node's `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
	/// Not started.
	Planned,
	/// In progress.
	Active,
	/// Done.
	Completed,
	/// Waiting on something.
	Blocked,
	/// No longer relevant.
	Archived,
}

impl Status {
	/// Every status, in legend order.
	pub const ALL: [Self; 5] = [Self::Planned, Self::Active, Self::Completed, Self::Blocked, Self::Archived];

	/// Case-insensitive; accepts common synonyms.
	pub fn parse(s: &str) -> Option<Self> {
		Some(match s.to_ascii_uppercase().replace(&['-', ' '][..], "_").as_str() {
			"PLANNED" | "PENDING" | "DRAFT" | "NOT_STARTED" => Self::Planned,
			"ACTIVE" | "IN_PROGRESS" | "RUNNING" => Self::Active,
			"COMPLETED" | "COMPLETE" | "DONE" | "APPROVED" => Self::Completed,
			"BLOCKED" | "FAILED" | "REJECTED" => Self::Blocked,
			"ARCHIVED" => Self::Archived,
			_ => return None,
		})
	}

	/// Legend label.
	pub fn label(self) -> &'static str {
		match self {
			Self::Planned => "Planned",
			Self::Active => "Active",
			Self::Completed => "Completed",
			Self::Blocked => "Blocked",
			Self::Archived => "Archived",
		}
	}

	/// Fill under the by-status preset.
	pub fn color(self) -> Color {
		match self {
			Self::Planned => Color::rgb(255, 193, 7),   // Amber
			Self::Active => Color::rgb(33, 150, 243),   // Blue
			Self::Completed => Color::rgb(76, 175, 80), // Green
			Self::Blocked => Color::rgb(244, 67, 54),   // Red
			Self::Archived => Color::rgb(121, 85, 72),  // Brown
		}
	}
}

/// Impact level read from `impact` or `severity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
	/// Low.
	Low,
	/// Medium.
	Medium,
	/// High.
	High,
	/// Critical.
	Critical,
}

impl Impact {
	/// Every level, lowest first.
	pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

	/// Case-insensitive.
	pub fn parse(s: &str) -> Option<Self> {
		Some(match s.to_ascii_uppercase().as_str() {
			"LOW" | "MINOR" => Self::Low,
			"MEDIUM" | "MODERATE" => Self::Medium,
			"HIGH" | "MAJOR" => Self::High,
			"CRITICAL" | "SEVERE" => Self::Critical,
			_ => return None,
		})
	}

	/// Legend label.
	pub fn label(self) -> &'static str {
		match self {
			Self::Low => "Low",
			Self::Medium => "Medium",
			Self::High => "High",
			Self::Critical => "Critical",
		}
	}

	/// Fill under the by-impact preset.
	pub fn color(self) -> Color {
		match self {
			Self::Low => Color::rgb(139, 195, 74),     // Light green
			Self::Medium => Color::rgb(255, 193, 7),   // Amber
			Self::High => Color::rgb(255, 87, 34),     // Deep orange
			Self::Critical => Color::rgb(183, 28, 28), // Dark red
		}
	}
}

/// Colors keyed to relation type; unknown relations fall back to neutral.
pub fn relation_color(relation: &str) -> Color {
	match relation {
		"has_persona" => PALETTE[4],
		"involves" => PALETTE[2],
		"represents" => PALETTE[1],
		"has_defense" => PALETTE[3],
		"generated_strategy" => PALETTE[9],
		"targets" => PALETTE[6],
		"data" => PALETTE[0],
		"control" => PALETTE[5],
		"event" => PALETTE[8],
		_ => NEUTRAL,
	}
}

fn relation_width(relation: &str) -> f64 {
	match relation {
		"involves" | "targets" => 2.0,
		"control" => 2.5,
		_ => 1.5,
	}
}

const RELATIONS: [&str; 9] = [
	"has_persona",
	"involves",
	"represents",
	"has_defense",
	"generated_strategy",
	"targets",
	"data",
	"control",
	"event",
];

// =============================================================================
// PRESETS
// =============================================================================

/// How nodes are colored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeStylePreset {
	/// Color by node kind.
	#[default]
	ByType,
	/// Color by `status`.
	ByStatus,
	/// Color by `impact` or `severity`.
	ByImpact,
}

impl NodeStylePreset {
	/// Every preset, in menu order.
	pub const ALL: [Self; 3] = [Self::ByType, Self::ByStatus, Self::ByImpact];

	/// Stable key used in saved views and `<option>` values.
	pub fn key(self) -> &'static str {
		match self {
			Self::ByType => "by-type",
			Self::ByStatus => "by-status",
			Self::ByImpact => "by-impact",
		}
	}

	/// Inverse of [`NodeStylePreset::key`].
	pub fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|p| p.key() == key)
	}

	/// Human-readable name for menus.
	pub fn label(self) -> &'static str {
		match self {
			Self::ByType => "Color by type",
			Self::ByStatus => "Color by status",
			Self::ByImpact => "Color by impact",
		}
	}

	/// (label, color) rows describing this preset.
	pub fn legend(self) -> Vec<(&'static str, Color)> {
		match self {
			Self::ByType => NodeKind::ALL.iter().map(|&k| (k.label(), kind_color(k))).collect(),
			Self::ByStatus => Status::ALL.iter().map(|&s| (s.label(), s.color())).collect(),
			Self::ByImpact => Impact::ALL.iter().map(|&i| (i.label(), i.color())).collect(),
		}
	}

	fn fill(self, node: &Node) -> Color {
		let keyed = match self {
			Self::ByType => None,
			Self::ByStatus => node.field("status").map(|s| Status::parse(s).map_or(NEUTRAL, Status::color)),
			Self::ByImpact => node
				.field("impact")
				.or_else(|| node.field("severity"))
				.map(|s| Impact::parse(s).map_or(NEUTRAL, Impact::color)),
		};
		keyed.unwrap_or_else(|| kind_color(node.kind))
	}
}

/// How edges are stroked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeStylePreset {
	/// Color and width by relation, with arrows.
	#[default]
	ByRelationship,
	/// One color and width; only alpha follows the highlight.
	Uniform,
	/// Width and alpha by combined endpoint size, with flowing dashes.
	ByIntensity,
}

impl EdgeStylePreset {
	/// Every preset, in menu order.
	pub const ALL: [Self; 3] = [Self::ByRelationship, Self::Uniform, Self::ByIntensity];

	/// Stable key used in saved views and `<option>` values.
	pub fn key(self) -> &'static str {
		match self {
			Self::ByRelationship => "by-relationship",
			Self::Uniform => "uniform",
			Self::ByIntensity => "by-intensity",
		}
	}

	/// Inverse of [`EdgeStylePreset::key`].
	pub fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|p| p.key() == key)
	}

	/// Human-readable name for menus.
	pub fn label(self) -> &'static str {
		match self {
			Self::ByRelationship => "Links by relationship",
			Self::Uniform => "Uniform links",
			Self::ByIntensity => "Links by intensity",
		}
	}

	/// (label, color) rows describing this preset.
	pub fn legend(self) -> Vec<(&'static str, Color)> {
		match self {
			Self::ByRelationship => RELATIONS.iter().map(|&r| (r, relation_color(r))).collect(),
			Self::Uniform => vec![("link", UNIFORM_EDGE)],
			Self::ByIntensity => vec![("intensity", INTENSITY_EDGE)],
		}
	}
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Paint parameters for one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
	/// Fill color.
	pub fill: Color,
	/// Fill opacity.
	pub alpha: f64,
}

/// Paint parameters for one edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
	/// Stroke color.
	pub stroke: Color,
	/// Line width in graph units.
	pub width: f64,
	/// Stroke opacity.
	pub alpha: f64,
	/// Draw an arrow head at the target end.
	pub arrow: bool,
	/// Animate dashes from source to target.
	pub flow: bool,
}

/// Background shading for one cluster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterStyle {
	/// Underlay color.
	pub fill: Color,
	/// Underlay opacity.
	pub alpha: f64,
}

/// Opacity levels shared by all presets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Opacity {
	/// Nodes and highlighted edges.
	pub full: f64,
	/// Edges while nothing is selected.
	pub edge: f64,
	/// Anything outside the selected neighborhood.
	pub dimmed: f64,
	/// Cluster underlays.
	pub cluster: f64,
}

impl Default for Opacity {
	fn default() -> Self {
		Self {
			full: 1.0,
			edge: 0.6,
			dimmed: 0.15,
			cluster: 0.12,
		}
	}
}

/// Resolves node, edge and cluster styles for the active presets.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleResolver {
	opacity: Opacity,
	min_pair_tier: u32,
	max_pair_tier: u32,
}

impl StyleResolver {
	/// Resolver for `opacity`; intensity is scaled to the tiers `sizer` can produce.
	pub fn new(opacity: Opacity, sizer: &DegreeSizer) -> Self {
		let min = sizer.min_tier();
		let max = sizer.steps().last().map_or(min, |s| s.tier);
		Self {
			opacity,
			min_pair_tier: 2 * min,
			max_pair_tier: 2 * max,
		}
	}

	/// Fill and alpha for `node` under `preset`.
	pub fn node_style(&self, node: &Node, preset: NodeStylePreset, emphasis: Emphasis) -> NodeStyle {
		NodeStyle {
			fill: preset.fill(node),
			alpha: match emphasis {
				Emphasis::Dimmed => self.opacity.dimmed,
				Emphasis::Neutral | Emphasis::Highlighted => self.opacity.full,
			},
		}
	}

	/// `pair_tier` is the sum of both endpoints' size tiers.
	pub fn edge_style(&self, edge: &Edge, pair_tier: u32, preset: EdgeStylePreset, emphasis: Emphasis) -> EdgeStyle {
		let mut style = match preset {
			EdgeStylePreset::ByRelationship => EdgeStyle {
				stroke: relation_color(&edge.relation),
				width: relation_width(&edge.relation),
				alpha: self.opacity.edge,
				arrow: true,
				flow: false,
			},
			EdgeStylePreset::Uniform => EdgeStyle {
				stroke: UNIFORM_EDGE,
				width: 1.5,
				alpha: self.opacity.edge,
				arrow: false,
				flow: false,
			},
			EdgeStylePreset::ByIntensity => {
				let t = self.intensity(pair_tier);
				EdgeStyle {
					stroke: INTENSITY_EDGE,
					width: 1.0 + 3.0 * t,
					alpha: 0.25 + 0.65 * t,
					arrow: true,
					flow: true,
				}
			}
		};
		// uniform edges keep one width; only their alpha follows the highlight
		let scales = preset != EdgeStylePreset::Uniform;
		match emphasis {
			Emphasis::Neutral => {}
			Emphasis::Highlighted => {
				style.alpha = (style.alpha + 0.3).min(self.opacity.full);
				if scales {
					style.width *= 1.3;
				}
			}
			Emphasis::Dimmed => {
				style.alpha = self.opacity.dimmed;
				if scales {
					style.width *= 0.7;
				}
			}
		}
		style
	}

	/// Normalized combined endpoint size in `0.0..=1.0`.
	fn intensity(&self, pair_tier: u32) -> f64 {
		let span = self.max_pair_tier.saturating_sub(self.min_pair_tier);
		if span == 0 {
			return 0.5;
		}
		let above = pair_tier.saturating_sub(self.min_pair_tier).min(span);
		above as f64 / span as f64
	}

	/// Underlay for `cluster`, independent of the node preset.
	pub fn cluster_style(&self, cluster: &str) -> ClusterStyle {
		ClusterStyle {
			fill: cluster_color(cluster),
			alpha: self.opacity.cluster,
		}
	}
}

/// Stable palette pick for a cluster key (FNV-1a).
pub fn cluster_color(cluster: &str) -> Color {
	let hash = cluster
		.bytes()
		.fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3));
	PALETTE[(hash % PALETTE.len() as u64) as usize]
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn node(kind: NodeKind, payload: serde_json::Value) -> Node {
		Node::new("n".into(), kind, "n", payload.as_object().cloned().unwrap_or_default())
	}

	fn resolver() -> StyleResolver {
		StyleResolver::new(Opacity::default(), &DegreeSizer::default())
	}

	#[test]
	fn by_type_colors_every_kind() {
		let r = resolver();
		for kind in NodeKind::ALL {
			let style = r.node_style(&node(kind, json!({})), NodeStylePreset::ByType, Emphasis::Neutral);
			assert_eq!(style.fill, kind_color(kind));
			assert_eq!(style.alpha, 1.0);
		}
	}

	#[test]
	fn status_preset_falls_back_to_type_then_neutral() {
		let r = resolver();
		let done = node(NodeKind::Strategy, json!({"status": "in-progress"}));
		let missing = node(NodeKind::Strategy, json!({}));
		let odd = node(NodeKind::Strategy, json!({"status": "on fire"}));
		assert_eq!(r.node_style(&done, NodeStylePreset::ByStatus, Emphasis::Neutral).fill, Status::Active.color());
		assert_eq!(r.node_style(&missing, NodeStylePreset::ByStatus, Emphasis::Neutral).fill, kind_color(NodeKind::Strategy));
		assert_eq!(r.node_style(&odd, NodeStylePreset::ByStatus, Emphasis::Neutral).fill, NEUTRAL);
	}

	#[test]
	fn impact_preset_reads_severity_too() {
		let r = resolver();
		let defense = node(NodeKind::Defense, json!({"severity": "Critical"}));
		assert_eq!(r.node_style(&defense, NodeStylePreset::ByImpact, Emphasis::Neutral).fill, Impact::Critical.color());
	}

	#[test]
	fn dimming_only_applies_to_excluded_elements() {
		let r = resolver();
		let n = node(NodeKind::Leader, json!({}));
		assert_eq!(r.node_style(&n, NodeStylePreset::ByType, Emphasis::Highlighted).alpha, 1.0);
		assert_eq!(r.node_style(&n, NodeStylePreset::ByType, Emphasis::Dimmed).alpha, 0.15);

		let e = Edge::new("a".into(), "b".into(), "involves");
		let neutral = r.edge_style(&e, 10, EdgeStylePreset::Uniform, Emphasis::Neutral);
		let dimmed = r.edge_style(&e, 10, EdgeStylePreset::Uniform, Emphasis::Dimmed);
		let lit = r.edge_style(&e, 10, EdgeStylePreset::Uniform, Emphasis::Highlighted);
		assert_eq!(neutral.stroke, dimmed.stroke);
		assert!(dimmed.alpha < neutral.alpha && neutral.alpha < lit.alpha);
	}

	#[test]
	fn uniform_edges_vary_only_in_alpha() {
		let r = resolver();
		let e = Edge::new("a".into(), "b".into(), "has_defense");
		let neutral = r.edge_style(&e, 10, EdgeStylePreset::Uniform, Emphasis::Neutral);
		for emphasis in [Emphasis::Highlighted, Emphasis::Dimmed] {
			let style = r.edge_style(&e, 10, EdgeStylePreset::Uniform, emphasis);
			assert_eq!(style.width, neutral.width);
			assert_eq!(style.stroke, neutral.stroke);
			assert_eq!((style.arrow, style.flow), (neutral.arrow, neutral.flow));
			assert_ne!(style.alpha, neutral.alpha);
		}

		let lit = r.edge_style(&e, 10, EdgeStylePreset::ByRelationship, Emphasis::Highlighted);
		let plain = r.edge_style(&e, 10, EdgeStylePreset::ByRelationship, Emphasis::Neutral);
		assert!(lit.width > plain.width);
	}

	#[test]
	fn unknown_relation_is_neutral() {
		let r = resolver();
		let e = Edge::new("a".into(), "b".into(), "mystery");
		assert_eq!(r.edge_style(&e, 8, EdgeStylePreset::ByRelationship, Emphasis::Neutral).stroke, NEUTRAL);
	}

	#[test]
	fn intensity_ignores_relation_and_grows_with_tiers() {
		let r = resolver();
		let a = Edge::new("a".into(), "b".into(), "data");
		let b = Edge::new("a".into(), "b".into(), "has_defense");
		let low = r.edge_style(&a, 8, EdgeStylePreset::ByIntensity, Emphasis::Neutral);
		let same = r.edge_style(&b, 8, EdgeStylePreset::ByIntensity, Emphasis::Neutral);
		let high = r.edge_style(&a, 18, EdgeStylePreset::ByIntensity, Emphasis::Neutral);
		assert_eq!(low, same);
		assert!(high.width > low.width && high.alpha > low.alpha);
		assert!(high.flow && !r.edge_style(&a, 8, EdgeStylePreset::Uniform, Emphasis::Neutral).arrow);
	}

	#[test]
	fn cluster_colors_are_stable() {
		assert_eq!(cluster_color("discovery"), cluster_color("discovery"));
		assert!(PALETTE.contains(&cluster_color("")));
		assert_eq!(resolver().cluster_style("x").alpha, 0.12);
	}

	#[test]
	fn presets_round_trip_through_keys() {
		for p in NodeStylePreset::ALL {
			assert_eq!(NodeStylePreset::from_key(p.key()), Some(p));
			assert_eq!(serde_json::to_value(p).unwrap(), json!(p.key()));
		}
		for p in EdgeStylePreset::ALL {
			assert_eq!(EdgeStylePreset::from_key(p.key()), Some(p));
			assert_eq!(serde_json::to_value(p).unwrap(), json!(p.key()));
		}
	}
}
