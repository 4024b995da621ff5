use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::ForceGraphState;
use super::types::PaintSettings;
use crate::graph::{EdgeId, EdgeStyle, Emphasis, NodeStyle, StyleResolver};

/// Zoom level past which every node gets a label.
const LABEL_ZOOM: f64 = 1.6;
/// Size tier from which a node is labelled at any zoom.
const LABEL_TIER: u32 = 7;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
	a + (b - a) * t
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, styles: &StyleResolver, settings: PaintSettings) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	if settings.clusters {
		draw_clusters(state, ctx, styles);
	}
	draw_edges(state, ctx, styles, settings);
	draw_nodes(state, ctx, styles, settings);
	ctx.restore();
}

fn draw_clusters(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, styles: &StyleResolver) {
	for group in &state.clusters {
		let n = group.members.len() as f64;
		let (sx, sy) = group.members.iter().fold((0.0, 0.0), |(ax, ay), &i| {
			let (x, y) = state.positions[i];
			(ax + x, ay + y)
		});
		let (cx, cy) = (sx / n, sy / n);
		let reach = group
			.members
			.iter()
			.map(|&i| {
				let (x, y) = state.positions[i];
				((x - cx).powi(2) + (y - cy).powi(2)).sqrt() + state.radius_of(i)
			})
			.fold(0.0, f64::max);

		let style = styles.cluster_style(&group.key);
		ctx.begin_path();
		let _ = ctx.arc(cx, cy, reach + 12.0, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&style.fill.css(style.alpha));
		ctx.fill();
	}
}

/// Edge style blended from neutral toward its emphasis by eased `t`.
fn blended_edge(resting: EdgeStyle, target: EdgeStyle, t: f64) -> EdgeStyle {
	EdgeStyle {
		alpha: lerp(resting.alpha, target.alpha, t),
		width: lerp(resting.width, target.width, t),
		..target
	}
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, styles: &StyleResolver, settings: PaintSettings) {
	let k = state.transform.k;
	let (dash, gap, arrow_size) = (8.0 / k, 4.0 / k, 8.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.highlight.t);
	let highlight = state.highlight.effective();

	for (i, edge) in state.graph.edges().iter().enumerate() {
		let Some(&(s, d)) = state.endpoints.get(i) else {
			continue;
		};
		let ((x1, y1), (x2, y2)) = (state.positions[s], state.positions[d]);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		let pair_tier = state.pair_tiers[i];
		let resting = styles.edge_style(edge, pair_tier, settings.link_preset, Emphasis::Neutral);
		let style = match highlight.edge_emphasis(EdgeId(i)) {
			Emphasis::Neutral => resting,
			emphasis => blended_edge(resting, styles.edge_style(edge, pair_tier, settings.link_preset, emphasis), t),
		};

		let (r1, r2) = (state.radius_of(s), state.radius_of(d));
		let head = if style.arrow { arrow_size } else { 0.0 };
		let (ux, uy) = (dx / dist, dy / dist);

		ctx.set_stroke_style_str(&style.stroke.css(style.alpha));
		ctx.set_line_width(style.width / k);
		if style.flow {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(&JsValue::from_f64(dash), &JsValue::from_f64(gap)));
			ctx.set_line_dash_offset(dash_offset);
		}
		ctx.begin_path();
		ctx.move_to(x1 + ux * r1, y1 + uy * r1);
		ctx.line_to(x2 - ux * (r2 + head), y2 - uy * (r2 + head));
		ctx.stroke();
		if style.flow {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		if !style.arrow {
			continue;
		}
		ctx.set_fill_style_str(&style.stroke.css((style.alpha + 0.2).min(1.0)));
		let (tip_x, tip_y) = (x2 - ux * r2, y2 - uy * r2);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	// labels only under emphasis, drawn after all strokes
	if !highlight.is_active() || t < 0.05 {
		return;
	}
	ctx.set_font(&format!("{}px sans-serif", 9.0 / k.max(0.5)));
	for &id in highlight.edges() {
		let (Some(edge), Some(&(s, d))) = (state.graph.edge(id), state.endpoints.get(id.0)) else {
			continue;
		};
		if s == d {
			continue;
		}
		let ((x1, y1), (x2, y2)) = (state.positions[s], state.positions[d]);
		ctx.set_fill_style_str(&format!("rgba(220, 230, 255, {})", 0.8 * t));
		let _ = ctx.fill_text(&edge.relation, (x1 + x2) / 2.0 + 3.0, (y1 + y2) / 2.0 - 3.0);
	}
}

fn draw_node(ctx: &CanvasRenderingContext2d, x: f64, y: f64, radius: f64, style: NodeStyle) {
	ctx.set_global_alpha(style.alpha);
	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&style.fill.css(1.0));
	ctx.fill();
	ctx.set_global_alpha(1.0);
}

fn draw_label(ctx: &CanvasRenderingContext2d, label: &str, x: f64, y: f64, radius: f64, k: f64, alpha: f64) {
	ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha));
	ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
	let _ = ctx.fill_text(label, x + radius + 3.0, y + 3.0);
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, styles: &StyleResolver, settings: PaintSettings) {
	let (t, k) = (ease_out_cubic(state.highlight.t), state.transform.k);
	let highlight = state.highlight.effective();
	let active = highlight.is_active();
	let selected = state.highlight.selected.as_ref();

	// pass 1: everything outside the highlight, fading toward dimmed
	for (i, node) in state.graph.nodes().iter().enumerate() {
		if active && highlight.contains_node(&node.id) {
			continue;
		}
		let (x, y) = state.positions[i];
		let resting = styles.node_style(node, settings.node_preset, Emphasis::Neutral);
		let style = if active {
			let dimmed = styles.node_style(node, settings.node_preset, Emphasis::Dimmed);
			NodeStyle {
				alpha: lerp(resting.alpha, dimmed.alpha, t),
				..resting
			}
		} else {
			resting
		};
		let shrink = if active { 0.15 * t } else { 0.0 };
		let radius = state.radius_of(i) * (1.0 - shrink);
		draw_node(ctx, x, y, radius, style);

		if node.size_tier >= LABEL_TIER || k >= LABEL_ZOOM {
			draw_label(ctx, &node.label, x, y, radius, k, style.alpha * 0.8);
		}
	}

	if !active {
		return;
	}

	// pass 2: the selected node and its neighbors on top
	for (i, node) in state.graph.nodes().iter().enumerate() {
		if !highlight.contains_node(&node.id) {
			continue;
		}
		let (x, y) = state.positions[i];
		let base = state.radius_of(i);
		let is_selected = selected == Some(&node.id);
		let (radius, glow_radius) = if is_selected {
			(base * (1.0 + 0.35 * t), base * (1.8 + 1.2 * t))
		} else {
			(base * (1.0 + 0.2 * t), base * (1.4 + 0.6 * t))
		};

		if t > 0.01 {
			let alpha = if is_selected { 0.35 * t } else { 0.2 * t };
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius) {
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", alpha));
				let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		let style = styles.node_style(node, settings.node_preset, Emphasis::Highlighted);
		draw_node(ctx, x, y, radius, style);

		if is_selected && t > 0.01 {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * t));
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}
		draw_label(ctx, &node.label, x, y, radius, k, 1.0);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::Color;

	#[test]
	fn easing_is_anchored() {
		assert_eq!(ease_out_cubic(0.0), 0.0);
		assert_eq!(ease_out_cubic(1.0), 1.0);
		assert!(ease_out_cubic(0.5) > 0.5);
	}

	#[test]
	fn blend_keeps_target_shape() {
		let resting = EdgeStyle {
			stroke: Color::rgb(1, 2, 3),
			width: 1.0,
			alpha: 0.6,
			arrow: true,
			flow: false,
		};
		let target = EdgeStyle {
			width: 2.0,
			alpha: 0.15,
			..resting
		};
		let mid = blended_edge(resting, target, 0.5);
		assert!((mid.width - 1.5).abs() < 1e-9);
		assert!((mid.alpha - 0.375).abs() < 1e-9);
		assert_eq!(mid.stroke, resting.stroke);
	}
}
