use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::{CLICK_SLOP, ForceGraphState};
use super::types::{Camera, PaintSettings};
use crate::graph::{EngineConfig, Graph, HighlightSet, NodeId, StyleResolver};

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

/// What a released press turned out to be.
enum Release {
	Node(NodeId),
	Background,
	Camera(Camera),
	Nothing,
}

/// Canvas view of a built graph: runs the layout, paints it with the style
/// presets and reports clicks and camera moves back to the owner.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] graph: Signal<Arc<Graph>>,
	#[prop(into)] highlight: Signal<HighlightSet>,
	#[prop(into)] selected: Signal<Option<NodeId>>,
	#[prop(into)] settings: Signal<PaintSettings>,
	#[prop(into)] camera: Signal<Camera>,
	#[prop(into)] on_node_click: Callback<NodeId>,
	#[prop(into)] on_background_click: Callback<()>,
	#[prop(into)] on_camera: Callback<Camera>,
	#[prop(optional)] config: EngineConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<ForceGraphState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let styles = Rc::new(StyleResolver::new(config.opacity, &config.size_table));
	let layout = config.layout;
	let (state_init, animate_init, resize_cb_init) = (state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			warn!("force graph: no window, canvas left blank");
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| canvas.parent_element().map(|p| p.client_width() as f64).unwrap_or(800.0)),
				height.unwrap_or_else(|| canvas.parent_element().map(|p| p.client_height() as f64).unwrap_or(600.0)),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = context_2d(&canvas) else {
			warn!("force graph: 2d context unavailable");
			return;
		};
		let mut initial = ForceGraphState::new(graph.get_untracked(), layout, w, h);
		initial.set_camera(camera.get_untracked());
		initial.set_highlight(highlight.get_untracked(), selected.get_untracked());
		*state_init.borrow_mut() = Some(initial);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner, styles) = (state_init.clone(), animate_init.clone(), styles.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if s.animation_running {
					s.tick(0.016);
				}
				render::render(s, &ctx, &styles, settings.get_untracked());
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_graph = state.clone();
	Effect::new(move |_| {
		let next = graph.get();
		if let Some(ref mut s) = *state_graph.borrow_mut() {
			if !Arc::ptr_eq(&s.graph, &next) {
				s.load_graph(next);
				s.set_highlight(highlight.get_untracked(), selected.get_untracked());
			}
		}
	});

	let state_hl = state.clone();
	Effect::new(move |_| {
		let (next, sel) = (highlight.get(), selected.get());
		if let Some(ref mut s) = *state_hl.borrow_mut() {
			s.set_highlight(next, sel);
		}
	});

	let state_cam = state.clone();
	Effect::new(move |_| {
		let next = camera.get();
		if let Some(ref mut s) = *state_cam.borrow_mut() {
			if !s.camera().approx_eq(&next) {
				s.set_camera(next);
			}
		}
	});

	let pointer = move |ev: &MouseEvent| -> Option<(f64, f64)> {
		let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
		let rect = canvas.get_bounding_client_rect();
		Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
	};

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(&ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			if let Some(idx) = s.node_at_position(x, y) {
				let (nx, ny) = s.positions[idx];
				s.drag.active = true;
				s.drag.moved = false;
				s.drag.node = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.drag.node_start_x = nx as f32;
				s.drag.node_start_y = ny as f32;
			} else {
				s.pan.active = true;
				s.pan.moved = false;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(&ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if s.drag.active {
				let (sx, sy) = (x - s.drag.start_x, y - s.drag.start_y);
				s.drag.moved |= sx.hypot(sy) > CLICK_SLOP;
				if let (Some(idx), true) = (s.drag.node, s.drag.moved) {
					let (nx, ny) = (
						s.drag.node_start_x + (sx / s.transform.k) as f32,
						s.drag.node_start_y + (sy / s.transform.k) as f32,
					);
					s.move_node(idx, nx, ny);
				}
			} else if s.pan.active {
				let (sx, sy) = (x - s.pan.start_x, y - s.pan.start_y);
				s.pan.moved |= sx.hypot(sy) > CLICK_SLOP;
				s.transform.x = s.pan.transform_start_x + sx;
				s.transform.y = s.pan.transform_start_y + sy;
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let release = match *state_mu.borrow_mut() {
			Some(ref mut s) => {
				let release = if s.drag.active && !s.drag.moved {
					s.drag.node.and_then(|idx| s.node_id(idx).cloned()).map_or(Release::Nothing, Release::Node)
				} else if s.pan.active && !s.pan.moved {
					Release::Background
				} else if s.pan.active {
					Release::Camera(s.camera())
				} else {
					Release::Nothing
				};
				s.drag.active = false;
				s.drag.node = None;
				s.pan.active = false;
				release
			}
			None => Release::Nothing,
		};
		// state borrow is released before notifying the owner
		match release {
			Release::Node(id) => on_node_click.run(id),
			Release::Background => on_background_click.run(()),
			Release::Camera(cam) => on_camera.run(cam),
			Release::Nothing => {}
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let moved = match *state_ml.borrow_mut() {
			Some(ref mut s) => {
				let moved = (s.pan.active && s.pan.moved).then(|| s.camera());
				s.drag.active = false;
				s.drag.node = None;
				s.pan.active = false;
				moved
			}
			None => None,
		};
		if let Some(cam) = moved {
			on_camera.run(cam);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(&*ev) else {
			return;
		};
		let zoomed = match *state_wh.borrow_mut() {
			Some(ref mut s) => {
				let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
				let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
				let ratio = new_k / s.transform.k;
				s.transform.x = x - (x - s.transform.x) * ratio;
				s.transform.y = y - (y - s.transform.y) * ratio;
				s.transform.k = new_k;
				Some(s.camera())
			}
			None => None,
		};
		if let Some(cam) = zoomed {
			on_camera.run(cam);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
