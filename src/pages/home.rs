use std::collections::BTreeSet;
use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, warn};
use serde_json::Value;

use crate::components::force_graph::{Camera, ForceGraphCanvas, PaintSettings};
use crate::graph::{
	ClusterBy, EdgeStylePreset, EngineConfig, EntityType, FilterState, GraphController, LocalStorageStore, NodeId,
	NodeStylePreset, Notice, RecordKind, RecordSets, StoredView, ViewId, ViewPersistence, records,
};

const SAMPLE_RECORDS: &str = include_str!("../../assets/sample_records.json");

fn sample_records() -> RecordSets {
	RecordSets::from_json(SAMPLE_RECORDS).unwrap_or_else(|e| {
		error!("sample records are not valid JSON: {e}");
		RecordSets::default()
	})
}

/// Distinct non-blank values of any of `fields` across all record kinds.
fn distinct_values(sets: &RecordSets, fields: &[&str]) -> Vec<String> {
	let values: BTreeSet<String> = RecordKind::ALL
		.iter()
		.flat_map(|&kind| sets.get(kind))
		.flat_map(|r| fields.iter().filter_map(move |f| records::text(r, f)))
		.map(str::to_ascii_lowercase)
		.collect();
	values.into_iter().collect()
}

fn none_if_blank(value: String) -> Option<String> {
	(!value.trim().is_empty()).then_some(value)
}

/// Entity-type filter from a `<select>` key; unknown keys clear it.
fn with_entity_key(filters: FilterState, key: Option<String>) -> FilterState {
	filters.with_entity_type(key.as_deref().and_then(EntityType::from_key))
}

fn display_value(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

async fn refresh_views(persistence: &ViewPersistence<LocalStorageStore>, views: RwSignal<Vec<StoredView>>) {
	match persistence.list().await {
		Ok(list) => views.set(list),
		Err(e) => warn!("could not list saved views: {e}"),
	}
}

/// Plain `<select>` over `(key, label)` options with an "any" entry.
#[component]
fn FilterSelect(
	label: &'static str,
	options: Vec<(String, String)>,
	#[prop(into)] value: Signal<Option<String>>,
	#[prop(into)] on_pick: Callback<Option<String>>,
) -> impl IntoView {
	view! {
		<label class="control">
			<span>{label}</span>
			<select
				prop:value=move || value.get().unwrap_or_default()
				on:change=move |ev| on_pick.run(none_if_blank(event_target_value(&ev)))
			>
				<option value="">"Any"</option>
				{options
					.into_iter()
					.map(|(key, text)| view! { <option value=key>{text}</option> })
					.collect_view()}
			</select>
		</label>
	}
}

/// Filter, preset and clustering controls. Each control replaces one field.
#[component]
fn ControlPanel(ctl: RwSignal<GraphController>, records: Arc<RecordSets>) -> impl IntoView {
	let filters = Memo::new(move |_| ctl.with(|c| c.filters().clone()));
	let visual = Memo::new(move |_| ctl.with(|c| c.visual().clone()));
	let set_filters = move |f: fn(FilterState, Option<String>) -> FilterState, v: Option<String>| {
		let next = f(filters.get_untracked(), v);
		ctl.update(|c| c.set_filters(next));
	};
	let keyed = |values: Vec<String>| values.into_iter().map(|v| (v.clone(), v)).collect::<Vec<_>>();

	view! {
		<section class="panel controls">
			<h2>"Filters"</h2>
			<label class="control">
				<span>"Search"</span>
				<input
					type="search"
					placeholder="Name or title"
					prop:value=move || filters.get().search.unwrap_or_default()
					on:input=move |ev| set_filters(FilterState::with_search, none_if_blank(event_target_value(&ev)))
				/>
			</label>
			<FilterSelect
				label="Type"
				options=EntityType::ALL.iter().map(|t| (t.key().to_owned(), t.label().to_owned())).collect()
				value=Signal::derive(move || filters.get().entity_type.map(|t| t.key().to_owned()))
				on_pick={move |v: Option<String>| set_filters(with_entity_key, v)}
			/>
			<FilterSelect
				label="Phase"
				options=keyed(distinct_values(&records, &["phase"]))
				value=Signal::derive(move || filters.get().phase)
				on_pick={move |v: Option<String>| set_filters(FilterState::with_phase, v)}
			/>
			<FilterSelect
				label="Impact"
				options=keyed(distinct_values(&records, &["impact", "severity"]))
				value=Signal::derive(move || filters.get().impact)
				on_pick={move |v: Option<String>| set_filters(FilterState::with_impact, v)}
			/>
			<FilterSelect
				label="Layer"
				options=keyed(distinct_values(&records, &["layer_type"]))
				value=Signal::derive(move || filters.get().layer_type)
				on_pick={move |v: Option<String>| set_filters(FilterState::with_layer_type, v)}
			/>

			<h2>"Style"</h2>
			<label class="control">
				<span>"Nodes"</span>
				<select
					prop:value=move || visual.get().node_style_preset.key()
					on:change=move |ev| {
						if let Some(p) = NodeStylePreset::from_key(&event_target_value(&ev)) {
							ctl.update(|c| c.set_node_preset(p));
						}
					}
				>
					{NodeStylePreset::ALL
						.iter()
						.map(|p| view! { <option value=p.key()>{p.label()}</option> })
						.collect_view()}
				</select>
			</label>
			<label class="control">
				<span>"Links"</span>
				<select
					prop:value=move || visual.get().link_style_preset.key()
					on:change=move |ev| {
						if let Some(p) = EdgeStylePreset::from_key(&event_target_value(&ev)) {
							ctl.update(|c| c.set_link_preset(p));
						}
					}
				>
					{EdgeStylePreset::ALL
						.iter()
						.map(|p| view! { <option value=p.key()>{p.label()}</option> })
						.collect_view()}
				</select>
			</label>
			<label class="control inline">
				<input
					type="checkbox"
					prop:checked=move || visual.get().clustering_enabled
					on:change=move |ev| {
						let by = visual.get_untracked().cluster_by;
						ctl.update(|c| c.set_clustering(event_target_checked(&ev), by));
					}
				/>
				<span>"Cluster by"</span>
				<select
					prop:value=move || visual.get().cluster_by.key()
					on:change=move |ev| {
						if let Some(by) = ClusterBy::from_key(&event_target_value(&ev)) {
							let enabled = visual.get_untracked().clustering_enabled;
							ctl.update(|c| c.set_clustering(enabled, by));
						}
					}
				>
					{ClusterBy::ALL
						.iter()
						.map(|b| view! { <option value=b.key()>{b.label()}</option> })
						.collect_view()}
				</select>
			</label>
		</section>
	}
}

/// Save the current filters and visual config, or load a stored view.
#[component]
fn ViewControls(ctl: RwSignal<GraphController>, store: LocalStorageStore) -> impl IntoView {
	let view_name = RwSignal::new(String::new());
	let views = RwSignal::new(Vec::<StoredView>::new());

	let initial = store.clone();
	spawn_local(async move {
		refresh_views(&ViewPersistence::new(initial), views).await;
	});

	let save_store = store.clone();
	let save_view = move |_| {
		let name = view_name.get_untracked();
		let (filters, visual) = ctl.with_untracked(|c| (c.filters().clone(), c.visual().clone()));
		let persistence = ViewPersistence::new(save_store.clone());
		spawn_local(async move {
			let result = persistence.save(&name, &filters, &visual).await;
			ctl.update(|c| c.finish_save(&name, &result));
			if result.is_ok() {
				view_name.set(String::new());
				refresh_views(&persistence, views).await;
			}
		});
	};

	let load_view = move |ev: web_sys::Event| {
		let Some(id) = none_if_blank(event_target_value(&ev)) else {
			return;
		};
		let Some(ticket) = ctl.try_update(GraphController::begin_load) else {
			return;
		};
		let persistence = ViewPersistence::new(store.clone());
		spawn_local(async move {
			let result = persistence.load(&ViewId(id)).await;
			ctl.update(|c| {
				c.finish_load(ticket, result);
			});
		});
	};

	view! {
		<section class="panel views">
			<h2>"Saved views"</h2>
			<div class="control inline">
				<input
					type="text"
					placeholder="View name"
					prop:value=move || view_name.get()
					on:input=move |ev| view_name.set(event_target_value(&ev))
				/>
				<button on:click=save_view disabled=move || view_name.with(|n| n.trim().is_empty())>
					"Save"
				</button>
			</div>
			<select on:change=load_view prop:value="">
				<option value="">"Load a view"</option>
				{move || {
					views
						.get()
						.into_iter()
						.map(|v| view! { <option value=v.id.0.clone()>{v.view.name}</option> })
						.collect_view()
				}}
			</select>
		</section>
	}
}

#[component]
fn DetailPanel(ctl: RwSignal<GraphController>) -> impl IntoView {
	let detail = Memo::new(move |_| ctl.with(|c| c.selected_detail()));

	move || {
		detail.get().map(|d| {
			let rows = d
				.payload
				.iter()
				.filter(|(_, v)| !v.is_null())
				.map(|(k, v)| view! { <dt>{k.clone()}</dt><dd>{display_value(v)}</dd> })
				.collect_view();
			view! {
				<section class="panel detail">
					<h2>{d.label}</h2>
					<p class="subtitle">{format!("{} · {} connections", d.kind.label(), d.degree)}</p>
					<dl>{rows}</dl>
					<button on:click=move |_| ctl.update(GraphController::deselect)>"Close"</button>
				</section>
			}
		})
	}
}

#[component]
fn Legend(ctl: RwSignal<GraphController>) -> impl IntoView {
	let swatch = |label: String, css: String| {
		view! {
			<li>
				<span class="swatch" style=format!("background: {css}")></span>
				{label}
			</li>
		}
	};

	move || {
		let (node_preset, link_preset, stats) =
			ctl.with(|c| (c.visual().node_style_preset, c.visual().link_style_preset, c.graph().stats()));
		let counts = stats
			.nodes_by_kind
			.iter()
			.map(|(kind, n)| format!("{n} {}", kind.label()))
			.collect::<Vec<_>>()
			.join(" · ");
		view! {
			<section class="panel legend">
				<ul>
					{node_preset
						.legend()
						.into_iter()
						.map(|(label, color)| swatch(label.to_owned(), color.hex()))
						.collect_view()}
				</ul>
				<ul>
					{link_preset
						.legend()
						.into_iter()
						.map(|(label, color)| {
							let n = stats.edges_by_relation.get(label).copied().unwrap_or(0);
							swatch(format!("{label} ({n})"), color.hex())
						})
						.collect_view()}
				</ul>
				<p class="subtitle">{counts}</p>
			</section>
		}
	}
}

/// Knowledge-graph dashboard over the bundled sample records.
#[component]
pub fn Home() -> impl IntoView {
	let config = EngineConfig::default();
	let records = Arc::new(sample_records());
	let ctl = RwSignal::new(GraphController::new(&config));
	ctl.update(|c| c.set_records((*records).clone()));

	let graph = Signal::derive(move || ctl.with(|c| Arc::clone(c.graph())));
	let highlight = Memo::new(move |_| ctl.with(|c| c.highlight().clone()));
	let selected = Memo::new(move |_| ctl.with(|c| c.selection().selected().cloned()));
	let settings = Memo::new(move |_| ctl.with(|c| PaintSettings::from(c.visual())));
	let camera = Memo::new(move |_| ctl.with(|c| Camera::from(c.visual())));
	let notice = Memo::new(move |_| ctl.with(|c| c.notice().cloned()));

	let on_node_click = Callback::new(move |id: NodeId| ctl.update(|c| c.click(id)));
	let on_background_click = Callback::new(move |()| ctl.update(GraphController::deselect));
	let on_camera = Callback::new(move |cam: Camera| ctl.update(|c| c.set_camera(cam.zoom, cam.center_x, cam.center_y)));
	let store = LocalStorageStore::new(config.view_storage_key.clone());

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<ForceGraphCanvas
					graph=graph
					highlight=highlight
					selected=selected
					settings=settings
					camera=camera
					on_node_click=on_node_click
					on_background_click=on_background_click
					on_camera=on_camera
					config=config
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Knowledge Graph"</h1>
					<p class="subtitle">"Click a node to focus its neighborhood. Scroll to zoom. Drag background to pan."</p>
					{move || {
						notice
							.get()
							.map(|n| {
								let (class, text) = match n {
									Notice::Info(t) => ("notice info", t),
									Notice::Error(t) => ("notice error", t),
								};
								view! {
									<div class=class on:click=move |_| ctl.update(GraphController::dismiss_notice)>
										{text}
									</div>
								}
							})
					}}
				</div>
				<aside class="graph-sidebar">
					<ControlPanel ctl=ctl records=records />
					<ViewControls ctl=ctl store=store />
					<Legend ctl=ctl />
					<DetailPanel ctl=ctl />
				</aside>
			</div>
		</ErrorBoundary>
	}
}
