//! Saved views: named snapshots of filter state and visual configuration,
//! persisted through an external record store. No graph data is stored.

use std::cell::{Cell, RefCell};
use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use super::builder::ClusterBy;
use super::error::ViewError;
use super::filter::FilterState;
use super::style::{EdgeStylePreset, NodeStylePreset};

/// Camera, clustering and preset choices captured by a saved view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualConfig {
	/// Camera zoom factor.
	pub zoom: f64,
	/// Camera translation, x.
	pub center_x: f64,
	/// Camera translation, y.
	pub center_y: f64,
	/// Shade clusters behind nodes.
	pub clustering_enabled: bool,
	/// Attribute clusters are keyed on.
	pub cluster_by: ClusterBy,
	/// Node coloring.
	pub node_style_preset: NodeStylePreset,
	/// Edge styling.
	pub link_style_preset: EdgeStylePreset,
}

impl Default for VisualConfig {
	fn default() -> Self {
		Self {
			zoom: 1.0,
			center_x: 0.0,
			center_y: 0.0,
			clustering_enabled: false,
			cluster_by: ClusterBy::default(),
			node_style_preset: NodeStylePreset::default(),
			link_style_preset: EdgeStylePreset::default(),
		}
	}
}

impl VisualConfig {
	/// Cluster key the builder should use, if clustering is on.
	pub fn clustering(&self) -> Option<ClusterBy> {
		self.clustering_enabled.then_some(self.cluster_by)
	}
}

/// A named snapshot as written to the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedView {
	/// User-chosen name, trimmed and non-empty.
	pub name: String,
	/// Filters at save time.
	pub filters: FilterState,
	/// Visual config at save time.
	pub visual_config: VisualConfig,
}

/// Store-assigned identifier of a saved view.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(pub String);

impl fmt::Display for ViewId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A saved view as listed by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredView {
	/// Store-assigned id.
	pub id: ViewId,
	/// The snapshot.
	#[serde(flatten)]
	pub view: SavedView,
}

/// External record store. Only create and list are required.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
	/// Persist `view` and return its new id.
	async fn create(&self, view: &SavedView) -> Result<ViewId, ViewError>;
	/// Every stored view, oldest first.
	async fn list(&self) -> Result<Vec<StoredView>, ViewError>;
}

/// Shapes and validates saved-view payloads; all I/O goes to the store.
pub struct ViewPersistence<S> {
	store: S,
}

impl<S: RecordStore> ViewPersistence<S> {
	/// Wrap `store`.
	pub fn new(store: S) -> Self {
		Self { store }
	}

	/// The wrapped store.
	pub fn store(&self) -> &S {
		&self.store
	}

	/// Validate and store a snapshot of `filters` and `visual` under `name`.
	pub async fn save(&self, name: &str, filters: &FilterState, visual: &VisualConfig) -> Result<ViewId, ViewError> {
		let name = name.trim();
		if name.is_empty() {
			return Err(ViewError::EmptyName);
		}
		let view = SavedView {
			name: name.to_owned(),
			filters: filters.clone(),
			visual_config: visual.clone(),
		};
		let id = self.store.create(&view).await?;
		info!("saved view `{name}` as {id}");
		Ok(id)
	}

	/// Fetch a view's filters and visual config. Does not touch any graph.
	pub async fn load(&self, id: &ViewId) -> Result<SavedView, ViewError> {
		let view = self
			.store
			.list()
			.await?
			.into_iter()
			.find(|v| &v.id == id)
			.map(|v| v.view)
			.ok_or_else(|| ViewError::NotFound(id.0.clone()))?;
		info!("loaded view `{}` ({id})", view.name);
		Ok(view)
	}

	/// Every stored view, oldest first.
	pub async fn list(&self) -> Result<Vec<StoredView>, ViewError> {
		self.store.list().await
	}
}

/// In-process store keeping each view as its serialized JSON document.
#[derive(Debug, Default)]
pub struct MemoryStore {
	rows: RefCell<Vec<(ViewId, String)>>,
	next_id: Cell<u64>,
	fail: Cell<bool>,
}

impl MemoryStore {
	/// Empty, healthy store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Make every subsequent request fail, as an unreachable backend would.
	pub fn set_failing(&self, fail: bool) {
		self.fail.set(fail);
	}

	/// Raw stored documents, in insertion order.
	pub fn documents(&self) -> Vec<String> {
		self.rows.borrow().iter().map(|(_, doc)| doc.clone()).collect()
	}

	fn check(&self) -> Result<(), ViewError> {
		if self.fail.get() {
			return Err(ViewError::Store("record store unavailable".into()));
		}
		Ok(())
	}
}

impl RecordStore for MemoryStore {
	async fn create(&self, view: &SavedView) -> Result<ViewId, ViewError> {
		self.check()?;
		let n = self.next_id.get() + 1;
		self.next_id.set(n);
		let id = ViewId(format!("view-{n}"));
		self.rows.borrow_mut().push((id.clone(), serde_json::to_string(view)?));
		Ok(id)
	}

	async fn list(&self) -> Result<Vec<StoredView>, ViewError> {
		self.check()?;
		self.rows
			.borrow()
			.iter()
			.map(|(id, doc)| -> Result<StoredView, ViewError> {
				Ok(StoredView {
					id: id.clone(),
					view: serde_json::from_str(doc)?,
				})
			})
			.collect()
	}
}

/// Browser store backed by `window.localStorage`, holding all views as one
/// JSON array under a single key.
#[derive(Clone, Debug)]
pub struct LocalStorageStore {
	key: String,
}

impl LocalStorageStore {
	/// Store views under localStorage `key`.
	pub fn new(key: impl Into<String>) -> Self {
		Self { key: key.into() }
	}

	fn storage(&self) -> Result<web_sys::Storage, ViewError> {
		web_sys::window()
			.ok_or_else(|| ViewError::Store("no window".into()))?
			.local_storage()
			.map_err(|e| ViewError::Store(format!("{e:?}")))?
			.ok_or_else(|| ViewError::Store("localStorage unavailable".into()))
	}

	fn read(&self, storage: &web_sys::Storage) -> Result<Vec<StoredView>, ViewError> {
		let raw = storage
			.get_item(&self.key)
			.map_err(|e| ViewError::Store(format!("{e:?}")))?;
		match raw {
			Some(json) => Ok(serde_json::from_str(&json)?),
			None => Ok(Vec::new()),
		}
	}
}

/// `view-<ms>-<n>`, where `n` is the number of views already stored. Bumped
/// until unused, so saves within the same millisecond stay distinct.
fn fresh_view_id(now_ms: u64, existing: &[StoredView]) -> ViewId {
	let mut n = existing.len();
	loop {
		let id = ViewId(format!("view-{now_ms}-{n}"));
		if existing.iter().all(|v| v.id != id) {
			return id;
		}
		n += 1;
	}
}

impl RecordStore for LocalStorageStore {
	async fn create(&self, view: &SavedView) -> Result<ViewId, ViewError> {
		let storage = self.storage()?;
		let mut views = self.read(&storage)?;
		let id = fresh_view_id(js_sys::Date::now() as u64, &views);
		views.push(StoredView {
			id: id.clone(),
			view: view.clone(),
		});
		storage
			.set_item(&self.key, &serde_json::to_string(&views)?)
			.map_err(|e| ViewError::Store(format!("{e:?}")))?;
		Ok(id)
	}

	async fn list(&self) -> Result<Vec<StoredView>, ViewError> {
		let storage = self.storage()?;
		self.read(&storage)
	}
}

#[cfg(test)]
mod tests {
	use pollster::block_on;
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::graph::filter::EntityType;

	fn visual() -> VisualConfig {
		VisualConfig {
			zoom: 1.75,
			center_x: -120.5,
			center_y: 33.25,
			clustering_enabled: true,
			cluster_by: ClusterBy::Phase,
			node_style_preset: NodeStylePreset::ByImpact,
			link_style_preset: EdgeStylePreset::ByIntensity,
		}
	}

	#[test]
	fn same_millisecond_saves_get_distinct_ids() {
		let saved = SavedView {
			name: "a".into(),
			filters: FilterState::default(),
			visual_config: visual(),
		};
		let mut stored = Vec::new();
		for _ in 0..3 {
			let id = fresh_view_id(1_700_000_000_000, &stored);
			assert!(stored.iter().all(|v: &StoredView| v.id != id));
			stored.push(StoredView { id, view: saved.clone() });
		}
		assert_eq!(stored[2].id, ViewId("view-1700000000000-2".into()));

		// an id taken out of sequence is skipped
		let clash = vec![StoredView {
			id: ViewId("view-5-1".into()),
			view: saved.clone(),
		}];
		assert_eq!(fresh_view_id(5, &clash), ViewId("view-5-2".into()));
	}

	#[test]
	fn blank_names_are_rejected_before_the_store() {
		let views = ViewPersistence::new(MemoryStore::new());
		let err = block_on(views.save("   ", &FilterState::default(), &visual())).unwrap_err();
		assert_eq!(err, ViewError::EmptyName);
		assert!(views.store().documents().is_empty());
	}

	#[test]
	fn save_then_load_restores_config() {
		let views = ViewPersistence::new(MemoryStore::new());
		let filters = FilterState::default()
			.with_entity_type(Some(EntityType::Strategy))
			.with_phase(Some("discovery".into()));
		let id = block_on(views.save(" Q3 board ", &filters, &visual())).unwrap();

		let loaded = block_on(views.load(&id)).unwrap();
		assert_eq!(loaded.name, "Q3 board");
		assert_eq!(loaded.filters, filters);
		assert_eq!(loaded.visual_config, visual());
	}

	#[test]
	fn saved_view_uses_camel_case_keys() {
		let views = ViewPersistence::new(MemoryStore::new());
		block_on(views.save("v", &FilterState::default(), &visual())).unwrap();
		let doc: serde_json::Value = serde_json::from_str(&views.store().documents()[0]).unwrap();
		assert_eq!(doc["visualConfig"]["centerX"], -120.5);
		assert_eq!(doc["visualConfig"]["clusterBy"], "phase");
		assert_eq!(doc["visualConfig"]["linkStylePreset"], "by-intensity");
	}

	#[test]
	fn missing_view_is_not_found() {
		let views = ViewPersistence::new(MemoryStore::new());
		let err = block_on(views.load(&ViewId("nope".into()))).unwrap_err();
		assert_eq!(err, ViewError::NotFound("nope".into()));
	}

	#[test]
	fn store_failures_surface_as_errors() {
		let views = ViewPersistence::new(MemoryStore::new());
		views.store().set_failing(true);
		assert!(matches!(
			block_on(views.save("v", &FilterState::default(), &visual())),
			Err(ViewError::Store(_))
		));
		assert!(matches!(block_on(views.list()), Err(ViewError::Store(_))));
	}

	#[test]
	fn list_returns_views_in_save_order() {
		let views = ViewPersistence::new(MemoryStore::new());
		block_on(views.save("first", &FilterState::default(), &visual())).unwrap();
		block_on(views.save("second", &FilterState::default(), &VisualConfig::default())).unwrap();
		let names: Vec<_> = block_on(views.list()).unwrap().into_iter().map(|v| v.view.name).collect();
		assert_eq!(names, vec!["first", "second"]);
	}
}
