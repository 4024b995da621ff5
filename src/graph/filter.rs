//! Filter state for the graph view. All active filters are combined with
//! logical AND; a filter only constrains record kinds that carry the
//! attribute it names.

use serde::{Deserialize, Serialize};

use super::records::{Record, RecordKind, text};

/// Entity-type filter values offered by the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
	/// Strategy executions only.
	Execution,
	/// Personas only.
	Persona,
	/// Defense patterns only.
	Defense,
	/// Generated strategies only.
	Strategy,
	/// Architecture layers and the interfaces between them.
	Layer,
}

impl EntityType {
	/// Every choice, in menu order.
	pub const ALL: [Self; 5] = [
		Self::Execution,
		Self::Persona,
		Self::Defense,
		Self::Strategy,
		Self::Layer,
	];

	/// Human-readable name for menus.
	pub fn label(self) -> &'static str {
		match self {
			Self::Execution => "Executions",
			Self::Persona => "Personas",
			Self::Defense => "Defense Patterns",
			Self::Strategy => "Strategies",
			Self::Layer => "Architecture",
		}
	}

	/// Stable key used in saved views and `<option>` values.
	pub fn key(self) -> &'static str {
		match self {
			Self::Execution => "execution",
			Self::Persona => "persona",
			Self::Defense => "defense",
			Self::Strategy => "strategy",
			Self::Layer => "layer",
		}
	}

	/// Inverse of [`EntityType::key`].
	pub fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|t| t.key() == key)
	}

	fn includes(self, kind: RecordKind) -> bool {
		matches!(
			(self, kind),
			(Self::Execution, RecordKind::Execution)
				| (Self::Persona, RecordKind::Persona)
				| (Self::Defense, RecordKind::DefensePattern)
				| (Self::Strategy, RecordKind::Strategy)
				| (Self::Layer, RecordKind::ArchitectureLayer | RecordKind::Interface)
		)
	}
}

/// Immutable set of named filter values. Setters return a new value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
	/// Exact (case-insensitive) phase match.
	pub phase: Option<String>,
	/// Restrict the graph to one entity type.
	pub entity_type: Option<EntityType>,
	/// Exact (case-insensitive) impact or severity match.
	pub impact: Option<String>,
	/// Exact (case-insensitive) layer type match.
	pub layer_type: Option<String>,
	/// Case-insensitive substring of the name or title.
	pub search: Option<String>,
}

impl FilterState {
	/// Blank values clear the filter.
	pub fn with_phase(self, phase: Option<String>) -> Self {
		Self {
			phase: normalize(phase),
			..self
		}
	}

	/// `None` admits every entity type.
	pub fn with_entity_type(self, entity_type: Option<EntityType>) -> Self {
		Self { entity_type, ..self }
	}

	/// Blank values clear the filter.
	pub fn with_impact(self, impact: Option<String>) -> Self {
		Self {
			impact: normalize(impact),
			..self
		}
	}

	/// Blank values clear the filter.
	pub fn with_layer_type(self, layer_type: Option<String>) -> Self {
		Self {
			layer_type: normalize(layer_type),
			..self
		}
	}

	/// Blank values clear the filter.
	pub fn with_search(self, search: Option<String>) -> Self {
		Self {
			search: normalize(search),
			..self
		}
	}

	/// Whether `record` of `kind` survives every active filter.
	pub fn admits(&self, kind: RecordKind, record: &Record) -> bool {
		if let Some(entity_type) = self.entity_type {
			if !entity_type.includes(kind) {
				return false;
			}
		}
		matches_field(self.phase.as_deref(), phase_field(kind), record)
			&& matches_field(self.impact.as_deref(), impact_field(kind), record)
			&& matches_field(self.layer_type.as_deref(), layer_type_field(kind), record)
			&& matches_search(self.search.as_deref(), name_field(kind), record)
	}
}

fn normalize(value: Option<String>) -> Option<String> {
	value
		.map(|v| v.trim().to_owned())
		.filter(|v| !v.is_empty())
}

fn matches_field(wanted: Option<&str>, field: Option<&str>, record: &Record) -> bool {
	match (wanted, field) {
		(Some(wanted), Some(field)) => text(record, field).is_some_and(|v| v.eq_ignore_ascii_case(wanted)),
		_ => true,
	}
}

fn matches_search(needle: Option<&str>, field: Option<&str>, record: &Record) -> bool {
	match (needle, field) {
		(Some(needle), Some(field)) => text(record, field)
			.is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase())),
		_ => true,
	}
}

fn phase_field(kind: RecordKind) -> Option<&'static str> {
	match kind {
		RecordKind::Execution | RecordKind::Strategy => Some("phase"),
		_ => None,
	}
}

fn impact_field(kind: RecordKind) -> Option<&'static str> {
	match kind {
		RecordKind::Execution | RecordKind::Strategy => Some("impact"),
		RecordKind::DefensePattern => Some("severity"),
		_ => None,
	}
}

fn layer_type_field(kind: RecordKind) -> Option<&'static str> {
	match kind {
		RecordKind::ArchitectureLayer => Some("layer_type"),
		_ => None,
	}
}

/// Display-name field searched by the free-text filter.
pub(crate) fn name_field(kind: RecordKind) -> Option<&'static str> {
	match kind {
		RecordKind::Execution | RecordKind::Persona | RecordKind::DefensePattern | RecordKind::ArchitectureLayer => Some("name"),
		RecordKind::Strategy => Some("title"),
		RecordKind::Interface => None,
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn record(value: serde_json::Value) -> Record {
		value.as_object().cloned().unwrap_or_default()
	}

	#[test]
	fn empty_filter_admits_everything() {
		let filters = FilterState::default();
		for kind in RecordKind::ALL {
			assert!(filters.admits(kind, &Record::new()));
		}
	}

	#[test]
	fn entity_type_keeps_only_matching_kinds() {
		let filters = FilterState::default().with_entity_type(Some(EntityType::Defense));
		assert!(filters.admits(RecordKind::DefensePattern, &Record::new()));
		assert!(!filters.admits(RecordKind::Execution, &Record::new()));
		assert!(!filters.admits(RecordKind::Persona, &Record::new()));

		let layers = FilterState::default().with_entity_type(Some(EntityType::Layer));
		assert!(layers.admits(RecordKind::Interface, &Record::new()));
	}

	#[test]
	fn phase_only_constrains_kinds_with_a_phase() {
		let filters = FilterState::default().with_phase(Some("Discovery".into()));
		assert!(filters.admits(RecordKind::Execution, &record(json!({"phase": "discovery"}))));
		assert!(!filters.admits(RecordKind::Execution, &record(json!({"phase": "delivery"}))));
		assert!(!filters.admits(RecordKind::Execution, &record(json!({}))));
		assert!(filters.admits(RecordKind::Persona, &record(json!({}))));
	}

	#[test]
	fn filters_combine_with_and() {
		let filters = FilterState::default()
			.with_phase(Some("discovery".into()))
			.with_impact(Some("high".into()));
		assert!(filters.admits(RecordKind::Execution, &record(json!({"phase": "discovery", "impact": "high"}))));
		assert!(!filters.admits(RecordKind::Execution, &record(json!({"phase": "discovery", "impact": "low"}))));
		assert!(filters.admits(RecordKind::DefensePattern, &record(json!({"severity": "HIGH"}))));
	}

	#[test]
	fn blank_values_clear_a_filter() {
		let filters = FilterState::default().with_search(Some("   ".into()));
		assert_eq!(filters, FilterState::default());
	}

	#[test]
	fn search_matches_display_name_substring() {
		let filters = FilterState::default().with_search(Some("acme".into()));
		assert!(filters.admits(RecordKind::Strategy, &record(json!({"title": "Win ACME back"}))));
		assert!(!filters.admits(RecordKind::Strategy, &record(json!({"title": "Other"}))));
		assert!(filters.admits(RecordKind::Interface, &record(json!({}))));
	}
}
