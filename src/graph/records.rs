//! Upstream domain records as the record store hands them over: one
//! already-fetched JSON array per entity kind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One domain record, kept as the store returned it.
pub type Record = Map<String, Value>;

/// Supported record kinds, in the order the builder walks them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
	/// `executions`
	Execution,
	/// `personas`
	Persona,
	/// `defense_patterns`
	DefensePattern,
	/// `strategies`
	Strategy,
	/// `architecture_layers`
	ArchitectureLayer,
	/// `interfaces`
	Interface,
}

impl RecordKind {
	/// Every kind, in build order.
	pub const ALL: [Self; 6] = [
		Self::Execution,
		Self::Persona,
		Self::DefensePattern,
		Self::Strategy,
		Self::ArchitectureLayer,
		Self::Interface,
	];

	/// Key of this kind's array in a [`RecordSets`] document.
	pub fn key(self) -> &'static str {
		match self {
			Self::Execution => "executions",
			Self::Persona => "personas",
			Self::DefensePattern => "defense_patterns",
			Self::Strategy => "strategies",
			Self::ArchitectureLayer => "architecture_layers",
			Self::Interface => "interfaces",
		}
	}

	/// Inverse of [`RecordKind::key`].
	pub fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|k| k.key() == key)
	}
}

/// Record arrays keyed by kind. Keys that name no supported kind are kept so
/// the builder can report them, but never normalized.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSets(BTreeMap<String, Vec<Record>>);

impl RecordSets {
	/// Empty record sets.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse a `{"executions": [...], "personas": [...], ...}` document.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}

	/// Builder form of [`RecordSets::insert`].
	pub fn with(mut self, kind: RecordKind, records: Vec<Record>) -> Self {
		self.insert(kind, records);
		self
	}

	/// Replace the records of `kind`.
	pub fn insert(&mut self, kind: RecordKind, records: Vec<Record>) {
		self.0.insert(kind.key().to_owned(), records);
	}

	/// Records of `kind`; empty when the document has none.
	pub fn get(&self, kind: RecordKind) -> &[Record] {
		self.0.get(kind.key()).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Keys present in the document that no normalizer handles.
	pub fn unknown_kinds(&self) -> impl Iterator<Item = &str> {
		self.0
			.keys()
			.map(String::as_str)
			.filter(|k| RecordKind::from_key(k).is_none())
	}

	/// Records across all supported kinds.
	pub fn total(&self) -> usize {
		RecordKind::ALL.iter().map(|&k| self.get(k).len()).sum()
	}
}

/// Non-blank string field.
pub fn text<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
	record
		.get(key)
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|s| !s.is_empty())
}

/// Identifier field; the store returns both string and numeric keys.
pub fn id_of(record: &Record, key: &str) -> Option<String> {
	match record.get(key)? {
		Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

/// Lowercase, dash-separated key used to dedupe nodes named in free text
/// (`"Acme Corp."` and `"acme corp"` map to the same company node).
pub fn slug(name: &str) -> String {
	let mut out = String::with_capacity(name.len());
	let mut dash = false;
	for c in name.chars() {
		if c.is_alphanumeric() {
			out.extend(c.to_lowercase());
			dash = false;
		} else if !out.is_empty() && !dash {
			out.push('-');
			dash = true;
		}
	}
	if dash {
		out.pop();
	}
	out
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn record(value: Value) -> Record {
		value.as_object().cloned().unwrap_or_default()
	}

	#[test]
	fn slug_normalizes_case_and_punctuation() {
		assert_eq!(slug("Acme Corp."), "acme-corp");
		assert_eq!(slug("  acme   corp "), "acme-corp");
		assert_eq!(slug("Ünïcode Co"), "ünïcode-co");
		assert_eq!(slug("!!!"), "");
	}

	#[test]
	fn id_accepts_numbers_and_strings() {
		let r = record(json!({"id": 7, "execution_id": " x1 ", "blank": "  "}));
		assert_eq!(id_of(&r, "id").as_deref(), Some("7"));
		assert_eq!(id_of(&r, "execution_id").as_deref(), Some("x1"));
		assert_eq!(id_of(&r, "blank"), None);
		assert_eq!(id_of(&r, "missing"), None);
	}

	#[test]
	fn unknown_keys_are_reported() {
		let sets = RecordSets::from_json(r#"{"executions": [], "notifications": [{"id": 1}]}"#).unwrap();
		assert_eq!(sets.unknown_kinds().collect::<Vec<_>>(), vec!["notifications"]);
		assert!(sets.get(RecordKind::Persona).is_empty());
	}
}
