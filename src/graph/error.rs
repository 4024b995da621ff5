//! Error types for graph construction and saved-view persistence.
//!
//! Neither kind is fatal to the dashboard: build errors keep the previous
//! graph on screen, view errors surface as a transient notice.

use thiserror::Error;

use super::types::NodeId;

/// Integrity failure while assembling a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
	/// An edge names an endpoint that no normalizer emitted in this build.
	#[error("edge {relation} from {from} to {to} references a missing node")]
	DanglingEdge {
		/// Edge source.
		from: NodeId,
		/// Edge target.
		to: NodeId,
		/// Edge relation.
		relation: String,
	},

	/// Degree size table is empty.
	#[error("size table must contain at least one threshold")]
	EmptySizeTable,

	/// Degree size table does not start at degree 0.
	#[error("size table must start at degree 0, found {0}")]
	SizeTableMissingZero(u32),

	/// Thresholds must strictly increase and tiers must not decrease.
	#[error("size table is not monotonic at threshold {0}")]
	NonMonotonicSizeTable(u32),
}

/// A record that cannot be placed in the graph. The builder skips it and
/// carries on with the rest of the build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
	/// A required identifying or correlating field is absent.
	#[error("{kind} record is missing required field `{field}`")]
	MissingField {
		/// Record kind, as shown to the user.
		kind: &'static str,
		/// Name of the absent field.
		field: &'static str,
	},
}

/// Failure while saving or loading a named view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
	/// Saved views need a non-blank name.
	#[error("view name must not be empty")]
	EmptyName,

	/// No stored view carries the requested id.
	#[error("view {0} not found")]
	NotFound(String),

	/// The record store rejected or failed the request.
	#[error("record store error: {0}")]
	Store(String),

	/// A stored view could not be encoded or decoded.
	#[error("view serialization error: {0}")]
	Serialization(String),
}

impl From<serde_json::Error> for ViewError {
	fn from(err: serde_json::Error) -> Self {
		Self::Serialization(err.to_string())
	}
}
