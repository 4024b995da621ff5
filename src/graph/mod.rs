//! Relationship-graph engine behind the knowledge-graph and blueprint views.
//!
//! Pure and synchronous: records and filters go in, a typed node/edge graph
//! comes out, and selection, sizing and styling are derived from it. Nothing
//! here touches the DOM; the canvas component in
//! `components::force_graph` drives rendering.

pub mod builder;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod highlight;
pub mod normalize;
pub mod records;
pub mod resolve;
pub mod scale;
pub mod style;
pub mod types;
pub mod view;

pub use builder::{ClusterBy, GraphBuilder};
pub use config::{EngineConfig, LayoutConfig};
pub use controller::{GraphController, LoadOutcome, LoadTicket, NodeDetail, Notice};
pub use error::{GraphError, NormalizeError, ViewError};
pub use filter::{EntityType, FilterState};
pub use highlight::{Emphasis, HighlightSet, Selection};
pub use records::{Record, RecordKind, RecordSets};
pub use resolve::{CompanyNameResolver, JoinTable, RelationshipResolver};
pub use scale::{DegreeSizer, SizeStep};
pub use style::{Color, EdgeStyle, EdgeStylePreset, NodeStyle, NodeStylePreset, StyleResolver};
pub use types::{Edge, EdgeId, Graph, GraphStats, Node, NodeId, NodeKind};
pub use view::{LocalStorageStore, MemoryStore, RecordStore, SavedView, StoredView, ViewId, ViewPersistence, VisualConfig};
