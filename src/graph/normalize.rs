//! Per-kind record normalization.
//!
//! Each supported [`RecordKind`] has one entry in [`NORMALIZERS`]. A
//! normalizer turns a single record into the nodes and edges it contributes,
//! reading (never writing) the nodes already accumulated in this build to
//! wire its edges. Edges are only emitted toward nodes that already exist, so
//! a filtered-out parent silently takes its children's edges with it.

use std::collections::HashMap;

use super::error::NormalizeError;
use super::records::{Record, RecordKind, id_of, slug, text};
use super::resolve::{CompanyRef, JoinTable};
use super::types::{Edge, Node, NodeId, NodeKind};

/// Execution to persona.
pub const HAS_PERSONA: &str = "has_persona";
/// Execution to company or leader.
pub const INVOLVES: &str = "involves";
/// Company persona to the execution's company.
pub const REPRESENTS: &str = "represents";
/// Execution to defense pattern.
pub const HAS_DEFENSE: &str = "has_defense";
/// Execution to the strategy it produced.
pub const GENERATED_STRATEGY: &str = "generated_strategy";
/// Strategy to a company it names.
pub const TARGETS: &str = "targets";

/// Nodes accumulated so far in one build, deduplicated by id and kept in
/// insertion order.
#[derive(Debug, Default)]
pub struct NodeSet {
	nodes: Vec<Node>,
	index: HashMap<NodeId, usize>,
}

impl NodeSet {
	/// Adds `node` unless a node with the same id is already present.
	/// Returns whether it was inserted.
	pub fn insert(&mut self, node: Node) -> bool {
		if self.index.contains_key(&node.id) {
			return false;
		}
		self.index.insert(node.id.clone(), self.nodes.len());
		self.nodes.push(node);
		true
	}

	/// Node with `id`, if already accumulated.
	pub fn get(&self, id: &NodeId) -> Option<&Node> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	/// Whether a node with `id` was accumulated.
	pub fn contains(&self, id: &NodeId) -> bool {
		self.index.contains_key(id)
	}

	/// Company nodes accumulated so far, for relationship resolution.
	pub fn company_refs(&self) -> Vec<CompanyRef<'_>> {
		self.nodes
			.iter()
			.filter(|n| n.kind == NodeKind::Company)
			.map(|n| CompanyRef { id: &n.id, name: &n.label })
			.collect()
	}

	/// Accumulated nodes in insertion order.
	pub fn into_vec(self) -> Vec<Node> {
		self.nodes
	}
}

/// Read-only view of the build in progress handed to normalizers.
#[derive(Clone, Copy)]
pub struct NormalizeContext<'a> {
	/// Nodes accumulated by earlier records.
	pub nodes: &'a NodeSet,
	/// Strategy to company links for this build.
	pub joins: &'a JoinTable,
}

impl NormalizeContext<'_> {
	/// `id` if that node already exists in this build.
	fn existing(&self, id: NodeId) -> Option<NodeId> {
		self.nodes.contains(&id).then_some(id)
	}
}

/// Nodes and edges contributed by one record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contribution {
	/// Nodes this record adds; duplicates of existing ids are dropped.
	pub nodes: Vec<Node>,
	/// Edges this record adds.
	pub edges: Vec<Edge>,
}

impl Contribution {
	fn node(mut self, node: Node) -> Self {
		self.nodes.push(node);
		self
	}

	fn edge(mut self, source: &NodeId, target: &NodeId, relation: &str) -> Self {
		self.edges.push(Edge::new(source.clone(), target.clone(), relation));
		self
	}

	fn edge_if(self, source: Option<&NodeId>, target: Option<&NodeId>, relation: &str) -> Self {
		match (source, target) {
			(Some(s), Some(t)) => self.edge(s, t, relation),
			_ => self,
		}
	}
}

type NormalizeFn = fn(&Record, NormalizeContext<'_>) -> Result<Contribution, NormalizeError>;

/// Dispatch table entry for one record kind.
pub struct KindEntry {
	/// Kind this entry handles.
	pub kind: RecordKind,
	/// Turns one record of `kind` into nodes and edges.
	pub normalize: NormalizeFn,
}

/// One entry per supported kind, in build order.
pub static NORMALIZERS: [KindEntry; 6] = [
	KindEntry {
		kind: RecordKind::Execution,
		normalize: normalize_execution,
	},
	KindEntry {
		kind: RecordKind::Persona,
		normalize: normalize_persona,
	},
	KindEntry {
		kind: RecordKind::DefensePattern,
		normalize: normalize_defense,
	},
	KindEntry {
		kind: RecordKind::Strategy,
		normalize: normalize_strategy,
	},
	KindEntry {
		kind: RecordKind::ArchitectureLayer,
		normalize: normalize_layer,
	},
	KindEntry {
		kind: RecordKind::Interface,
		normalize: normalize_interface,
	},
];

/// Table entry for `kind`; [`NORMALIZERS`] is laid out in [`RecordKind`] order.
pub fn entry(kind: RecordKind) -> &'static KindEntry {
	&NORMALIZERS[kind as usize]
}

fn required(record: &Record, kind: &'static str, field: &'static str) -> Result<String, NormalizeError> {
	id_of(record, field).ok_or(NormalizeError::MissingField { kind, field })
}

/// Node id of execution `id`.
pub fn execution_id(id: &str) -> NodeId {
	NodeId::namespaced("execution", id)
}

/// Node id of the company called `name`; equal for case and punctuation variants.
pub fn company_id(name: &str) -> NodeId {
	NodeId::namespaced("company", &slug(name))
}

/// Node id of architecture layer `id`.
pub fn layer_id(id: &str) -> NodeId {
	NodeId::namespaced("layer", id)
}

fn company_node(name: &str) -> Option<Node> {
	if slug(name).is_empty() {
		return None;
	}
	let mut payload = Record::new();
	payload.insert("name".into(), name.into());
	Some(Node::new(company_id(name), NodeKind::Company, name, payload))
}

fn normalize_execution(record: &Record, _ctx: NormalizeContext<'_>) -> Result<Contribution, NormalizeError> {
	let id = execution_id(&required(record, "execution", "id")?);
	let label = text(record, "name").unwrap_or(id.as_str());
	let mut out = Contribution::default().node(Node::new(id.clone(), NodeKind::Execution, label, record.clone()));

	if let Some(company) = text(record, "company").and_then(company_node) {
		out = out.edge(&id, &company.id, INVOLVES).node(company);
	}
	Ok(out)
}

fn normalize_persona(record: &Record, ctx: NormalizeContext<'_>) -> Result<Contribution, NormalizeError> {
	let id = NodeId::namespaced("persona", &required(record, "persona", "id")?);
	let owner = execution_id(&required(record, "persona", "execution_id")?);
	let name = text(record, "name").unwrap_or(id.as_str());
	let owner = ctx.existing(owner);

	let mut out = Contribution::default()
		.node(Node::new(id.clone(), NodeKind::Persona, name, record.clone()))
		.edge_if(owner.as_ref(), Some(&id), HAS_PERSONA);

	match text(record, "persona_type").map(str::to_ascii_lowercase).as_deref() {
		Some("leader") => {
			let leader = Node::new(NodeId::namespaced("leader", &slug(name)), NodeKind::Leader, name, record.clone());
			out = out.edge_if(owner.as_ref(), Some(&leader.id), INVOLVES).node(leader);
		}
		Some("company") => {
			let company = owner
				.as_ref()
				.and_then(|o| ctx.nodes.get(o))
				.and_then(|exec| exec.field("company"))
				.and_then(|name| ctx.existing(company_id(name)));
			out = out.edge_if(Some(&id), company.as_ref(), REPRESENTS);
		}
		_ => {}
	}
	Ok(out)
}

fn normalize_defense(record: &Record, ctx: NormalizeContext<'_>) -> Result<Contribution, NormalizeError> {
	let id = NodeId::namespaced("defense", &required(record, "defense pattern", "id")?);
	let owner = ctx.existing(execution_id(&required(record, "defense pattern", "execution_id")?));
	let name = text(record, "name").unwrap_or(id.as_str());

	Ok(Contribution::default()
		.node(Node::new(id.clone(), NodeKind::Defense, name, record.clone()))
		.edge_if(owner.as_ref(), Some(&id), HAS_DEFENSE))
}

fn normalize_strategy(record: &Record, ctx: NormalizeContext<'_>) -> Result<Contribution, NormalizeError> {
	let key = required(record, "strategy", "id")?;
	let id = NodeId::namespaced("strategy", &key);
	let title = text(record, "title").unwrap_or(id.as_str());
	let owner = id_of(record, "execution_id").and_then(|e| ctx.existing(execution_id(&e)));

	let mut out = Contribution::default()
		.node(Node::new(id.clone(), NodeKind::Strategy, title, record.clone()))
		.edge_if(owner.as_ref(), Some(&id), GENERATED_STRATEGY);
	for company in ctx.joins.targets_of(&key) {
		if ctx.nodes.contains(company) {
			out = out.edge(&id, company, TARGETS);
		}
	}
	Ok(out)
}

fn normalize_layer(record: &Record, _ctx: NormalizeContext<'_>) -> Result<Contribution, NormalizeError> {
	let id = layer_id(&required(record, "architecture layer", "id")?);
	let name = text(record, "name").unwrap_or(id.as_str());
	Ok(Contribution::default().node(Node::new(id.clone(), NodeKind::LayerComponent, name, record.clone())))
}

fn normalize_interface(record: &Record, ctx: NormalizeContext<'_>) -> Result<Contribution, NormalizeError> {
	let source = layer_id(&required(record, "interface", "source_layer_id")?);
	let target = layer_id(&required(record, "interface", "target_layer_id")?);
	let relation = text(record, "interface_type").unwrap_or("data").to_ascii_lowercase();

	Ok(Contribution::default().edge_if(
		ctx.existing(source).as_ref(),
		ctx.existing(target).as_ref(),
		&relation,
	))
}
