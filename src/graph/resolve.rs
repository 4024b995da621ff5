//! Relationship resolution for references that are only loosely expressed in
//! the records (strategies name their target company in free text).
//!
//! The join table is built once per build, before the strategy pass, so
//! matching policy stays out of the normalizers.

use std::collections::BTreeMap;

use super::records::{Record, id_of, slug, text};
use super::types::NodeId;

/// A company node already present in the accumulating build.
#[derive(Clone, Debug)]
pub struct CompanyRef<'a> {
	/// Company node id.
	pub id: &'a NodeId,
	/// Company display name, as first seen.
	pub name: &'a str,
}

/// Many-to-many strategy → company join table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JoinTable {
	links: BTreeMap<String, Vec<NodeId>>,
}

impl JoinTable {
	/// Join `strategy_id` to `company`, ignoring repeats.
	pub fn link(&mut self, strategy_id: &str, company: NodeId) {
		let targets = self.links.entry(strategy_id.to_owned()).or_default();
		if !targets.contains(&company) {
			targets.push(company);
		}
	}

	/// Companies joined to a strategy, in company build order.
	pub fn targets_of(&self, strategy_id: &str) -> &[NodeId] {
		self.links.get(strategy_id).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Number of strategy to company links.
	pub fn len(&self) -> usize {
		self.links.values().map(Vec::len).sum()
	}

	/// Whether no strategy was joined.
	pub fn is_empty(&self) -> bool {
		self.links.is_empty()
	}
}

/// Policy for joining strategies to companies.
pub trait RelationshipResolver {
	/// Join each strategy to the companies it refers to.
	fn resolve(&self, strategies: &[&Record], companies: &[CompanyRef<'_>]) -> JoinTable;
}

/// Matches a strategy's `company` field (or, failing that, its `title`)
/// against company names, ignoring case and punctuation. A company matches
/// when its name appears as a whole-word run inside the strategy text, or the
/// strategy's `company` field appears inside the company name.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompanyNameResolver;

impl RelationshipResolver for CompanyNameResolver {
	fn resolve(&self, strategies: &[&Record], companies: &[CompanyRef<'_>]) -> JoinTable {
		let companies: Vec<(&NodeId, String)> = companies
			.iter()
			.map(|c| (c.id, slug(c.name)))
			.filter(|(_, s)| !s.is_empty())
			.collect();

		let mut table = JoinTable::default();
		for strategy in strategies {
			let Some(strategy_id) = id_of(strategy, "id") else {
				continue;
			};
			let named = text(strategy, "company").map(slug);
			let title = text(strategy, "title").map(slug);

			for (company_id, company) in &companies {
				let hit = match (&named, &title) {
					(Some(named), _) => contains_words(named, company) || contains_words(company, named),
					(None, Some(title)) => contains_words(title, company),
					(None, None) => false,
				};
				if hit {
					table.link(&strategy_id, (*company_id).clone());
				}
			}
		}
		table
	}
}

/// Whole-word containment over dash-separated slugs.
fn contains_words(haystack: &str, needle: &str) -> bool {
	!needle.is_empty() && format!("-{haystack}-").contains(&format!("-{needle}-"))
}
