//! Degree-based node sizing.

use serde::{Deserialize, Serialize};

use super::error::GraphError;

/// One row of the size table: nodes with at least `min_degree` edges get
/// `tier` radius units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStep {
	/// Smallest degree this row applies to.
	pub min_degree: u32,
	/// Size tier for that degree and above.
	pub tier: u32,
}

/// Monotonic step function from degree to visual size tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DegreeSizer {
	steps: Vec<SizeStep>,
}

const BASE_TIER: u32 = 4;

impl Default for DegreeSizer {
	fn default() -> Self {
		Self {
			steps: vec![
				SizeStep { min_degree: 0, tier: BASE_TIER },
				SizeStep { min_degree: 1, tier: BASE_TIER + 1 },
				SizeStep { min_degree: 3, tier: BASE_TIER + 2 },
				SizeStep { min_degree: 5, tier: BASE_TIER + 3 },
				SizeStep { min_degree: 10, tier: BASE_TIER + 5 },
			],
		}
	}
}

impl DegreeSizer {
	/// Validate a table: it must start at degree 0, thresholds must strictly
	/// increase and tiers must never shrink. Tier 0 rows are raised to 1 so
	/// every node stays visible.
	pub fn new(mut steps: Vec<SizeStep>) -> Result<Self, GraphError> {
		let first = steps.first().ok_or(GraphError::EmptySizeTable)?;
		if first.min_degree != 0 {
			return Err(GraphError::SizeTableMissingZero(first.min_degree));
		}
		for step in &mut steps {
			step.tier = step.tier.max(1);
		}
		for pair in steps.windows(2) {
			if pair[1].min_degree <= pair[0].min_degree || pair[1].tier < pair[0].tier {
				return Err(GraphError::NonMonotonicSizeTable(pair[1].min_degree));
			}
		}
		Ok(Self { steps })
	}

	/// Tier of the greatest threshold not above `degree`.
	pub fn size_of(&self, degree: u32) -> u32 {
		let idx = self.steps.partition_point(|s| s.min_degree <= degree);
		// steps[0].min_degree == 0, so idx >= 1
		self.steps[idx.saturating_sub(1)].tier
	}

	/// Tier of an isolated node.
	pub fn min_tier(&self) -> u32 {
		self.steps[0].tier
	}

	/// Validated table rows.
	pub fn steps(&self) -> &[SizeStep] {
		&self.steps
	}
}

impl<'de> Deserialize<'de> for DegreeSizer {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let steps = Vec::<SizeStep>::deserialize(deserializer)?;
		Self::new(steps).map_err(serde::de::Error::custom)
	}
}
