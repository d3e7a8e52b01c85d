use super::default_map::DefaultMap;
use super::distribution::SmoothedDistribution;

/// Marginal probability returned when no context contributes any mass.
///
/// Reached when no context has been stored yet, since reads never store one.
/// This is a fixed fallback value, not a normalized probability.
pub const EMPTY_MARGINAL_PROBABILITY: f64 = 1.0;

/// Smoothed distribution of outcomes conditioned on a context string.
///
/// Each context owns its own `SmoothedDistribution`, all created with the same
/// smoothing constant. Contexts are stored on their first increment; querying
/// an unknown context scores against a fresh, empty distribution and leaves
/// the map untouched.
///
/// # Invariants
/// - Every stored distribution uses `smooth`
/// - Every stored distribution has at least one observation
#[derive(Clone, Debug)]
pub struct ConditionalDistribution {
	smooth: f64,
	by_context: DefaultMap<String, SmoothedDistribution>,
}

impl ConditionalDistribution {
	/// Creates an empty conditional distribution with smoothing constant `smooth`.
	pub fn new(smooth: f64) -> Self {
		Self {
			smooth,
			by_context: DefaultMap::new(move || SmoothedDistribution::new(smooth)),
		}
	}

	/// Records one observation of `outcome` following `context`.
	pub fn increment(&mut self, context: &str, outcome: &str) {
		self.by_context.get_or_insert(context.to_owned()).increment(outcome);
	}

	/// Computes `P(outcome | context)`.
	///
	/// For an unknown context this is `smooth / smooth` (so `1.0`), or `NaN`
	/// when `smooth == 0`.
	pub fn conditional_probability(&self, context: &str, outcome: &str) -> f64 {
		self.with_context(context, |dist| dist.probability(outcome))
	}

	/// Computes `ln P(outcome | context)` using the per-context log routine.
	pub fn log_conditional_probability(&self, context: &str, outcome: &str) -> f64 {
		self.with_context(context, |dist| dist.log_probability(outcome))
	}

	/// Computes the context-free probability of `outcome`.
	///
	/// Sums numerators and denominators across every stored context and
	/// divides. Returns `EMPTY_MARGINAL_PROBABILITY` when the summed
	/// denominator is exactly zero.
	pub fn marginal_probability(&self, outcome: &str) -> f64 {
		let mut numerator = 0.0;
		let mut denominator = 0.0;
		for (_, dist) in self.by_context.iter() {
			numerator += dist.count_of(outcome);
			denominator += dist.denominator();
		}
		if denominator == 0.0 {
			return EMPTY_MARGINAL_PROBABILITY;
		}
		numerator / denominator
	}

	/// Natural log of `marginal_probability(outcome)`.
	pub fn marginal_log_probability(&self, outcome: &str) -> f64 {
		self.marginal_probability(outcome).ln()
	}

	/// Number of contexts with at least one observation.
	pub fn context_count(&self) -> usize {
		self.by_context.size()
	}

	/// Total number of observations across all contexts.
	pub fn total(&self) -> f64 {
		self.by_context.iter().map(|(_, dist)| dist.total()).sum()
	}

	pub fn smoothing(&self) -> f64 {
		self.smooth
	}

	/// Merges another conditional distribution into this one.
	///
	/// # Errors
	/// Returns an error if the smoothing constants differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		if self.smooth != other.smooth {
			return Err(format!("Smoothing mismatch: self={}, other={}", self.smooth, other.smooth));
		}

		for (context, dist) in other.by_context.iter() {
			self.by_context.get_or_insert(context.clone()).merge(dist)?;
		}

		Ok(())
	}

	fn with_context<T>(&self, context: &str, score: impl FnOnce(&SmoothedDistribution) -> T) -> T {
		match self.by_context.get_stored(context) {
			Some(dist) => score(dist),
			None => score(&self.by_context.produce_default()),
		}
	}
}
