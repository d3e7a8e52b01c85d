use super::default_map::DefaultMap;

/// Additive-smoothed distribution over string outcomes.
///
/// Every lookup of an outcome starts from the smoothing constant `smooth`:
/// an outcome never observed counts as `smooth`, an outcome observed `k` times
/// counts as `smooth + k`. The denominator reserves one extra `smooth` slot for
/// outcomes never seen at all, so every outcome has nonzero probability as
/// long as `smooth > 0`.
///
/// ## Responsibilities:
/// - Accumulate outcome observations during training
/// - Compute (log) probabilities of single outcomes
/// - Merge with another distribution using the same smoothing (parallel training)
///
/// ## Invariants
/// - `total` equals the number of `increment` calls applied (merges included)
/// - Stored counts are `smooth + observations`, observations >= 1
#[derive(Clone, Debug)]
pub struct SmoothedDistribution {
	/// Additive pseudo-count, also the count of unseen outcomes.
	smooth: f64,
	/// Outcome counts. Absent outcomes read as `smooth` and are never stored by reads.
	counts: DefaultMap<String, f64>,
	/// Number of observations recorded.
	total: f64,
}

impl SmoothedDistribution {
	/// Creates an empty distribution with smoothing constant `smooth`.
	pub fn new(smooth: f64) -> Self {
		Self {
			smooth,
			counts: DefaultMap::new(move || smooth),
			total: 0.0,
		}
	}

	/// Records one observation of `outcome`.
	///
	/// The first observation of an outcome stores `smooth + 1`.
	pub fn increment(&mut self, outcome: &str) {
		let count = self.counts.get(outcome) + 1.0;
		self.counts.put(outcome.to_owned(), count);
		self.total += 1.0;
	}

	/// Probability numerator of `outcome` (`smooth` when unseen).
	pub fn count_of(&self, outcome: &str) -> f64 {
		self.counts.get(outcome)
	}

	/// Probability denominator: `total + (size + 1) * smooth`.
	pub fn denominator(&self) -> f64 {
		self.total + (self.size() as f64 + 1.0) * self.smooth
	}

	/// Probability of `outcome`, computed as `exp(log_probability(outcome))`.
	pub fn probability(&self, outcome: &str) -> f64 {
		self.log_probability(outcome).exp()
	}

	/// Natural log probability of `outcome`.
	///
	/// # Notes
	/// - With `smooth == 0`, an unseen outcome yields `f64::NEG_INFINITY`.
	/// - With `smooth == 0` and no observation at all, yields `NaN`.
	pub fn log_probability(&self, outcome: &str) -> f64 {
		self.count_of(outcome).ln() - self.denominator().ln()
	}

	/// Support size: number of distinct outcomes observed at least once.
	pub fn size(&self) -> usize {
		self.counts.size()
	}

	/// Number of observations recorded.
	pub fn total(&self) -> f64 {
		self.total
	}

	/// Smoothing constant this distribution was built with.
	pub fn smoothing(&self) -> f64 {
		self.smooth
	}

	/// Merges another distribution into this one.
	///
	/// Real observations are summed; the smoothing baseline is counted once.
	///
	/// # Errors
	/// Returns an error if the smoothing constants differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		if self.smooth != other.smooth {
			return Err(format!("Smoothing mismatch: self={}, other={}", self.smooth, other.smooth));
		}

		for (outcome, count) in other.counts.iter() {
			let observed = count - other.smooth;
			let merged = self.counts.get(outcome) + observed;
			self.counts.put(outcome.clone(), merged);
		}
		self.total += other.total;

		Ok(())
	}
}
