use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, info};
use serde::Serialize;

use super::conditional::ConditionalDistribution;
use super::ngram::make_ngrams;
use crate::io::read_corpus;
use crate::text::preprocess;

/// Smoothing constant used by `NgramModel::new`.
pub const DEFAULT_SMOOTHING: f64 = 1.0;

/// Summary of a model's size, for hosts and logs.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ModelStats {
	pub order: usize,
	pub smoothing: f64,
	/// Number of distinct contexts observed.
	pub contexts: usize,
	/// Number of n-grams trained on.
	pub observations: f64,
}

/// Word-level n-gram language model of fixed order `n`.
///
/// The model scores a token sequence with the chain rule over its padded
/// n-grams: each outcome is scored given the `n - 1` tokens before it, and
/// the sentinels make sequence start and end part of the score.
///
/// # Responsibilities
/// - Train from token sequences (strictly additive, no decay)
/// - Score token sequences without mutating the model
/// - Merge with another model of the same order and smoothing
/// - Build itself from a corpus file in parallel
///
/// # Invariants
/// - `n` is always >= 1 and never changes
/// - Counts only grow
#[derive(Clone, Debug)]
pub struct NgramModel {
	/// The order of the model (number of tokens in each n-gram)
	n: usize, // must be >= 1

	/// Outcome counts keyed by context
	distribution: ConditionalDistribution,
}

impl NgramModel {
	/// Creates an empty model of order `n` with `DEFAULT_SMOOTHING`.
	///
	/// # Errors
	/// Returns an error if `n < 1`.
	pub fn new(n: usize) -> Result<Self, String> {
		Self::with_smoothing(n, DEFAULT_SMOOTHING)
	}

	/// Creates an empty model of order `n` with a custom smoothing constant.
	///
	/// # Errors
	/// Returns an error if `n < 1` or if `smooth` is negative or NaN.
	pub fn with_smoothing(n: usize, smooth: f64) -> Result<Self, String> {
		if n < 1 {
			return Err("n must be >= 1".to_owned());
		}
		if smooth.is_nan() || smooth < 0.0 {
			return Err(format!("smoothing must be >= 0, got {}", smooth));
		}
		Ok(Self { n, distribution: ConditionalDistribution::new(smooth) })
	}

	/// Builds a model from a text file, one message per line.
	///
	/// # Behavior
	/// - Splits the lines into chunks (based on CPU cores * factor).
	/// - Spawns threads to build partial models for each chunk.
	/// - Merges all partial models on the calling thread.
	///
	/// # Notes
	/// - Every line goes through `preprocess` before training.
	/// - An empty corpus yields an empty model.
	///
	/// # Errors
	/// Returns an error if `n < 1`, if the file cannot be read or if a
	/// worker thread fails.
	pub fn from_corpus<P: AsRef<Path>>(filepath: P, n: usize) -> Result<Self, Box<dyn std::error::Error>> {
		let mut final_model = Self::new(n)?;
		let lines = read_corpus(&filepath)?;
		if lines.is_empty() {
			return Ok(final_model);
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = lines.len().div_ceil(chunks);
		debug!("training on {} lines in chunks of {}", lines.len(), chunk_size);

		let (tx, rx) = mpsc::channel();
		let mut handles = Vec::new();
		for chunk in lines.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();
			let mut partial_model = final_model.empty_like();

			handles.push(thread::spawn(move || {
				for line in chunk {
					partial_model.update(&preprocess(&line));
				}
				// The receiver outlives every worker
				let _ = tx.send(partial_model);
			}));
		}
		drop(tx);

		for partial_model in rx.iter() {
			final_model.merge(&partial_model)?;
		}
		for handle in handles {
			handle.join().map_err(|_| "corpus worker panicked")?;
		}

		let stats = final_model.stats();
		info!(
			"built order-{} model: {} contexts, {} observations",
			stats.order, stats.contexts, stats.observations
		);
		Ok(final_model)
	}

	/// Order of the model.
	pub fn order(&self) -> usize {
		self.n
	}

	/// Trains the model on one token sequence.
	///
	/// Every padded n-gram of the sequence is counted once.
	pub fn update<S: AsRef<str>>(&mut self, tokens: &[S]) {
		for ngram in make_ngrams(tokens, self.n) {
			self.distribution.increment(&ngram.context(), ngram.outcome());
		}
	}

	/// Natural log probability of a token sequence (chain rule, boundaries included).
	///
	/// # Notes
	/// - Does not mutate the model.
	/// - May be `-inf` or `NaN` when the model was built with zero smoothing.
	pub fn log_probability<S: AsRef<str>>(&self, tokens: &[S]) -> f64 {
		make_ngrams(tokens, self.n)
			.iter()
			.map(|ngram| self.distribution.log_conditional_probability(&ngram.context(), ngram.outcome()))
			.sum()
	}

	/// Probability of a token sequence, `exp(log_probability(tokens))`.
	pub fn probability<S: AsRef<str>>(&self, tokens: &[S]) -> f64 {
		self.log_probability(tokens).exp()
	}

	/// Context-free probability of a single token, pooled over all contexts.
	pub fn marginal_probability(&self, token: &str) -> f64 {
		self.distribution.marginal_probability(token)
	}

	/// Read access to the underlying conditional distribution.
	pub fn distribution(&self) -> &ConditionalDistribution {
		&self.distribution
	}

	pub fn stats(&self) -> ModelStats {
		ModelStats {
			order: self.n,
			smoothing: self.distribution.smoothing(),
			contexts: self.distribution.context_count(),
			observations: self.distribution.total(),
		}
	}

	/// Merges another n-gram model into this one.
	///
	/// # Notes
	/// - Both models must have the same order `n` and smoothing.
	/// - Counts for matching contexts and outcomes are summed.
	///
	/// # Errors
	/// Returns an error if the orders or smoothing constants do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		if self.n != other.n {
			return Err(format!("N mismatch: self={}, other={}", self.n, other.n));
		}
		self.distribution.merge(&other.distribution)
	}

	fn empty_like(&self) -> Self {
		Self { n: self.n, distribution: ConditionalDistribution::new(self.distribution.smoothing()) }
	}
}

/// An empty bigram model with `DEFAULT_SMOOTHING`.
impl Default for NgramModel {
	fn default() -> Self {
		Self { n: 2, distribution: ConditionalDistribution::new(DEFAULT_SMOOTHING) }
	}
}
