//! Message filters built on the n-gram model.
//!
//! A filter sees every incoming message twice: once to learn from it
//! (`train`) and once to decide whether it should be rejected (`filter`).
//! Hosts drive filters through a `FilterPipeline`, which always trains and
//! only filters while enabled.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::trace;
use serde::{Deserialize, Serialize};

use crate::model::ngram_model::{DEFAULT_SMOOTHING, NgramModel};
use crate::text::preprocess;

/// Decides whether chat messages should be rejected.
pub trait MessageFilter {
	/// Learns from a message. Filters without state ignore it.
	fn train(&mut self, _text: &str) {}

	/// Returns `true` if the message should be rejected.
	fn filter(&mut self, text: &str) -> bool;
}

/// A missing filter never rejects.
impl<F: MessageFilter> MessageFilter for Option<F> {
	fn train(&mut self, text: &str) {
		if let Some(inner) = self {
			inner.train(text);
		}
	}

	fn filter(&mut self, text: &str) -> bool {
		self.as_mut().is_some_and(|inner| inner.filter(text))
	}
}

/// Both filters always see the message; either one can reject it.
impl<A: MessageFilter, B: MessageFilter> MessageFilter for (A, B) {
	fn train(&mut self, text: &str) {
		self.0.train(text);
		self.1.train(text);
	}

	fn filter(&mut self, text: &str) -> bool {
		let first = self.0.filter(text);
		let second = self.1.filter(text);
		first || second
	}
}

/// Settings for a `ProbabilityFilter`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FilterConfig {
	/// Order of the underlying n-gram model.
	pub order: usize,
	/// Additive smoothing of the underlying model.
	pub smoothing: f64,
	/// Messages to learn from before any message is rejected.
	pub min_training_messages: usize,
}

impl Default for FilterConfig {
	fn default() -> Self {
		Self {
			order: 2,
			smoothing: DEFAULT_SMOOTHING,
			min_training_messages: 10,
		}
	}
}

/// Rejects low-information messages.
///
/// A message is rejected when it is at least as probable as the average
/// training message, scored when each was learned. Nothing is rejected until
/// more than `min_training_messages` messages have been seen.
#[derive(Clone, Debug)]
pub struct ProbabilityFilter {
	model: NgramModel,
	messages: usize,
	probability_sum: f64,
	min_training_messages: usize,
}

impl ProbabilityFilter {
	/// Creates a filter with the default configuration (bigrams, 10 warm-up messages).
	pub fn new() -> Self {
		Self {
			model: NgramModel::default(),
			messages: 0,
			probability_sum: 0.0,
			min_training_messages: FilterConfig::default().min_training_messages,
		}
	}

	/// # Errors
	/// Returns an error if the configured order or smoothing is invalid.
	pub fn from_config(config: &FilterConfig) -> Result<Self, String> {
		Ok(Self {
			model: NgramModel::with_smoothing(config.order, config.smoothing)?,
			messages: 0,
			probability_sum: 0.0,
			min_training_messages: config.min_training_messages,
		})
	}

	pub fn model(&self) -> &NgramModel {
		&self.model
	}

	/// Number of messages trained on.
	pub fn messages(&self) -> usize {
		self.messages
	}

	/// Average probability of the training messages, `None` before the first one.
	pub fn average_probability(&self) -> Option<f64> {
		if self.messages == 0 {
			return None;
		}
		Some(self.probability_sum / self.messages as f64)
	}

	/// Probability of `text` under the current model.
	pub fn score(&self, text: &str) -> f64 {
		self.model.probability(&preprocess(text))
	}
}

impl Default for ProbabilityFilter {
	fn default() -> Self {
		Self::new()
	}
}

impl MessageFilter for ProbabilityFilter {
	fn train(&mut self, text: &str) {
		let tokens = preprocess(text);
		self.model.update(&tokens);
		self.messages += 1;
		self.probability_sum += self.model.probability(&tokens);
	}

	fn filter(&mut self, text: &str) -> bool {
		if self.messages <= self.min_training_messages {
			return false;
		}
		let probability = self.score(text);
		let average = self.probability_sum / self.messages as f64;
		trace!("probability {} against average {}", probability, average);
		probability >= average
	}
}

/// Rejects repeats of a message seen within the last `block_timeout`.
///
/// The window starts at the first sighting; repeats do not extend it.
#[derive(Clone, Debug)]
pub struct DuplicateFilter {
	block_timeout: Duration,
	/// Compare normalized tokens instead of raw text.
	normalize: bool,
	/// Message → first sighting within the current window.
	seen: HashMap<String, Instant>,
}

impl DuplicateFilter {
	pub fn new(block_timeout: Duration, normalize: bool) -> Self {
		Self {
			block_timeout,
			normalize,
			seen: HashMap::new(),
		}
	}

	/// Same as `filter`, with an explicit clock.
	pub fn filter_at(&mut self, text: &str, now: Instant) -> bool {
		let key = if self.normalize {
			preprocess(text).join(" ")
		} else {
			text.to_owned()
		};

		let timeout = self.block_timeout;
		self.seen.retain(|_, first_seen| now.saturating_duration_since(*first_seen) < timeout);

		if self.seen.contains_key(&key) {
			return true;
		}
		self.seen.insert(key, now);
		false
	}

	/// Number of messages currently blocked.
	pub fn blocked(&self) -> usize {
		self.seen.len()
	}
}

impl MessageFilter for DuplicateFilter {
	fn filter(&mut self, text: &str) -> bool {
		self.filter_at(text, Instant::now())
	}
}

/// Drives a filter for a stream of messages.
///
/// Every message is trained on; filtering can be switched off without
/// stopping training.
#[derive(Clone, Debug)]
pub struct FilterPipeline<F> {
	filter: F,
	enabled: bool,
}

impl<F: MessageFilter> FilterPipeline<F> {
	/// Creates an enabled pipeline around `filter`.
	pub fn new(filter: F) -> Self {
		Self { filter, enabled: true }
	}

	/// Trains on `text`, then returns `true` if it should be rejected.
	pub fn process(&mut self, text: &str) -> bool {
		self.filter.train(text);
		self.enabled && self.filter.filter(text)
	}

	/// Trains on `text` without filtering it (corpus warm-up).
	pub fn train(&mut self, text: &str) {
		self.filter.train(text);
	}

	/// Flips filtering on/off and returns the new state.
	pub fn toggle(&mut self) -> bool {
		self.enabled = !self.enabled;
		self.enabled
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	pub fn filter(&self) -> &F {
		&self.filter
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn warm_up(filter: &mut ProbabilityFilter, count: usize) {
		for i in 0..count {
			filter.train(&format!("message number {} about topic {}", i, i % 3));
		}
	}

	#[test]
	fn probability_filter_waits_for_training() {
		let mut filter = ProbabilityFilter::new();
		warm_up(&mut filter, 10);
		assert_eq!(filter.messages(), 10);
		// Exactly min_training_messages seen: still passive
		assert!(!filter.filter("message number"));
		filter.train("message number 10 about topic 1");
		assert!(filter.average_probability().is_some());
	}

	#[test]
	fn probability_filter_rejects_repetitive_spam() {
		let mut filter = ProbabilityFilter::new();
		for _ in 0..20 {
			filter.train("lol");
		}
		for i in 0..5 {
			filter.train(&format!("an original thought number {}", i));
		}
		assert!(filter.filter("LOL!"));
		assert!(!filter.filter("completely unexpected words appear here"));
	}

	#[test]
	fn average_tracks_training_probabilities() {
		let mut filter = ProbabilityFilter::new();
		assert!(filter.average_probability().is_none());
		filter.train("a b");
		// After one update every bigram of "a b" has probability 2/3
		let expected = (2.0f64 / 3.0).powi(3);
		assert!((filter.average_probability().unwrap() - expected).abs() < 1e-12);
	}

	#[test]
	fn from_config_validates_order() {
		let config = FilterConfig { order: 0, ..FilterConfig::default() };
		assert!(ProbabilityFilter::from_config(&config).is_err());
		let filter = ProbabilityFilter::from_config(&FilterConfig { order: 3, ..FilterConfig::default() }).unwrap();
		assert_eq!(filter.model().order(), 3);
	}

	#[test]
	fn duplicate_filter_blocks_within_window() {
		let start = Instant::now();
		let mut filter = DuplicateFilter::new(Duration::from_secs(60), false);
		assert!(!filter.filter_at("hello", start));
		assert!(filter.filter_at("hello", start + Duration::from_secs(30)));
		// Window is anchored at the first sighting
		assert!(!filter.filter_at("hello", start + Duration::from_secs(60)));
		assert!(!filter.filter_at("Hello!", start + Duration::from_secs(61)));
		assert_eq!(filter.blocked(), 2);
	}

	#[test]
	fn duplicate_filter_can_normalize() {
		let start = Instant::now();
		let mut filter = DuplicateFilter::new(Duration::from_secs(60), true);
		assert!(!filter.filter_at("Hello, World!", start));
		assert!(filter.filter_at("hello world", start));
	}

	#[test]
	fn pipeline_trains_even_when_disabled() {
		let mut pipeline = FilterPipeline::new(ProbabilityFilter::new());
		assert!(!pipeline.toggle());
		for _ in 0..15 {
			assert!(!pipeline.process("same thing"));
		}
		assert_eq!(pipeline.filter().messages(), 15);
		assert!(pipeline.toggle());
		assert!(pipeline.process("same thing"));
	}

	#[test]
	fn combined_filters_both_see_messages() {
		let duplicates = Some(DuplicateFilter::new(Duration::from_secs(600), true));
		let mut pipeline = FilterPipeline::new((ProbabilityFilter::new(), duplicates));
		assert!(!pipeline.process("first"));
		assert!(pipeline.process("first"));
		assert_eq!(pipeline.filter().0.messages(), 2);

		let mut without: FilterPipeline<(ProbabilityFilter, Option<DuplicateFilter>)> =
			FilterPipeline::new((ProbabilityFilter::new(), None));
		assert!(!without.process("first"));
		assert!(!without.process("first"));
	}
}
