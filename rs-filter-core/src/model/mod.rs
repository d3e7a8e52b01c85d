//! Top-level module for the n-gram language model.
//!
//! This module contains, leaves first:
//! - A key/value map with non-persisting defaults (`DefaultMap`)
//! - An additive-smoothed distribution over outcomes (`SmoothedDistribution`)
//! - A distribution conditioned on a context string (`ConditionalDistribution`)
//! - N-gram extraction with sentence sentinels (`make_ngrams`)
//! - The fixed-order model facade (`NgramModel`)

/// Map returning a produced default for absent keys without storing it.
pub mod default_map;

/// Additive-smoothed distribution over outcomes.
///
/// Tracks per-outcome counts and a running total, and computes
/// probabilities with a held-out slot for never-seen outcomes.
pub mod distribution;

/// Smoothed distribution conditioned on a context.
///
/// Supports conditional and marginal (context-free) probability queries.
pub mod conditional;

/// N-gram windows over a padded token sequence.
pub mod ngram;

/// Fixed-order n-gram model (`n >= 1`).
///
/// Handles training, chain-rule scoring, merging and corpus construction.
pub mod ngram_model;
