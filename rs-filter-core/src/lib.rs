//! Smoothed n-gram language model for scoring chat messages.
//!
//! This crate provides a small statistical text scoring system including:
//! - Additive-smoothed unigram and conditional distributions
//! - Word-level n-gram extraction with sentence boundary sentinels
//! - A fixed-order n-gram model scoring token sequences
//! - Message filters built on top of the model (low-information and repeat filters)
//! - Internal utilities for corpus I/O
//!
//! Models are plain owned values: hosts create them, pass them around
//! explicitly and serialize access themselves when sharing across threads.

/// Core probability model and n-gram logic.
///
/// Exposes the n-gram model facade along with the distributions it is
/// composed of.
pub mod model;

/// Text normalization and whitespace tokenization.
pub mod text;

/// Message filters deciding whether a chat message should be rejected.
pub mod filter;

/// I/O utilities (corpus loading).
pub mod io;
