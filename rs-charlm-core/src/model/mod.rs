//! Oracles, sampling and generation.
//!
//! This module provides:
//! - The `Oracle` capability (window encoding → next-char distribution)
//! - Temperature-scaled categorical sampling (`sampler`)
//! - The autoregressive `Generator`
//! - A count-based n-gram oracle (`FrequencyOracle`)

/// Next-character distribution capability.
pub mod oracle;

/// Temperature reweighting and categorical draws.
pub mod sampler;

/// Autoregressive sliding-window generation.
///
/// Exposes seed selection (custom or random corpus window), the sliding
/// window loop and multi-temperature previews.
pub mod generator;

/// Multi-order n-gram oracle with additive smoothing.
///
/// Supports parallel construction, merging and a binary cache on disk.
pub mod frequency_oracle;

/// Fixed-order n-gram table over labels (`n >= 2`).
mod ngram_model;

/// Internal representation of a single n-gram context.
///
/// Tracks outgoing transition counts. Not exposed publicly.
mod state;
