//! Character-window text generation library.
//!
//! This crate provides a character-level generation pipeline including:
//! - Corpus loading and a sorted, reproducible character vocabulary
//! - Fixed-width window one-hot encoding (single windows and training batches)
//! - Temperature-scaled sampling from a probability oracle
//! - Autoregressive generation with an explicitly threaded random source
//! - A count-based n-gram oracle so the pipeline runs end to end
//!
//! Low-level helpers (file I/O, path handling) are kept internal.

/// Generation configuration (defaults, JSON loading, validation).
pub mod config;

/// Crate-wide error type.
pub mod error;

/// Oracles, sampling and the autoregressive generator.
pub mod model;

/// Corpus, vocabulary and one-hot encoding.
pub mod text;

/// I/O utilities (file loading, path helpers).
///
/// Not exposed
pub(crate) mod io;

pub use config::GenerationConfig;
pub use error::{Error, Result};
pub use model::frequency_oracle::FrequencyOracle;
pub use model::generator::{GenerationRequest, Generator, StartSeed};
pub use model::oracle::Oracle;
pub use model::sampler::{reweight, sample};
pub use text::corpus::Corpus;
pub use text::encoding::{decode_window, encode_window, TrainingSet};
pub use text::vocabulary::Vocabulary;
