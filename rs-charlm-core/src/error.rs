use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading text, encoding windows, sampling or generating.
///
/// None of these are transient: every variant is surfaced to the caller as is,
/// nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
	/// A caller supplied seed is shorter than the window length.
	#[error("Seed text must be at least {min_len} chars long (got {len})")]
	InvalidSeed { min_len: usize, len: usize },

	/// The oracle produced an entry outside the log domain.
	#[error("Distribution entry {index} must be strictly positive and finite, got {value}")]
	Domain { index: usize, value: f64 },

	#[error("Temperature must be a finite value > 0, got {0}")]
	InvalidTemperature(f64),

	#[error("Distribution is empty")]
	EmptyDistribution,

	#[error("Distribution has {got} entries, vocabulary has {expected}")]
	DistributionSize { expected: usize, got: usize },

	#[error("Character {0:?} is not in the vocabulary")]
	UnknownCharacter(char),

	#[error("Label {0} is not in the vocabulary")]
	UnknownLabel(usize),

	#[error("Invalid one-hot encoding: {0}")]
	InvalidEncoding(String),

	#[error("Requested {requested} chars, at most {max} allowed")]
	TooManyChars { requested: usize, max: usize },

	#[error("Window length must be >= 1")]
	InvalidWindowLength,

	#[error("Window step must be >= 1")]
	InvalidStep,

	#[error("Smoothing must be a finite value > 0, got {0}")]
	InvalidSmoothing(f64),

	#[error("Corpus must hold at least {min_len} chars (got {len})")]
	CorpusTooShort { min_len: usize, len: usize },

	/// Two frequency oracles built over different vocabularies or orders.
	#[error("Model mismatch: {0}")]
	ModelMismatch(String),

	#[error("Corpus is empty")]
	EmptyCorpus,

	/// A random start seed was requested but no corpus is attached.
	#[error("No corpus available to draw a random seed from")]
	MissingCorpus,

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] postcard::Error),

	#[error("Configuration error: {0}")]
	Config(#[from] serde_json::Error),
}

impl Error {
	/// Returns `true` for errors caused by the caller's arguments
	/// (as opposed to a misbehaving oracle or an I/O failure).
	pub fn is_caller_error(&self) -> bool {
		matches!(
			self,
			Error::InvalidSeed { .. }
				| Error::InvalidTemperature(_)
				| Error::TooManyChars { .. }
				| Error::UnknownCharacter(_)
				| Error::InvalidWindowLength
				| Error::InvalidStep
				| Error::InvalidSmoothing(_)
				| Error::MissingCorpus
		)
	}
}
