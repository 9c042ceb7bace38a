use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::read_file;
use crate::model::sampler::check_temperature;

/// Generation and oracle settings.
///
/// Every field has a default, so a JSON file only needs the keys it
/// overrides:
///
/// ```json
/// { "temperature": 0.4, "num_chars": 2000 }
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
	/// Window length `W` (model context, in chars).
	pub window_length: usize,

	/// Stride between training windows.
	pub step: usize,

	pub temperature: f64,

	/// Total output length, seed included.
	pub num_chars: usize,

	/// Upper bound on any requested output length.
	pub max_num_chars: usize,

	/// Additive smoothing of the frequency oracle.
	pub smoothing: f64,

	/// Temperatures used by previews.
	pub preview_temperatures: Vec<f64>,

	/// Fixed random seed; `None` draws from the OS.
	pub rng_seed: Option<u64>,
}

impl Default for GenerationConfig {
	fn default() -> Self {
		Self {
			window_length: 8,
			step: 3,
			temperature: 0.35,
			num_chars: 100,
			max_num_chars: 100_000,
			smoothing: 0.01,
			preview_temperatures: vec![0.2, 0.5, 1.0, 1.2],
			rng_seed: None,
		}
	}
}

impl GenerationConfig {
	/// Loads a JSON configuration file and validates it.
	pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		let config: Self = serde_json::from_str(&read_file(path)?)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks every field against its constraint.
	pub fn validate(&self) -> Result<()> {
		if self.window_length == 0 {
			return Err(Error::InvalidWindowLength);
		}
		if self.step == 0 {
			return Err(Error::InvalidStep);
		}
		if !self.smoothing.is_finite() || self.smoothing <= 0.0 {
			return Err(Error::InvalidSmoothing(self.smoothing));
		}
		check_temperature(self.temperature)?;
		self.check_num_chars(self.num_chars)?;
		for &temperature in &self.preview_temperatures {
			check_temperature(temperature)?;
		}
		Ok(())
	}

	/// Rejects output lengths above `max_num_chars`.
	pub fn check_num_chars(&self, num_chars: usize) -> Result<()> {
		if num_chars > self.max_num_chars {
			return Err(Error::TooManyChars { requested: num_chars, max: self.max_num_chars });
		}
		Ok(())
	}
}
