use std::collections::VecDeque;

use log::debug;
use rand::Rng;

use crate::error::{Error, Result};
use crate::text::corpus::Corpus;
use crate::text::encoding::encode_window;
use crate::text::vocabulary::Vocabulary;
use super::oracle::Oracle;
use super::sampler::{check_temperature, sample};

/// Strategy used to select the starting context of a generation.
///
/// # Variants
/// - `Random`: draw a window of the corpus attached to the generator.
/// - `Custom(String)`: use the given text; it must hold at least
///   `window_length` chars and only vocabulary chars.
#[derive(Clone, Debug, PartialEq)]
pub enum StartSeed {
	Random,
	Custom(String),
}

/// Parameters of a single generation.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
	/// Sampling temperature (`> 0`).
	pub temperature: f64,

	pub start_seed: StartSeed,

	/// Total output length in chars, seed included.
	pub num_chars: usize,
}

/// Autoregressive text generator.
///
/// # Responsibilities
/// - Pick the starting window (custom seed or random corpus window)
/// - Encode the trailing window, query the oracle, sample the next char
/// - Slide the window until the target length is reached
///
/// # Invariants
/// - The window always holds exactly `window_length` chars
/// - Every generated char belongs to `vocabulary`
pub struct Generator<'a, O: Oracle + ?Sized> {
	oracle: &'a O,
	vocabulary: &'a Vocabulary,
	window_length: usize,
	corpus: Option<&'a Corpus>,
}

impl<'a, O: Oracle + ?Sized> Generator<'a, O> {
	/// Creates a generator without a corpus (custom seeds only).
	///
	/// # Errors
	/// [`Error::InvalidWindowLength`] if `window_length == 0`.
	pub fn new(oracle: &'a O, vocabulary: &'a Vocabulary, window_length: usize) -> Result<Self> {
		if window_length == 0 {
			return Err(Error::InvalidWindowLength);
		}
		Ok(Self { oracle, vocabulary, window_length, corpus: None })
	}

	/// Attaches the corpus used by [`StartSeed::Random`].
	pub fn with_corpus(mut self, corpus: &'a Corpus) -> Self {
		self.corpus = Some(corpus);
		self
	}

	pub fn window_length(&self) -> usize {
		self.window_length
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		self.vocabulary
	}

	/// Generates text until it holds `request.num_chars` chars.
	///
	/// If the seed already holds `num_chars` chars or more, it is returned
	/// unchanged.
	///
	/// # Errors
	/// - [`Error::InvalidTemperature`] before anything else
	/// - [`Error::InvalidSeed`] if a custom seed is shorter than the window
	/// - [`Error::MissingCorpus`] / [`Error::CorpusTooShort`] for random seeds
	/// - [`Error::UnknownCharacter`] if the seed leaves the vocabulary
	/// - [`Error::DistributionSize`], [`Error::Domain`] or any oracle error
	///   if the oracle misbehaves
	pub fn generate<R: Rng>(&self, request: &GenerationRequest, rng: &mut R) -> Result<String> {
		check_temperature(request.temperature)?;

		let mut generated = self.resolve_seed(&request.start_seed, rng)?;
		let mut generated_len = generated.chars().count();

		// Last window_length chars of the seed
		let mut window: VecDeque<char> = generated.chars().skip(generated_len - self.window_length).collect();

		debug!(
			"Generating {} chars at temperature {} from seed {:?}",
			request.num_chars.saturating_sub(generated_len),
			request.temperature,
			generated
		);

		while generated_len < request.num_chars {
			let encoded = encode_window(self.vocabulary, window.make_contiguous())?;
			let distribution = self.oracle.distribution(encoded.view())?;
			if distribution.len() != self.vocabulary.len() {
				return Err(Error::DistributionSize { expected: self.vocabulary.len(), got: distribution.len() });
			}

			let label = sample(&distribution, request.temperature, rng)?;
			let next_char = self.vocabulary.try_char_of(label)?;

			generated.push(next_char);
			generated_len += 1;
			window.pop_front();
			window.push_back(next_char);
		}

		Ok(generated)
	}

	/// Generates one random-seeded text per temperature.
	///
	/// Returns `(temperature, text)` pairs in the order of `temperatures`.
	pub fn preview<R: Rng>(&self, temperatures: &[f64], num_chars: usize, rng: &mut R) -> Result<Vec<(f64, String)>> {
		temperatures
			.iter()
			.map(|&temperature| -> Result<(f64, String)> {
				let request = GenerationRequest { temperature, start_seed: StartSeed::Random, num_chars };
				Ok((temperature, self.generate(&request, rng)?))
			})
			.collect()
	}

	fn resolve_seed<R: Rng>(&self, start_seed: &StartSeed, rng: &mut R) -> Result<String> {
		match start_seed {
			StartSeed::Custom(seed) => {
				let len = seed.chars().count();
				if len < self.window_length {
					return Err(Error::InvalidSeed { min_len: self.window_length, len });
				}
				Ok(seed.clone())
			}
			StartSeed::Random => self.corpus.ok_or(Error::MissingCorpus)?.random_window(self.window_length, rng),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ndarray::ArrayView2;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	/// Returns a fixed vector regardless of the window.
	struct Fixed(Vec<f64>);

	impl Oracle for Fixed {
		fn distribution(&self, _window: ArrayView2<'_, f32>) -> Result<Vec<f64>> {
			Ok(self.0.clone())
		}
	}

	fn custom(seed: &str, num_chars: usize) -> GenerationRequest {
		GenerationRequest { temperature: 0.5, start_seed: StartSeed::Custom(seed.to_owned()), num_chars }
	}

	#[test]
	fn greedy_oracle_repeats_its_favourite() {
		let vocab = Vocabulary::from_text("abcdefgh");
		let favourite = vocab.label_of('e').unwrap();
		let size = vocab.len();
		let oracle = |_window: ArrayView2<'_, f32>| -> Result<Vec<f64>> {
			Ok((0..size).map(|i| if i == favourite { 0.97 } else { 0.01 }).collect())
		};
		let generator = Generator::new(&oracle, &vocab, 8).unwrap();
		let mut rng = StdRng::seed_from_u64(5);

		let request = GenerationRequest { temperature: 1e-6, ..custom("abcdefgh", 12) };
		assert_eq!(generator.generate(&request, &mut rng).unwrap(), "abcdefgheeee");
	}

	#[test]
	fn longer_seed_keeps_its_tail_as_window() {
		let vocab = Vocabulary::from_text("abcxyz");
		let seen = std::cell::RefCell::new(Vec::new());
		let oracle = |window: ArrayView2<'_, f32>| -> Result<Vec<f64>> {
			seen.borrow_mut().push(crate::text::encoding::decode_window(&vocab, window)?);
			Ok((0..vocab.len()).map(|i| if i == 0 { 0.97 } else { 0.01 }).collect())
		};
		let generator = Generator::new(&oracle, &vocab, 3).unwrap();
		let mut rng = StdRng::seed_from_u64(5);

		let text = generator.generate(&custom("xyzabc", 9), &mut rng).unwrap();
		assert!(text.starts_with("xyzabc"));
		assert_eq!(text.chars().count(), 9);
		assert_eq!(seen.borrow()[0], "abc");
		assert_eq!(seen.borrow().len(), 3);
	}

	#[test]
	fn short_target_returns_seed() {
		let vocab = Vocabulary::from_text("abc");
		let oracle = Fixed(vec![]);
		let generator = Generator::new(&oracle, &vocab, 2).unwrap();
		let mut rng = StdRng::seed_from_u64(0);

		// The oracle is never asked
		assert_eq!(generator.generate(&custom("abcabc", 3), &mut rng).unwrap(), "abcabc");
	}

	#[test]
	fn wrong_distribution_size() {
		let vocab = Vocabulary::from_text("abc");
		let oracle = Fixed(vec![0.5, 0.5]);
		let generator = Generator::new(&oracle, &vocab, 2).unwrap();
		let mut rng = StdRng::seed_from_u64(0);

		assert!(matches!(
			generator.generate(&custom("ab", 5), &mut rng),
			Err(Error::DistributionSize { expected: 3, got: 2 })
		));
	}

	#[test]
	fn misbehaving_oracle_is_a_domain_error() {
		let vocab = Vocabulary::from_text("abc");
		let oracle = Fixed(vec![0.5, 0.0, 0.5]);
		let generator = Generator::new(&oracle, &vocab, 2).unwrap();
		let mut rng = StdRng::seed_from_u64(0);

		assert!(matches!(generator.generate(&custom("ab", 5), &mut rng), Err(Error::Domain { index: 1, .. })));
	}

	#[test]
	fn bad_temperature_before_seed_checks() {
		let vocab = Vocabulary::from_text("abc");
		let oracle = Fixed(vec![1.0, 1.0, 1.0]);
		let generator = Generator::new(&oracle, &vocab, 8).unwrap();
		let mut rng = StdRng::seed_from_u64(0);

		let request = GenerationRequest { temperature: 0.0, ..custom("ab", 20) };
		assert!(matches!(generator.generate(&request, &mut rng), Err(Error::InvalidTemperature(_))));
	}

	#[test]
	fn seed_outside_vocabulary() {
		let vocab = Vocabulary::from_text("abc");
		let oracle = Fixed(vec![1.0, 1.0, 1.0]);
		let generator = Generator::new(&oracle, &vocab, 2).unwrap();
		let mut rng = StdRng::seed_from_u64(0);

		assert!(matches!(generator.generate(&custom("az", 5), &mut rng), Err(Error::UnknownCharacter('z'))));
	}

	#[test]
	fn random_seed_needs_a_corpus() {
		let vocab = Vocabulary::from_text("abc");
		let oracle = Fixed(vec![1.0, 1.0, 1.0]);
		let generator = Generator::new(&oracle, &vocab, 2).unwrap();
		let mut rng = StdRng::seed_from_u64(0);

		let request = GenerationRequest { temperature: 1.0, start_seed: StartSeed::Random, num_chars: 5 };
		assert!(matches!(generator.generate(&request, &mut rng), Err(Error::MissingCorpus)));
	}

	#[test]
	fn zero_window_length() {
		let vocab = Vocabulary::from_text("abc");
		let oracle = Fixed(vec![1.0, 1.0, 1.0]);
		assert!(matches!(Generator::new(&oracle, &vocab, 0), Err(Error::InvalidWindowLength)));
	}

	#[test]
	fn preview_one_text_per_temperature() {
		let corpus = Corpus::from_text("abcabcabcabc");
		let vocab = corpus.vocabulary();
		let oracle = Fixed(vec![1.0, 2.0, 3.0]);
		let generator = Generator::new(&oracle, &vocab, 4).unwrap().with_corpus(&corpus);
		let mut rng = StdRng::seed_from_u64(11);

		let preview = generator.preview(&[0.2, 0.5, 1.0, 1.2], 10, &mut rng).unwrap();
		assert_eq!(preview.iter().map(|(t, _)| *t).collect::<Vec<_>>(), vec![0.2, 0.5, 1.0, 1.2]);
		for (_, text) in preview {
			assert_eq!(text.chars().count(), 10);
			assert!(corpus.text().contains(&text.chars().take(4).collect::<String>()));
		}
	}
}
