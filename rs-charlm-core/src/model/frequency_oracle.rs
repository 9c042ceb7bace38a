use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use log::{debug, info, warn};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::build_output_path;
use crate::text::corpus::Corpus;
use crate::text::encoding::decode_labels;
use crate::text::vocabulary::Vocabulary;
use super::ngram_model::NGramModel;
use super::oracle::Oracle;

/// Count-based oracle over every context length up to the window length.
///
/// For a window of `W` labels, the longest context that was observed in the
/// corpus decides the distribution (orders `W+1` down to `2`), falling back
/// to unigram counts. Counts are additively smoothed:
///
/// `p_c = (count_c + α) / (total + α·V)`
///
/// # Responsibilities
/// - Count transitions for every order, in parallel
/// - Answer next-label distributions for encoded windows
/// - Merge with another oracle built over the same vocabulary and order
/// - Persist itself as a compact binary cache (`postcard`)
///
/// # Invariants
/// - `max_n >= 2` and `ngrams` holds exactly the orders `2..=max_n`
/// - `smoothing > 0`, so every returned entry is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FrequencyOracle {
	/// Vocabulary chars in label order, used to validate caches and merges.
	symbols: Vec<char>,

	/// Fingerprint of the counted corpus (`0` until built).
	corpus_fingerprint: u64,

	/// Largest order (window length + 1).
	max_n: usize,

	/// Additive smoothing `α`.
	smoothing: f64,

	/// Label occurrence counts (order 1).
	unigrams: Vec<usize>,

	ngrams: BTreeMap<usize, NGramModel>,
}

impl FrequencyOracle {
	/// Creates an oracle with no observations (uniform answers).
	///
	/// # Errors
	/// - [`Error::InvalidWindowLength`] if `window_length == 0`
	/// - [`Error::InvalidSmoothing`] if `smoothing` is not finite and `> 0`
	pub fn new(vocabulary: &Vocabulary, window_length: usize, smoothing: f64) -> Result<Self> {
		if window_length == 0 {
			return Err(Error::InvalidWindowLength);
		}
		if !smoothing.is_finite() || smoothing <= 0.0 {
			return Err(Error::InvalidSmoothing(smoothing));
		}

		let max_n = window_length + 1;
		let mut ngrams = BTreeMap::new();
		for n in 2..=max_n {
			ngrams.insert(n, NGramModel::new(n)?);
		}

		Ok(Self {
			symbols: vocabulary.chars().to_vec(),
			corpus_fingerprint: 0,
			max_n,
			smoothing,
			unigrams: vec![0; vocabulary.len()],
			ngrams,
		})
	}

	/// Counts the whole corpus.
	///
	/// The label sequence is split into `cpus * 8` target ranges; each range is
	/// counted by its own thread into a partial oracle, and the partial
	/// oracles are merged as they come back over a channel.
	///
	/// # Errors
	/// [`Error::UnknownCharacter`] if the corpus holds a char outside
	/// `vocabulary`, plus the errors of [`FrequencyOracle::new`].
	pub fn build(corpus: &Corpus, vocabulary: &Vocabulary, window_length: usize, smoothing: f64) -> Result<Self> {
		let template = Self::new(vocabulary, window_length, smoothing)?;
		let labels: Vec<usize> = corpus
			.chars()
			.iter()
			.map(|&c| vocabulary.try_label_of(c))
			.collect::<Result<_>>()?;

		let chunks = num_cpus::get() * 8;
		let chunk_size = labels.len().div_ceil(chunks).max(1);
		debug!("Counting {} labels in chunks of {}", labels.len(), chunk_size);

		let mut oracle = template.clone();
		thread::scope(|scope| -> Result<()> {
			let (tx, rx) = mpsc::channel();
			for start in (0..labels.len()).step_by(chunk_size) {
				let tx = tx.clone();
				let mut partial = template.clone();
				let labels = &labels;
				let targets = start..(start + chunk_size).min(labels.len());

				scope.spawn(move || {
					partial.add_labels(labels, targets);
					// The receiver outlives every worker
					let _ = tx.send(partial);
				});
			}
			drop(tx);

			for partial in rx.iter() {
				oracle.merge(&partial)?;
			}
			Ok(())
		})?;

		oracle.corpus_fingerprint = corpus.fingerprint();
		info!(
			"Built frequency oracle: {} labels, {} symbols, {} contexts over orders 2..={}",
			labels.len(),
			oracle.symbols.len(),
			oracle.ngrams.values().map(NGramModel::len).sum::<usize>(),
			oracle.max_n
		);
		Ok(oracle)
	}

	/// Loads the oracle from `cache_path` if it was built from the same
	/// corpus, vocabulary, window length and smoothing; otherwise builds it
	/// from `corpus` and overwrites the cache. An unreadable cache is rebuilt.
	///
	/// # Errors
	/// I/O errors reading or writing the cache, plus the errors of
	/// [`FrequencyOracle::build`].
	pub fn load_or_build<P: AsRef<Path>>(
		cache_path: P,
		corpus: &Corpus,
		vocabulary: &Vocabulary,
		window_length: usize,
		smoothing: f64,
	) -> Result<Self> {
		let cache_path = cache_path.as_ref();
		if cache_path.exists() {
			let bytes = std::fs::read(cache_path)?;
			match postcard::from_bytes::<Self>(&bytes) {
				Ok(cached) if cached.matches(corpus, vocabulary, window_length, smoothing) => {
					info!("Loaded frequency oracle from {}", cache_path.display());
					return Ok(cached);
				}
				Ok(_) => warn!("Stale frequency oracle cache {}, rebuilding", cache_path.display()),
				Err(e) => warn!("Unreadable frequency oracle cache {} ({e}), rebuilding", cache_path.display()),
			}
		}

		let oracle = Self::build(corpus, vocabulary, window_length, smoothing)?;
		oracle.save(cache_path)?;
		Ok(oracle)
	}

	/// Writes the oracle to `path` with `postcard`.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(path.as_ref(), bytes)?;
		debug!("Saved frequency oracle to {}", path.as_ref().display());
		Ok(())
	}

	/// Default cache location for a corpus directory: `data` → `data.bin`.
	pub fn cache_path<P: AsRef<Path>>(corpus_dir: P) -> Result<PathBuf> {
		Ok(build_output_path(corpus_dir, "bin")?)
	}

	/// Window length this oracle expects.
	pub fn window_length(&self) -> usize {
		self.max_n - 1
	}

	pub fn vocab_size(&self) -> usize {
		self.symbols.len()
	}

	pub fn smoothing(&self) -> f64 {
		self.smoothing
	}

	fn matches(&self, corpus: &Corpus, vocabulary: &Vocabulary, window_length: usize, smoothing: f64) -> bool {
		self.corpus_fingerprint == corpus.fingerprint()
			&& self.symbols == vocabulary.chars()
			&& self.max_n == window_length + 1
			&& self.smoothing == smoothing
	}

	/// Counts every target position in `targets` for all orders.
	fn add_labels(&mut self, labels: &[usize], targets: Range<usize>) {
		for &label in &labels[targets.start.min(labels.len())..targets.end.min(labels.len())] {
			if let Some(slot) = self.unigrams.get_mut(label) {
				*slot += 1;
			}
		}
		for model in self.ngrams.values_mut() {
			model.add_labels(labels, targets.clone());
		}
	}

	/// Merges another oracle into this one.
	///
	/// # Errors
	/// [`Error::ModelMismatch`] if the vocabularies or orders differ.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.symbols != other.symbols {
			return Err(Error::ModelMismatch("vocabularies differ".to_owned()));
		}
		if self.max_n != other.max_n {
			return Err(Error::ModelMismatch(format!("max order {} vs {}", self.max_n, other.max_n)));
		}

		for (slot, count) in self.unigrams.iter_mut().zip(&other.unigrams) {
			*slot += count;
		}
		for (n, model) in &other.ngrams {
			match self.ngrams.get_mut(n) {
				Some(existing) => existing.merge(model)?,
				None => {
					self.ngrams.insert(*n, model.clone());
				}
			}
		}

		Ok(())
	}

	/// Counts for the longest observed context ending the window.
	fn backoff_counts(&self, labels: &[usize]) -> (Vec<usize>, usize) {
		let v = self.symbols.len();
		let longest = labels.len().min(self.max_n - 1);

		for context in (1..=longest).rev() {
			let key = &labels[labels.len() - context..];
			let state = self.ngrams.get(&(context + 1)).and_then(|model| model.state(key));
			if let Some(state) = state {
				let total = state.total();
				if total > 0 {
					return (state.counts(v), total);
				}
			}
		}

		(self.unigrams.clone(), self.unigrams.iter().sum())
	}
}

impl Oracle for FrequencyOracle {
	fn distribution(&self, window: ArrayView2<'_, f32>) -> Result<Vec<f64>> {
		let v = self.symbols.len();
		let labels = decode_labels(window, v)?;
		let (counts, total) = self.backoff_counts(&labels);

		let denominator = total as f64 + self.smoothing * v as f64;
		Ok(counts.iter().map(|&c| (c as f64 + self.smoothing) / denominator).collect())
	}
}
