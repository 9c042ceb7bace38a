use ndarray::{Array2, Array3, ArrayView1, ArrayView2};

use crate::error::{Error, Result};
use super::corpus::Corpus;
use super::vocabulary::Vocabulary;

/// One-hot encodes a window into a `W × V` matrix.
///
/// Row `t` holds a single `1.0` at the label of the `t`-th char.
///
/// # Errors
/// [`Error::UnknownCharacter`] if any char is outside the vocabulary.
pub fn encode_window(vocabulary: &Vocabulary, window: &[char]) -> Result<Array2<f32>> {
	let mut matrix = Array2::zeros((window.len(), vocabulary.len()));
	for (t, &c) in window.iter().enumerate() {
		matrix[[t, vocabulary.try_label_of(c)?]] = 1.0;
	}
	Ok(matrix)
}

/// Returns the column of the largest entry in `row`.
///
/// Ties resolve to the lowest column. Returns `None` for an empty row or a
/// row with no positive entry.
pub(crate) fn argmax(row: ArrayView1<'_, f32>) -> Option<usize> {
	let mut best: Option<(usize, f32)> = None;
	for (i, &value) in row.iter().enumerate() {
		if value > 0.0 && best.is_none_or(|(_, b)| value > b) {
			best = Some((i, value));
		}
	}
	best.map(|(i, _)| i)
}

/// Decodes a window matrix back to labels (arg-max of each row).
///
/// # Errors
/// [`Error::InvalidEncoding`] if the column count is not `vocab_size` or a
/// row has no active column.
pub(crate) fn decode_labels(matrix: ArrayView2<'_, f32>, vocab_size: usize) -> Result<Vec<usize>> {
	if matrix.ncols() != vocab_size {
		return Err(Error::InvalidEncoding(format!(
			"expected {} columns, got {}",
			vocab_size,
			matrix.ncols()
		)));
	}

	matrix
		.rows()
		.into_iter()
		.enumerate()
		.map(|(t, row)| argmax(row).ok_or_else(|| Error::InvalidEncoding(format!("row {t} has no active column"))))
		.collect()
}

/// Decodes a window matrix back to text.
pub fn decode_window(vocabulary: &Vocabulary, matrix: ArrayView2<'_, f32>) -> Result<String> {
	decode_labels(matrix, vocabulary.len())?
		.into_iter()
		.map(|label| vocabulary.try_char_of(label))
		.collect()
}

/// A window paired with the character that follows it in the corpus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainingPair {
	pub window: Vec<char>,
	pub next: char,
}

/// Supervised training examples cut from a corpus.
///
/// Windows start every `step` chars: `0, step, 2*step, ...` while a
/// successor exists, i.e. for every start `i < len - window_length`.
#[derive(Clone, Debug)]
pub struct TrainingSet {
	window_length: usize,
	pairs: Vec<TrainingPair>,
}

impl TrainingSet {
	/// Cuts `(window, next)` pairs out of the corpus.
	///
	/// A corpus with `window_length` chars or fewer yields an empty set.
	///
	/// # Errors
	/// - [`Error::InvalidWindowLength`] if `window_length == 0`
	/// - [`Error::InvalidStep`] if `step == 0`
	pub fn from_corpus(corpus: &Corpus, window_length: usize, step: usize) -> Result<Self> {
		if window_length == 0 {
			return Err(Error::InvalidWindowLength);
		}
		if step == 0 {
			return Err(Error::InvalidStep);
		}

		let chars = corpus.chars();
		let pairs = (0..chars.len().saturating_sub(window_length))
			.step_by(step)
			.map(|i| TrainingPair {
				window: chars[i..i + window_length].to_vec(),
				next: chars[i + window_length],
			})
			.collect();

		Ok(Self { window_length, pairs })
	}

	pub fn window_length(&self) -> usize {
		self.window_length
	}

	pub fn pairs(&self) -> &[TrainingPair] {
		&self.pairs
	}

	pub fn len(&self) -> usize {
		self.pairs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pairs.is_empty()
	}

	/// Encodes every pair.
	///
	/// Returns `(x, y)` where `x` has shape `N × W × V` (one one-hot matrix
	/// per window) and `y` has shape `N × V` (one one-hot row per successor).
	pub fn encode(&self, vocabulary: &Vocabulary) -> Result<(Array3<f32>, Array2<f32>)> {
		let v = vocabulary.len();
		let mut x = Array3::zeros((self.pairs.len(), self.window_length, v));
		let mut y = Array2::zeros((self.pairs.len(), v));

		for (i, pair) in self.pairs.iter().enumerate() {
			for (t, &c) in pair.window.iter().enumerate() {
				x[[i, t, vocabulary.try_label_of(c)?]] = 1.0;
			}
			y[[i, vocabulary.try_label_of(pair.next)?]] = 1.0;
		}

		Ok((x, y))
	}
}
