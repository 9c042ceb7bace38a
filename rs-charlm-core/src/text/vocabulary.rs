use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Character vocabulary with a dense label bijection.
///
/// # Responsibilities
/// - Collect the distinct characters of a text
/// - Map characters to labels and labels back to characters
///
/// # Invariants
/// - Labels are exactly `0..len()`, assigned in ascending character order,
///   so two vocabularies built from the same character set are identical
/// - `char_to_label` and `chars` are mutually inverse
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Vocabulary {
	/// Characters indexed by label.
	chars: Vec<char>,

	/// Reverse mapping from character to label.
	char_to_label: HashMap<char, usize>,
}

impl Vocabulary {
	/// Builds the vocabulary of all distinct characters in `text`.
	pub fn from_text(text: &str) -> Self {
		Self::from_chars(text.chars())
	}

	/// Builds a vocabulary from any character iterator (duplicates are ignored).
	pub fn from_chars<I: IntoIterator<Item = char>>(chars: I) -> Self {
		let chars: Vec<char> = chars.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
		let char_to_label = chars.iter().enumerate().map(|(label, &c)| (c, label)).collect();
		Self { chars, char_to_label }
	}

	/// Number of distinct characters (`V`).
	pub fn len(&self) -> usize {
		self.chars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chars.is_empty()
	}

	/// Characters in label order.
	pub fn chars(&self) -> &[char] {
		&self.chars
	}

	pub fn contains(&self, c: char) -> bool {
		self.char_to_label.contains_key(&c)
	}

	/// Returns the label of `c`, or `None` if it was never seen.
	pub fn label_of(&self, c: char) -> Option<usize> {
		self.char_to_label.get(&c).copied()
	}

	/// Returns the character carrying `label`, or `None` if out of range.
	pub fn char_of(&self, label: usize) -> Option<char> {
		self.chars.get(label).copied()
	}

	/// Same as [`Vocabulary::label_of`] but fails with [`Error::UnknownCharacter`].
	pub fn try_label_of(&self, c: char) -> Result<usize> {
		self.label_of(c).ok_or(Error::UnknownCharacter(c))
	}

	/// Same as [`Vocabulary::char_of`] but fails with [`Error::UnknownLabel`].
	pub fn try_char_of(&self, label: usize) -> Result<char> {
		self.char_of(label).ok_or(Error::UnknownLabel(label))
	}

	/// Converts a text into its label sequence.
	///
	/// # Errors
	/// Fails on the first character outside the vocabulary.
	pub fn labels(&self, text: &str) -> Result<Vec<usize>> {
		text.chars().map(|c| self.try_label_of(c)).collect()
	}
}
