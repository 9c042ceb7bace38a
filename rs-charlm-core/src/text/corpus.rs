use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;

use log::debug;
use rand::Rng;

use crate::error::{Error, Result};
use crate::io::{list_files, normalize_folder, read_file};
use super::vocabulary::Vocabulary;

/// Concatenated training text.
///
/// Keeps both the raw text and its decoded characters so windows can be
/// sliced by character position (UTF-8 aware) without re-scanning.
#[derive(Clone, Debug)]
pub struct Corpus {
	text: String,
	chars: Vec<char>,
}

impl Corpus {
	/// Wraps an in-memory text.
	pub fn from_text(text: impl Into<String>) -> Self {
		let text = text.into();
		let chars = text.chars().collect();
		Self { text, chars }
	}

	/// Reads every file whole and joins their contents with `'\n'`.
	///
	/// # Errors
	/// - I/O errors from any file
	/// - [`Error::EmptyCorpus`] if `paths` is empty or every file is empty
	pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
		let mut contents = Vec::with_capacity(paths.len());
		for path in paths {
			debug!("Reading corpus file {}", path.as_ref().display());
			contents.push(read_file(path)?);
		}

		let corpus = Self::from_text(contents.join("\n"));
		if corpus.chars.iter().all(|&c| c == '\n') {
			return Err(Error::EmptyCorpus);
		}
		Ok(corpus)
	}

	/// Loads every file with `extension` directly contained in `dir`.
	///
	/// Files are read in name order so the corpus (and thus every random
	/// window drawn from it) is reproducible.
	pub fn from_dir<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Self> {
		let folder = normalize_folder(dir);
		let paths: Vec<_> = list_files(&folder, extension)?
			.into_iter()
			.map(|name| folder.join(name))
			.collect();
		Self::from_files(&paths)
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn chars(&self) -> &[char] {
		&self.chars
	}

	/// Length in characters.
	pub fn len(&self) -> usize {
		self.chars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chars.is_empty()
	}

	/// Content fingerprint, used to detect stale caches.
	pub fn fingerprint(&self) -> u64 {
		let mut hasher = DefaultHasher::new();
		self.chars.len().hash(&mut hasher);
		self.text.hash(&mut hasher);
		hasher.finish()
	}

	/// Builds the vocabulary of this corpus.
	pub fn vocabulary(&self) -> Vocabulary {
		Vocabulary::from_chars(self.chars.iter().copied())
	}

	/// Draws a window of `window_length` chars starting at a uniform offset
	/// in `[0, len - window_length - 1]`.
	///
	/// The last char is never a window start candidate, so every drawn
	/// window has a successor in the corpus.
	///
	/// # Errors
	/// - [`Error::InvalidWindowLength`] if `window_length == 0`
	/// - [`Error::CorpusTooShort`] if the corpus holds fewer than
	///   `window_length + 1` chars
	pub fn random_window<R: Rng>(&self, window_length: usize, rng: &mut R) -> Result<String> {
		if window_length == 0 {
			return Err(Error::InvalidWindowLength);
		}
		if self.chars.len() <= window_length {
			return Err(Error::CorpusTooShort { min_len: window_length + 1, len: self.chars.len() });
		}

		let start = rng.random_range(0..=self.chars.len() - window_length - 1);
		Ok(self.chars[start..start + window_length].iter().collect())
	}
}
