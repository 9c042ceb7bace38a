use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A context in an n-gram table.
///
/// A `State` corresponds to a fixed (n-1)-label context (`key`) and stores
/// every observed transition from this context to the next label.
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct State {
	/// Context labels, oldest first.
	key: Vec<usize>,
	/// Outgoing transitions indexed by the next label.
	/// Example: { 4 => 42, 0 => 3 }
	transitions: HashMap<usize, usize>,
}

impl State {
	pub(crate) fn new(key: &[usize]) -> Self {
		Self {
			key: key.to_vec(),
			transitions: HashMap::new(),
		}
	}

	/// Records an occurrence of a transition toward `next`.
	pub(crate) fn add_transition(&mut self, next: usize) {
		*self.transitions.entry(next).or_insert(0) += 1;
	}

	/// Total number of observed transitions.
	pub(crate) fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Returns the count of each label, indexed by label.
	///
	/// Labels `>= vocab_size` are ignored.
	pub(crate) fn counts(&self, vocab_size: usize) -> Vec<usize> {
		let mut counts = vec![0; vocab_size];
		for (&label, &occurrence) in &self.transitions {
			if let Some(slot) = counts.get_mut(label) {
				*slot += occurrence;
			}
		}
		counts
	}

	/// Merges another state into this one, summing occurrence counts.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub(crate) fn merge(&mut self, other: &Self) -> Result<()> {
		if self.key != other.key {
			return Err(Error::ModelMismatch(format!("key {:?} vs {:?}", self.key, other.key)));
		}

		for (&next, &occurrence) in &other.transitions {
			*self.transitions.entry(next).or_insert(0) += occurrence;
		}

		Ok(())
	}
}
