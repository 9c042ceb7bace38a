use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use super::state::State;

/// Transition counts for a fixed order `n` over label sequences.
///
/// Stores one `State` per observed context of length `n-1`.
///
/// # Invariants
/// - `n` is always >= 2
/// - Each state in `states` corresponds to a unique context of length `n-1`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct NGramModel {
	/// The order of the model (context length + 1)
	n: usize,

	states: HashMap<Vec<usize>, State>,
}

impl NGramModel {
	/// # Errors
	/// Returns an error if `n < 2`.
	pub(crate) fn new(n: usize) -> Result<Self> {
		if n < 2 {
			return Err(Error::InvalidWindowLength);
		}
		Ok(Self { n, states: HashMap::new() })
	}

	/// Counts every n-gram of `labels` whose last label sits in `targets`.
	///
	/// Targets without a full context (`t < n - 1`) are skipped.
	pub(crate) fn add_labels(&mut self, labels: &[usize], targets: Range<usize>) {
		let context = self.n - 1;
		for t in targets.start.max(context)..targets.end.min(labels.len()) {
			let key = &labels[t - context..t];
			self.states
				.entry(key.to_vec())
				.or_insert_with(|| State::new(key))
				.add_transition(labels[t]);
		}
	}

	/// Returns the state of `key`, if that context was observed.
	pub(crate) fn state(&self, key: &[usize]) -> Option<&State> {
		self.states.get(key)
	}

	pub(crate) fn len(&self) -> usize {
		self.states.len()
	}

	/// Merges another table of the same order into this one.
	pub(crate) fn merge(&mut self, other: &Self) -> Result<()> {
		if self.n != other.n {
			return Err(Error::ModelMismatch(format!("order {} vs {}", self.n, other.n)));
		}

		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state)?;
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}

		Ok(())
	}
}
