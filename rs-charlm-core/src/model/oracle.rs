use ndarray::ArrayView2;

use crate::error::Result;

/// A source of next-character distributions.
///
/// Given the one-hot encoding of a window (`W × V`), returns `V` strictly
/// positive scores, one per vocabulary label. Scores need not sum to 1.
///
/// Implementations are expected to be pure from the generator's point of
/// view: the same window may be queried any number of times.
pub trait Oracle {
	fn distribution(&self, window: ArrayView2<'_, f32>) -> Result<Vec<f64>>;
}

impl<F> Oracle for F
where
	F: Fn(ArrayView2<'_, f32>) -> Result<Vec<f64>>,
{
	fn distribution(&self, window: ArrayView2<'_, f32>) -> Result<Vec<f64>> {
		self(window)
	}
}
