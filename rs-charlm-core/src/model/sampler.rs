use rand::Rng;

use crate::error::{Error, Result};

/// Checks that `temperature` is usable as a divisor.
pub(crate) fn check_temperature(temperature: f64) -> Result<()> {
	if !temperature.is_finite() || temperature <= 0.0 {
		return Err(Error::InvalidTemperature(temperature));
	}
	Ok(())
}

/// Applies the temperature transform to a distribution.
///
/// Computes `p_i = exp(ln(d_i) / T) / Σ_j exp(ln(d_j) / T)`. The largest
/// log value is subtracted before dividing by `T`, so every scaled value is
/// `<= 0` (the arg-max is exactly 0) and tiny temperatures collapse onto the
/// arg-max instead of producing `inf - inf`.
///
/// # Errors
/// - [`Error::InvalidTemperature`] if `temperature` is not finite and `> 0`
///   (checked first)
/// - [`Error::EmptyDistribution`] if `distribution` is empty
/// - [`Error::Domain`] on the first entry that is `<= 0` or not finite
pub fn reweight(distribution: &[f64], temperature: f64) -> Result<Vec<f64>> {
	check_temperature(temperature)?;
	if distribution.is_empty() {
		return Err(Error::EmptyDistribution);
	}

	let mut logs = Vec::with_capacity(distribution.len());
	for (index, &value) in distribution.iter().enumerate() {
		if !value.is_finite() || value <= 0.0 {
			return Err(Error::Domain { index, value });
		}
		logs.push(value.ln());
	}

	let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
	let mut weights: Vec<f64> = logs.iter().map(|l| ((l - max) / temperature).exp()).collect();
	// The arg-max term is exp(0) = 1, so the sum is at least 1
	let sum: f64 = weights.iter().sum();
	weights.iter_mut().for_each(|w| *w /= sum);

	Ok(weights)
}

/// Draws a label from `distribution` reshaped by `temperature`.
///
/// Low temperatures approach the arg-max of `distribution`, high
/// temperatures approach a uniform choice.
///
/// The returned label is always in `[0, distribution.len())`.
///
/// # Errors
/// Same as [`reweight`].
pub fn sample<R: Rng>(distribution: &[f64], temperature: f64, rng: &mut R) -> Result<usize> {
	let probabilities = reweight(distribution, temperature)?;

	// Cumulative subtraction over the buckets
	let mut r: f64 = rng.random();
	let mut fallback = 0;
	for (label, &p) in probabilities.iter().enumerate() {
		if r < p {
			return Ok(label);
		}
		r -= p;
		if p > 0.0 {
			fallback = label;
		}
	}

	// Rounding left `r` just above the total mass
	Ok(fallback)
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn unit_temperature_normalizes() {
		let p = reweight(&[3.0, 1.0, 1.0, 4.0], 1.0).unwrap();
		let expected = [3.0 / 9.0, 1.0 / 9.0, 1.0 / 9.0, 4.0 / 9.0];
		for (a, b) in p.iter().zip(expected.iter()) {
			assert_relative_eq!(*a, *b, epsilon = 1e-12);
		}
	}

	#[test]
	fn temperature_is_a_power() {
		// exp(ln(d) / T) = d^(1/T)
		let p = reweight(&[3.0, 1.0, 1.0, 4.0], 2.3).unwrap();
		let raw: Vec<f64> = [3.0f64, 1.0, 1.0, 4.0].iter().map(|d| d.powf(1.0 / 2.3)).collect();
		let total: f64 = raw.iter().sum();
		for (a, b) in p.iter().zip(raw.iter()) {
			assert_relative_eq!(*a, b / total, epsilon = 1e-12);
		}
		assert_relative_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
	}

	#[test]
	fn tiny_temperature_does_not_overflow() {
		let p = reweight(&[0.1, 0.6, 0.3], 1e-6).unwrap();
		assert_eq!(p, vec![0.0, 1.0, 0.0]);
	}

	#[test]
	fn subnormal_temperature_is_one_hot() {
		let mut rng = StdRng::seed_from_u64(8);
		for (distribution, argmax) in [([0.5, 2.0], 1), ([0.2, 0.8], 1), ([0.9, 0.3], 0)] {
			let mut expected = vec![0.0; 2];
			expected[argmax] = 1.0;
			assert_eq!(reweight(&distribution, 1e-309).unwrap(), expected);
			for _ in 0..100 {
				assert_eq!(sample(&distribution, 1e-309, &mut rng).unwrap(), argmax);
			}
		}
	}

	#[test]
	fn non_positive_entry_is_a_domain_error() {
		let mut rng = StdRng::seed_from_u64(0);
		let err = sample(&[0.5, 0.0, 0.3], 1.0, &mut rng).unwrap_err();
		assert!(matches!(err, Error::Domain { index: 1, .. }));

		let err = sample(&[0.5, -2.0], 1.0, &mut rng).unwrap_err();
		assert!(matches!(err, Error::Domain { index: 1, .. }));

		let err = sample(&[f64::NAN, 1.0], 1.0, &mut rng).unwrap_err();
		assert!(matches!(err, Error::Domain { index: 0, .. }));
	}

	#[test]
	fn temperature_is_checked_before_distribution() {
		let mut rng = StdRng::seed_from_u64(0);
		for t in [0.0, -1.0, f64::NAN, f64::INFINITY] {
			assert!(matches!(sample(&[0.5, 0.0], t, &mut rng), Err(Error::InvalidTemperature(_))));
		}
	}

	#[test]
	fn empty_distribution() {
		let mut rng = StdRng::seed_from_u64(0);
		assert!(matches!(sample(&[], 1.0, &mut rng), Err(Error::EmptyDistribution)));
	}

	#[test]
	fn label_is_in_range() {
		let mut rng = StdRng::seed_from_u64(3);
		let distribution = [0.2, 0.2, 0.2, 0.2, 0.2];
		for _ in 0..1_000 {
			assert!(sample(&distribution, 0.8, &mut rng).unwrap() < distribution.len());
		}
	}

	#[test]
	fn low_temperature_picks_argmax() {
		let mut rng = StdRng::seed_from_u64(42);
		let distribution = [0.1, 0.25, 0.4, 0.25];
		let draws = 1_000;
		let hits = (0..draws)
			.filter(|_| sample(&distribution, 1e-6, &mut rng).unwrap() == 2)
			.count();
		assert!(hits as f64 / draws as f64 > 0.99, "arg-max chosen {hits}/{draws} times");
	}

	#[test]
	fn high_temperature_is_nearly_uniform() {
		let mut rng = StdRng::seed_from_u64(42);
		let distribution = [0.1, 0.2, 0.3, 0.4];
		let draws = 10_000;
		let mut counts = [0usize; 4];
		for _ in 0..draws {
			counts[sample(&distribution, 100.0, &mut rng).unwrap()] += 1;
		}

		let expected = draws as f64 / counts.len() as f64;
		let chi_square: f64 = counts
			.iter()
			.map(|&observed| (observed as f64 - expected).powi(2) / expected)
			.sum();
		// 3 degrees of freedom, alpha = 0.001
		assert!(chi_square < 16.27, "chi-square {chi_square} for counts {counts:?}");
	}

	#[test]
	fn seeded_draws_are_reproducible() {
		let distribution = [0.3, 0.3, 0.4];
		let run = |seed| {
			let mut rng = StdRng::seed_from_u64(seed);
			(0..50).map(|_| sample(&distribution, 1.0, &mut rng).unwrap()).collect::<Vec<_>>()
		};
		assert_eq!(run(9), run(9));
	}
}
