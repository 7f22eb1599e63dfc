//! Base-level activation, partial-match mismatch penalties, activation
//! noise, and the retrieval-probability/blended-value combinators built
//! from them.
//!
//! ## Activation
//!
//! Base-level activation reflects recency and frequency of occurrence:
//!
//! ```text
//! B(I) = ln[ Σ_j (n - t_j)^(-d) ]
//! ```
//!
//! or, in optimized-learning mode (an O(1) approximation valid once `d <
//! 1`):
//!
//! ```text
//! B(I) = ln(k / (1 - d)) - d * ln(n - t_avg)
//! ```
//!
//! ## Partial matching
//!
//! A query with similarity-scored attributes contributes a mismatch
//! penalty on top of base-level activation:
//!
//! ```text
//! P(I) = mismatch_penalty * Σ_a w_a * (s_a(q.a, I.a) - 1)
//! ```
//!
//! which is always `<= 0` since each `s_a <= 1`.
//!
//! ## Retrieval probability and blending
//!
//! Instances compete for retrieval through a softmax over total
//! activation (base-level + mismatch + logistic noise) at temperature
//! `tau`. The blended value of an option is the occurrence-probability
//! weighted mean of its candidates' outcomes.

/// Smallest time-since-occurrence used in place of zero or negative gaps
/// (an instance occurring at exactly `now`), avoiding `ln(0)`/negative
/// bases.
pub const EPSILON: f64 = 1e-10;

/// Exact base-level activation from a full occurrence history.
///
/// `occurrences` need not be sorted; every entry is treated independently.
#[must_use]
pub fn base_level_activation(occurrences: &[u64], now: u64, decay: f64) -> f64 {
	let sum: f64 = occurrences
		.iter()
		.map(|&t| time_since(now, t).powf(-decay))
		.sum();
	sum.ln()
}

/// Optimized-learning base-level activation from an occurrence count and
/// mean occurrence time, valid only for `decay < 1`.
#[must_use]
pub fn base_level_activation_optimized(k: u32, t_avg: f64, now: u64, decay: f64) -> f64 {
	let dt = if (now as f64) > t_avg {
		now as f64 - t_avg
	} else {
		EPSILON
	};
	(f64::from(k) / (1.0 - decay)).ln() - decay * dt.ln()
}

fn time_since(now: u64, t: u64) -> f64 {
	if now > t {
		(now - t) as f64
	} else {
		EPSILON
	}
}

/// The partial-match mismatch penalty `mismatch_penalty * Σ w_a (s_a - 1)`.
/// Always `<= 0`.
#[must_use]
pub fn mismatch_penalty(mismatch_penalty: f64, weighted_similarities: &[(f64, f64)]) -> f64 {
	mismatch_penalty
		* weighted_similarities
			.iter()
			.map(|&(weight, similarity)| weight * (similarity - 1.0))
			.sum::<f64>()
}

/// Draw one sample from a logistic distribution with location `0` and
/// scale `noise`, via inverse-CDF transform: `noise * ln(u / (1 - u))`.
/// `noise` *is* the logistic scale parameter directly, with no unit
/// conversion.
pub fn logistic_noise(noise: f64, rng: &mut impl rand::Rng) -> f64 {
	if noise <= 0.0 {
		return 0.0;
	}
	let u: f64 = rng.gen_range(f64::EPSILON..1.0 - f64::EPSILON);
	noise * (u / (1.0 - u)).ln()
}

/// The softmax temperature implied by a `noise` parameter when no explicit
/// `temperature` was set: `noise * sqrt(2)`.
#[must_use]
pub fn temperature_from_noise(noise: f64) -> f64 {
	noise * std::f64::consts::SQRT_2
}

/// Retrieval probabilities for a set of total activations, via a
/// numerically stable softmax at temperature `tau`.
#[must_use]
pub fn retrieval_probabilities(activations: &[f64], tau: f64) -> Vec<f64> {
	if activations.is_empty() {
		return Vec::new();
	}
	let scaled: Vec<f64> = activations.iter().map(|a| a / tau).collect();
	let max = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
	let exps: Vec<f64> = scaled.iter().map(|s| (s - max).exp()).collect();
	let sum: f64 = exps.iter().sum();
	exps.iter().map(|e| e / sum).collect()
}

/// The blended value of a set of candidates: the probability-weighted mean
/// of their outcomes.
#[must_use]
pub fn blended_value(outcomes: &[f64], probabilities: &[f64]) -> f64 {
	outcomes
		.iter()
		.zip(probabilities)
		.map(|(o, p)| o * p)
		.sum()
}

/// Per-candidate activation breakdown, surfaced through
/// [`crate::diagnostics`] when `details`/`trace` are enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationBreakdown {
	/// The base-level term, before mismatch penalty or noise.
	pub base_level: f64,
	/// The partial-match mismatch penalty (`0.0` when partial matching is
	/// disabled or this candidate matched every attribute exactly).
	pub mismatch: f64,
	/// The noise draw added for this candidate.
	pub noise: f64,
	/// `base_level + mismatch + noise`.
	pub total: f64,
	/// This candidate's retrieval probability within its option's
	/// candidate set.
	pub retrieval_probability: f64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn base_level_matches_single_occurrence() {
		// One occurrence at t=0, now=1, decay=0.5: (1)^-0.5 = 1, ln(1) = 0.
		let b = base_level_activation(&[0], 1, 0.5);
		assert!((b - 0.0).abs() < 1e-9);
	}

	#[test]
	fn base_level_two_instance_worked_example() {
		// Matches the documented IBL worked example: instance reinforced
		// at t=0 and t=1, now=2, decay=0.5.
		let b = base_level_activation(&[0, 1], 2, 0.5);
		let expected = (2f64.powf(-0.5) + 1f64.powf(-0.5)).ln();
		assert!((b - expected).abs() < 1e-9);
	}

	#[test]
	fn worked_example_blended_value_is_4_142() {
		// Two candidates for decision "A": outcome 10 at t=0 (now=2), and
		// outcome 0 at t=1 (now=2). temperature=1, no noise, no mismatch.
		let b10 = base_level_activation(&[0], 2, 0.5);
		let b0 = base_level_activation(&[1], 2, 0.5);
		let probs = retrieval_probabilities(&[b10, b0], 1.0);
		let v = blended_value(&[10.0, 0.0], &probs);
		assert!((v - 4.142_135_623_730_951).abs() < 1e-9);
	}

	#[test]
	fn mismatch_penalty_is_nonpositive() {
		let p = mismatch_penalty(2.0, &[(1.0, 0.5), (0.5, 0.8)]);
		assert!(p <= 0.0);
	}

	#[test]
	fn zero_noise_is_deterministic() {
		let mut rng = rand::thread_rng();
		assert_eq!(logistic_noise(0.0, &mut rng), 0.0);
	}

	#[test]
	fn retrieval_probabilities_sum_to_one() {
		let probs = retrieval_probabilities(&[1.0, 2.0, 3.0], 0.5);
		let sum: f64 = probs.iter().sum();
		assert!((sum - 1.0).abs() < 1e-9);
	}

	#[test]
	fn optimized_learning_matches_exact_for_single_occurrence() {
		let exact = base_level_activation(&[0], 10, 0.5);
		let opt = base_level_activation_optimized(1, 0.0, 10, 0.5);
		assert!((exact - opt).abs() < 1e-9);
	}
}
