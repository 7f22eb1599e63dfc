//! Similarity functions for partial matching.
//!
//! All functions here are pure and stateless; they never touch the agent or
//! the instance store. The builders (`bounded_linear_similarity`,
//! `bounded_quadratic_similarity`) clamp out-of-range input instead of
//! failing, and log the clamp through the [`log`] facade rather than
//! returning an error, mirroring how a caller would actually want to use
//! them mid-simulation.

use crate::error::SimilarityError;
use crate::value::Value;
use std::rc::Rc;

/// A registered per-attribute similarity function.
///
/// Takes the query value and the stored instance's value (in that order)
/// and returns a similarity in `[0, 1]`, or an error if the values are not
/// comparable this way.
pub type SimilarityFn = Rc<dyn Fn(&Value, &Value) -> Result<f64, SimilarityError>>;

/// Build a [`SimilarityFn`] that always returns `1.0`, used when an
/// attribute is registered for partial matching with no discrimination
/// (the "always 1" flag in [`crate::agent::Agent::similarity`]).
#[must_use]
pub fn always_one() -> SimilarityFn {
	Rc::new(|_, _| Ok(1.0))
}

/// Wrap a numeric similarity function so it can be registered against
/// [`Value`]-typed attributes, rejecting non-numeric pairs.
#[must_use]
pub fn numeric(f: impl Fn(f64, f64) -> Result<f64, SimilarityError> + 'static) -> SimilarityFn {
	Rc::new(move |q, i| {
		let (x, y) = (
			q.as_f64().ok_or(SimilarityError::NotNumeric)?,
			i.as_f64().ok_or(SimilarityError::NotNumeric)?,
		);
		f(x, y)
	})
}

/// `min(|x|, |y|) / max(|x|, |y|)`, for attributes where only the ratio of
/// magnitudes matters. Both arguments must be strictly positive.
///
/// # Errors
///
/// Returns [`SimilarityError::NonPositive`] if either argument is `<= 0`.
pub fn positive_linear_similarity(x: f64, y: f64) -> Result<f64, SimilarityError> {
	if x <= 0.0 || y <= 0.0 {
		return Err(SimilarityError::NonPositive(x, y));
	}
	let (lo, hi) = if x < y { (x, y) } else { (y, x) };
	Ok(lo / hi)
}

/// The square of [`positive_linear_similarity`], sharpening the falloff for
/// small ratio mismatches.
///
/// # Errors
///
/// Returns [`SimilarityError::NonPositive`] if either argument is `<= 0`.
pub fn positive_quadratic_similarity(x: f64, y: f64) -> Result<f64, SimilarityError> {
	positive_linear_similarity(x, y).map(|s| s * s)
}

/// `1 - |x - y| / (hi - lo)`, clamped to `[0, 1]` and a warning logged if
/// either `x` or `y` falls outside `[lo, hi]`.
#[must_use]
pub fn bounded_linear_similarity(lo: f64, hi: f64) -> impl Fn(f64, f64) -> f64 {
	move |x, y| {
		warn_if_out_of_bounds(x, y, lo, hi);
		let span = hi - lo;
		(1.0 - (x - y).abs() / span).clamp(0.0, 1.0)
	}
}

/// The square of [`bounded_linear_similarity`].
#[must_use]
pub fn bounded_quadratic_similarity(lo: f64, hi: f64) -> impl Fn(f64, f64) -> f64 {
	let linear = bounded_linear_similarity(lo, hi);
	move |x, y| {
		let s = linear(x, y);
		s * s
	}
}

fn warn_if_out_of_bounds(x: f64, y: f64, lo: f64, hi: f64) {
	if !(lo..=hi).contains(&x) {
		log::warn!("bounded similarity argument {x} outside [{lo}, {hi}], clamping");
	}
	if !(lo..=hi).contains(&y) {
		log::warn!("bounded similarity argument {y} outside [{lo}, {hi}], clamping");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn positive_linear_is_symmetric_and_unit_at_equality() {
		assert!((positive_linear_similarity(3.0, 3.0).unwrap() - 1.0).abs() < 1e-12);
		let a = positive_linear_similarity(2.0, 8.0).unwrap();
		let b = positive_linear_similarity(8.0, 2.0).unwrap();
		assert!((a - b).abs() < 1e-12);
		assert!((a - 0.25).abs() < 1e-12);
	}

	#[test]
	fn positive_linear_rejects_nonpositive() {
		assert!(matches!(
			positive_linear_similarity(-1.0, 2.0),
			Err(SimilarityError::NonPositive(..))
		));
		assert!(matches!(
			positive_linear_similarity(0.0, 2.0),
			Err(SimilarityError::NonPositive(..))
		));
	}

	#[test]
	fn positive_quadratic_is_linear_squared() {
		let linear = positive_linear_similarity(2.0, 8.0).unwrap();
		let quad = positive_quadratic_similarity(2.0, 8.0).unwrap();
		assert!((quad - linear * linear).abs() < 1e-12);
	}

	#[test]
	fn bounded_linear_clamps_out_of_range() {
		let f = bounded_linear_similarity(0.0, 1.0);
		assert!((f(-2.0, 1.0) - 0.0).abs() < 1e-12);
		assert!((f(0.5, 0.5) - 1.0).abs() < 1e-12);
	}

	#[test]
	fn bounded_quadratic_matches_square_of_linear() {
		let linear = bounded_linear_similarity(0.0, 10.0);
		let quad = bounded_quadratic_similarity(0.0, 10.0);
		let l = linear(2.0, 6.0);
		assert!((quad(2.0, 6.0) - l * l).abs() < 1e-12);
	}
}
