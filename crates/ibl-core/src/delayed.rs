//! Handles for decisions whose outcome is not known yet.

use crate::agent::Agent;
use crate::error::Result;
use crate::value::Value;
use smallvec::SmallVec;
use std::cell::Cell;

/// A handle returned by [`Agent::respond`] when no outcome is available
/// yet. The placeholder outcome (the blended value expected for this
/// decision) has already been recorded; call [`Self::update`] later with
/// the real outcome, as many times as the real outcome changes.
///
/// Several handles from different decisions can be outstanding and updated
/// independently; resolving one never disturbs another's bookkeeping,
/// since each tracks only the occurrence time of its own decision.
#[derive(Debug)]
pub struct DelayedResponse {
	attrs: SmallVec<[Value; 4]>,
	decision: Value,
	time: u64,
	expectation: f64,
	outcome: Cell<f64>,
	resolved: Cell<bool>,
}

impl DelayedResponse {
	pub(crate) fn new(attrs: SmallVec<[Value; 4]>, decision: Value, time: u64, placeholder: f64, expectation: f64) -> Self {
		Self {
			attrs,
			decision,
			time,
			expectation,
			outcome: Cell::new(placeholder),
			resolved: Cell::new(false),
		}
	}

	/// The blended value computed for the chosen option at the moment of
	/// the original choice. Immutable; never changes after `respond`
	/// returns this handle.
	#[must_use]
	pub fn expectation(&self) -> f64 {
		self.expectation
	}

	/// The outcome currently recorded for this decision: the placeholder
	/// expectation until [`Self::update`] is called, then the most
	/// recently supplied real outcome.
	#[must_use]
	pub fn outcome(&self) -> f64 {
		self.outcome.get()
	}

	/// True once [`Self::update`] has been called at least once.
	#[must_use]
	pub fn is_resolved(&self) -> bool {
		self.resolved.get()
	}

	/// Record the real outcome for this decision, moving the occurrence
	/// from whatever instance currently holds it (the placeholder, or a
	/// previous call's outcome) to the instance for `real_outcome`.
	///
	/// Can be called more than once as better information arrives; each
	/// call moves the same occurrence time again.
	pub fn update(&self, agent: &mut Agent, real_outcome: f64) -> Result<f64> {
		let previous = self.outcome.get();
		agent.resolve_delayed(&self.attrs, &self.decision, previous, real_outcome, self.time)?;
		self.outcome.set(real_outcome);
		self.resolved.set(true);
		Ok(previous)
	}
}
