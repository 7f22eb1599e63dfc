//! Structured decision details and the tabular `trace` dump.

use crate::activation::ActivationBreakdown;
use crate::value::Value;

/// The full breakdown for one candidate instance considered while
/// evaluating one option.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateDetail {
	/// The candidate instance's outcome.
	pub outcome: f64,
	/// Activation components for this candidate.
	pub activation: ActivationBreakdown,
}

/// The full breakdown for one option evaluated by a single `choose` call.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDetail {
	/// The option's decision label.
	pub decision: Value,
	/// This option's blended value.
	pub blended_value: f64,
	/// Per-candidate breakdown, in the order candidates were retrieved.
	pub candidates: Vec<CandidateDetail>,
}

/// One full decision's details: every option considered, in the order they
/// were presented.
pub type DecisionDetail = Vec<OptionDetail>;

/// Render one decision's details as the tabular trace PyIBL prints to
/// stdout, gated independently of `details` by the agent's `trace` flag.
///
/// The header is stable so callers can grep/test for it:
/// `"decision   base activation   activation noise   retrieval probability"`.
#[must_use]
pub fn render_trace(decision: &DecisionDetail) -> String {
	let mut out = String::new();
	out.push_str("decision            base activation   activation noise   retrieval probability   outcome\n");
	for option in decision {
		for candidate in &option.candidates {
			out.push_str(&format!(
				"{:<20}{:>17.6}{:>19.6}{:>24.6}{:>9.3}\n",
				option.decision,
				candidate.activation.base_level,
				candidate.activation.noise,
				candidate.activation.retrieval_probability,
				candidate.outcome,
			));
		}
	}
	out
}
