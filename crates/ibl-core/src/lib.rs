//! # IBL Core
//!
//! Instance-based learning (IBL) decision agents grounded in ACT-R's
//! declarative memory equations.
//!
//! ## Why instance-based learning?
//!
//! Most reinforcement-learning agents compress experience into a value
//! function. IBL agents don't: every decision and its outcome is kept as
//! a distinct *instance*, and a decision's value is reconstructed on
//! demand by blending the outcomes of similar past instances, weighted by
//! how retrievable each one is right now. This makes the learning process
//! itself psychologically plausible — it is the same declarative-memory
//! mechanism ACT-R uses for recall — and gives you, for free, graceful
//! generalization over numeric attributes via partial matching.
//!
//! ## Core concepts
//!
//! ### Activation
//!
//! Every instance's retrievability is its activation, built from two
//! components:
//!
//! 1. **Base-level activation** — recency and frequency of occurrence:
//!    ```text
//!    B(I) = ln[ Σ_j (n - t_j)^(-d) ]
//!    ```
//! 2. **Partial-match mismatch penalty** — a similarity-weighted penalty
//!    for attributes that don't match the query exactly:
//!    ```text
//!    P(I) = mismatch_penalty * Σ_a w_a * (s_a(q.a, I.a) - 1)
//!    ```
//!
//! Logistic noise is added on top, and retrieval probability follows from
//! a softmax over total activation.
//!
//! ### Choice
//!
//! The blended value of an option is the probability-weighted mean
//! outcome of its candidate instances. [`Agent::choose`] picks the
//! option with the highest blended value (ties broken uniformly at
//! random), [`Agent::respond`] records what actually happened.
//!
//! ## Example
//!
//! ```rust
//! use ibl_core::{Agent, AgentConfig, Choice, Value};
//!
//! let mut agent = Agent::new(AgentConfig {
//!     name: "gambler".to_string(),
//!     noise: 0.0,
//!     temperature: Some(1.0),
//!     ..AgentConfig::default()
//! })
//! .unwrap();
//!
//! agent.populate(&[Choice::from(Value::from("left"))], 10.0, None).unwrap();
//! agent.populate(&[Choice::from(Value::from("right"))], 5.0, None).unwrap();
//!
//! let options = vec![Choice::from(Value::from("left")), Choice::from(Value::from("right"))];
//! let (choice, _) = agent.choose(Some(&options), false).unwrap();
//! assert_eq!(choice, Choice::from(Value::from("left")));
//! agent.respond(Some(12.0), None).unwrap();
//! ```
//!
//! ## References
//!
//! - Anderson, J. R., & Lebiere, C. (1998). *The Atomic Components of
//!   Thought* — ACT-R's declarative memory equations.
//! - Gonzalez, C., Lerch, J. F., & Lebiere, C. (2003). *Instance-based
//!   learning in dynamic decision making*. Cognitive Science.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::needless_return)]

pub mod activation;
pub mod agent;
pub mod delayed;
pub mod diagnostics;
pub mod error;
pub mod option;
pub mod similarity;
pub mod store;
pub mod value;

pub use agent::{Agent, AgentConfig, DefaultUtility, InstanceSnapshot};
pub use delayed::DelayedResponse;
pub use diagnostics::{render_trace, CandidateDetail, DecisionDetail, OptionDetail};
pub use error::{ChoiceError, ConfigError, EngineError, Result, SimilarityError, StoreError};
pub use option::{Choice, NormalizedOption, Schema};
pub use similarity::{
	always_one, bounded_linear_similarity, bounded_quadratic_similarity, numeric,
	positive_linear_similarity, positive_quadratic_similarity, SimilarityFn,
};
pub use store::{Instance, InstanceId, InstanceStore};
pub use value::{OrderedFloat, Value};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn end_to_end_smoke_test() {
		let mut agent = Agent::new(AgentConfig {
			noise: 0.0,
			temperature: Some(1.0),
			..AgentConfig::default()
		})
		.unwrap();
		agent
			.populate(&[Choice::from(Value::from("A"))], 1.0, None)
			.unwrap();
		agent
			.populate(&[Choice::from(Value::from("B"))], 0.0, None)
			.unwrap();
		let options = vec![Choice::from(Value::from("A")), Choice::from(Value::from("B"))];
		let (choice, _) = agent.choose(Some(&options), false).unwrap();
		assert_eq!(choice, Choice::from(Value::from("A")));
		assert!(agent.respond(Some(1.0), None).unwrap().is_none());
	}
}
