//! Error types for the decision engine.

/// Errors rejected while building or reconfiguring an [`crate::agent::Agent`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// `noise` must be non-negative.
	#[error("noise must be >= 0.0, got {0}")]
	NegativeNoise(f64),

	/// `decay` must be non-negative.
	#[error("decay must be >= 0.0, got {0}")]
	NegativeDecay(f64),

	/// `decay` must be < 1 whenever optimized learning is enabled.
	#[error("optimized learning requires decay < 1.0, got {0}")]
	OptimizedLearningRequiresDecayBelowOne(f64),

	/// `temperature` must be strictly positive when supplied explicitly.
	#[error("temperature must be > 0.0, got {0}")]
	NonPositiveTemperature(f64),

	/// `mismatch_penalty` must be non-negative.
	#[error("mismatch_penalty must be >= 0.0, got {0}")]
	NegativeMismatchPenalty(f64),

	/// An attribute name was empty, duplicated, or used the reserved
	/// `_decision` name.
	#[error("invalid attribute name: {0}")]
	InvalidAttributeName(String),

	/// `similarity` was given a weight that is not positive.
	#[error("similarity weight must be > 0.0, got {0}")]
	NonPositiveWeight(f64),

	/// `noise == 0.0` with no explicit `temperature`: the temperature that
	/// would otherwise be derived from noise is also zero, which divides by
	/// zero in the retrieval softmax.
	#[error("temperature must be set explicitly when noise = 0.0")]
	ZeroNoiseRequiresTemperature,
}

/// Errors raised while evaluating similarity functions.
#[derive(Debug, thiserror::Error)]
pub enum SimilarityError {
	/// One or both arguments were not numeric, for a numeric-only similarity
	/// function (e.g. `positive_linear_similarity`).
	#[error("similarity function requires numeric attribute values")]
	NotNumeric,

	/// One or both arguments were zero or negative, for a similarity
	/// function that requires strictly positive magnitudes.
	#[error("similarity arguments must be positive and nonzero, got ({0}, {1})")]
	NonPositive(f64, f64),
}

/// Errors raised while presenting, choosing between, or populating options.
#[derive(Debug, thiserror::Error)]
pub enum ChoiceError {
	/// `choose` was called with no options and no previous option set to
	/// reuse.
	#[error("choose() called with no options and no previous option set to reuse")]
	NoOptions,

	/// The same normalized option appeared twice in one `choose` call.
	#[error("duplicate option presented to choose()")]
	DuplicateOption,

	/// An option did not carry every attribute the agent's schema requires.
	#[error("option is missing schema attribute `{0}`")]
	MissingAttribute(String),

	/// `respond` was called with no pending decision.
	#[error("respond() called with no pending decision; call choose() first")]
	NoPendingChoice,

	/// No instance matched an option and the agent has no `default_utility`.
	#[error("no experience for option and no default_utility configured")]
	NoCandidatesAndNoDefault,
}

/// Errors raised by the instance store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	/// `populate`/`populate_at` was given a creation time later than the
	/// agent's current time.
	#[error("creation time {given} is after the agent's current time {now}")]
	FutureTime {
		/// The time that was requested.
		given: u64,
		/// The agent's current time.
		now: u64,
	},

	/// `populate`/`populate_at` targeted an instance that already exists
	/// with a different creation time.
	#[error("populate conflicts with an existing instance created at time {existing}, not {requested}")]
	ConflictingCreation {
		/// The creation time already recorded for this instance.
		existing: u64,
		/// The creation time this call requested.
		requested: u64,
	},

	/// `advance`'s `target` was before the agent's current time.
	#[error("advance target {given} is before the agent's current time {now}")]
	TargetBeforeNow {
		/// The target time that was requested.
		given: u64,
		/// The agent's current time.
		now: u64,
	},
}

/// The umbrella error returned by fallible [`crate::agent::Agent`] operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
	/// A configuration/parameter assignment was rejected.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// A similarity function rejected its arguments.
	#[error(transparent)]
	Similarity(#[from] SimilarityError),

	/// A choice/response operation was invalid.
	#[error(transparent)]
	Choice(#[from] ChoiceError),

	/// A store operation was invalid.
	#[error(transparent)]
	Store(#[from] StoreError),
}

impl EngineError {
	/// True if this error reflects a caller configuration mistake rather
	/// than a runtime/data condition.
	#[must_use]
	pub fn is_config(&self) -> bool {
		matches!(self, Self::Config(_))
	}
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
