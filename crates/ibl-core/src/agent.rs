//! The `Agent`: a single instance-based learner, its parameters, and the
//! choose/respond/populate protocol built on top of [`crate::store`] and
//! [`crate::activation`].

use crate::activation::{self, ActivationBreakdown};
use crate::delayed::DelayedResponse;
use crate::diagnostics::{render_trace, CandidateDetail, DecisionDetail, OptionDetail};
use crate::error::{ChoiceError, ConfigError, EngineError, Result, StoreError};
use crate::option::{Choice, NormalizedOption, Schema};
use crate::similarity::SimilarityFn;
use crate::store::InstanceStore;
use crate::value::{OrderedFloat, Value};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// A fixed numeric default, or a function of the option's decision label,
/// used to seed the blended value of an option with no prior experience.
#[derive(Clone)]
pub enum DefaultUtility {
	/// A single value applied to every option with no candidates.
	Constant(f64),
	/// A function of the option's decision label.
	Function(Rc<dyn Fn(&Value) -> f64>),
}

impl std::fmt::Debug for DefaultUtility {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
			Self::Function(_) => f.write_str("Function(..)"),
		}
	}
}

/// Parameters used to construct an [`Agent`].
#[derive(Debug, Clone)]
pub struct AgentConfig {
	/// A human-readable name, surfaced in diagnostics only.
	pub name: String,
	/// Attribute names, in schema order. Empty means options are bare
	/// scalars.
	pub attributes: Vec<String>,
	/// Activation noise standard deviation. `0.0` makes choice
	/// deterministic apart from random tie-breaking among equal-valued
	/// options.
	pub noise: f64,
	/// Base-level activation decay.
	pub decay: f64,
	/// Softmax temperature. Defaults to `noise * sqrt(2)` when left `None`,
	/// matching the ACT-R convention of deriving temperature from noise.
	/// Must be set explicitly when `noise == 0.0`, since the derived
	/// default would then also be zero.
	pub temperature: Option<f64>,
	/// Partial-matching mismatch penalty. `None` disables partial
	/// matching entirely (attributes without similarity functions are
	/// always exact-matched).
	pub mismatch_penalty: Option<f64>,
	/// Use the O(1) optimized-learning base-level activation approximation.
	/// Requires `decay < 1.0`.
	pub optimized_learning: bool,
	/// When an option has no matching experience and `default_utility` is
	/// set, record the default as a real instance (it then participates
	/// in future base-level activation) rather than using it only
	/// in-flight for this decision.
	pub default_utility_populates: bool,
	/// Deterministic seed for the agent's RNG (noise draws and tie-break).
	/// `None` seeds from entropy.
	pub seed: Option<u64>,
}

impl Default for AgentConfig {
	fn default() -> Self {
		Self {
			name: String::new(),
			attributes: Vec::new(),
			noise: 0.25,
			decay: 0.5,
			temperature: None,
			mismatch_penalty: None,
			optimized_learning: false,
			default_utility_populates: false,
			seed: None,
		}
	}
}

#[derive(Debug, Clone)]
struct PendingChoice {
	attrs: SmallVec<[Value; 4]>,
	decision: Value,
	time: u64,
	expectation: f64,
}

/// One instance-based learner: an episodic store, its activation
/// parameters, and the choose/respond/populate protocol.
pub struct Agent {
	name: String,
	schema: Schema,
	noise: f64,
	decay: f64,
	temperature: Option<f64>,
	mismatch_penalty: Option<f64>,
	optimized_learning: bool,
	default_utility: Option<DefaultUtility>,
	default_utility_populates: bool,
	fixed_noise: bool,
	trace: bool,
	details_enabled: bool,
	details_log: Vec<DecisionDetail>,
	time: u64,
	store: InstanceStore,
	similarities: HashMap<usize, (SimilarityFn, f64)>,
	last_options: Option<Vec<Choice>>,
	pending: Option<PendingChoice>,
	rng: StdRng,
	noise_cache: HashMap<usize, f64>,
}

impl Agent {
	/// Build a new agent from `config`.
	///
	/// # Errors
	///
	/// Returns [`ConfigError`] if `config` carries a contradictory
	/// parameter assignment (negative noise/decay, non-positive
	/// temperature, `noise == 0.0` with no explicit `temperature`,
	/// optimized learning with `decay >= 1.0`, or an invalid attribute
	/// name).
	pub fn new(config: AgentConfig) -> Result<Self> {
		if config.noise < 0.0 {
			return Err(ConfigError::NegativeNoise(config.noise).into());
		}
		if config.noise == 0.0 {
			if config.temperature.is_none() {
				return Err(ConfigError::ZeroNoiseRequiresTemperature.into());
			}
			log::warn!("agent `{}` configured with noise=0.0: choice is deterministic apart from tie-breaking", config.name);
		}
		if config.decay < 0.0 {
			return Err(ConfigError::NegativeDecay(config.decay).into());
		}
		if config.optimized_learning && config.decay >= 1.0 {
			return Err(ConfigError::OptimizedLearningRequiresDecayBelowOne(config.decay).into());
		}
		if let Some(t) = config.temperature {
			if t <= 0.0 {
				return Err(ConfigError::NonPositiveTemperature(t).into());
			}
		}
		if let Some(p) = config.mismatch_penalty {
			if p < 0.0 {
				return Err(ConfigError::NegativeMismatchPenalty(p).into());
			}
		}
		let schema = Schema::new(config.attributes.clone())?;
		let rng = match config.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_entropy(),
		};
		Ok(Self {
			name: config.name,
			schema,
			noise: config.noise,
			decay: config.decay,
			temperature: config.temperature,
			mismatch_penalty: config.mismatch_penalty,
			optimized_learning: config.optimized_learning,
			default_utility: None,
			default_utility_populates: config.default_utility_populates,
			fixed_noise: false,
			trace: false,
			details_enabled: false,
			details_log: Vec::new(),
			time: 0,
			store: InstanceStore::new(),
			similarities: HashMap::new(),
			last_options: None,
			pending: None,
			rng,
			noise_cache: HashMap::new(),
		})
	}

	/// The agent's name.
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The agent's current time.
	#[must_use]
	pub fn time(&self) -> u64 {
		self.time
	}

	/// The agent's attribute schema.
	#[must_use]
	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	/// Set the activation noise standard deviation.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::NegativeNoise`] if `noise < 0.0`, or
	/// [`ConfigError::ZeroNoiseRequiresTemperature`] if `noise == 0.0` and
	/// no explicit `temperature` is set.
	pub fn set_noise(&mut self, noise: f64) -> Result<()> {
		if noise < 0.0 {
			return Err(ConfigError::NegativeNoise(noise).into());
		}
		if noise == 0.0 {
			if self.temperature.is_none() {
				return Err(ConfigError::ZeroNoiseRequiresTemperature.into());
			}
			log::warn!("agent `{}` set noise=0.0: choice is deterministic apart from tie-breaking", self.name);
		}
		self.noise = noise;
		Ok(())
	}

	/// Set the base-level activation decay.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::NegativeDecay`] if `decay < 0.0`, or
	/// [`ConfigError::OptimizedLearningRequiresDecayBelowOne`] if optimized
	/// learning is active and `decay >= 1.0`.
	pub fn set_decay(&mut self, decay: f64) -> Result<()> {
		if decay < 0.0 {
			return Err(ConfigError::NegativeDecay(decay).into());
		}
		if self.optimized_learning && decay >= 1.0 {
			return Err(ConfigError::OptimizedLearningRequiresDecayBelowOne(decay).into());
		}
		self.decay = decay;
		Ok(())
	}

	/// Set (or clear) the softmax temperature.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::NonPositiveTemperature`] if `temperature <=
	/// 0.0`, or [`ConfigError::ZeroNoiseRequiresTemperature`] if clearing
	/// it back to `None` while `noise == 0.0`.
	pub fn set_temperature(&mut self, temperature: Option<f64>) -> Result<()> {
		if let Some(t) = temperature {
			if t <= 0.0 {
				return Err(ConfigError::NonPositiveTemperature(t).into());
			}
		} else if self.noise == 0.0 {
			return Err(ConfigError::ZeroNoiseRequiresTemperature.into());
		}
		self.temperature = temperature;
		Ok(())
	}

	/// Enable or disable optimized-learning base-level activation.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::OptimizedLearningRequiresDecayBelowOne`] if
	/// enabling while `decay >= 1.0`.
	pub fn set_optimized_learning(&mut self, on: bool) -> Result<()> {
		if on && self.decay >= 1.0 {
			return Err(ConfigError::OptimizedLearningRequiresDecayBelowOne(self.decay).into());
		}
		self.optimized_learning = on;
		Ok(())
	}

	/// Set (or clear) the partial-matching mismatch penalty.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::NegativeMismatchPenalty`] if `penalty <
	/// 0.0`.
	pub fn set_mismatch_penalty(&mut self, penalty: Option<f64>) -> Result<()> {
		if let Some(p) = penalty {
			if p < 0.0 {
				return Err(ConfigError::NegativeMismatchPenalty(p).into());
			}
			if self.similarities.is_empty() {
				log::warn!(
					"agent `{}` set mismatch_penalty with no attributes registered for partial matching",
					self.name
				);
			}
		}
		self.mismatch_penalty = penalty;
		Ok(())
	}

	/// Set (or clear) the default utility used for options with no prior
	/// experience.
	pub fn set_default_utility(&mut self, default_utility: Option<DefaultUtility>) {
		self.default_utility = default_utility;
	}

	/// Whether a default utility, once used for an option, is also
	/// recorded as a real instance.
	pub fn set_default_utility_populates(&mut self, on: bool) {
		self.default_utility_populates = on;
	}

	/// Cache one noise draw per candidate instance for the duration of a
	/// single `choose` call, so every option sharing a candidate sees the
	/// same noise.
	pub fn set_fixed_noise(&mut self, on: bool) {
		self.fixed_noise = on;
	}

	/// Print a tabular activation breakdown to stdout on every `choose`.
	pub fn set_trace(&mut self, on: bool) {
		self.trace = on;
	}

	/// Accumulate structured decision details for every `choose` call,
	/// retrievable via [`Self::details`].
	pub fn set_details(&mut self, on: bool) {
		self.details_enabled = on;
		if !on {
			self.details_log.clear();
		}
	}

	/// The accumulated decision details, when [`Self::set_details`] is
	/// enabled.
	#[must_use]
	pub fn details(&self) -> &[DecisionDetail] {
		&self.details_log
	}

	/// Register (or clear) a similarity function for one or more
	/// attributes, with a mismatch weight.
	///
	/// Passing `function: None` clears any similarity function previously
	/// registered for these attributes, reverting them to exact matching.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::InvalidAttributeName`] if any name is not in
	/// the schema, or [`ConfigError::NonPositiveWeight`] if `weight <=
	/// 0.0`.
	pub fn similarity(
		&mut self,
		attrs: &[&str],
		function: Option<SimilarityFn>,
		weight: f64,
	) -> Result<()> {
		if weight <= 0.0 {
			return Err(ConfigError::NonPositiveWeight(weight).into());
		}
		for name in attrs {
			let idx = self
				.schema
				.index_of(name)
				.ok_or_else(|| ConfigError::InvalidAttributeName((*name).to_string()))?;
			match &function {
				Some(f) => {
					let _ = self.similarities.insert(idx, (f.clone(), weight));
				}
				None => {
					let _ = self.similarities.remove(&idx);
				}
			}
		}
		Ok(())
	}

	fn mismatchable_attrs(&self) -> HashSet<usize> {
		self.similarities.keys().copied().collect()
	}

	fn evaluate_default_utility(&self, norm: &NormalizedOption) -> Result<f64> {
		match &self.default_utility {
			Some(DefaultUtility::Constant(v)) => Ok(*v),
			Some(DefaultUtility::Function(f)) => Ok(f(&norm.decision)),
			None => Err(ChoiceError::NoCandidatesAndNoDefault.into()),
		}
	}

	fn blend_for(&mut self, norm: &NormalizedOption) -> Result<(f64, Vec<CandidateDetail>)> {
		let now = self.time;
		let mismatchable = self.mismatchable_attrs();
		let mut ids = self.store.candidates(&norm.attrs, &norm.decision, &mismatchable);
		if ids.is_empty() {
			let default = self.evaluate_default_utility(norm)?;
			if self.default_utility_populates {
				let _ = self
					.store
					.populate(norm.attrs.clone(), norm.decision.clone(), default, now)?;
				ids = self.store.candidates(&norm.attrs, &norm.decision, &mismatchable);
			} else {
				return Ok((default, Vec::new()));
			}
		}
		self.blend_candidates(norm, now, ids)
	}

	fn blend_candidates(
		&mut self,
		norm: &NormalizedOption,
		now: u64,
		ids: Vec<usize>,
	) -> Result<(f64, Vec<CandidateDetail>)> {
		let mismatch_weight = self.mismatch_penalty.unwrap_or(0.0);
		let mut bases = Vec::with_capacity(ids.len());
		let mut mismatches = Vec::with_capacity(ids.len());
		let mut noises = Vec::with_capacity(ids.len());
		let mut totals = Vec::with_capacity(ids.len());
		let mut outcomes = Vec::with_capacity(ids.len());

		for &id in &ids {
			let (base, attrs_snapshot, outcome) = {
				let inst = self
					.store
					.get(id)
					.expect("id returned by candidates() must be live");
				let base = if self.optimized_learning {
					let (k, t_avg) = inst.optimized_learning_stats();
					activation::base_level_activation_optimized(k, t_avg, now, self.decay)
				} else {
					activation::base_level_activation(&inst.occurrences, now, self.decay)
				};
				(base, inst.attrs.clone(), inst.outcome)
			};

			let mut weighted_sims = Vec::new();
			if self.mismatch_penalty.is_some() {
				for (&attr_idx, (f, weight)) in &self.similarities {
					if let (Some(q), Some(iv)) = (norm.attrs.get(attr_idx), attrs_snapshot.get(attr_idx)) {
						let s = f(q, iv)?;
						weighted_sims.push((*weight, s));
					}
				}
			}
			let mismatch = activation::mismatch_penalty(mismatch_weight, &weighted_sims);

			let noise = if self.fixed_noise {
				if let Some(&cached) = self.noise_cache.get(&id) {
					cached
				} else {
					let n = activation::logistic_noise(self.noise, &mut self.rng);
					let _ = self.noise_cache.insert(id, n);
					n
				}
			} else {
				activation::logistic_noise(self.noise, &mut self.rng)
			};

			bases.push(base);
			mismatches.push(mismatch);
			noises.push(noise);
			totals.push(base + mismatch + noise);
			outcomes.push(outcome);
		}

		let tau = self
			.temperature
			.unwrap_or_else(|| activation::temperature_from_noise(self.noise));
		let probs = activation::retrieval_probabilities(&totals, tau);
		let value = activation::blended_value(&outcomes, &probs);

		let details = (0..ids.len())
			.map(|i| CandidateDetail {
				outcome: outcomes[i],
				activation: ActivationBreakdown {
					base_level: bases[i],
					mismatch: mismatches[i],
					noise: noises[i],
					total: totals[i],
					retrieval_probability: probs[i],
				},
			})
			.collect();
		Ok((value, details))
	}

	/// Choose among `options` (or the last presented set, if `options` is
	/// `None`), returning the chosen option and, when `details` is true,
	/// a per-option activation breakdown.
	///
	/// Advances the agent's clock by one tick before evaluating options,
	/// so the instance this decision eventually creates (via
	/// [`Self::respond`]) is timestamped after every instance that could
	/// have informed it.
	///
	/// # Errors
	///
	/// Returns [`ChoiceError::NoOptions`] if `options` is `None` and no
	/// options were previously presented, [`ChoiceError::DuplicateOption`]
	/// if two options resolve to the same decision label, or any error
	/// from resolving an option against the schema or blending its
	/// candidates.
	pub fn choose(
		&mut self,
		options: Option<&[Choice]>,
		details: bool,
	) -> Result<(Choice, Option<DecisionDetail>)> {
		let opts: Vec<Choice> = match options {
			Some(o) if !o.is_empty() => o.to_vec(),
			Some(_) => return Err(ChoiceError::NoOptions.into()),
			None => self.last_options.clone().ok_or(ChoiceError::NoOptions)?,
		};

		let norms: Vec<NormalizedOption> = opts
			.iter()
			.map(|c| self.schema.normalize(c).map_err(EngineError::from))
			.collect::<Result<_>>()?;

		let mut seen = HashSet::new();
		for n in &norms {
			if !seen.insert(n.decision.clone()) {
				return Err(ChoiceError::DuplicateOption.into());
			}
		}

		self.time += 1;
		if self.fixed_noise {
			self.noise_cache.clear();
		}

		let mut blended = Vec::with_capacity(norms.len());
		let mut option_details = Vec::with_capacity(norms.len());
		for n in &norms {
			let (value, candidates) = self.blend_for(n)?;
			blended.push(value);
			option_details.push(OptionDetail {
				decision: n.decision.clone(),
				blended_value: value,
				candidates,
			});
		}

		let max = blended.iter().copied().fold(f64::NEG_INFINITY, f64::max);
		let winners: Vec<usize> = blended
			.iter()
			.enumerate()
			.filter(|&(_, &v)| v == max)
			.map(|(i, _)| i)
			.collect();
		let chosen_idx = winners[self.rng.gen_range(0..winners.len())];

		self.pending = Some(PendingChoice {
			attrs: norms[chosen_idx].attrs.clone(),
			decision: norms[chosen_idx].decision.clone(),
			time: self.time,
			expectation: blended[chosen_idx],
		});
		self.last_options = Some(opts.clone());

		if self.trace {
			print!("{}", render_trace(&option_details));
		}
		if self.details_enabled {
			self.details_log.push(option_details.clone());
		}

		Ok((opts[chosen_idx].clone(), details.then_some(option_details)))
	}

	/// Close the pending decision opened by [`Self::choose`].
	///
	/// If `outcome` is `Some`, the instance is recorded immediately and
	/// `None` is returned. If `outcome` is `None`, a placeholder instance
	/// (using the decision's expected blended value) is recorded and a
	/// [`DelayedResponse`] handle is returned for later resolution.
	///
	/// `new_decision`, if supplied, relabels which decision this outcome
	/// is filed under (the attributes are unchanged).
	///
	/// # Errors
	///
	/// Returns [`ChoiceError::NoPendingChoice`] if `choose` was not called
	/// since the last `respond`.
	pub fn respond(
		&mut self,
		outcome: Option<f64>,
		new_decision: Option<Value>,
	) -> Result<Option<DelayedResponse>> {
		let mut pending = self.pending.take().ok_or(ChoiceError::NoPendingChoice)?;
		if let Some(d) = new_decision {
			if d != pending.decision {
				pending.decision = d;
			}
		}
		match outcome {
			Some(v) => {
				let _ = self.store.upsert(pending.attrs, pending.decision, v, pending.time);
				Ok(None)
			}
			None => {
				let placeholder = pending.expectation;
				let _ = self.store.upsert(
					pending.attrs.clone(),
					pending.decision.clone(),
					placeholder,
					pending.time,
				);
				Ok(Some(DelayedResponse::new(
					pending.attrs,
					pending.decision,
					pending.time,
					placeholder,
					pending.expectation,
				)))
			}
		}
	}

	pub(crate) fn resolve_delayed(
		&mut self,
		attrs: &[Value],
		decision: &Value,
		old_outcome: f64,
		new_outcome: f64,
		time: u64,
	) -> Result<()> {
		self.store.move_occurrence(attrs, decision, old_outcome, new_outcome, time);
		Ok(())
	}

	/// Insert one instance per option at `at_time` (defaulting to the
	/// agent's current time).
	///
	/// # Errors
	///
	/// Returns [`StoreError::FutureTime`] if `at_time` is after the
	/// agent's current time, or [`StoreError::ConflictingCreation`] if an
	/// instance with this identity already exists with a different
	/// creation time.
	pub fn populate(&mut self, options: &[Choice], outcome: f64, at_time: Option<u64>) -> Result<()> {
		let time = at_time.unwrap_or(self.time);
		self.populate_at(options, outcome, time)
	}

	/// Like [`Self::populate`], but requires an explicit creation time.
	///
	/// # Errors
	///
	/// See [`Self::populate`].
	pub fn populate_at(&mut self, options: &[Choice], outcome: f64, time: u64) -> Result<()> {
		if time > self.time {
			return Err(StoreError::FutureTime {
				given: time,
				now: self.time,
			}
			.into());
		}
		for opt in options {
			let norm = self.schema.normalize(opt)?;
			let _ = self.store.populate(norm.attrs, norm.decision, outcome, time)?;
		}
		Ok(())
	}

	/// Advance the agent's clock without making a decision.
	///
	/// With `target` supplied, jumps directly to that absolute time `n` is
	/// ignored. Otherwise jumps forward by `n` (defaulting to `1` when
	/// `n` is `None`); `n = Some(0)` is a legitimate no-op, not rounded up.
	///
	/// # Errors
	///
	/// Returns [`StoreError::TargetBeforeNow`] if `target` is before the
	/// agent's current time.
	pub fn advance(&mut self, n: Option<u64>, target: Option<u64>) -> Result<u64> {
		match target {
			Some(t) => {
				if t < self.time {
					return Err(StoreError::TargetBeforeNow {
						given: t,
						now: self.time,
					}
					.into());
				}
				self.time = t;
			}
			None => {
				self.time += n.unwrap_or(1);
			}
		}
		Ok(self.time)
	}

	/// The probability distribution over an option's distinct outcome
	/// values: `p(outcome) = Σ p(I)` over candidates sharing that outcome.
	/// Unlike [`Self::choose`]'s blended value, this does not collapse to
	/// a single mean, which is useful when outcomes are themselves
	/// discrete/categorical.
	///
	/// # Errors
	///
	/// Returns the same errors as evaluating a single option during
	/// [`Self::choose`].
	pub fn discrete_blend(&mut self, option: &Choice) -> Result<HashMap<OrderedFloat, f64>> {
		let norm = self.schema.normalize(option)?;
		let (_, candidates) = self.blend_for(&norm)?;
		let mut dist: HashMap<OrderedFloat, f64> = HashMap::new();
		for c in candidates {
			*dist.entry(OrderedFloat(c.outcome)).or_insert(0.0) += c.activation.retrieval_probability;
		}
		Ok(dist)
	}

	/// Snapshot every stored instance, for debugging/display.
	#[must_use]
	pub fn instances(&self) -> Vec<InstanceSnapshot> {
		self.store
			.iter()
			.map(|(_, inst)| InstanceSnapshot {
				decision: inst.decision.clone(),
				outcome: inst.outcome,
				created: inst.created,
				occurrences: inst.occurrences.clone(),
			})
			.collect()
	}

	/// Forget stored instances and reset the clock, leaving parameters and
	/// similarity registrations untouched.
	///
	/// When `preserve_prepopulated` is true, instances created or last
	/// touched by [`Self::populate`]/[`Self::populate_at`] survive the
	/// reset; everything learned through `choose`/`respond` is dropped
	/// either way.
	pub fn reset(&mut self, preserve_prepopulated: bool) {
		self.store.clear(preserve_prepopulated);
		self.time = 0;
		self.pending = None;
		self.last_options = None;
		self.details_log.clear();
		self.noise_cache.clear();
	}
}

/// A read-only snapshot of one stored instance, returned by
/// [`Agent::instances`].
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceSnapshot {
	/// The instance's decision label.
	pub decision: Value,
	/// The instance's outcome.
	pub outcome: f64,
	/// When the instance was first created.
	pub created: u64,
	/// Every time this instance recurred.
	pub occurrences: Vec<u64>,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn deterministic_agent(attrs: &[&str]) -> Agent {
		Agent::new(AgentConfig {
			name: "test".to_string(),
			attributes: attrs.iter().map(|s| (*s).to_string()).collect(),
			noise: 0.0,
			decay: 0.5,
			temperature: Some(1.0),
			seed: Some(42),
			..AgentConfig::default()
		})
		.unwrap()
	}

	#[test]
	fn choose_prefers_higher_outcome_with_one_instance_each() {
		let mut agent = deterministic_agent(&[]);
		agent.populate(&[Choice::from(Value::from("A"))], 10.0, None).unwrap();
		agent.populate(&[Choice::from(Value::from("B"))], 5.0, None).unwrap();
		let options = vec![Choice::from(Value::from("A")), Choice::from(Value::from("B"))];
		let (choice, _) = agent.choose(Some(&options), false).unwrap();
		assert_eq!(choice, Choice::from(Value::from("A")));
	}

	#[test]
	fn respond_then_choose_matches_worked_example() {
		let mut agent = deterministic_agent(&[]);
		agent.populate(&[Choice::from(Value::from("A"))], 10.0, None).unwrap();
		agent.populate(&[Choice::from(Value::from("B"))], 5.0, None).unwrap();
		let options = vec![Choice::from(Value::from("A")), Choice::from(Value::from("B"))];

		let (choice, _) = agent.choose(Some(&options), false).unwrap();
		assert_eq!(choice, Choice::from(Value::from("A")));
		agent.respond(Some(0.0), None).unwrap();

		let (_, details) = agent.choose(Some(&options), true).unwrap();
		let details = details.unwrap();
		let a_detail = details.iter().find(|d| d.decision == Value::from("A")).unwrap();
		assert!((a_detail.blended_value - 4.142_135_623_730_951).abs() < 1e-9);
	}

	#[test]
	fn choose_without_options_reuses_last_set() {
		let mut agent = deterministic_agent(&[]);
		agent.populate(&[Choice::from(Value::from("A"))], 10.0, None).unwrap();
		let options = vec![Choice::from(Value::from("A"))];
		agent.choose(Some(&options), false).unwrap();
		agent.respond(Some(1.0), None).unwrap();
		let result = agent.choose(None, false);
		assert!(result.is_ok());
	}

	#[test]
	fn choose_with_no_prior_options_and_none_fails() {
		let mut agent = deterministic_agent(&[]);
		assert!(matches!(
			agent.choose(None, false),
			Err(EngineError::Choice(ChoiceError::NoOptions))
		));
	}

	#[test]
	fn respond_without_pending_choice_fails() {
		let mut agent = deterministic_agent(&[]);
		assert!(matches!(
			agent.respond(Some(1.0), None),
			Err(EngineError::Choice(ChoiceError::NoPendingChoice))
		));
	}

	#[test]
	fn delayed_response_round_trip() {
		let mut agent = deterministic_agent(&[]);
		agent.populate(&[Choice::from(Value::from("A"))], 10.0, None).unwrap();
		let options = vec![Choice::from(Value::from("A"))];
		agent.choose(Some(&options), false).unwrap();
		let handle = agent.respond(None, None).unwrap().unwrap();
		assert!(!handle.is_resolved());
		handle.update(&mut agent, 7.0).unwrap();
		assert!(handle.is_resolved());
		assert_eq!(handle.outcome(), 7.0);
	}

	#[test]
	fn populate_rejects_future_time() {
		let mut agent = deterministic_agent(&[]);
		assert!(agent
			.populate(&[Choice::from(Value::from("A"))], 1.0, Some(99))
			.is_err());
	}

	#[test]
	fn reset_clears_instances_and_time() {
		let mut agent = deterministic_agent(&[]);
		agent.populate(&[Choice::from(Value::from("A"))], 1.0, None).unwrap();
		agent.advance(Some(5), None).unwrap();
		agent.reset(false);
		assert_eq!(agent.time(), 0);
		assert!(agent.instances().is_empty());
	}

	#[test]
	fn reset_can_preserve_prepopulated_instances() {
		let mut agent = deterministic_agent(&[]);
		agent.populate(&[Choice::from(Value::from("A"))], 1.0, None).unwrap();
		let options = vec![Choice::from(Value::from("A"))];
		agent.choose(Some(&options), false).unwrap();
		agent.respond(Some(2.0), None).unwrap();
		agent.reset(true);
		assert_eq!(agent.time(), 0);
		assert_eq!(agent.instances().len(), 1);
		assert!((agent.instances()[0].outcome - 1.0).abs() < 1e-9);
	}

	#[test]
	fn advance_by_zero_is_a_no_op() {
		let mut agent = deterministic_agent(&[]);
		assert_eq!(agent.advance(Some(0), None).unwrap(), 0);
	}

	#[test]
	fn advance_to_target_before_now_fails() {
		let mut agent = deterministic_agent(&[]);
		agent.advance(Some(5), None).unwrap();
		assert!(agent.advance(None, Some(2)).is_err());
	}

	#[test]
	fn advance_to_target_jumps_directly() {
		let mut agent = deterministic_agent(&[]);
		assert_eq!(agent.advance(None, Some(10)).unwrap(), 10);
	}

	#[test]
	fn zero_noise_without_temperature_is_rejected() {
		let result = Agent::new(AgentConfig {
			noise: 0.0,
			temperature: None,
			..AgentConfig::default()
		});
		assert!(matches!(
			result,
			Err(EngineError::Config(ConfigError::ZeroNoiseRequiresTemperature))
		));
	}

	#[test]
	fn clearing_temperature_with_zero_noise_is_rejected() {
		let mut agent = deterministic_agent(&[]);
		assert!(agent.set_temperature(None).is_err());
	}

	#[test]
	fn discrete_blend_returns_outcome_distribution() {
		let mut agent = deterministic_agent(&[]);
		agent.populate(&[Choice::from(Value::from("A"))], 10.0, None).unwrap();
		agent.advance(Some(1), None).unwrap();
		let dist = agent.discrete_blend(&Choice::from(Value::from("A"))).unwrap();
		assert_eq!(dist.len(), 1);
		assert!((dist[&OrderedFloat(10.0)] - 1.0).abs() < 1e-9);
	}
}
