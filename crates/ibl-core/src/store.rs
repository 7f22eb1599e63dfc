//! The instance store: identity-keyed episodic memory with exact-match
//! indexing over attributes that carry no similarity function.

use crate::error::StoreError;
use crate::value::Value;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Handle to a stored [`Instance`], stable for the instance's lifetime.
pub type InstanceId = usize;

/// A single remembered (attributes, decision, outcome) triple, with every
/// time it has recurred.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
	/// Schema-ordered attribute values.
	pub attrs: SmallVec<[Value; 4]>,
	/// The decision this instance belongs to.
	pub decision: Value,
	/// The outcome this instance recorded.
	pub outcome: f64,
	/// The time this instance was first created.
	pub created: u64,
	/// Every time (including `created`) this exact triple recurred, sorted
	/// strictly increasing.
	pub occurrences: Vec<u64>,
	occurrence_sum: f64,
	prepopulated: bool,
}

impl Instance {
	fn new(attrs: SmallVec<[Value; 4]>, decision: Value, outcome: f64, time: u64, prepopulated: bool) -> Self {
		Self {
			attrs,
			decision,
			outcome,
			created: time,
			occurrences: vec![time],
			occurrence_sum: time as f64,
			prepopulated,
		}
	}

	fn reinforce(&mut self, time: u64) {
		if self.occurrences.last().map_or(true, |&last| time > last) {
			self.occurrences.push(time);
			self.occurrence_sum += time as f64;
		}
	}

	/// Remove a single occurrence time (used when a delayed response's
	/// placeholder instance is superseded by the real outcome). Returns
	/// true if the instance is now empty and should be dropped.
	fn remove_occurrence(&mut self, time: u64) -> bool {
		if let Some(pos) = self.occurrences.iter().position(|&t| t == time) {
			self.occurrences.remove(pos);
			self.occurrence_sum -= time as f64;
		}
		self.occurrences.is_empty()
	}

	/// Occurrence count and mean occurrence time, maintained incrementally
	/// so optimized-learning activation is O(1).
	#[must_use]
	pub fn optimized_learning_stats(&self) -> (u32, f64) {
		let k = self.occurrences.len() as u32;
		(k, self.occurrence_sum / f64::from(k))
	}

	/// True if this instance was created or last touched by
	/// [`InstanceStore::populate`] rather than [`InstanceStore::upsert`] —
	/// the set [`InstanceStore::clear`] keeps when asked to preserve
	/// pre-populated experience across a reset.
	#[must_use]
	pub fn is_prepopulated(&self) -> bool {
		self.prepopulated
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IdentityKey {
	attrs: SmallVec<[Value; 4]>,
	decision: Value,
	outcome: crate::value::OrderedFloat,
}

/// Episodic instance storage with a secondary exact-match index keyed by
/// decision and by each attribute's value, used to narrow candidate sets
/// before any similarity scoring happens.
#[derive(Debug, Default)]
pub struct InstanceStore {
	slots: Vec<Option<Instance>>,
	free: Vec<InstanceId>,
	by_identity: HashMap<IdentityKey, InstanceId>,
	/// `(attr_index, value) -> instance ids`, where `attr_index ==
	/// attrs.len()` is reserved for the decision label.
	index: HashMap<(usize, Value), HashSet<InstanceId>>,
}

impl InstanceStore {
	/// New, empty store.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Drop stored instances. When `preserve_prepopulated` is true, instances
	/// created or last touched by [`Self::populate`] are kept; everything
	/// learned through [`Self::upsert`] (the `choose`/`respond` path) is
	/// dropped.
	pub fn clear(&mut self, preserve_prepopulated: bool) {
		if !preserve_prepopulated {
			self.slots.clear();
			self.free.clear();
			self.by_identity.clear();
			self.index.clear();
			return;
		}
		let to_remove: Vec<InstanceId> = self
			.iter()
			.filter(|(_, inst)| !inst.prepopulated)
			.map(|(id, _)| id)
			.collect();
		for id in to_remove {
			if let Some(inst) = self.slots[id].take() {
				self.remove_from_index(id, &inst.attrs, &inst.decision);
				let key = IdentityKey {
					attrs: inst.attrs,
					decision: inst.decision,
					outcome: crate::value::OrderedFloat(inst.outcome),
				};
				let _ = self.by_identity.remove(&key);
				self.free.push(id);
			}
		}
	}

	/// Number of live instances.
	#[must_use]
	pub fn len(&self) -> usize {
		self.by_identity.len()
	}

	/// True if the store holds no instances.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.by_identity.is_empty()
	}

	/// Look up a live instance by id.
	#[must_use]
	pub fn get(&self, id: InstanceId) -> Option<&Instance> {
		self.slots.get(id).and_then(Option::as_ref)
	}

	/// Iterate every live instance.
	pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &Instance)> {
		self.slots
			.iter()
			.enumerate()
			.filter_map(|(id, slot)| slot.as_ref().map(|inst| (id, inst)))
	}

	fn decision_attr_index(attrs: &[Value]) -> usize {
		attrs.len()
	}

	fn insert_into_index(&mut self, id: InstanceId, attrs: &[Value], decision: &Value) {
		let decision_idx = Self::decision_attr_index(attrs);
		self.index
			.entry((decision_idx, decision.clone()))
			.or_default()
			.insert(id);
		for (i, v) in attrs.iter().enumerate() {
			self.index.entry((i, v.clone())).or_default().insert(id);
		}
	}

	fn remove_from_index(&mut self, id: InstanceId, attrs: &[Value], decision: &Value) {
		let decision_idx = Self::decision_attr_index(attrs);
		if let Some(set) = self.index.get_mut(&(decision_idx, decision.clone())) {
			set.remove(&id);
		}
		for (i, v) in attrs.iter().enumerate() {
			if let Some(set) = self.index.get_mut(&(i, v.clone())) {
				set.remove(&id);
			}
		}
	}

	fn alloc(&mut self, instance: Instance) -> InstanceId {
		let id = if let Some(id) = self.free.pop() {
			self.slots[id] = Some(instance);
			id
		} else {
			self.slots.push(Some(instance));
			self.slots.len() - 1
		};
		id
	}

	/// Insert a fresh occurrence, reinforcing an existing instance with the
	/// same identity or creating a new one. Returns the instance id.
	pub fn upsert(
		&mut self,
		attrs: SmallVec<[Value; 4]>,
		decision: Value,
		outcome: f64,
		time: u64,
	) -> InstanceId {
		let key = IdentityKey {
			attrs: attrs.clone(),
			decision: decision.clone(),
			outcome: crate::value::OrderedFloat(outcome),
		};
		if let Some(&id) = self.by_identity.get(&key) {
			if let Some(inst) = self.slots[id].as_mut() {
				inst.reinforce(time);
			}
			id
		} else {
			let instance = Instance::new(attrs.clone(), decision.clone(), outcome, time, false);
			let id = self.alloc(instance);
			self.by_identity.insert(key, id);
			self.insert_into_index(id, &attrs, &decision);
			id
		}
	}

	/// Like [`Self::upsert`], but fails if an instance with this identity
	/// already exists with a different creation time, and marks the
	/// instance pre-populated (see [`Self::clear`]).
	///
	/// # Errors
	///
	/// Returns [`StoreError::ConflictingCreation`] if the identity already
	/// exists and its `created` time differs from `time`.
	pub fn populate(
		&mut self,
		attrs: SmallVec<[Value; 4]>,
		decision: Value,
		outcome: f64,
		time: u64,
	) -> Result<InstanceId, StoreError> {
		let key = IdentityKey {
			attrs: attrs.clone(),
			decision: decision.clone(),
			outcome: crate::value::OrderedFloat(outcome),
		};
		if let Some(&id) = self.by_identity.get(&key) {
			let existing = self.slots[id]
				.as_ref()
				.expect("identity index never points at a freed slot")
				.created;
			if existing != time {
				return Err(StoreError::ConflictingCreation {
					existing,
					requested: time,
				});
			}
			let id = self.upsert(attrs, decision, outcome, time);
			if let Some(inst) = self.slots[id].as_mut() {
				inst.prepopulated = true;
			}
			Ok(id)
		} else {
			let instance = Instance::new(attrs.clone(), decision.clone(), outcome, time, true);
			let id = self.alloc(instance);
			self.by_identity.insert(key, id);
			self.insert_into_index(id, &attrs, &decision);
			Ok(id)
		}
	}

	/// Move one occurrence time from the instance identified by
	/// `(attrs, decision, old_outcome)` to `(attrs, decision, new_outcome)`,
	/// creating the destination if needed and dropping the source if it
	/// becomes empty. Used to resolve delayed feedback.
	pub fn move_occurrence(
		&mut self,
		attrs: &[Value],
		decision: &Value,
		old_outcome: f64,
		new_outcome: f64,
		time: u64,
	) {
		let old_key = IdentityKey {
			attrs: attrs.iter().cloned().collect(),
			decision: decision.clone(),
			outcome: crate::value::OrderedFloat(old_outcome),
		};
		if let Some(id) = self.by_identity.remove(&old_key) {
			let empty = self.slots[id]
				.as_mut()
				.map(|inst| inst.remove_occurrence(time))
				.unwrap_or(true);
			if empty {
				self.remove_from_index(id, attrs, decision);
				self.slots[id] = None;
				self.free.push(id);
			} else {
				self.by_identity.insert(old_key, id);
			}
		}
		let _ = self.upsert(
			attrs.iter().cloned().collect(),
			decision.clone(),
			new_outcome,
			time,
		);
	}

	/// Candidate instance ids for `decision`.
	///
	/// `decision` is a deterministic function of the *full* attrs tuple
	/// (`Value::decision_label`), so it can only be used to narrow candidates
	/// when there are no attributes to filter by at all (the bare-scalar
	/// schema). For a non-empty schema, candidates are narrowed instead by
	/// exact agreement on every attribute index *not* present in
	/// `mismatchable`; attributes registered for partial matching are left
	/// unfiltered here so two instances differing only there can still both
	/// be retrieved, with similarity scoring happening downstream. If every
	/// attribute is mismatchable, every stored instance is a candidate.
	#[must_use]
	pub fn candidates(
		&self,
		attrs: &[Value],
		decision: &Value,
		mismatchable: &HashSet<usize>,
	) -> Vec<InstanceId> {
		let mut result: Option<HashSet<InstanceId>> = None;
		let mut intersect = |bucket: Option<&HashSet<InstanceId>>| {
			let bucket = bucket.cloned().unwrap_or_default();
			result = Some(match result.take() {
				None => bucket,
				Some(r) => r.intersection(&bucket).copied().collect(),
			});
		};
		if attrs.is_empty() {
			let decision_idx = Self::decision_attr_index(attrs);
			intersect(self.index.get(&(decision_idx, decision.clone())));
		} else {
			for (i, v) in attrs.iter().enumerate() {
				if !mismatchable.contains(&i) {
					intersect(self.index.get(&(i, v.clone())));
				}
			}
		}
		match result {
			Some(r) => r.into_iter().collect(),
			None => self.iter().map(|(id, _)| id).collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn attrs(vs: &[Value]) -> SmallVec<[Value; 4]> {
		vs.iter().cloned().collect()
	}

	#[test]
	fn upsert_reinforces_same_identity() {
		let mut store = InstanceStore::new();
		let id = store.upsert(attrs(&[]), Value::from("A"), 10.0, 0);
		let id2 = store.upsert(attrs(&[]), Value::from("A"), 10.0, 1);
		assert_eq!(id, id2);
		assert_eq!(store.get(id).unwrap().occurrences, vec![0, 1]);
	}

	#[test]
	fn populate_rejects_conflicting_creation_time() {
		let mut store = InstanceStore::new();
		store.populate(attrs(&[]), Value::from("A"), 10.0, 0).unwrap();
		let err = store.populate(attrs(&[]), Value::from("A"), 10.0, 5);
		assert!(matches!(err, Err(StoreError::ConflictingCreation { .. })));
	}

	#[test]
	fn candidates_are_scoped_to_decision() {
		let mut store = InstanceStore::new();
		store.upsert(attrs(&[]), Value::from("A"), 10.0, 0);
		store.upsert(attrs(&[]), Value::from("B"), 5.0, 0);
		let cands = store.candidates(&[], &Value::from("A"), &HashSet::new());
		assert_eq!(cands.len(), 1);
		assert_eq!(store.get(cands[0]).unwrap().decision, Value::from("A"));
	}

	#[test]
	fn move_occurrence_relocates_a_single_time() {
		let mut store = InstanceStore::new();
		store.upsert(attrs(&[]), Value::from("A"), 9.0, 0);
		store.upsert(attrs(&[]), Value::from("A"), 9.0, 3);
		store.move_occurrence(&[], &Value::from("A"), 9.0, 15.0, 3);
		let cands = store.candidates(&[], &Value::from("A"), &HashSet::new());
		let outcomes: Vec<f64> = cands.iter().map(|&id| store.get(id).unwrap().outcome).collect();
		assert!(outcomes.contains(&9.0));
		assert!(outcomes.contains(&15.0));
		let nine = cands
			.iter()
			.find(|&&id| store.get(id).unwrap().outcome == 9.0)
			.unwrap();
		assert_eq!(store.get(*nine).unwrap().occurrences, vec![0]);
	}

	/// Mirrors `test_partial_matching`: querying with a mismatchable
	/// attribute value that differs from every stored instance must not
	/// collapse the candidate set to empty, since the decision label
	/// (derived from the full attrs tuple) differs too.
	#[test]
	fn candidates_pool_across_a_mismatchable_attribute_value() {
		let mut store = InstanceStore::new();
		// attrs = [button, color, size]; button is exact-match, color/size
		// are registered for partial matching.
		let stored_attrs = attrs(&[Value::from("b"), Value::from("blue"), Value::from(10_i64)]);
		let stored_decision = Value::decision_label(&stored_attrs);
		store.upsert(stored_attrs, stored_decision, 110.0, 0);

		let query_attrs = [Value::from("b"), Value::from("blue"), Value::from(20_i64)];
		let query_decision = Value::decision_label(&query_attrs);
		assert_ne!(query_decision, store.get(0).unwrap().decision);

		let mismatchable: HashSet<usize> = [1, 2].into_iter().collect();
		let cands = store.candidates(&query_attrs, &query_decision, &mismatchable);
		assert_eq!(cands.len(), 1);
		assert_eq!(store.get(cands[0]).unwrap().outcome, 110.0);
	}

	#[test]
	fn clear_can_preserve_prepopulated_instances() {
		let mut store = InstanceStore::new();
		store.populate(attrs(&[]), Value::from("A"), 10.0, 0).unwrap();
		store.upsert(attrs(&[]), Value::from("B"), 1.0, 1);
		store.clear(true);
		assert_eq!(store.len(), 1);
		assert_eq!(
			store.candidates(&[], &Value::from("A"), &HashSet::new()).len(),
			1
		);
		assert_eq!(
			store.candidates(&[], &Value::from("B"), &HashSet::new()).len(),
			0
		);
	}

	#[test]
	fn clear_without_preserve_drops_everything() {
		let mut store = InstanceStore::new();
		store.populate(attrs(&[]), Value::from("A"), 10.0, 0).unwrap();
		store.clear(false);
		assert!(store.is_empty());
	}
}
