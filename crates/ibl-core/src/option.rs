//! Attribute schemas and the option values presented to [`crate::agent::Agent::choose`].

use crate::error::ConfigError;
use crate::value::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// The reserved pseudo-attribute name used internally to always exact-match
/// on an option's decision label.
pub(crate) const DECISION_ATTR: &str = "_decision";

/// The ordered set of attribute names an agent discriminates instances on.
///
/// An empty schema means every option is a bare hashable scalar (the
/// decision *is* the option); a non-empty schema means every option must
/// supply a value for each named attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
	attributes: Arc<[Arc<str>]>,
}

impl Schema {
	/// Build a schema from attribute names, rejecting empty, duplicate, or
	/// reserved (`_decision`) names.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::InvalidAttributeName`] for any name that is
	/// empty, repeated, or equal to the reserved `_decision` name.
	pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Result<Self, ConfigError> {
		let mut seen = std::collections::HashSet::new();
		let mut attributes = Vec::new();
		for name in names {
			let name = name.into();
			if name.is_empty() || name == DECISION_ATTR {
				return Err(ConfigError::InvalidAttributeName(name));
			}
			if !seen.insert(name.clone()) {
				return Err(ConfigError::InvalidAttributeName(name));
			}
			attributes.push(Arc::from(name.as_str()));
		}
		Ok(Self {
			attributes: Arc::from(attributes),
		})
	}

	/// The empty schema: options are bare scalars.
	#[must_use]
	pub fn scalar() -> Self {
		Self {
			attributes: Arc::from(Vec::new()),
		}
	}

	/// Number of attributes in the schema.
	#[must_use]
	pub fn len(&self) -> usize {
		self.attributes.len()
	}

	/// True for the empty (scalar-option) schema.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.attributes.is_empty()
	}

	/// Attribute names, in schema order.
	#[must_use]
	pub fn attributes(&self) -> &[Arc<str>] {
		&self.attributes
	}

	/// Index of an attribute name, if present.
	#[must_use]
	pub fn index_of(&self, name: &str) -> Option<usize> {
		self.attributes.iter().position(|a| a.as_ref() == name)
	}
}

/// A caller-supplied option, before it is checked against the agent's
/// schema.
///
/// - `Scalar` is valid only for the empty schema: the option *is* the
///   decision.
/// - `Keyed` supplies attribute values by name; extra keys not in the
///   schema are ignored, matching how PyIBL treats "ignore-unused" fields.
/// - `Positional` supplies attribute values in schema order.
#[derive(Debug, Clone, PartialEq)]
pub enum Choice {
	/// A bare scalar option (only valid for the empty schema).
	Scalar(Value),
	/// Attribute values by name.
	Keyed(HashMap<Arc<str>, Value>),
	/// Attribute values in schema order.
	Positional(Vec<Value>),
}

impl From<Value> for Choice {
	fn from(v: Value) -> Self {
		Self::Scalar(v)
	}
}

impl From<Vec<Value>> for Choice {
	fn from(v: Vec<Value>) -> Self {
		Self::Positional(v)
	}
}

impl From<HashMap<Arc<str>, Value>> for Choice {
	fn from(v: HashMap<Arc<str>, Value>) -> Self {
		Self::Keyed(v)
	}
}

/// An option resolved against a schema: schema-ordered attribute values
/// plus the decision label derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedOption {
	/// Schema-ordered attribute values (empty for the scalar schema).
	pub attrs: SmallVec<[Value; 4]>,
	/// The decision label: the bare scalar for the empty schema, otherwise
	/// a tuple of `attrs`.
	pub decision: Value,
}

impl Schema {
	/// Resolve a caller-supplied [`Choice`] against this schema.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::InvalidAttributeName`] if a `Keyed` option is
	/// missing a required attribute, or if a `Scalar`/`Positional` option
	/// does not match the schema's arity.
	pub fn normalize(&self, choice: &Choice) -> Result<NormalizedOption, ConfigError> {
		let attrs: SmallVec<[Value; 4]> = match (self.is_empty(), choice) {
			(true, Choice::Scalar(_)) => SmallVec::new(),
			(false, Choice::Keyed(map)) => self
				.attributes
				.iter()
				.map(|name| {
					map.get(name.as_ref())
						.cloned()
						.ok_or_else(|| ConfigError::InvalidAttributeName(name.to_string()))
				})
				.collect::<Result<_, _>>()?,
			(false, Choice::Positional(values)) if values.len() == self.attributes.len() => {
				values.iter().cloned().collect()
			}
			_ => {
				return Err(ConfigError::InvalidAttributeName(
					"option does not conform to the agent's attribute schema".to_string(),
				));
			}
		};
		let decision = if self.is_empty() {
			match choice {
				Choice::Scalar(v) => v.clone(),
				_ => unreachable!("scalar schema already matched above"),
			}
		} else {
			Value::decision_label(&attrs)
		};
		Ok(NormalizedOption { attrs, decision })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scalar_schema_normalizes_to_itself() {
		let schema = Schema::scalar();
		let opt = schema.normalize(&Choice::Scalar(Value::from("A"))).unwrap();
		assert!(opt.attrs.is_empty());
		assert_eq!(opt.decision, Value::from("A"));
	}

	#[test]
	fn keyed_option_ignores_extra_fields() {
		let schema = Schema::new(["button", "illuminated"]).unwrap();
		let mut map = HashMap::new();
		map.insert(Arc::from("button"), Value::from("b"));
		map.insert(Arc::from("illuminated"), Value::from(true));
		map.insert(Arc::from("ignore-unused"), Value::from(99_i64));
		let opt = schema.normalize(&Choice::Keyed(map)).unwrap();
		assert_eq!(opt.attrs.as_slice(), &[Value::from("b"), Value::from(true)]);
	}

	#[test]
	fn positional_option_must_match_arity() {
		let schema = Schema::new(["a", "b"]).unwrap();
		assert!(schema
			.normalize(&Choice::Positional(vec![Value::from(1_i64)]))
			.is_err());
	}

	#[test]
	fn reserved_attribute_name_rejected() {
		assert!(Schema::new(["_decision"]).is_err());
	}
}
