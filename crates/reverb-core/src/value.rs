//! Value model for observable data
//!
//! Observable data is a tree of [`Value`]s. Primitive values are stored inline,
//! while mappings and sequences live in shared [`Container`]s so that nested data
//! keeps its identity when it is read, moved, or wrapped.
//!
//! ## Type classification
//!
//! Only *plain containers* are eligible for observation wrapping. A value is a
//! plain container when it is a mapping or a sequence whose container is not
//! already wrapped by a live [`Observable`]. See [`is_plain_container`].
//!
//! ## Example
//!
//! ```ignore
//! use reverb_core::value::{Value, is_plain_container};
//!
//! let data = Value::from(serde_json::json!({ "count": 0, "items": [1, 2] }));
//! assert!(is_plain_container(&data));
//! assert!(!is_plain_container(&Value::from(3)));
//! ```

use core::cell::{Ref, RefCell, RefMut};
use core::fmt;

extern crate alloc;
use alloc::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::observable::{Observable, ObservableInner};

/// Key addressing an entry of a container.
///
/// Mappings are addressed by name. Sequences are addressed by index; an index
/// used against a mapping addresses the entry named by its decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Key {
	/// Named entry of a mapping
	Name(String),
	/// Positional entry of a sequence
	Index(usize),
}

impl Key {
	/// Returns the key as a mapping entry name.
	pub fn to_name(&self) -> String {
		match self {
			Self::Name(name) => name.clone(),
			Self::Index(index) => index.to_string(),
		}
	}
}

impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Name(name) => write!(f, "{}", name),
			Self::Index(index) => write!(f, "{}", index),
		}
	}
}

impl From<&str> for Key {
	fn from(name: &str) -> Self {
		Self::Name(name.to_string())
	}
}

impl From<String> for Key {
	fn from(name: String) -> Self {
		Self::Name(name)
	}
}

impl From<usize> for Key {
	fn from(index: usize) -> Self {
		Self::Index(index)
	}
}

/// Storage held by a [`Container`].
#[derive(Debug, Clone)]
pub enum Entries {
	/// Insertion-ordered key/value mapping
	Map(IndexMap<String, Value>),
	/// Ordered sequence
	List(Vec<Value>),
}

pub(crate) struct ContainerData {
	pub(crate) entries: Entries,
	/// Wrapper currently observing this container, if any.
	pub(crate) observer: Weak<ObservableInner>,
}

/// A shared, mutable mapping or sequence.
///
/// Cloning a `Container` clones the handle, not the data. Two handles are the
/// same container when [`Container::ptr_eq`] holds.
#[derive(Clone)]
pub struct Container(Rc<RefCell<ContainerData>>);

impl Container {
	fn with_entries(entries: Entries) -> Self {
		Self(Rc::new(RefCell::new(ContainerData {
			entries,
			observer: Weak::new(),
		})))
	}

	/// Creates an empty mapping container.
	pub fn map() -> Self {
		Self::with_entries(Entries::Map(IndexMap::new()))
	}

	/// Creates an empty sequence container.
	pub fn list() -> Self {
		Self::with_entries(Entries::List(Vec::new()))
	}

	/// Creates a mapping container from key/value pairs.
	pub fn from_pairs<K, I>(pairs: I) -> Self
	where
		K: Into<String>,
		I: IntoIterator<Item = (K, Value)>,
	{
		Self::with_entries(Entries::Map(
			pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
		))
	}

	/// Creates a sequence container from values.
	pub fn from_values<I>(values: I) -> Self
	where
		I: IntoIterator<Item = Value>,
	{
		Self::with_entries(Entries::List(values.into_iter().collect()))
	}

	/// Returns `true` when both handles point at the same container.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Returns `true` for mapping containers.
	pub fn is_map(&self) -> bool {
		matches!(self.0.borrow().entries, Entries::Map(_))
	}

	/// Returns `true` for sequence containers.
	pub fn is_list(&self) -> bool {
		matches!(self.0.borrow().entries, Entries::List(_))
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		match &self.0.borrow().entries {
			Entries::Map(map) => map.len(),
			Entries::List(list) => list.len(),
		}
	}

	/// Returns `true` when the container holds no entries.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Reads an entry without any observation side effects.
	pub fn get(&self, key: &Key) -> Option<Value> {
		match (&self.0.borrow().entries, key) {
			(Entries::Map(map), key) => map.get(&key.to_name()).cloned(),
			(Entries::List(list), Key::Index(index)) => list.get(*index).cloned(),
			(Entries::List(_), Key::Name(_)) => None,
		}
	}

	/// Keys of the container, in order.
	pub fn keys(&self) -> Vec<Key> {
		match &self.0.borrow().entries {
			Entries::Map(map) => map.keys().cloned().map(Key::Name).collect(),
			Entries::List(list) => (0..list.len()).map(Key::Index).collect(),
		}
	}

	/// The observable currently wrapping this container, if it is still alive.
	pub fn observer(&self) -> Option<Observable> {
		self.0
			.borrow()
			.observer
			.upgrade()
			.map(Observable::from_inner)
	}

	pub(crate) fn entries(&self) -> Ref<'_, Entries> {
		Ref::map(self.0.borrow(), |data| &data.entries)
	}

	pub(crate) fn entries_mut(&self) -> RefMut<'_, Entries> {
		RefMut::map(self.0.borrow_mut(), |data| &mut data.entries)
	}

	pub(crate) fn set_observer(&self, inner: &Rc<ObservableInner>) {
		self.0.borrow_mut().observer = Rc::downgrade(inner);
	}

	/// Plain JSON snapshot of this container.
	pub fn to_json(&self) -> serde_json::Value {
		match &*self.entries() {
			Entries::Map(map) => serde_json::Value::Object(
				map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
			),
			Entries::List(list) => {
				serde_json::Value::Array(list.iter().map(Value::to_json).collect())
			}
		}
	}
}

impl fmt::Debug for Container {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0.try_borrow() {
			Ok(data) => f.debug_tuple("Container").field(&data.entries).finish(),
			Err(_) => f.write_str("Container(<borrowed>)"),
		}
	}
}

/// A value stored in observable data.
#[derive(Clone, Default)]
pub enum Value {
	/// Absent / null value
	#[default]
	Null,
	/// Boolean
	Bool(bool),
	/// Number (all numbers are stored as `f64`)
	Number(f64),
	/// String
	String(String),
	/// Mapping container
	Map(Container),
	/// Sequence container
	List(Container),
	/// A container already wrapped in an [`Observable`]
	Observed(Observable),
}

impl Value {
	/// Creates a fresh, empty mapping.
	pub fn map() -> Self {
		Self::Map(Container::map())
	}

	/// Creates a fresh, empty sequence.
	pub fn list() -> Self {
		Self::List(Container::list())
	}

	/// Identity check: `true` only for wrapped containers.
	pub fn is_observable(&self) -> bool {
		matches!(self, Self::Observed(_))
	}

	/// The underlying container for mappings, sequences and observables.
	pub fn container(&self) -> Option<Container> {
		match self {
			Self::Map(container) | Self::List(container) => Some(container.clone()),
			Self::Observed(observable) => Some(observable.target()),
			_ => None,
		}
	}

	/// Returns the value with any observable unwrapped to its raw container.
	pub fn unwrapped(&self) -> Value {
		match self {
			Self::Observed(observable) => {
				let target = observable.target();
				if target.is_list() {
					Self::List(target)
				} else {
					Self::Map(target)
				}
			}
			other => other.clone(),
		}
	}

	/// Returns the numeric value, if this is a number.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Number(n) => Some(*n),
			_ => None,
		}
	}

	/// Returns the string value, if this is a string.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s),
			_ => None,
		}
	}

	/// Returns the boolean value, if this is a boolean.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(b) => Some(*b),
			_ => None,
		}
	}

	/// Returns the wrapping observable, if this is one.
	pub fn as_observable(&self) -> Option<&Observable> {
		match self {
			Self::Observed(observable) => Some(observable),
			_ => None,
		}
	}

	/// Plain JSON snapshot of this value. Observables are unwrapped.
	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Self::Null => serde_json::Value::Null,
			Self::Bool(b) => serde_json::Value::Bool(*b),
			Self::Number(n) => number_to_json(*n),
			Self::String(s) => serde_json::Value::String(s.clone()),
			Self::Map(container) | Self::List(container) => container.to_json(),
			Self::Observed(observable) => observable.target().to_json(),
		}
	}
}

fn number_to_json(n: f64) -> serde_json::Value {
	if n.fract() == 0.0 && n.is_finite() && n.abs() < i64::MAX as f64 {
		serde_json::Value::from(n as i64)
	} else {
		serde_json::Number::from_f64(n)
			.map(serde_json::Value::Number)
			.unwrap_or(serde_json::Value::Null)
	}
}

/// Type Classifier: whether `value` may be wrapped for observation.
///
/// Mappings and sequences qualify unless their container is already observed.
/// Primitives and observables never qualify.
pub fn is_plain_container(value: &Value) -> bool {
	match value {
		Value::Map(container) | Value::List(container) => container.observer().is_none(),
		_ => false,
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("Null"),
			Self::Bool(b) => write!(f, "Bool({})", b),
			Self::Number(n) => write!(f, "Number({})", n),
			Self::String(s) => write!(f, "String({:?})", s),
			Self::Map(container) => write!(f, "Map({:?})", container),
			Self::List(container) => write!(f, "List({:?})", container),
			Self::Observed(observable) => write!(f, "Observed({:?})", observable.target()),
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("null"),
			Self::Bool(b) => write!(f, "{}", b),
			Self::Number(n) => write!(f, "{}", n),
			Self::String(s) => f.write_str(s),
			other => write!(f, "{}", other.to_json()),
		}
	}
}

impl PartialEq for Value {
	/// Structural equality for primitives, identity for containers.
	///
	/// Observables compare equal to the raw container they wrap.
	fn eq(&self, other: &Self) -> bool {
		crate::observable::proxy_safe_compare(self, other)
	}
}

impl From<serde_json::Value> for Value {
	fn from(json: serde_json::Value) -> Self {
		match json {
			serde_json::Value::Null => Self::Null,
			serde_json::Value::Bool(b) => Self::Bool(b),
			serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
			serde_json::Value::String(s) => Self::String(s),
			serde_json::Value::Array(items) => {
				Self::List(Container::from_values(items.into_iter().map(Value::from)))
			}
			serde_json::Value::Object(map) => Self::Map(Container::from_pairs(
				map.into_iter().map(|(k, v)| (k, Value::from(v))),
			)),
		}
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<f64> for Value {
	fn from(n: f64) -> Self {
		Self::Number(n)
	}
}

impl From<i32> for Value {
	fn from(n: i32) -> Self {
		Self::Number(f64::from(n))
	}
}

impl From<u32> for Value {
	fn from(n: u32) -> Self {
		Self::Number(f64::from(n))
	}
}

impl From<i64> for Value {
	fn from(n: i64) -> Self {
		Self::Number(n as f64)
	}
}

impl From<usize> for Value {
	fn from(n: usize) -> Self {
		Self::Number(n as f64)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Self::String(s.to_string())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Self::String(s)
	}
}

impl From<Observable> for Value {
	fn from(observable: Observable) -> Self {
		Self::Observed(observable)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(Self::Null)
	}
}

impl Serialize for Value {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Self::Null => serializer.serialize_unit(),
			Self::Bool(b) => serializer.serialize_bool(*b),
			Self::Number(n) => number_to_json(*n).serialize(serializer),
			Self::String(s) => serializer.serialize_str(s),
			Self::Map(container) | Self::List(container) => container.serialize(serializer),
			Self::Observed(observable) => observable.target().serialize(serializer),
		}
	}
}

impl Serialize for Container {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match &*self.entries() {
			Entries::Map(map) => {
				let mut out = serializer.serialize_map(Some(map.len()))?;
				for (key, value) in map {
					out.serialize_entry(key, value)?;
				}
				out.end()
			}
			Entries::List(list) => {
				let mut out = serializer.serialize_seq(Some(list.len()))?;
				for value in list {
					out.serialize_element(value)?;
				}
				out.end()
			}
		}
	}
}

impl<'de> Deserialize<'de> for Value {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		serde_json::Value::deserialize(deserializer).map(Value::from)
	}
}
