//! Observable Wrapper
//!
//! [`Observable`] wraps a mapping or sequence so that every mutation made
//! through it is reported on the bound notification channels. Reads and writes
//! go through explicit accessors ([`Observable::get`], [`Observable::set`],
//! [`Observable::delete`]) which perform the equality check and the dispatch.
//!
//! ## Key Features
//!
//! - **Idempotent wrapping**: wrapping an observable, or a container that is
//!   already observed, returns the existing wrapper.
//! - **Lazy deep reactivity**: with `recursive` enabled, nested containers are
//!   wrapped the first time they are read, and replaced in place.
//! - **Proxy-safe equality**: writes that would store an equal value (after
//!   unwrapping observables to their raw containers) are dropped silently.
//! - **Shared mute**: wrappers derived from one root share a single mute flag.
//!   Unmuting emits exactly one plain notification.
//!
//! ## Example
//!
//! ```ignore
//! use reverb_core::{make_observable, ObservableOptions, Value};
//!
//! let data = make_observable(None, &["counter"], ObservableOptions::default())?;
//! data.set("count", 1)?; // notifies `reverb` and `reverb:counter`
//! data.set("count", 1)?; // equal value, no notification
//! ```

use core::cell::Cell;
use core::fmt;

extern crate alloc;
use alloc::rc::Rc;

use serde::Deserialize;

use crate::bus::{self, Action, Detail};
use crate::channel::{ChannelName, normalize_channels};
use crate::error::{ObservableError, ObservableResult};
use crate::value::{Container, Entries, Key, Value, is_plain_container};

/// Wrapping behaviour shared by an observable and everything derived from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ObservableOptions {
	/// Wrap nested containers when they are read or written
	pub recursive: bool,
	/// Attach a [`Detail`] payload to notifications
	pub include_detail: bool,
}

impl ObservableOptions {
	/// Options with recursive wrapping enabled.
	pub fn recursive() -> Self {
		Self {
			recursive: true,
			include_detail: false,
		}
	}

	/// Enables or disables detail payloads.
	pub fn with_detail(mut self, include_detail: bool) -> Self {
		self.include_detail = include_detail;
		self
	}
}

/// Mute flag shared by reference across a wrapped subtree.
#[derive(Debug, Clone, Default)]
pub struct MuteFlag(Rc<Cell<bool>>);

impl MuteFlag {
	/// Whether notifications are currently suppressed.
	pub fn is_muted(&self) -> bool {
		self.0.get()
	}

	/// Returns `true` when both flags are the same shared flag.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	fn set(&self, muted: bool) {
		self.0.set(muted);
	}
}

pub(crate) struct ObservableInner {
	target: Container,
	channels: Rc<[ChannelName]>,
	options: ObservableOptions,
	mute: MuteFlag,
}

/// A mapping or sequence whose mutations are reported on notification channels.
///
/// Cloning an `Observable` clones the handle; all clones observe the same container.
#[derive(Clone)]
pub struct Observable {
	inner: Rc<ObservableInner>,
}

impl Observable {
	pub(crate) fn from_inner(inner: Rc<ObservableInner>) -> Self {
		Self { inner }
	}

	/// Wraps `value` so that mutations are reported on `channels`.
	///
	/// Channels are used verbatim; see [`make_observable`] for the normalized
	/// public constructor.
	///
	/// # Errors
	///
	/// Returns [`ObservableError::NotAContainer`] for primitive values.
	pub fn wrap(
		value: Value,
		channels: Vec<ChannelName>,
		options: ObservableOptions,
	) -> ObservableResult<Self> {
		Self::wrap_shared(value, channels.into(), options, MuteFlag::default())
	}

	fn wrap_shared(
		value: Value,
		channels: Rc<[ChannelName]>,
		options: ObservableOptions,
		mute: MuteFlag,
	) -> ObservableResult<Self> {
		match value {
			Value::Observed(observable) => Ok(observable),
			Value::Map(container) | Value::List(container) => {
				if let Some(existing) = container.observer() {
					return Ok(existing);
				}
				let inner = Rc::new(ObservableInner {
					target: container.clone(),
					channels,
					options,
					mute,
				});
				container.set_observer(&inner);
				tracing::trace!(channels = ?inner.channels, "wrapped container");
				Ok(Self { inner })
			}
			other => Err(ObservableError::NotAContainer(format!("{:?}", other))),
		}
	}

	/// Wraps a nested container with this observable's channels, options and mute flag.
	fn wrap_nested(&self, value: Value) -> ObservableResult<Self> {
		Self::wrap_shared(
			value,
			self.inner.channels.clone(),
			self.inner.options,
			self.inner.mute.clone(),
		)
	}

	/// The raw container behind this observable.
	pub fn target(&self) -> Container {
		self.inner.target.clone()
	}

	/// Channels this observable reports to.
	pub fn channels(&self) -> &[ChannelName] {
		&self.inner.channels
	}

	/// Wrapping options.
	pub fn options(&self) -> ObservableOptions {
		self.inner.options
	}

	/// The shared mute flag.
	pub fn mute_flag(&self) -> &MuteFlag {
		&self.inner.mute
	}

	/// Returns `true` when both handles are the same wrapper.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	/// Number of entries in the wrapped container.
	pub fn len(&self) -> usize {
		self.inner.target.len()
	}

	/// Returns `true` when the wrapped container is empty.
	pub fn is_empty(&self) -> bool {
		self.inner.target.is_empty()
	}

	/// Keys of the wrapped container, in order.
	pub fn keys(&self) -> Vec<Key> {
		self.inner.target.keys()
	}

	/// Reads an entry.
	///
	/// With recursive wrapping enabled, a nested plain container is wrapped and
	/// stored back in place before it is returned, so later reads observe the
	/// same wrapper.
	pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
		let key = key.into();
		let value = self.inner.target.get(&key)?;
		if !self.inner.options.recursive {
			return Some(value);
		}
		match value {
			Value::Map(_) | Value::List(_) => {
				let nested = self.wrap_nested(value.clone()).ok()?;
				let wrapped = Value::Observed(nested);
				self.store(&key, wrapped.clone()).ok()?;
				Some(wrapped)
			}
			other => Some(other),
		}
	}

	/// Writes an entry, notifying unless the value is unchanged or the subtree is muted.
	///
	/// Returns `Ok(false)` when the write was skipped because the stored value is
	/// already equal under [`proxy_safe_compare`].
	///
	/// # Errors
	///
	/// Sequence writes accept an index up to the current length (appending at the
	/// end); anything else is rejected.
	pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> ObservableResult<bool> {
		let key = key.into();
		let mut value = value.into();

		if let Some(current) = self.inner.target.get(&key)
			&& proxy_safe_compare(&current, &value)
		{
			return Ok(false);
		}

		if self.inner.options.recursive && is_plain_container(&value) {
			value = Value::Observed(self.wrap_nested(value)?);
		}

		self.store(&key, value.clone())?;
		self.notify(|| Detail::new(Action::Set, Some(key), Some(value)));
		Ok(true)
	}

	/// Deletes an entry, notifying when something was removed.
	pub fn delete(&self, key: impl Into<Key>) -> ObservableResult<Option<Value>> {
		let key = key.into();
		let removed = self.take(&key)?;
		if removed.is_some() {
			self.notify(|| Detail::new(Action::Delete, Some(key), None));
		}
		Ok(removed)
	}

	/// Inserts an entry through the collection mutator and notifies.
	///
	/// On a mapping this adds or replaces the named entry. On a sequence the
	/// value is inserted at the index, shifting later entries.
	pub fn insert(
		&self,
		key: impl Into<Key>,
		value: impl Into<Value>,
	) -> ObservableResult<Option<Value>> {
		let key = key.into();
		let value = value.into();
		let previous = {
			let mut entries = self.inner.target.entries_mut();
			match &mut *entries {
				Entries::Map(map) => map.insert(key.to_name(), value.clone()),
				Entries::List(list) => match key {
					Key::Index(index) if index <= list.len() => {
						list.insert(index, value.clone());
						None
					}
					Key::Index(index) => {
						return Err(ObservableError::IndexOutOfBounds {
							index,
							len: list.len(),
						});
					}
					Key::Name(_) => {
						return Err(ObservableError::InvalidKey {
							container: "sequence",
							key,
						});
					}
				},
			}
		};
		self.notify(|| Detail::new(Action::Insert, Some(key), Some(value)));
		Ok(previous)
	}

	/// Removes an entry through the collection mutator and notifies.
	pub fn remove(&self, key: impl Into<Key>) -> ObservableResult<Option<Value>> {
		let key = key.into();
		let removed = self.take(&key)?;
		self.notify(|| Detail::new(Action::Remove, Some(key), None));
		Ok(removed)
	}

	/// Removes every entry and notifies.
	pub fn clear(&self) {
		match &mut *self.inner.target.entries_mut() {
			Entries::Map(map) => map.clear(),
			Entries::List(list) => list.clear(),
		}
		self.notify(|| Detail::new(Action::Clear, None, None));
	}

	/// Appends to a sequence and notifies.
	pub fn push(&self, value: impl Into<Value>) -> ObservableResult<()> {
		let value = value.into();
		let index = match &mut *self.inner.target.entries_mut() {
			Entries::List(list) => {
				list.push(value.clone());
				list.len() - 1
			}
			Entries::Map(_) => {
				return Err(ObservableError::Unsupported {
					operation: "push",
					container: "mapping",
				});
			}
		};
		self.notify(|| Detail::new(Action::Push, Some(Key::Index(index)), Some(value)));
		Ok(())
	}

	/// Updates an entry in place through `f` and notifies.
	///
	/// A missing mapping entry starts out as [`Value::Null`]. The closure runs on
	/// a copy, so it may read this observable.
	pub fn update<F>(&self, key: impl Into<Key>, f: F) -> ObservableResult<()>
	where
		F: FnOnce(&mut Value),
	{
		let key = key.into();
		let mut value = match self.inner.target.get(&key) {
			Some(value) => value,
			None if self.inner.target.is_map() => Value::Null,
			None => {
				return Err(ObservableError::IndexOutOfBounds {
					index: match key {
						Key::Index(index) => index,
						Key::Name(_) => usize::MAX,
					},
					len: self.len(),
				});
			}
		};
		f(&mut value);
		self.store(&key, value.clone())?;
		self.notify(|| Detail::new(Action::Update, Some(key), Some(value)));
		Ok(())
	}

	/// Engages or releases the shared mute flag.
	///
	/// Releasing a muted flag emits one plain notification on this observable's
	/// channels so subscribers can catch up on the writes they missed.
	pub fn set_muted(&self, muted: bool) {
		let was_muted = self.inner.mute.is_muted();
		self.inner.mute.set(muted);
		if was_muted && !muted {
			tracing::trace!(channels = ?self.inner.channels, "unmuted");
			bus::dispatch(&self.inner.channels, None);
		}
	}

	/// Whether the shared mute flag is engaged.
	pub fn is_muted(&self) -> bool {
		self.inner.mute.is_muted()
	}

	/// Plain JSON snapshot of the wrapped data.
	pub fn snapshot(&self) -> serde_json::Value {
		self.inner.target.to_json()
	}

	fn store(&self, key: &Key, value: Value) -> ObservableResult<()> {
		match &mut *self.inner.target.entries_mut() {
			Entries::Map(map) => {
				map.insert(key.to_name(), value);
				Ok(())
			}
			Entries::List(list) => match key {
				Key::Index(index) if *index < list.len() => {
					list[*index] = value;
					Ok(())
				}
				Key::Index(index) if *index == list.len() => {
					list.push(value);
					Ok(())
				}
				Key::Index(index) => Err(ObservableError::IndexOutOfBounds {
					index: *index,
					len: list.len(),
				}),
				Key::Name(_) => Err(ObservableError::InvalidKey {
					container: "sequence",
					key: key.clone(),
				}),
			},
		}
	}

	fn take(&self, key: &Key) -> ObservableResult<Option<Value>> {
		match &mut *self.inner.target.entries_mut() {
			Entries::Map(map) => Ok(map.shift_remove(&key.to_name())),
			Entries::List(list) => match key {
				Key::Index(index) if *index < list.len() => Ok(Some(list.remove(*index))),
				Key::Index(_) => Ok(None),
				Key::Name(_) => Err(ObservableError::InvalidKey {
					container: "sequence",
					key: key.clone(),
				}),
			},
		}
	}

	fn notify<F>(&self, detail: F)
	where
		F: FnOnce() -> Detail,
	{
		if self.inner.mute.is_muted() {
			return;
		}
		let detail = self.inner.options.include_detail.then(detail);
		bus::dispatch(&self.inner.channels, detail);
	}
}

impl fmt::Debug for Observable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Observable")
			.field("target", &self.inner.target)
			.field("channels", &self.inner.channels)
			.field("options", &self.inner.options)
			.field("muted", &self.inner.mute.is_muted())
			.finish()
	}
}

/// Equality that looks through observables.
///
/// Containers (raw or wrapped) are equal when they are the same container.
/// Primitives are equal when their values are equal.
pub fn proxy_safe_compare(a: &Value, b: &Value) -> bool {
	match (a.container(), b.container()) {
		(Some(x), Some(y)) => x.ptr_eq(&y),
		(None, None) => match (a, b) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(x), Value::Bool(y)) => x == y,
			(Value::Number(x), Value::Number(y)) => x == y,
			(Value::String(x), Value::String(y)) => x == y,
			_ => false,
		},
		_ => false,
	}
}

/// Public constructor for observable data.
///
/// `data` defaults to an empty mapping. The observable reports to the base
/// channel plus each of `channels` namespaced under the channel prefix.
///
/// # Errors
///
/// Returns [`ObservableError::NotAContainer`] when `data` is a primitive.
pub fn make_observable<S: AsRef<str>>(
	data: Option<Value>,
	channels: &[S],
	options: ObservableOptions,
) -> ObservableResult<Observable> {
	Observable::wrap(
		data.unwrap_or_else(Value::map),
		normalize_channels(channels),
		options,
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::bus::Notification;
	use rstest::rstest;
	use serde_json::json;
	use serial_test::serial;
	use std::cell::RefCell;

	fn record(channel: ChannelName) -> Rc<RefCell<Vec<Notification>>> {
		let log = Rc::new(RefCell::new(Vec::new()));
		let sink = log.clone();
		bus::subscribe(channel, move |n: &Notification| {
			sink.borrow_mut().push(n.clone())
		});
		log
	}

	#[rstest]
	#[serial(bus)]
	fn test_set_notifies_base_and_user_channels() {
		// Arrange
		bus::reset();
		let base = record(ChannelName::BASE);
		let user = record(ChannelName::user("counter"));
		let data = make_observable(None, &["counter"], ObservableOptions::default()).unwrap();

		// Act
		let changed = data.set("count", 1).unwrap();

		// Assert
		assert!(changed);
		assert_eq!(base.borrow().len(), 1);
		assert_eq!(user.borrow().len(), 1);
		assert!(user.borrow()[0].detail.is_none());
		bus::reset();
	}

	#[rstest]
	#[serial(bus)]
	fn test_detail_payload_for_set_and_delete() {
		// Arrange
		bus::reset();
		let log = record(ChannelName::BASE);
		let options = ObservableOptions::default().with_detail(true);
		let data = make_observable::<&str>(None, &[], options).unwrap();

		// Act
		data.set("name", "ada").unwrap();
		data.delete("name").unwrap();

		// Assert
		let log = log.borrow();
		assert_eq!(
			log[0].detail,
			Some(Detail::new(Action::Set, Some(Key::from("name")), Some(Value::from("ada"))))
		);
		assert_eq!(
			log[1].detail,
			Some(Detail::new(Action::Delete, Some(Key::from("name")), None))
		);
		bus::reset();
	}

	#[rstest]
	fn test_primitive_cannot_be_wrapped() {
		let result = make_observable::<&str>(Some(Value::from(3)), &[], ObservableOptions::default());
		assert!(matches!(result, Err(ObservableError::NotAContainer(_))));
	}

	#[rstest]
	fn test_recursive_get_wraps_in_place_once() {
		// Arrange
		let data = Value::from(json!({ "user": { "name": "ada" } }));
		let observable =
			make_observable::<&str>(Some(data), &[], ObservableOptions::recursive()).unwrap();

		// Act
		let first = observable.get("user").unwrap();
		let second = observable.get("user").unwrap();

		// Assert
		assert!(first.is_observable());
		assert!(
			first
				.as_observable()
				.unwrap()
				.ptr_eq(second.as_observable().unwrap())
		);
		assert!(observable.target().get(&Key::from("user")).unwrap().is_observable());
	}

	#[rstest]
	fn test_non_recursive_get_returns_raw_container() {
		let data = Value::from(json!({ "user": { "name": "ada" } }));
		let observable =
			make_observable::<&str>(Some(data), &[], ObservableOptions::default()).unwrap();

		let user = observable.get("user").unwrap();

		assert!(!user.is_observable());
		assert!(is_plain_container(&user));
	}

	#[rstest]
	fn test_nested_wrapper_shares_mute_flag() {
		let data = Value::from(json!({ "user": { "name": "ada" } }));
		let root = make_observable::<&str>(Some(data), &[], ObservableOptions::recursive()).unwrap();

		let user = root.get("user").unwrap();
		let nested = user.as_observable().unwrap();

		assert!(nested.mute_flag().ptr_eq(root.mute_flag()));
		root.set_muted(true);
		assert!(nested.is_muted());
	}

	#[rstest]
	fn test_sequence_writes() {
		let list = make_observable::<&str>(Some(Value::list()), &[], ObservableOptions::default())
			.unwrap();

		list.set(0usize, "a").unwrap();
		list.push("b").unwrap();
		list.insert(1usize, "between").unwrap();

		assert_eq!(list.snapshot(), json!(["a", "between", "b"]));
		assert_eq!(
			list.set(7usize, "far"),
			Err(ObservableError::IndexOutOfBounds { index: 7, len: 3 })
		);
		assert!(matches!(
			list.set("name", 1),
			Err(ObservableError::InvalidKey { .. })
		));
	}

	#[rstest]
	fn test_push_on_mapping_is_unsupported() {
		let map = make_observable::<&str>(None, &[], ObservableOptions::default()).unwrap();
		assert!(matches!(
			map.push(1),
			Err(ObservableError::Unsupported { operation: "push", .. })
		));
	}

	#[rstest]
	#[serial(bus)]
	fn test_update_runs_on_copy_and_notifies() {
		// Arrange
		bus::reset();
		let log = record(ChannelName::BASE);
		let data = make_observable::<&str>(
			Some(Value::from(json!({ "count": 1 }))),
			&[],
			ObservableOptions::default(),
		)
		.unwrap();
		let reader = data.clone();

		// Act
		data.update("count", |value| {
			let current = reader.get("count").and_then(|v| v.as_f64()).unwrap_or(0.0);
			*value = Value::from(current + 1.0);
		})
		.unwrap();

		// Assert
		assert_eq!(data.snapshot(), json!({ "count": 2 }));
		assert_eq!(log.borrow().len(), 1);
		bus::reset();
	}

	#[rstest]
	#[case(Value::from(1), Value::from(1), true)]
	#[case(Value::from(1), Value::from(2), false)]
	#[case(Value::from("a"), Value::from("a"), true)]
	#[case(Value::Null, Value::Null, true)]
	#[case(Value::Null, Value::from(false), false)]
	#[case(Value::from(0), Value::from("0"), false)]
	fn test_proxy_safe_compare_primitives(#[case] a: Value, #[case] b: Value, #[case] equal: bool) {
		assert_eq!(proxy_safe_compare(&a, &b), equal);
	}

	#[rstest]
	fn test_proxy_safe_compare_unwraps_observables() {
		let raw = Value::map();
		let container = raw.container().unwrap();
		let observable =
			Observable::wrap(raw.clone(), vec![], ObservableOptions::default()).unwrap();

		assert!(proxy_safe_compare(&Value::Observed(observable.clone()), &raw));
		assert!(proxy_safe_compare(&raw, &Value::Observed(observable)));
		assert!(proxy_safe_compare(&Value::Map(container), &raw));
		assert!(!proxy_safe_compare(&raw, &Value::map()));
	}
}
