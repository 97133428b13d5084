//! Notification Channel Dispatcher
//!
//! A publish/subscribe registry mapping channel names to listeners. Observables
//! publish change notifications here; render units subscribe to the channels
//! they react to.
//!
//! ## Architecture
//!
//! The bus is a thread-local context, created on first use. In WASM there is a
//! single thread, so it is effectively process-wide. [`reset`] tears all
//! subscriptions down, which keeps tests isolated from each other.
//!
//! Listeners run after the registry borrow has been released, so a listener may
//! subscribe, unsubscribe or dispatch while it is being notified.
//!
//! ## Example
//!
//! ```ignore
//! use reverb_core::bus::{self, Notification};
//! use reverb_core::channel::ChannelName;
//!
//! let id = bus::subscribe(ChannelName::user("counter"), |n: &Notification| {
//!     println!("{} changed", n.channel);
//! });
//! bus::dispatch(&[ChannelName::user("counter")], None);
//! bus::unsubscribe(id);
//! ```

use core::cell::{Cell, RefCell};

extern crate alloc;
use alloc::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::channel::ChannelName;
use crate::value::{Key, Value};

/// Kind of mutation a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
	/// Property write
	Set,
	/// Property deletion
	Delete,
	/// Keyed insert through an explicit mutator
	Insert,
	/// Keyed removal through an explicit mutator
	Remove,
	/// Removal of every entry
	Clear,
	/// Append to a sequence
	Push,
	/// In-place update through a closure
	Update,
}

/// Payload describing a single mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detail {
	/// What happened
	pub action: Action,
	/// Property or key that was touched, when there is one
	#[serde(skip_serializing_if = "Option::is_none")]
	pub key: Option<Key>,
	/// Value that was stored, when there is one
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
}

impl Detail {
	/// Creates a detail payload.
	pub fn new(action: Action, key: Option<Key>, value: Option<Value>) -> Self {
		Self { action, key, value }
	}
}

/// A notification delivered to listeners of one channel.
#[derive(Debug, Clone)]
pub struct Notification {
	/// Channel the notification was published on
	pub channel: ChannelName,
	/// Optional mutation payload
	pub detail: Option<Detail>,
}

/// Listener callback type
pub type Listener = Rc<dyn Fn(&Notification)>;

/// Handle identifying a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Channel → listeners registry
pub struct EventBus {
	listeners: RefCell<IndexMap<ChannelName, Vec<(SubscriptionId, Listener)>>>,
	next_id: Cell<u64>,
}

impl EventBus {
	/// Creates an empty bus.
	pub fn new() -> Self {
		Self {
			listeners: RefCell::new(IndexMap::new()),
			next_id: Cell::new(0),
		}
	}

	/// Registers `listener` for `channel`.
	pub fn subscribe(&self, channel: ChannelName, listener: Listener) -> SubscriptionId {
		let id = SubscriptionId(self.next_id.get());
		self.next_id.set(id.0 + 1);
		tracing::trace!(channel = %channel, ?id, "subscribe");
		self.listeners
			.borrow_mut()
			.entry(channel)
			.or_default()
			.push((id, listener));
		id
	}

	/// Removes a subscription. Returns `false` if it was not registered.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		let mut listeners = self.listeners.borrow_mut();
		let mut removed = false;
		for entries in listeners.values_mut() {
			let before = entries.len();
			entries.retain(|(entry_id, _)| *entry_id != id);
			removed |= entries.len() < before;
		}
		listeners.retain(|_, entries| !entries.is_empty());
		removed
	}

	/// Number of listeners registered on `channel`.
	pub fn listener_count(&self, channel: &ChannelName) -> usize {
		self.listeners
			.borrow()
			.get(channel)
			.map(Vec::len)
			.unwrap_or(0)
	}

	/// Emits one notification per channel.
	///
	/// Channels without listeners are skipped.
	pub fn dispatch(&self, channels: &[ChannelName], detail: Option<&Detail>) {
		for channel in channels {
			let targets: Vec<Listener> = match self.listeners.borrow().get(channel) {
				Some(entries) => entries.iter().map(|(_, l)| l.clone()).collect(),
				None => continue,
			};
			tracing::trace!(channel = %channel, listeners = targets.len(), "dispatch");
			let notification = Notification {
				channel: channel.clone(),
				detail: detail.cloned(),
			};
			for listener in targets {
				listener(&notification);
			}
		}
	}

	/// Drops every subscription.
	pub fn clear(&self) {
		self.listeners.borrow_mut().clear();
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new()
	}
}

thread_local! {
	static BUS: EventBus = EventBus::new();
}

/// Runs `f` against the thread's bus.
pub fn with_bus<F, R>(f: F) -> R
where
	F: FnOnce(&EventBus) -> R,
{
	BUS.with(f)
}

/// Like [`with_bus`], but returns `None` once the thread-local has been destroyed.
pub fn try_with_bus<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&EventBus) -> R,
{
	BUS.try_with(f).ok()
}

/// Subscribes `listener` to `channel` on the thread's bus.
pub fn subscribe<F>(channel: ChannelName, listener: F) -> SubscriptionId
where
	F: Fn(&Notification) + 'static,
{
	with_bus(|bus| bus.subscribe(channel, Rc::new(listener)))
}

/// Removes a subscription from the thread's bus.
pub fn unsubscribe(id: SubscriptionId) -> bool {
	try_with_bus(|bus| bus.unsubscribe(id)).unwrap_or(false)
}

/// Number of listeners on `channel`.
pub fn listener_count(channel: &ChannelName) -> usize {
	try_with_bus(|bus| bus.listener_count(channel)).unwrap_or(0)
}

/// Emits one notification per channel, carrying `detail` when present.
///
/// This is a no-op when the bus is unavailable (thread teardown), so
/// observables may be mutated safely outside a live render context.
pub fn dispatch(channels: &[ChannelName], detail: Option<Detail>) {
	let _ = try_with_bus(|bus| bus.dispatch(channels, detail.as_ref()));
}

/// Drops every subscription on the thread's bus.
pub fn reset() {
	let _ = try_with_bus(EventBus::clear);
}
