//! Render Scheduler
//!
//! Coalesces render requests into one batched pass per timer/frame pair.
//!
//! ## Architecture
//!
//! 1. **Pending set**: units waiting for the next pass, in insertion order;
//!    enqueuing a unit that is already pending does not add it twice
//! 2. **Timer stage**: every enqueue restarts a short host timer, absorbing
//!    synchronous bursts
//! 3. **Frame stage**: when the timer fires, a frame callback is requested
//!    (replacing any outstanding one) and runs the pass
//! 4. **Completion**: one frame after the pass the global completion channel
//!    fires; each unit's named completion fires once its own work settles
//!
//! While paused, nothing is processed but the pending set is kept and
//! replayed on resume.
//!
//! The scheduler is a thread-local context. [`init`] installs a host and
//! settings; otherwise the first use creates one with [`default_host`] and
//! default settings, reachable through [`host`]. [`reset`] tears it down.
//!
//! ## Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use reverb_pages::host::ManualHost;
//! use reverb_pages::{scheduler, RenderSettings};
//!
//! let host = Rc::new(ManualHost::new());
//! scheduler::init(host.clone(), RenderSettings::default());
//! // ... create render units, mutate observables ...
//! host.run_until_idle();
//! ```

use core::cell::{Cell, RefCell};

extern crate alloc;
use alloc::rc::{Rc, Weak};

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use indexmap::IndexMap;
use reverb_core::ChannelName;
use reverb_core::bus;

use crate::error::RenderResult;
use crate::host::{FrameHandle, Host, TimerHandle, default_host};
use crate::settings::RenderSettings;

/// Completion signal of one unit's render pass.
///
/// Resolves once every reconciliation of the pass has finished or been
/// dropped as stale. Cloning yields another handle to the same signal.
pub type Completion = Shared<LocalBoxFuture<'static, RenderResult<()>>>;

/// A completion signal that has already resolved successfully.
pub fn completed() -> Completion {
	futures::future::ready(Ok(())).boxed_local().shared()
}

/// The seam between the scheduler and the units it drives.
pub trait Renderable {
	/// Key of the unit in the pending set.
	fn unit_id(&self) -> u64;

	/// Name used for the unit's completion channel.
	fn name(&self) -> &str;

	/// Whether the unit still reacts to requests.
	fn is_active(&self) -> bool;

	/// Clears the marker that suppresses duplicate requests.
	fn clear_debounce(&self);

	/// Runs the unit's render pass.
	///
	/// Returns `None` when no mount point resolved and nothing was rendered.
	fn render_queue_callback(self: Rc<Self>) -> RenderResult<Option<Completion>>;
}

struct Scheduler {
	host: Rc<dyn Host>,
	settings: RenderSettings,
	pending: RefCell<IndexMap<u64, Rc<dyn Renderable>>>,
	paused: Cell<bool>,
	timer: Cell<Option<TimerHandle>>,
	frame: Cell<Option<FrameHandle>>,
}

impl Scheduler {
	fn new(host: Rc<dyn Host>, settings: RenderSettings) -> Self {
		Self {
			host,
			settings,
			pending: RefCell::new(IndexMap::new()),
			paused: Cell::new(false),
			timer: Cell::new(None),
			frame: Cell::new(None),
		}
	}

	fn enqueue(self: &Rc<Self>, unit: Rc<dyn Renderable>) {
		if !unit.is_active() {
			return;
		}
		let id = unit.unit_id();
		let inserted = self.pending.borrow_mut().insert(id, unit).is_none();
		tracing::debug!(unit = id, inserted, "enqueue");
		self.start_queue();
	}

	fn start_queue(self: &Rc<Self>) {
		if self.paused.get() {
			return;
		}
		if let Some(timer) = self.timer.take() {
			self.host.clear_timeout(timer);
		}
		let scheduler = Rc::downgrade(self);
		let timer = self.host.set_timeout(
			self.settings.debounce(),
			Box::new(move || {
				if let Some(scheduler) = scheduler.upgrade() {
					scheduler.on_timer();
				}
			}),
		);
		self.timer.set(Some(timer));
	}

	fn on_timer(self: &Rc<Self>) {
		self.timer.set(None);
		if self.paused.get() {
			return;
		}
		if let Some(frame) = self.frame.take() {
			self.host.cancel_frame(frame);
		}
		let scheduler = Rc::downgrade(self);
		let frame = self.host.request_frame(Box::new(move || {
			if let Some(scheduler) = scheduler.upgrade() {
				scheduler.frame.set(None);
				if let Err(e) = scheduler.process_queue() {
					tracing::error!(error = %e, "render pass failed");
				}
			}
		}));
		self.frame.set(Some(frame));
	}

	fn process_queue(self: &Rc<Self>) -> RenderResult<()> {
		if self.paused.get() {
			return Ok(());
		}
		let pending = core::mem::take(&mut *self.pending.borrow_mut());
		if pending.is_empty() {
			return Ok(());
		}
		tracing::debug!(units = pending.len(), "processing render queue");

		let mut completions = Vec::new();
		let mut first_error = None;
		for unit in pending.into_values() {
			if !unit.is_active() {
				unit.clear_debounce();
				continue;
			}
			let name = unit.name().to_string();
			match unit.clone().render_queue_callback() {
				Ok(Some(completion)) => completions.push((name, completion)),
				Ok(None) => {}
				Err(e) => {
					tracing::error!(unit = %name, error = %e, "render unit failed");
					unit.clear_debounce();
					first_error.get_or_insert(e);
				}
			}
		}

		if self.settings.emit_completion {
			self.schedule_completion(completions);
		}
		first_error.map_or(Ok(()), Err)
	}

	fn schedule_completion(self: &Rc<Self>, completions: Vec<(String, Completion)>) {
		let scheduler: Weak<Self> = Rc::downgrade(self);
		self.host.request_frame(Box::new(move || {
			bus::dispatch(&[ChannelName::RENDERED], None);
			let Some(scheduler) = scheduler.upgrade() else {
				return;
			};
			for (name, completion) in completions {
				let task = async move {
					match completion.await {
						Ok(()) => bus::dispatch(&[ChannelName::unit_rendered(&name)], None),
						Err(e) => tracing::warn!(unit = %name, error = %e, "render did not complete"),
					}
				};
				if let Err(e) = scheduler.host.spawn_local(task.boxed_local()) {
					tracing::error!(error = %e, "failed to await render completion");
				}
			}
		}));
	}

	/// Cancels the timer and frame stages and releases every pending unit.
	fn cancel_outstanding(&self) {
		if let Some(timer) = self.timer.take() {
			self.host.clear_timeout(timer);
		}
		if let Some(frame) = self.frame.take() {
			self.host.cancel_frame(frame);
		}
		let released = core::mem::take(&mut *self.pending.borrow_mut());
		if !released.is_empty() {
			tracing::debug!(units = released.len(), "released pending units");
		}
		for unit in released.into_values() {
			unit.clear_debounce();
		}
	}
}

thread_local! {
	static SCHEDULER: RefCell<Option<Rc<Scheduler>>> = const { RefCell::new(None) };
}

fn context() -> Rc<Scheduler> {
	SCHEDULER.with(|slot| {
		slot.borrow_mut()
			.get_or_insert_with(|| Rc::new(Scheduler::new(default_host(), RenderSettings::default())))
			.clone()
	})
}

/// Installs `host` and `settings` as the thread's scheduler context.
///
/// Any previous context is torn down. Its pending units are released without
/// rendering and accept new requests again.
pub fn init(host: Rc<dyn Host>, settings: RenderSettings) {
	let previous = SCHEDULER.with(|slot| {
		slot.borrow_mut()
			.replace(Rc::new(Scheduler::new(host, settings)))
	});
	if let Some(previous) = previous {
		previous.cancel_outstanding();
	}
}

/// Tears down the thread's scheduler context, releasing its pending units.
pub fn reset() {
	let previous = SCHEDULER
		.try_with(|slot| slot.borrow_mut().take())
		.ok()
		.flatten();
	if let Some(previous) = previous {
		previous.cancel_outstanding();
	}
}

/// Adds `unit` to the pending set and restarts the timer stage.
///
/// Inactive units are ignored.
pub fn enqueue(unit: Rc<dyn Renderable>) {
	context().enqueue(unit);
}

/// Number of units waiting for the next pass.
pub fn pending_count() -> usize {
	context().pending.borrow().len()
}

/// Runs a pass over the pending set immediately, bypassing the timer and frame.
///
/// Every pending unit is rendered even if an earlier one fails; the first
/// failure is returned. Pending template computations the pass spawned are
/// then polled once through [`Host::poll_tasks`], so results that are already
/// available are applied before this returns.
pub fn flush() -> RenderResult<()> {
	let scheduler = context();
	let outcome = scheduler.process_queue();
	scheduler.host.poll_tasks();
	outcome
}

/// The host driving the thread's scheduler.
///
/// When [`init`] was never called this is the implicit [`default_host`]
/// created on first use.
pub fn host() -> Rc<dyn Host> {
	context().host.clone()
}

/// Hands `task` to the host executor.
pub fn spawn_local(task: LocalBoxFuture<'static, ()>) -> RenderResult<()> {
	context().host.spawn_local(task)
}

/// Suspends all processing; pending units are kept.
pub fn pause_all() {
	tracing::debug!("scheduler paused");
	context().paused.set(true);
}

/// Resumes processing and replays units enqueued while paused.
pub fn resume_all() {
	let scheduler = context();
	scheduler.paused.set(false);
	tracing::debug!("scheduler resumed");
	if !scheduler.pending.borrow().is_empty() {
		scheduler.start_queue();
	}
}

/// Returns `true` unless the scheduler is paused.
pub fn is_active() -> bool {
	!is_paused()
}

/// Returns `true` while the scheduler is paused.
pub fn is_paused() -> bool {
	context().paused.get()
}
