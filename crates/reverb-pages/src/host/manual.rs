//! Manually driven host.
//!
//! Nothing runs until the owner drives it: [`ManualHost::run_timers`] fires
//! due timers, [`ManualHost::run_frame`] plays one animation frame and
//! [`ManualHost::run_tasks`] polls spawned futures until they stall. Time is
//! virtual and only moves through [`ManualHost::advance`] or `run_timers`.

use core::cell::RefCell;
use core::time::Duration;

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use indexmap::IndexMap;

use super::{Callback, FrameHandle, Host, TimerHandle};
use crate::error::RenderError;

/// Upper bound on drive rounds in [`ManualHost::run_until_idle`].
const MAX_IDLE_ROUNDS: usize = 1024;

struct Timer {
	due: Duration,
	callback: Callback,
}

#[derive(Default)]
struct Queues {
	next_id: u64,
	now: Duration,
	timers: IndexMap<u64, Timer>,
	frames: IndexMap<u64, Callback>,
}

impl Queues {
	fn next_id(&mut self) -> u64 {
		self.next_id += 1;
		self.next_id
	}
}

/// Host whose timers, frames and tasks are driven explicitly.
pub struct ManualHost {
	queues: RefCell<Queues>,
	pool: RefCell<LocalPool>,
	spawner: LocalSpawner,
}

impl ManualHost {
	/// Creates an idle host at virtual time zero.
	pub fn new() -> Self {
		let pool = LocalPool::new();
		let spawner = pool.spawner();
		Self {
			queues: RefCell::new(Queues::default()),
			pool: RefCell::new(pool),
			spawner,
		}
	}

	/// Current virtual time.
	pub fn now(&self) -> Duration {
		self.queues.borrow().now
	}

	/// Number of scheduled timers.
	pub fn pending_timers(&self) -> usize {
		self.queues.borrow().timers.len()
	}

	/// Number of requested frames.
	pub fn pending_frames(&self) -> usize {
		self.queues.borrow().frames.len()
	}

	/// Moves virtual time forward by `by` and fires the timers that came due.
	pub fn advance(&self, by: Duration) -> usize {
		let until = self.now() + by;
		self.fire_timers_until(until)
	}

	/// Fires every timer scheduled so far, moving time to the latest due time.
	pub fn run_timers(&self) -> usize {
		let until = {
			let queues = self.queues.borrow();
			queues
				.timers
				.values()
				.map(|t| t.due)
				.max()
				.unwrap_or(queues.now)
		};
		self.fire_timers_until(until)
	}

	fn fire_timers_until(&self, until: Duration) -> usize {
		let mut due: Vec<(u64, Timer)> = {
			let mut queues = self.queues.borrow_mut();
			let ids: Vec<u64> = queues
				.timers
				.iter()
				.filter(|(_, t)| t.due <= until)
				.map(|(id, _)| *id)
				.collect();
			ids.into_iter()
				.filter_map(|id| queues.timers.shift_remove(&id).map(|t| (id, t)))
				.collect()
		};
		due.sort_by_key(|(id, t)| (t.due, *id));
		let fired = due.len();
		for (_, timer) in due {
			{
				let mut queues = self.queues.borrow_mut();
				queues.now = queues.now.max(timer.due);
			}
			(timer.callback)();
		}
		let mut queues = self.queues.borrow_mut();
		queues.now = queues.now.max(until);
		fired
	}

	/// Runs every frame callback requested so far, as one animation frame.
	///
	/// Frames requested by these callbacks wait for the next call.
	pub fn run_frame(&self) -> usize {
		let frames = core::mem::take(&mut self.queues.borrow_mut().frames);
		let count = frames.len();
		for (_, callback) in frames {
			callback();
		}
		count
	}

	/// Polls spawned tasks until none can make progress.
	pub fn run_tasks(&self) {
		self.pool.borrow_mut().run_until_stalled();
	}

	/// Alternates tasks, timers and frames until nothing is left to run.
	///
	/// Returns the number of rounds that fired a timer or frame.
	pub fn run_until_idle(&self) -> usize {
		let mut rounds = 0;
		while rounds < MAX_IDLE_ROUNDS {
			self.run_tasks();
			let timers = self.run_timers();
			let frames = self.run_frame();
			if timers == 0 && frames == 0 {
				break;
			}
			rounds += 1;
		}
		self.run_tasks();
		rounds
	}
}

impl Default for ManualHost {
	fn default() -> Self {
		Self::new()
	}
}

impl Host for ManualHost {
	fn set_timeout(&self, delay: Duration, callback: Callback) -> TimerHandle {
		let mut queues = self.queues.borrow_mut();
		let id = queues.next_id();
		let due = queues.now + delay;
		queues.timers.insert(id, Timer { due, callback });
		TimerHandle::new(id)
	}

	fn clear_timeout(&self, handle: TimerHandle) {
		self.queues.borrow_mut().timers.shift_remove(&handle.raw());
	}

	fn request_frame(&self, callback: Callback) -> FrameHandle {
		let mut queues = self.queues.borrow_mut();
		let id = queues.next_id();
		queues.frames.insert(id, callback);
		FrameHandle::new(id)
	}

	fn cancel_frame(&self, handle: FrameHandle) {
		self.queues.borrow_mut().frames.shift_remove(&handle.raw());
	}

	fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), RenderError> {
		self.spawner
			.spawn_local(task)
			.map_err(|e| RenderError::Spawn(e.to_string()))
	}

	fn poll_tasks(&self) {
		// Called from inside a running task: the outer run keeps polling.
		if let Ok(mut pool) = self.pool.try_borrow_mut() {
			pool.run_until_stalled();
		}
	}
}
