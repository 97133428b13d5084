//! Host timing primitives
//!
//! The scheduler needs two cancelable deferrals from its host: a macrotask
//! delay and a paint-aligned frame callback. It also needs an executor for
//! pending template computations. [`Host`] is that seam.
//!
//! - [`ManualHost`]: explicit driver used on native targets and in tests
//! - `BrowserHost`: `setTimeout` / `requestAnimationFrame` on `wasm32`

mod manual;

#[cfg(target_arch = "wasm32")]
mod browser;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserHost;
pub use manual::ManualHost;

use core::time::Duration;

extern crate alloc;
use alloc::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::error::RenderError;

/// A deferred callback.
pub type Callback = Box<dyn FnOnce()>;

/// Handle of a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
	/// Wraps a host timer id.
	pub fn new(raw: u64) -> Self {
		Self(raw)
	}

	/// The host timer id.
	pub fn raw(self) -> u64 {
		self.0
	}
}

/// Handle of a requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
	/// Wraps a host frame request id.
	pub fn new(raw: u64) -> Self {
		Self(raw)
	}

	/// The host frame request id.
	pub fn raw(self) -> u64 {
		self.0
	}
}

/// Timer, frame and executor primitives of the host platform.
pub trait Host {
	/// Runs `callback` once after `delay`.
	fn set_timeout(&self, delay: Duration, callback: Callback) -> TimerHandle;

	/// Cancels a timer. Unknown or fired handles are ignored.
	fn clear_timeout(&self, handle: TimerHandle);

	/// Runs `callback` before the next paint.
	fn request_frame(&self, callback: Callback) -> FrameHandle;

	/// Cancels a frame request. Unknown or fired handles are ignored.
	fn cancel_frame(&self, handle: FrameHandle);

	/// Drives `task` to completion on the current thread.
	fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), RenderError>;

	/// Polls spawned tasks that can make progress right now.
	///
	/// Hosts whose platform runs spawned tasks on its own leave this empty.
	fn poll_tasks(&self) {}
}

/// The default host for the compilation target.
pub fn default_host() -> Rc<dyn Host> {
	#[cfg(target_arch = "wasm32")]
	{
		Rc::new(BrowserHost)
	}
	#[cfg(not(target_arch = "wasm32"))]
	{
		Rc::new(ManualHost::new())
	}
}
