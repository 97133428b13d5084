//! Browser host backed by `window` timers and animation frames.

use core::time::Duration;

use futures::future::LocalBoxFuture;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use super::{Callback, FrameHandle, Host, TimerHandle};
use crate::error::RenderError;

/// Host using `setTimeout`, `requestAnimationFrame` and the microtask queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserHost;

impl Host for BrowserHost {
	fn set_timeout(&self, delay: Duration, callback: Callback) -> TimerHandle {
		let Some(window) = web_sys::window() else {
			tracing::warn!("no window available, timer dropped");
			return TimerHandle::new(0);
		};
		let closure = Closure::once_into_js(move || callback());
		let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
		match window
			.set_timeout_with_callback_and_timeout_and_arguments_0(closure.unchecked_ref::<js_sys::Function>(), millis)
		{
			Ok(id) => TimerHandle::new(id as u64),
			Err(e) => {
				tracing::warn!(error = ?e, "setTimeout failed");
				TimerHandle::new(0)
			}
		}
	}

	fn clear_timeout(&self, handle: TimerHandle) {
		if let Some(window) = web_sys::window() {
			window.clear_timeout_with_handle(handle.raw() as i32);
		}
	}

	fn request_frame(&self, callback: Callback) -> FrameHandle {
		let Some(window) = web_sys::window() else {
			tracing::warn!("no window available, frame dropped");
			return FrameHandle::new(0);
		};
		let closure = Closure::once_into_js(move |_timestamp: f64| callback());
		match window.request_animation_frame(closure.unchecked_ref::<js_sys::Function>()) {
			Ok(id) => FrameHandle::new(id as u64),
			Err(e) => {
				tracing::warn!(error = ?e, "requestAnimationFrame failed");
				FrameHandle::new(0)
			}
		}
	}

	fn cancel_frame(&self, handle: FrameHandle) {
		if let Some(window) = web_sys::window()
			&& let Err(e) = window.cancel_animation_frame(handle.raw() as i32)
		{
			tracing::warn!(error = ?e, "cancelAnimationFrame failed");
		}
	}

	fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), RenderError> {
		wasm_bindgen_futures::spawn_local(task);
		Ok(())
	}
}
