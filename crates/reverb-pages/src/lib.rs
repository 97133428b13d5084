//! Reverb Pages - Render Layer
//!
//! Render units that keep parts of a node tree in sync with observable data.
//!
//! ## Flow
//!
//! 1. Mutating an [`Observable`](reverb_core::Observable) publishes on its channels
//! 2. Render units subscribed to those channels request a render
//! 3. The [`scheduler`] batches requests into one pass per timer/frame pair
//! 4. Each unit computes its template and [`reconcile`]s it into its mounts
//! 5. Completion channels fire: `reverb-render` once per pass, then
//!    `reverb-render:<unit>` per unit once its work settles
//!
//! ## Modules
//!
//! - [`dom`]: host tree (in-memory natively, the page DOM on `wasm32`)
//! - [`reconcile`]: in-place tree reconciliation
//! - [`host`]: timer, frame and executor primitives
//! - [`scheduler`]: batching render scheduler
//! - [`render_unit`]: render units and mount points
//! - [`registry`]: named unit registry
//! - [`settings`]: scheduler settings
//!
//! ## Example
//!
//! ```ignore
//! use reverb_pages::{make_render_unit, make_observable, MountSpec, ObservableOptions, Rendered};
//!
//! let data = make_observable(None, &["counter"], ObservableOptions::default())?;
//! data.set("count", 0)?;
//!
//! let state = data.clone();
//! make_render_unit("counter", MountSpec::id("app"), move || {
//!     let count = state.get("count").unwrap_or_default();
//!     Ok(Rendered::ready(format!("<span>{}</span>", count)))
//! }, &["counter"], false);
//!
//! data.set("count", 1)?; // the span reads "1" after the next frame
//! ```

#![warn(missing_docs)]

pub mod dom;
pub mod error;
pub mod host;
pub mod reconcile;
pub mod registry;
pub mod render_unit;
pub mod scheduler;
pub mod settings;

pub use dom::{Document, Node, NodeKind, parse_fragment};
pub use error::{DomError, RenderError, RenderResult, SettingsError};
pub use host::{Host, ManualHost};
pub use reconcile::{Template, apply};
pub use render_unit::{MountSpec, RenderUnit, Rendered};
pub use reverb_core::{ObservableOptions, make_observable, proxy_safe_compare};
pub use scheduler::{Completion, is_active, is_paused, pause_all, resume_all};
pub use settings::RenderSettings;

/// Creates a render unit, registers it under `name` and, unless
/// `start_paused`, requests its first render.
///
/// A previous unit registered under the same name is replaced.
pub fn make_render_unit<F, S>(
	name: &str,
	mount: impl Into<MountSpec>,
	template: F,
	channels: &[S],
	start_paused: bool,
) -> RenderUnit
where
	F: Fn() -> RenderResult<Rendered> + 'static,
	S: AsRef<str>,
{
	let unit = RenderUnit::new(name, mount, template, channels);
	registry::register(unit.clone());
	if start_paused {
		unit.pause();
	} else {
		unit.render();
	}
	unit
}

/// Tears down every thread-local context: registry, scheduler, event bus and
/// current document.
pub fn reset() {
	registry::reset();
	scheduler::reset();
	reverb_core::bus::reset();
	dom::reset_current_document();
}
