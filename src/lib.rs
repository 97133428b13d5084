//! # Reverb
//!
//! A minimal reactive UI layer: observable data containers publish change
//! notifications, render units subscribed to those notifications recompute
//! their templates, and the results are merged into a live node tree with
//! minimal mutation.
//!
//! ## Crates
//!
//! - [`core`] (reverb-core): value model, observable wrapper, channels, event bus
//! - [`pages`] (reverb-pages): render units, scheduler, reconciliation, host tree
//!
//! ## Feature Flags
//!
//! - `pages` (default) - render layer; without it only the data layer is built
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use reverb::prelude::*;
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
//! data.set("count", 1)?;
//! ```

pub mod core;
#[cfg(feature = "pages")]
pub mod pages;

// Re-export the data layer
pub use reverb_core::{
	ChannelName, Observable, ObservableError, ObservableOptions, Value, make_observable,
	proxy_safe_compare,
};

// Re-export the render layer
#[cfg(feature = "pages")]
pub use reverb_pages::{
	MountSpec, RenderError, RenderSettings, RenderUnit, Rendered, Template, apply, is_active,
	is_paused, make_render_unit, pause_all, reset, resume_all,
};

pub mod prelude {
	//! Commonly used items.

	pub use crate::{ChannelName, Observable, ObservableOptions, Value, make_observable};

	#[cfg(feature = "pages")]
	pub use crate::{
		MountSpec, RenderError, RenderUnit, Rendered, Template, make_render_unit, pause_all,
		resume_all,
	};
}
