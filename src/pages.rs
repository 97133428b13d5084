//! Render layer
//!
//! This module provides access to reverb-pages: render units, the batching
//! scheduler, tree reconciliation and the host tree.
//!
//! ## Architecture
//!
//! - **Render Units**: template computations bound to mount points and channels
//! - **Scheduler**: timer/frame batching of render requests
//! - **Reconciliation**: in-place merge of proposed content into live nodes
//!
//! ## Example
//!
//! ```rust,ignore
//! use reverb::pages::{make_render_unit, MountSpec, Rendered};
//!
//! make_render_unit("greeting", MountSpec::id("app"), || {
//!     Ok(Rendered::ready("<p>hello</p>"))
//! }, &["greeting"], false);
//! ```

// Re-export all reverb-pages functionality
pub use reverb_pages::*;
