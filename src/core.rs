//! Observable data layer.
//!
//! This module provides access to reverb-core: the value model, observable
//! wrappers, channel names and the notification bus.
//!
//! # Examples
//!
//! ```rust,ignore
//! use reverb::core::{make_observable, ObservableOptions};
//! use reverb::core::bus;
//! ```

pub use reverb_core::*;
