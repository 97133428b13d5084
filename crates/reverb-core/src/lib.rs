//! Reverb Core - Observable Data Layer
//!
//! Change detection for plain data. Wrapping a mapping or sequence in an
//! [`Observable`] makes every mutation made through it observable: each write,
//! delete or collection mutation is published on named notification channels
//! through the thread's event [`bus`].
//!
//! ## Modules
//!
//! - [`value`]: value model, shared containers, type classification
//! - [`channel`]: channel names and normalization
//! - [`bus`]: notification channel dispatcher (publish/subscribe registry)
//! - [`observable`]: the observable wrapper and proxy-safe equality
//! - [`error`]: error types
//!
//! ## Example
//!
//! ```ignore
//! use reverb_core::{bus, make_observable, ChannelName, ObservableOptions};
//!
//! bus::subscribe(ChannelName::user("counter"), |_| println!("counter changed"));
//!
//! let data = make_observable(None, &["counter"], ObservableOptions::default())?;
//! data.set("count", 1)?;
//! ```

#![warn(missing_docs)]

pub mod bus;
pub mod channel;
pub mod error;
pub mod observable;
pub mod value;

pub use bus::{Action, Detail, Notification, SubscriptionId};
pub use channel::{ChannelName, normalize_channels};
pub use error::{ObservableError, ObservableResult};
pub use observable::{MuteFlag, Observable, ObservableOptions, make_observable, proxy_safe_compare};
pub use value::{Container, Entries, Key, Value, is_plain_container};
