//! Notification channel names
//!
//! Every observable reports to the base channel plus one namespaced channel per
//! user-supplied channel name. Render completion is announced on a global
//! channel and on one channel per render unit.
//!
//! | Channel | Name |
//! |---------|------|
//! | Base | `reverb` |
//! | User channel `c` | `reverb:c` |
//! | Global render completion | `reverb-render` |
//! | Completion of unit `u` | `reverb-render:u` |

use std::fmt;
use std::sync::Arc;

/// Prefix applied to user channel names.
pub const CHANNEL_PREFIX: &str = "reverb:";

/// Prefix applied to per-unit completion channel names.
pub const UNIT_RENDERED_PREFIX: &str = "reverb-render:";

#[derive(Debug, Clone)]
enum ChannelNameInner {
	Static(&'static str),
	Owned(Arc<str>),
}

/// Name of a notification channel
///
/// # Examples
///
/// ```
/// use reverb_core::channel::ChannelName;
///
/// assert_eq!(ChannelName::user("counter").as_str(), "reverb:counter");
/// assert_eq!(ChannelName::BASE.as_str(), "reverb");
/// ```
#[derive(Debug, Clone)]
pub struct ChannelName(ChannelNameInner);

impl ChannelName {
	/// Channel every observable reports to
	pub const BASE: Self = Self(ChannelNameInner::Static("reverb"));
	/// Channel announcing the end of each scheduler pass
	pub const RENDERED: Self = Self(ChannelNameInner::Static("reverb-render"));

	/// Uses `name` verbatim, without namespacing.
	pub const fn raw(name: &'static str) -> Self {
		Self(ChannelNameInner::Static(name))
	}

	/// Uses an owned name verbatim, without namespacing.
	pub fn from_string(name: impl Into<Arc<str>>) -> Self {
		Self(ChannelNameInner::Owned(name.into()))
	}

	/// Namespaced channel for a user-supplied name.
	pub fn user(name: &str) -> Self {
		Self::from_string(format!("{}{}", CHANNEL_PREFIX, name))
	}

	/// Completion channel for the render unit registered as `unit`.
	pub fn unit_rendered(unit: &str) -> Self {
		Self::from_string(format!("{}{}", UNIT_RENDERED_PREFIX, unit))
	}

	/// Returns the channel name as a string slice.
	pub fn as_str(&self) -> &str {
		match &self.0 {
			ChannelNameInner::Static(s) => s,
			ChannelNameInner::Owned(s) => s,
		}
	}
}

impl PartialEq for ChannelName {
	fn eq(&self, other: &Self) -> bool {
		self.as_str() == other.as_str()
	}
}

impl Eq for ChannelName {}

impl std::hash::Hash for ChannelName {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.as_str().hash(state);
	}
}

impl fmt::Display for ChannelName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl AsRef<str> for ChannelName {
	fn as_ref(&self) -> &str {
		self.as_str()
	}
}

/// Base channel followed by each user channel namespaced under [`CHANNEL_PREFIX`].
///
/// Duplicates are dropped; order of first appearance is kept.
pub fn normalize_channels<S: AsRef<str>>(user: &[S]) -> Vec<ChannelName> {
	let mut channels = vec![ChannelName::BASE];
	for name in user {
		let channel = ChannelName::user(name.as_ref());
		if !channels.contains(&channel) {
			channels.push(channel);
		}
	}
	channels
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_normalize_always_includes_base() {
		let channels = normalize_channels::<&str>(&[]);
		assert_eq!(channels, vec![ChannelName::BASE]);
	}

	#[rstest]
	fn test_normalize_prefixes_and_deduplicates() {
		// Act
		let channels = normalize_channels(&["todos", "user", "todos"]);

		// Assert
		let names: Vec<&str> = channels.iter().map(ChannelName::as_str).collect();
		assert_eq!(names, vec!["reverb", "reverb:todos", "reverb:user"]);
	}

	#[rstest]
	fn test_static_and_owned_names_compare_by_content() {
		assert_eq!(ChannelName::raw("reverb"), ChannelName::from_string("reverb"));
		assert_eq!(ChannelName::BASE, ChannelName::from_string(String::from("reverb")));
	}

	#[rstest]
	fn test_completion_channels_do_not_collide_with_user_channels() {
		assert_ne!(ChannelName::user("render"), ChannelName::RENDERED);
		assert_ne!(ChannelName::user("list"), ChannelName::unit_rendered("list"));
		assert_eq!(ChannelName::unit_rendered("list").as_str(), "reverb-render:list");
	}
}
