//! Scheduler settings.

use core::time::Duration;

use serde::Deserialize;

use crate::error::SettingsError;

/// Tunables of the render scheduler.
///
/// Every field has a default, so partial documents are accepted:
///
/// ```ignore
/// let settings = RenderSettings::from_json(r#"{ "debounce_ms": 16 }"#)?;
/// assert!(settings.emit_completion);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
	/// Delay of the timer stage in milliseconds
	pub debounce_ms: u64,
	/// Whether completion notifications are published after each pass
	pub emit_completion: bool,
}

impl RenderSettings {
	/// Parses settings from a JSON document.
	pub fn from_json(source: &str) -> Result<Self, SettingsError> {
		Ok(serde_json::from_str(source)?)
	}

	/// Delay of the timer stage.
	pub fn debounce(&self) -> Duration {
		Duration::from_millis(self.debounce_ms)
	}
}

impl Default for RenderSettings {
	fn default() -> Self {
		Self {
			debounce_ms: 0,
			emit_completion: true,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("{}", RenderSettings::default())]
	#[case(r#"{ "debounce_ms": 16 }"#, RenderSettings { debounce_ms: 16, emit_completion: true })]
	#[case(r#"{ "emit_completion": false }"#, RenderSettings { debounce_ms: 0, emit_completion: false })]
	fn test_partial_documents_use_defaults(#[case] source: &str, #[case] expected: RenderSettings) {
		assert_eq!(RenderSettings::from_json(source).unwrap(), expected);
	}

	#[rstest]
	fn test_malformed_document_is_rejected() {
		let result = RenderSettings::from_json(r#"{ "debounce_ms": "soon" }"#);
		assert!(matches!(result, Err(SettingsError::Parse(_))));
	}
}
