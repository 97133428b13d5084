//! Error types for the render layer.

use thiserror::Error;

/// Errors raised by host tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
	/// The requested insertion would produce an invalid tree.
	#[error("Hierarchy request error: {0}")]
	HierarchyRequest(String),

	/// A reference node is not where the operation expected it.
	#[error("Node not found: {0}")]
	NotFound(String),

	/// A selector could not be parsed.
	#[error("Invalid selector: {0}")]
	InvalidSelector(String),
}

/// Errors raised while producing or applying a render.
///
/// `RenderError` is `Clone` so that it can be the output of a shared
/// completion future observed by several waiters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
	/// Reconciliation failed part-way; the live tree may be partially updated.
	#[error("Reconciliation failed: {0}")]
	Dom(#[from] DomError),

	/// The template computation failed or produced unusable output.
	#[error("Template error: {0}")]
	Template(String),

	/// A deferred render could not be handed to the host executor.
	#[error("Failed to spawn render task: {0}")]
	Spawn(String),
}

impl RenderError {
	/// Creates a template error from any displayable message.
	pub fn template(message: impl std::fmt::Display) -> Self {
		Self::Template(message.to_string())
	}
}

/// Errors raised while loading [`RenderSettings`](crate::settings::RenderSettings).
#[derive(Debug, Error)]
pub enum SettingsError {
	/// The settings document could not be parsed.
	#[error("Failed to parse render settings: {0}")]
	Parse(#[from] serde_json::Error),
}

/// Result type alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
