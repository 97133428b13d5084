//! Error types for observable data.

use thiserror::Error;

use crate::value::Key;

/// Errors raised by observable container operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservableError {
	/// Only mappings and sequences can be observed.
	#[error("Value is not a container: {0}")]
	NotAContainer(String),

	/// The key kind does not fit the container (a name used on a sequence).
	#[error("Invalid key for {container}: {key}")]
	InvalidKey {
		/// Kind of container that was addressed
		container: &'static str,
		/// Offending key
		key: Key,
	},

	/// A sequence write past its end.
	#[error("Index {index} out of bounds for sequence of length {len}")]
	IndexOutOfBounds {
		/// Requested index
		index: usize,
		/// Current length
		len: usize,
	},

	/// The operation only applies to a different container kind.
	#[error("Operation `{operation}` is not supported on a {container}")]
	Unsupported {
		/// Operation name
		operation: &'static str,
		/// Kind of container that was addressed
		container: &'static str,
	},
}

/// Result type alias for observable operations.
pub type ObservableResult<T> = Result<T, ObservableError>;
