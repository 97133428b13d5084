//! Output of a template computation.

use core::fmt;
use core::future::Future;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::dom::Node;
use crate::error::RenderResult;
use crate::reconcile::Template;

/// What a template computation produced: content now, or content later.
pub enum Rendered {
	/// Content available synchronously
	Ready(Template),
	/// Content that resolves later
	Pending(LocalBoxFuture<'static, RenderResult<Template>>),
}

impl Rendered {
	/// Synchronous content.
	pub fn ready(template: impl Into<Template>) -> Self {
		Self::Ready(template.into())
	}

	/// Content produced by `future`.
	pub fn pending<F>(future: F) -> Self
	where
		F: Future<Output = RenderResult<Template>> + 'static,
	{
		Self::Pending(future.boxed_local())
	}

	/// Returns `true` for deferred content.
	pub fn is_pending(&self) -> bool {
		matches!(self, Self::Pending(_))
	}
}

impl fmt::Debug for Rendered {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Ready(template) => f.debug_tuple("Ready").field(template).finish(),
			Self::Pending(_) => f.write_str("Pending(..)"),
		}
	}
}

impl From<Template> for Rendered {
	fn from(template: Template) -> Self {
		Self::Ready(template)
	}
}

impl From<&str> for Rendered {
	fn from(markup: &str) -> Self {
		Self::Ready(markup.into())
	}
}

impl From<String> for Rendered {
	fn from(markup: String) -> Self {
		Self::Ready(markup.into())
	}
}

impl From<Node> for Rendered {
	fn from(node: Node) -> Self {
		Self::Ready(node.into())
	}
}

impl From<Vec<Node>> for Rendered {
	fn from(nodes: Vec<Node>) -> Self {
		Self::Ready(nodes.into())
	}
}
