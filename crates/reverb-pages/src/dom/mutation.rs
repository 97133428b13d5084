//! Mutation records for connected nodes.

use core::cell::RefCell;

extern crate alloc;
use alloc::rc::Rc;

use super::node::Node;

/// A single change applied to a node attached to a recording document.
#[derive(Debug, Clone)]
pub enum Mutation {
	/// Children were inserted or removed under `target`.
	ChildList {
		/// Parent whose child list changed
		target: Node,
	},
	/// An attribute was set or removed.
	Attribute {
		/// Element whose attribute changed
		target: Node,
		/// Attribute name
		name: String,
	},
	/// Text or comment data changed.
	CharacterData {
		/// The text or comment node
		target: Node,
	},
	/// The form-control value property was assigned.
	Value {
		/// The element whose value property changed
		target: Node,
	},
}

impl Mutation {
	/// Node the mutation applies to.
	pub fn target(&self) -> &Node {
		match self {
			Self::ChildList { target }
			| Self::Attribute { target, .. }
			| Self::CharacterData { target }
			| Self::Value { target } => target,
		}
	}

	/// Returns `true` for child-list records.
	pub fn is_structural(&self) -> bool {
		matches!(self, Self::ChildList { .. })
	}
}

/// Shared buffer of mutation records owned by a document root.
#[derive(Debug, Clone, Default)]
pub(crate) struct MutationLog(Rc<RefCell<Vec<Mutation>>>);

impl MutationLog {
	pub(crate) fn push(&self, mutation: Mutation) {
		self.0.borrow_mut().push(mutation);
	}

	pub(crate) fn take(&self) -> Vec<Mutation> {
		core::mem::take(&mut *self.0.borrow_mut())
	}
}
