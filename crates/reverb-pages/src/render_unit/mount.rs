//! Mount point resolution.

use core::cell::RefCell;

use crate::dom::{Node, current_document};
use crate::error::DomError;

/// Where a render unit mounts its output.
#[derive(Debug, Clone)]
pub enum MountSpec {
	/// A specific element
	Node(Node),
	/// The element with this identifier in the current document
	Id(String),
	/// Every element matching this selector in the current document
	Selector(String),
	/// An explicit list of elements
	Nodes(Vec<Node>),
}

impl MountSpec {
	/// Mounts into the element with identifier `id`.
	pub fn id(id: impl Into<String>) -> Self {
		Self::Id(id.into())
	}

	/// Mounts into every element matching `selector`.
	pub fn selector(selector: impl Into<String>) -> Self {
		Self::Selector(selector.into())
	}
}

impl From<Node> for MountSpec {
	fn from(node: Node) -> Self {
		Self::Node(node)
	}
}

impl From<&Node> for MountSpec {
	fn from(node: &Node) -> Self {
		Self::Node(node.clone())
	}
}

impl From<Vec<Node>> for MountSpec {
	fn from(nodes: Vec<Node>) -> Self {
		Self::Nodes(nodes)
	}
}

/// A mount spec plus the lazily resolved elements it last pointed at.
#[derive(Debug)]
pub(crate) struct MountTarget {
	spec: MountSpec,
	resolved: RefCell<Vec<Node>>,
}

impl MountTarget {
	pub(crate) fn new(spec: MountSpec) -> Self {
		Self {
			spec,
			resolved: RefCell::new(Vec::new()),
		}
	}

	pub(crate) fn spec(&self) -> &MountSpec {
		&self.spec
	}

	/// Current mount elements, re-resolving lookups that went stale.
	///
	/// An identifier lookup is stale when its element left the tree; a
	/// selector lookup when it matched nothing or every match left the tree.
	pub(crate) fn resolve(&self) -> Result<Vec<Node>, DomError> {
		match &self.spec {
			MountSpec::Node(node) => Ok(vec![node.clone()]),
			MountSpec::Nodes(nodes) => Ok(nodes.clone()),
			MountSpec::Id(id) => {
				let stale = self
					.resolved
					.borrow()
					.first()
					.is_none_or(|node| !node.is_connected());
				if stale {
					let found = current_document().get_element_by_id(id);
					*self.resolved.borrow_mut() = found.into_iter().collect();
				}
				Ok(self.resolved.borrow().clone())
			}
			MountSpec::Selector(selector) => {
				let stale = self.resolved.borrow().iter().all(|node| !node.is_connected());
				if stale {
					let found = current_document().query_selector_all(selector)?;
					*self.resolved.borrow_mut() = found;
				}
				Ok(self.resolved.borrow().clone())
			}
		}
	}
}
