//! Reconciliation Engine
//!
//! Merges a proposed node list into the children of a live container in place.
//! Proposed children are walked by index against the live children at the
//! same index:
//!
//! - a missing live node is filled with a deep clone of the proposed node
//! - a *different* live node is either preceded by a clone of the proposed
//!   node, or by a later live sibling carrying the proposed identifier, which
//!   is moved (not cloned) so its subtree keeps its identity
//! - matching nodes have their attributes, text and children reconciled
//!
//! Live children beyond the proposed count are trimmed from the end.
//!
//! Elements whose tag contains a hyphen are custom elements: their attributes
//! are reconciled but their content is left alone.
//!
//! ## Example
//!
//! ```ignore
//! use reverb_pages::dom::Document;
//! use reverb_pages::reconcile::{apply, Template};
//!
//! let document = Document::new();
//! apply(&Template::from("<p id=\"greeting\">hello</p>"), document.body())?;
//! apply(&Template::from("<p id=\"greeting\">hello, world</p>"), document.body())?;
//! ```

mod attributes;

pub use attributes::{BOOLEAN_ATTRIBUTES, is_falsey};

use crate::dom::{Node, NodeKind, parse_fragment};
use crate::error::{DomError, RenderResult};
use attributes::reconcile_attributes;

/// Proposed content for a mount point.
#[derive(Debug, Clone)]
pub enum Template {
	/// Literal markup, parsed before reconciliation
	Markup(String),
	/// A container node whose children are the proposed list
	Node(Node),
	/// An explicit proposed list
	Nodes(Vec<Node>),
}

impl Template {
	/// Resolves the template into the proposed node list.
	pub fn to_nodes(&self) -> Result<Vec<Node>, DomError> {
		match self {
			Self::Markup(markup) => Ok(parse_fragment(markup)?.children()),
			Self::Node(node) => Ok(node.children()),
			Self::Nodes(nodes) => Ok(nodes.clone()),
		}
	}
}

impl From<&str> for Template {
	fn from(markup: &str) -> Self {
		Self::Markup(markup.to_string())
	}
}

impl From<String> for Template {
	fn from(markup: String) -> Self {
		Self::Markup(markup)
	}
}

impl From<Node> for Template {
	fn from(node: Node) -> Self {
		Self::Node(node)
	}
}

impl From<Vec<Node>> for Template {
	fn from(nodes: Vec<Node>) -> Self {
		Self::Nodes(nodes)
	}
}

/// Reconciles the children of `live` toward `template`.
///
/// # Errors
///
/// Fails when the live tree rejects a structural change, for example when
/// `live` is a text node and the template has children. No rollback is
/// attempted: changes made before the failure stay in place.
pub fn apply(template: &Template, live: &Node) -> RenderResult<()> {
	let proposed = template.to_nodes()?;
	tracing::trace!(proposed = proposed.len(), live = live.child_count(), "reconcile");
	apply_nodes(&proposed, live)?;
	Ok(())
}

fn apply_nodes(proposed: &[Node], live: &Node) -> Result<(), DomError> {
	for (index, next) in proposed.iter().enumerate() {
		let Some(mut current) = live.child(index) else {
			live.append_child(&next.try_deep_clone()?)?;
			continue;
		};

		if is_different(next, &current) {
			match find_ahead(next, live, index) {
				Some(ahead) => {
					live.insert_before(&ahead, Some(&current))?;
					current = ahead;
				}
				None => {
					live.insert_before(&next.try_deep_clone()?, Some(&current))?;
					continue;
				}
			}
		}

		reconcile_attributes(next, &current);

		if next.tag_name().is_some_and(|tag| tag.contains('-')) {
			continue;
		}

		let proposed_content = content(next);
		if proposed_content != content(&current) {
			current.set_text_content(proposed_content.as_deref().unwrap_or(""));
		}

		if !next.has_children() && current.has_children() {
			current.clear_children();
			continue;
		}

		if !current.has_children() && next.has_children() {
			let fragment = Node::scratch_fragment()?;
			apply_nodes(&next.children(), &fragment)?;
			current.append_child(&fragment)?;
			continue;
		}

		if next.has_children() {
			apply_nodes(&next.children(), &current)?;
		}
	}

	live.truncate_children(proposed.len());
	Ok(())
}

/// Comparable text of a node: its text only when it has no children.
fn content(node: &Node) -> Option<String> {
	if node.has_children() {
		None
	} else {
		Some(node.text_content())
	}
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.is_empty())
}

/// Whether `live` cannot be reconciled in place toward `proposed`.
fn is_different(proposed: &Node, live: &Node) -> bool {
	if proposed.kind() != live.kind() || proposed.tag_name() != live.tag_name() {
		return true;
	}
	if proposed.kind() != NodeKind::Element {
		return false;
	}
	let both_differ = |a: Option<String>, b: Option<String>| matches!((a, b), (Some(a), Some(b)) if a != b);
	both_differ(non_empty(proposed.attribute("id")), non_empty(live.attribute("id")))
		|| both_differ(proposed.attribute("key"), live.attribute("key"))
		|| both_differ(non_empty(proposed.attribute("src")), non_empty(live.attribute("src")))
}

/// A later live sibling carrying the proposed node's identifier and tag.
///
/// Other attributes, `key` included, are reconciled after the move.
fn find_ahead(proposed: &Node, live: &Node, index: usize) -> Option<Node> {
	let id = non_empty(proposed.attribute("id"))?;
	let tag = proposed.tag_name();
	live.children().into_iter().skip(index + 1).find(|candidate| {
		candidate.attribute("id").as_deref() == Some(id.as_str()) && candidate.tag_name() == tag
	})
}
