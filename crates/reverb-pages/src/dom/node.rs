//! Tree nodes
//!
//! [`Node`] is a shared handle to a node of the in-memory host tree. Handles
//! are cheap to clone; identity is pointer identity ([`Node::ptr_eq`]).
//! Children are owned by their parent, parents are referenced weakly.

use core::cell::RefCell;
use core::fmt;

extern crate alloc;
use alloc::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::NodeKind;
use super::mutation::{Mutation, MutationLog};
use crate::error::DomError;

#[derive(Debug, Clone)]
struct ElementData {
	tag: String,
	attributes: IndexMap<String, String>,
	/// Form-control value property, distinct from the `value` attribute
	value: Option<String>,
}

#[derive(Clone)]
enum NodeValue {
	Element(ElementData),
	Text(String),
	Comment(String),
	Fragment,
	Document(Option<MutationLog>),
}

struct NodeData {
	value: NodeValue,
	parent: Weak<RefCell<NodeData>>,
	children: Vec<Node>,
}

/// Shared handle to a tree node.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
	"wbr",
];

impl Node {
	fn from_value(value: NodeValue) -> Self {
		Self(Rc::new(RefCell::new(NodeData {
			value,
			parent: Weak::new(),
			children: Vec::new(),
		})))
	}

	/// Creates a detached element. Tag names are stored lowercase.
	pub fn element(tag: &str) -> Self {
		Self::from_value(NodeValue::Element(ElementData {
			tag: tag.to_ascii_lowercase(),
			attributes: IndexMap::new(),
			value: None,
		}))
	}

	/// Creates a detached text node.
	pub fn text(data: &str) -> Self {
		Self::from_value(NodeValue::Text(data.to_string()))
	}

	/// Creates a detached comment node.
	pub fn comment(data: &str) -> Self {
		Self::from_value(NodeValue::Comment(data.to_string()))
	}

	/// Creates an empty fragment.
	pub fn fragment() -> Self {
		Self::from_value(NodeValue::Fragment)
	}

	/// Empty fragment for assembling a detached subtree.
	pub(crate) fn scratch_fragment() -> Result<Self, DomError> {
		Ok(Self::fragment())
	}

	/// A document root holding `body` as its only child.
	pub(crate) fn document_root(body: &Node) -> Self {
		let root = Self::from_value(NodeValue::Document(None));
		root.attach(body.clone(), None);
		root
	}

	/// Kind of this node.
	pub fn kind(&self) -> NodeKind {
		match &self.0.borrow().value {
			NodeValue::Element(_) => NodeKind::Element,
			NodeValue::Text(_) => NodeKind::Text,
			NodeValue::Comment(_) => NodeKind::Comment,
			NodeValue::Fragment => NodeKind::Fragment,
			NodeValue::Document(_) => NodeKind::Document,
		}
	}

	/// Returns `true` for element nodes.
	pub fn is_element(&self) -> bool {
		self.kind() == NodeKind::Element
	}

	/// Returns `true` when both handles refer to the same node.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Lowercase tag name of an element.
	pub fn tag_name(&self) -> Option<String> {
		match &self.0.borrow().value {
			NodeValue::Element(element) => Some(element.tag.clone()),
			_ => None,
		}
	}

	/// The `id` attribute, or an empty string.
	pub fn id(&self) -> String {
		self.attribute("id").unwrap_or_default()
	}

	/// Reads an attribute.
	pub fn attribute(&self, name: &str) -> Option<String> {
		match &self.0.borrow().value {
			NodeValue::Element(element) => element.attributes.get(name).cloned(),
			_ => None,
		}
	}

	/// Returns `true` when the element carries `name`.
	pub fn has_attribute(&self, name: &str) -> bool {
		match &self.0.borrow().value {
			NodeValue::Element(element) => element.attributes.contains_key(name),
			_ => false,
		}
	}

	/// Attribute names of an element, in document order.
	pub fn attribute_names(&self) -> Vec<String> {
		match &self.0.borrow().value {
			NodeValue::Element(element) => element.attributes.keys().cloned().collect(),
			_ => Vec::new(),
		}
	}

	/// Attribute name/value pairs of an element, in document order.
	pub fn attributes(&self) -> Vec<(String, String)> {
		match &self.0.borrow().value {
			NodeValue::Element(element) => element
				.attributes
				.iter()
				.map(|(k, v)| (k.clone(), v.clone()))
				.collect(),
			_ => Vec::new(),
		}
	}

	/// Sets an attribute. Ignored on non-element nodes.
	pub fn set_attribute(&self, name: &str, value: &str) {
		let changed = match &mut self.0.borrow_mut().value {
			NodeValue::Element(element) => {
				element
					.attributes
					.insert(name.to_string(), value.to_string());
				true
			}
			_ => false,
		};
		if changed {
			self.record(|target| Mutation::Attribute {
				target,
				name: name.to_string(),
			});
		}
	}

	/// Removes an attribute. Returns `true` if it was present.
	pub fn remove_attribute(&self, name: &str) -> bool {
		let removed = match &mut self.0.borrow_mut().value {
			NodeValue::Element(element) => element.attributes.shift_remove(name).is_some(),
			_ => false,
		};
		if removed {
			self.record(|target| Mutation::Attribute {
				target,
				name: name.to_string(),
			});
		}
		removed
	}

	/// Form-control value property.
	///
	/// Until it is assigned, the property reflects the `value` attribute.
	pub fn value(&self) -> String {
		match &self.0.borrow().value {
			NodeValue::Element(element) => element
				.value
				.clone()
				.or_else(|| element.attributes.get("value").cloned())
				.unwrap_or_default(),
			_ => String::new(),
		}
	}

	/// Assigns the form-control value property without touching attributes.
	pub fn set_value(&self, value: &str) {
		let changed = match &mut self.0.borrow_mut().value {
			NodeValue::Element(element) => {
				element.value = Some(value.to_string());
				true
			}
			_ => false,
		};
		if changed {
			self.record(|target| Mutation::Value { target });
		}
	}

	/// Parent node, if attached.
	pub fn parent(&self) -> Option<Node> {
		self.0.borrow().parent.upgrade().map(Node)
	}

	/// Outermost ancestor (the node itself when detached).
	pub fn root(&self) -> Node {
		let mut current = self.clone();
		while let Some(parent) = current.parent() {
			current = parent;
		}
		current
	}

	/// Whether the node is attached to a document.
	pub fn is_connected(&self) -> bool {
		self.root().kind() == NodeKind::Document
	}

	/// Child nodes, in order.
	pub fn children(&self) -> Vec<Node> {
		self.0.borrow().children.clone()
	}

	/// Child at `index`.
	pub fn child(&self, index: usize) -> Option<Node> {
		self.0.borrow().children.get(index).cloned()
	}

	/// Number of child nodes.
	pub fn child_count(&self) -> usize {
		self.0.borrow().children.len()
	}

	/// Returns `true` when the node has at least one child.
	pub fn has_children(&self) -> bool {
		!self.0.borrow().children.is_empty()
	}

	/// Position of `child` among this node's children.
	pub fn index_of(&self, child: &Node) -> Option<usize> {
		self.0.borrow().children.iter().position(|c| c.ptr_eq(child))
	}

	/// Text of a text or comment node, or the concatenated descendant text of
	/// any other node.
	pub fn text_content(&self) -> String {
		let data = self.0.borrow();
		match &data.value {
			NodeValue::Text(text) | NodeValue::Comment(text) => text.clone(),
			_ => {
				let mut out = String::new();
				for child in &data.children {
					if child.kind() != NodeKind::Comment {
						out.push_str(&child.text_content());
					}
				}
				out
			}
		}
	}

	/// Replaces the node's text.
	///
	/// Text and comment nodes have their data replaced. Elements and fragments
	/// lose all children and receive a single text child unless `text` is empty.
	pub fn set_text_content(&self, text: &str) {
		let is_character_data = {
			let mut data = self.0.borrow_mut();
			match &mut data.value {
				NodeValue::Text(current) | NodeValue::Comment(current) => {
					*current = text.to_string();
					true
				}
				NodeValue::Document(_) => return,
				_ => false,
			}
		};
		if is_character_data {
			self.record(|target| Mutation::CharacterData { target });
			return;
		}
		self.clear_children();
		if !text.is_empty() {
			self.attach(Node::text(text), None);
		}
	}

	fn can_hold_children(&self) -> bool {
		matches!(
			self.kind(),
			NodeKind::Element | NodeKind::Fragment | NodeKind::Document
		)
	}

	fn check_insertable(&self, child: &Node) -> Result<(), DomError> {
		if !self.can_hold_children() {
			return Err(DomError::HierarchyRequest(format!(
				"{:?} nodes cannot have children",
				self.kind()
			)));
		}
		if child.kind() == NodeKind::Document {
			return Err(DomError::HierarchyRequest(
				"a document cannot be inserted".to_string(),
			));
		}
		let mut ancestor = Some(self.clone());
		while let Some(node) = ancestor {
			if node.ptr_eq(child) {
				return Err(DomError::HierarchyRequest(
					"a node cannot be inserted into itself or its descendants".to_string(),
				));
			}
			ancestor = node.parent();
		}
		Ok(())
	}

	/// Appends `child`, moving it from its current parent.
	///
	/// Appending a fragment moves the fragment's children instead.
	pub fn append_child(&self, child: &Node) -> Result<(), DomError> {
		self.insert_before(child, None)
	}

	/// Inserts `child` before `reference`, or at the end when `reference` is `None`.
	///
	/// # Errors
	///
	/// Fails when the insertion would create a cycle, when this node cannot hold
	/// children, or when `reference` is not a child of this node.
	pub fn insert_before(&self, child: &Node, reference: Option<&Node>) -> Result<(), DomError> {
		self.check_insertable(child)?;
		if let Some(reference) = reference {
			if reference.ptr_eq(child) {
				return Ok(());
			}
			if self.index_of(reference).is_none() {
				return Err(DomError::NotFound(
					"reference node is not a child of this node".to_string(),
				));
			}
		}

		if child.kind() == NodeKind::Fragment {
			for grandchild in child.children() {
				grandchild.remove();
				self.attach(grandchild, reference);
			}
			return Ok(());
		}

		child.remove();
		self.attach(child.clone(), reference);
		Ok(())
	}

	/// Links a detached node in. `reference` must be a child of this node.
	fn attach(&self, child: Node, reference: Option<&Node>) {
		child.0.borrow_mut().parent = Rc::downgrade(&self.0);
		{
			let mut data = self.0.borrow_mut();
			let index = reference
				.and_then(|r| data.children.iter().position(|c| c.ptr_eq(r)))
				.unwrap_or(data.children.len());
			data.children.insert(index, child);
		}
		self.record(|target| Mutation::ChildList { target });
	}

	/// Removes `child` from this node and returns it.
	pub fn remove_child(&self, child: &Node) -> Result<Node, DomError> {
		if self.index_of(child).is_none() {
			return Err(DomError::NotFound(
				"node to remove is not a child of this node".to_string(),
			));
		}
		child.remove();
		Ok(child.clone())
	}

	/// Detaches this node from its parent, if any.
	pub fn remove(&self) {
		let Some(parent) = self.parent() else {
			return;
		};
		parent.0.borrow_mut().children.retain(|c| !c.ptr_eq(self));
		self.0.borrow_mut().parent = Weak::new();
		parent.record(|target| Mutation::ChildList { target });
	}

	/// Detaches every child.
	pub fn clear_children(&self) {
		let children = core::mem::take(&mut self.0.borrow_mut().children);
		if children.is_empty() {
			return;
		}
		for child in &children {
			child.0.borrow_mut().parent = Weak::new();
		}
		self.record(|target| Mutation::ChildList { target });
	}

	/// Detaches children from `len` onward, keeping the first `len`.
	pub fn truncate_children(&self, len: usize) {
		let removed = {
			let mut data = self.0.borrow_mut();
			if data.children.len() <= len {
				return;
			}
			data.children.split_off(len)
		};
		for child in &removed {
			child.0.borrow_mut().parent = Weak::new();
		}
		self.record(|target| Mutation::ChildList { target });
	}

	/// Deep copy of this node and its subtree, detached.
	///
	/// Documents are copied as fragments.
	pub fn deep_clone(&self) -> Node {
		let (value, children) = {
			let data = self.0.borrow();
			let value = match &data.value {
				NodeValue::Document(_) => NodeValue::Fragment,
				other => other.clone(),
			};
			(value, data.children.clone())
		};
		let copy = Node::from_value(value);
		{
			let mut data = copy.0.borrow_mut();
			for child in children {
				let child_copy = child.deep_clone();
				child_copy.0.borrow_mut().parent = Rc::downgrade(&copy.0);
				data.children.push(child_copy);
			}
		}
		copy
	}

	pub(crate) fn try_deep_clone(&self) -> Result<Node, DomError> {
		Ok(self.deep_clone())
	}

	/// Depth-first, pre-order descendants (excluding this node).
	pub fn descendants(&self) -> Vec<Node> {
		let mut out = Vec::new();
		for child in self.children() {
			out.push(child.clone());
			out.extend(child.descendants());
		}
		out
	}

	/// Starts a mutation log on a document root. Other nodes are unaffected.
	pub(crate) fn enable_mutation_log(&self) {
		if let NodeValue::Document(log) = &mut self.0.borrow_mut().value {
			log.get_or_insert_with(MutationLog::default);
		}
	}

	pub(crate) fn mutation_log(&self) -> Option<MutationLog> {
		match &self.0.borrow().value {
			NodeValue::Document(log) => log.clone(),
			_ => None,
		}
	}

	fn record<F>(&self, mutation: F)
	where
		F: FnOnce(Node) -> Mutation,
	{
		if let Some(log) = self.root().mutation_log() {
			log.push(mutation(self.clone()));
		}
	}

	/// Serializes the node and its subtree as HTML.
	pub fn outer_html(&self) -> String {
		let mut out = String::new();
		self.write_html(&mut out);
		out
	}

	/// Serializes the node's children as HTML.
	pub fn inner_html(&self) -> String {
		let mut out = String::new();
		for child in self.children() {
			child.write_html(&mut out);
		}
		out
	}

	fn write_html(&self, out: &mut String) {
		let data = self.0.borrow();
		match &data.value {
			NodeValue::Text(text) => out.push_str(&escape_text(text)),
			NodeValue::Comment(text) => {
				out.push_str("<!--");
				out.push_str(text);
				out.push_str("-->");
			}
			NodeValue::Fragment | NodeValue::Document(_) => {
				for child in &data.children {
					child.write_html(out);
				}
			}
			NodeValue::Element(element) => {
				out.push('<');
				out.push_str(&element.tag);
				for (name, value) in &element.attributes {
					out.push(' ');
					out.push_str(name);
					out.push_str("=\"");
					out.push_str(&escape_attribute(value));
					out.push('"');
				}
				out.push('>');
				if VOID_ELEMENTS.contains(&element.tag.as_str()) {
					return;
				}
				for child in &data.children {
					child.write_html(out);
				}
				out.push_str("</");
				out.push_str(&element.tag);
				out.push('>');
			}
		}
	}
}

fn escape_text(text: &str) -> String {
	text.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
	value.replace('&', "&amp;").replace('"', "&quot;")
}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0.try_borrow() {
			Ok(_) => write!(f, "Node({:?}, {})", self.kind(), self.outer_html()),
			Err(_) => f.write_str("Node(<borrowed>)"),
		}
	}
}
