//! Browser host tree
//!
//! On `wasm32` the host tree is the page's own DOM. [`Node`] wraps a
//! `web_sys::Node` and exposes the same lookups and tree operations as the
//! in-memory tree, so reconciliation and mount resolution run unchanged.
//!
//! Nodes are created through [`Document`] or [`parse_fragment`]; both fail
//! with [`DomError::NotFound`] when no document is available, for example
//! inside a worker.

use core::cell::RefCell;

use wasm_bindgen::{JsCast, JsValue};

use super::NodeKind;
use crate::error::DomError;

fn js_error(error: JsValue) -> DomError {
	let message = error
		.as_string()
		.or_else(|| error.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
		.unwrap_or_else(|| format!("{:?}", error));
	DomError::HierarchyRequest(message)
}

fn no_document() -> DomError {
	DomError::NotFound("no document is available".to_string())
}

fn escape_text(text: &str) -> String {
	text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Handle to a node of the page's DOM.
#[derive(Debug, Clone)]
pub struct Node(web_sys::Node);

impl From<web_sys::Node> for Node {
	fn from(node: web_sys::Node) -> Self {
		Self(node)
	}
}

impl Node {
	/// The underlying DOM node.
	pub fn as_web(&self) -> &web_sys::Node {
		&self.0
	}

	fn as_element(&self) -> Option<&web_sys::Element> {
		self.0.dyn_ref::<web_sys::Element>()
	}

	pub(crate) fn scratch_fragment() -> Result<Self, DomError> {
		let fragment = web_sys::DocumentFragment::new().map_err(js_error)?;
		Ok(Self(fragment.into()))
	}

	pub(crate) fn try_deep_clone(&self) -> Result<Self, DomError> {
		self.0.clone_node_with_deep(true).map(Self).map_err(js_error)
	}

	/// Kind of this node. Character data other than comments counts as text.
	pub fn kind(&self) -> NodeKind {
		match self.0.node_type() {
			web_sys::Node::ELEMENT_NODE => NodeKind::Element,
			web_sys::Node::TEXT_NODE | web_sys::Node::CDATA_SECTION_NODE => NodeKind::Text,
			web_sys::Node::DOCUMENT_NODE => NodeKind::Document,
			web_sys::Node::DOCUMENT_FRAGMENT_NODE => NodeKind::Fragment,
			_ => NodeKind::Comment,
		}
	}

	/// Returns `true` for element nodes.
	pub fn is_element(&self) -> bool {
		self.kind() == NodeKind::Element
	}

	/// Returns `true` when both handles refer to the same node.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		self.0.is_same_node(Some(&other.0))
	}

	/// Lowercase local name of an element.
	pub fn tag_name(&self) -> Option<String> {
		self.as_element().map(|element| element.local_name())
	}

	/// The `id` attribute, or an empty string.
	pub fn id(&self) -> String {
		self.attribute("id").unwrap_or_default()
	}

	/// Value of attribute `name`.
	pub fn attribute(&self, name: &str) -> Option<String> {
		self.as_element()?.get_attribute(name)
	}

	/// Returns `true` when attribute `name` is present.
	pub fn has_attribute(&self, name: &str) -> bool {
		self.as_element().is_some_and(|element| element.has_attribute(name))
	}

	/// Attribute names, in document order.
	pub fn attribute_names(&self) -> Vec<String> {
		self.as_element()
			.map(|element| {
				element
					.get_attribute_names()
					.iter()
					.filter_map(|name| name.as_string())
					.collect()
			})
			.unwrap_or_default()
	}

	/// Attribute name/value pairs, in document order.
	pub fn attributes(&self) -> Vec<(String, String)> {
		self.attribute_names()
			.into_iter()
			.filter_map(|name| {
				let value = self.attribute(&name)?;
				Some((name, value))
			})
			.collect()
	}

	/// Sets attribute `name`. Names the browser rejects are logged and skipped.
	pub fn set_attribute(&self, name: &str, value: &str) {
		if let Some(element) = self.as_element()
			&& let Err(e) = element.set_attribute(name, value)
		{
			tracing::warn!(attribute = name, error = %js_error(e), "attribute rejected");
		}
	}

	/// Removes attribute `name`, returning whether it was present.
	pub fn remove_attribute(&self, name: &str) -> bool {
		let Some(element) = self.as_element() else {
			return false;
		};
		let present = element.has_attribute(name);
		if present && let Err(e) = element.remove_attribute(name) {
			tracing::warn!(attribute = name, error = %js_error(e), "attribute removal failed");
			return false;
		}
		present
	}

	/// Form-control value property, falling back to the `value` attribute.
	pub fn value(&self) -> String {
		js_sys::Reflect::get(&self.0, &JsValue::from_str("value"))
			.ok()
			.and_then(|value| value.as_string())
			.or_else(|| self.attribute("value"))
			.unwrap_or_default()
	}

	/// Assigns the value property; elements without one get the attribute.
	pub fn set_value(&self, value: &str) {
		let key = JsValue::from_str("value");
		let assigned = js_sys::Reflect::has(&self.0, &key).unwrap_or(false)
			&& js_sys::Reflect::set(&self.0, &key, &JsValue::from_str(value)).unwrap_or(false);
		if !assigned {
			self.set_attribute("value", value);
		}
	}

	/// Parent node, if attached.
	pub fn parent(&self) -> Option<Node> {
		self.0.parent_node().map(Self)
	}

	/// Whether the node is attached to a document.
	pub fn is_connected(&self) -> bool {
		self.0.is_connected()
	}

	/// Child nodes, in order.
	pub fn children(&self) -> Vec<Node> {
		let list = self.0.child_nodes();
		(0..list.length()).filter_map(|i| list.get(i)).map(Self).collect()
	}

	/// Child at `index`.
	pub fn child(&self, index: usize) -> Option<Node> {
		let index = u32::try_from(index).ok()?;
		self.0.child_nodes().get(index).map(Self)
	}

	/// Number of child nodes.
	pub fn child_count(&self) -> usize {
		self.0.child_nodes().length() as usize
	}

	/// Returns `true` when the node has at least one child.
	pub fn has_children(&self) -> bool {
		self.0.has_child_nodes()
	}

	/// Text of a character-data node, or the descendant text of any other node.
	pub fn text_content(&self) -> String {
		self.0.text_content().unwrap_or_default()
	}

	/// Replaces the node's text. On containers this replaces all children.
	pub fn set_text_content(&self, text: &str) {
		self.0.set_text_content(Some(text));
	}

	/// Appends `child`, moving it from its current parent.
	pub fn append_child(&self, child: &Node) -> Result<(), DomError> {
		self.0.append_child(&child.0).map(|_| ()).map_err(js_error)
	}

	/// Inserts `child` before `reference`, or at the end when `reference` is `None`.
	pub fn insert_before(&self, child: &Node, reference: Option<&Node>) -> Result<(), DomError> {
		self.0
			.insert_before(&child.0, reference.map(|r| &r.0))
			.map(|_| ())
			.map_err(js_error)
	}

	/// Removes `child` from this node and returns it.
	pub fn remove_child(&self, child: &Node) -> Result<Node, DomError> {
		self.0
			.remove_child(&child.0)
			.map(Self)
			.map_err(|e| DomError::NotFound(js_error(e).to_string()))
	}

	/// Detaches this node from its parent, if any.
	pub fn remove(&self) {
		if let Some(parent) = self.0.parent_node()
			&& let Err(e) = parent.remove_child(&self.0)
		{
			tracing::warn!(error = %js_error(e), "node removal failed");
		}
	}

	/// Detaches every child.
	pub fn clear_children(&self) {
		self.truncate_children(0);
	}

	/// Detaches children from `len` onward, keeping the first `len`.
	pub fn truncate_children(&self, len: usize) {
		while self.child_count() > len {
			let Some(last) = self.0.last_child() else {
				return;
			};
			if let Err(e) = self.0.remove_child(&last) {
				tracing::warn!(error = %js_error(e), "child removal failed");
				return;
			}
		}
	}

	/// Serializes the node and its subtree as HTML.
	pub fn outer_html(&self) -> String {
		match self.kind() {
			NodeKind::Element => self.as_element().map(|e| e.outer_html()).unwrap_or_default(),
			NodeKind::Text => escape_text(&self.text_content()),
			NodeKind::Comment => format!("<!--{}-->", self.text_content()),
			NodeKind::Fragment | NodeKind::Document => self.inner_html(),
		}
	}

	/// Serializes the node's children as HTML.
	pub fn inner_html(&self) -> String {
		match self.as_element() {
			Some(element) => element.inner_html(),
			None => self.children().iter().map(Node::outer_html).collect(),
		}
	}
}

/// The page document, or a placeholder when none is available.
///
/// Lookups on the placeholder find nothing, so mount points simply do not
/// resolve.
#[derive(Debug, Clone, Default)]
pub struct Document {
	inner: Option<web_sys::Document>,
}

impl From<web_sys::Document> for Document {
	fn from(document: web_sys::Document) -> Self {
		Self {
			inner: Some(document),
		}
	}
}

impl Document {
	/// The document of the current window.
	pub fn from_window() -> Self {
		Self {
			inner: web_sys::window().and_then(|window| window.document()),
		}
	}

	/// The underlying DOM document.
	pub fn as_web(&self) -> Option<&web_sys::Document> {
		self.inner.as_ref()
	}

	fn require(&self) -> Result<&web_sys::Document, DomError> {
		self.inner.as_ref().ok_or_else(no_document)
	}

	/// The `<body>` element.
	pub fn body(&self) -> Option<Node> {
		let body = self.inner.as_ref()?.body()?;
		Some(Node(body.into()))
	}

	/// Creates a detached element.
	pub fn create_element(&self, tag: &str) -> Result<Node, DomError> {
		let element = self.require()?.create_element(tag).map_err(js_error)?;
		Ok(Node(element.into()))
	}

	/// Creates a detached text node.
	pub fn create_text_node(&self, data: &str) -> Result<Node, DomError> {
		Ok(Node(self.require()?.create_text_node(data).into()))
	}

	/// Creates a detached comment.
	pub fn create_comment(&self, data: &str) -> Result<Node, DomError> {
		Ok(Node(self.require()?.create_comment(data).into()))
	}

	/// Creates an empty fragment.
	pub fn create_document_fragment(&self) -> Result<Node, DomError> {
		Ok(Node(self.require()?.create_document_fragment().into()))
	}

	/// Connected element whose `id` equals `id`.
	pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
		if id.is_empty() {
			return None;
		}
		let element = self.inner.as_ref()?.get_element_by_id(id)?;
		Some(Node(element.into()))
	}

	/// First element matching `selector`, in document order.
	pub fn query_selector(&self, selector: &str) -> Result<Option<Node>, DomError> {
		let Some(document) = self.inner.as_ref() else {
			return Ok(None);
		};
		document
			.query_selector(selector)
			.map(|found| found.map(|element| Node(element.into())))
			.map_err(|_| DomError::InvalidSelector(selector.to_string()))
	}

	/// Every element matching `selector`, in document order.
	pub fn query_selector_all(&self, selector: &str) -> Result<Vec<Node>, DomError> {
		let Some(document) = self.inner.as_ref() else {
			return Ok(Vec::new());
		};
		let list = document
			.query_selector_all(selector)
			.map_err(|_| DomError::InvalidSelector(selector.to_string()))?;
		Ok((0..list.length()).filter_map(|i| list.get(i)).map(Node).collect())
	}
}

thread_local! {
	static CURRENT: RefCell<Option<Document>> = const { RefCell::new(None) };
}

/// The thread's current document, the window's document unless replaced.
pub fn current_document() -> Document {
	CURRENT.with(|current| {
		current
			.borrow_mut()
			.get_or_insert_with(Document::from_window)
			.clone()
	})
}

/// Replaces the thread's current document.
pub fn set_current_document(document: Document) {
	CURRENT.with(|current| *current.borrow_mut() = Some(document));
}

/// Drops the thread's current document; the next access looks it up again.
pub fn reset_current_document() {
	if CURRENT.try_with(|current| current.borrow_mut().take()).is_err() {
		tracing::trace!("current document already torn down");
	}
}

/// Parses `markup` into a fragment through an inert `<template>` element.
pub fn parse_fragment(markup: &str) -> Result<Node, DomError> {
	let document = current_document();
	let template = document
		.require()?
		.create_element("template")
		.map_err(js_error)?
		.dyn_into::<web_sys::HtmlTemplateElement>()
		.map_err(|_| DomError::HierarchyRequest("template element unavailable".to_string()))?;
	template.set_inner_html(markup);
	Ok(Node(template.content().into()))
}
