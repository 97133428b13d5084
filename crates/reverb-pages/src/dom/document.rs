//! Documents
//!
//! A [`Document`] owns the root of a host tree and answers lookups by
//! identifier and selector. Each thread has a current document that mount
//! points are resolved against; see [`current_document`].

use core::cell::RefCell;

use super::mutation::Mutation;
use super::node::Node;
use super::selector::Selector;
use crate::error::DomError;

/// A host tree with a `<body>` element under its root.
#[derive(Debug, Clone)]
pub struct Document {
	root: Node,
	body: Node,
}

impl Document {
	/// Creates an empty document.
	pub fn new() -> Self {
		let body = Node::element("body");
		let root = Node::document_root(&body);
		Self { root, body }
	}

	/// The document root node.
	pub fn root(&self) -> &Node {
		&self.root
	}

	/// The `<body>` element.
	pub fn body(&self) -> &Node {
		&self.body
	}

	/// Creates a detached element.
	pub fn create_element(&self, tag: &str) -> Node {
		Node::element(tag)
	}

	/// Creates a detached text node.
	pub fn create_text_node(&self, data: &str) -> Node {
		Node::text(data)
	}

	/// Creates a detached comment.
	pub fn create_comment(&self, data: &str) -> Node {
		Node::comment(data)
	}

	/// Creates an empty fragment.
	pub fn create_document_fragment(&self) -> Node {
		Node::fragment()
	}

	/// First connected element whose `id` equals `id`.
	pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
		if id.is_empty() {
			return None;
		}
		self.root
			.descendants()
			.into_iter()
			.find(|node| node.is_element() && node.attribute("id").as_deref() == Some(id))
	}

	/// First element matching `selector`, in document order.
	pub fn query_selector(&self, selector: &str) -> Result<Option<Node>, DomError> {
		let selector = Selector::parse(selector)?;
		Ok(self
			.root
			.descendants()
			.into_iter()
			.find(|node| selector.matches(node)))
	}

	/// Every element matching `selector`, in document order.
	pub fn query_selector_all(&self, selector: &str) -> Result<Vec<Node>, DomError> {
		let selector = Selector::parse(selector)?;
		Ok(self
			.root
			.descendants()
			.into_iter()
			.filter(|node| selector.matches(node))
			.collect())
	}

	/// Starts recording mutations of connected nodes.
	pub fn record_mutations(&self) {
		self.root.enable_mutation_log();
	}

	/// Drains the recorded mutations. Empty when recording is off.
	pub fn take_mutations(&self) -> Vec<Mutation> {
		self.root
			.mutation_log()
			.map(|log| log.take())
			.unwrap_or_default()
	}
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

thread_local! {
	static CURRENT: RefCell<Option<Document>> = const { RefCell::new(None) };
}

/// The thread's current document, created on first use.
pub fn current_document() -> Document {
	CURRENT.with(|current| {
		current
			.borrow_mut()
			.get_or_insert_with(Document::new)
			.clone()
	})
}

/// Replaces the thread's current document.
pub fn set_current_document(document: Document) {
	CURRENT.with(|current| *current.borrow_mut() = Some(document));
}

/// Drops the thread's current document; the next access creates a new one.
pub fn reset_current_document() {
	if CURRENT.try_with(|current| current.borrow_mut().take()).is_err() {
		tracing::trace!("current document already torn down");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	fn test_new_document_has_connected_body() {
		let document = Document::new();

		assert_eq!(document.root().kind(), crate::dom::NodeKind::Document);
		assert_eq!(document.root().child_count(), 1);
		assert!(document.root().child(0).unwrap().ptr_eq(document.body()));
		assert!(document.body().is_connected());
		assert_eq!(document.body().tag_name().as_deref(), Some("body"));
	}

	#[rstest]
	fn test_lookup_requires_connection() {
		let document = Document::new();
		let detached = document.create_element("div");
		detached.set_attribute("id", "app");
		assert!(document.get_element_by_id("app").is_none());

		document.body().append_child(&detached).unwrap();

		let found = document.get_element_by_id("app").unwrap();
		assert!(found.ptr_eq(&detached));
		assert!(found.is_connected());
	}

	#[rstest]
	fn test_query_selector_all_in_document_order() {
		let document = Document::new();
		for (i, class) in ["mount", "other", "mount"].iter().enumerate() {
			let node = document.create_element("section");
			node.set_attribute("class", class);
			node.set_attribute("data-index", &i.to_string());
			document.body().append_child(&node).unwrap();
		}

		let found = document.query_selector_all("section.mount").unwrap();

		let indexes: Vec<String> = found
			.iter()
			.filter_map(|n| n.attribute("data-index"))
			.collect();
		assert_eq!(indexes, vec!["0", "2"]);
	}

	#[rstest]
	fn test_mutations_recorded_only_when_enabled() {
		let document = Document::new();
		document.body().set_attribute("class", "before");
		assert!(document.take_mutations().is_empty());

		document.record_mutations();
		document.body().set_attribute("class", "after");
		document.create_element("p").set_attribute("class", "detached");

		let mutations = document.take_mutations();
		assert_eq!(mutations.len(), 1);
		assert!(mutations[0].target().ptr_eq(document.body()));
	}

	#[rstest]
	#[serial(document)]
	fn test_current_document_is_stable_until_reset() {
		reset_current_document();
		let first = current_document();
		assert!(current_document().root().ptr_eq(first.root()));

		reset_current_document();

		assert!(!current_document().root().ptr_eq(first.root()));
	}
}
