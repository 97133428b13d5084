//! Markup parsing
//!
//! Literal markup is parsed with `scraper` (html5ever) in body context and
//! converted into detached [`Node`]s.

use scraper::{ElementRef, Html};

use super::node::Node;
use crate::error::DomError;

/// Parses `markup` into a fragment holding the resulting top-level nodes.
///
/// Parsing is lenient: malformed markup is repaired the way a browser would
/// repair it, so this only fails if the converted tree cannot be assembled.
pub fn parse_fragment(markup: &str) -> Result<Node, DomError> {
	let html = Html::parse_fragment(markup);
	let fragment = Node::fragment();
	convert_children(html.root_element(), &fragment)?;
	tracing::trace!(children = fragment.child_count(), "parsed markup fragment");
	Ok(fragment)
}

fn convert_children(parent: ElementRef<'_>, into: &Node) -> Result<(), DomError> {
	for child in parent.children() {
		match child.value() {
			scraper::Node::Element(element) => {
				let node = Node::element(element.name());
				for (name, value) in element.attrs() {
					node.set_attribute(name, value);
				}
				if let Some(element_ref) = ElementRef::wrap(child) {
					convert_children(element_ref, &node)?;
				}
				into.append_child(&node)?;
			}
			scraper::Node::Text(text) => into.append_child(&Node::text(text))?,
			scraper::Node::Comment(comment) => into.append_child(&Node::comment(comment))?,
			_ => {}
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::NodeKind;
	use rstest::rstest;

	#[rstest]
	fn test_parse_nested_markup() {
		let fragment = parse_fragment(r#"<ul id="list"><li class="a">one</li><li>two</li></ul>tail"#).unwrap();

		assert_eq!(fragment.child_count(), 2);
		let list = fragment.child(0).unwrap();
		assert_eq!(list.tag_name().as_deref(), Some("ul"));
		assert_eq!(list.id(), "list");
		assert_eq!(list.child_count(), 2);
		assert_eq!(list.child(0).unwrap().attribute("class").as_deref(), Some("a"));
		assert_eq!(fragment.child(1).unwrap().kind(), NodeKind::Text);
	}

	#[rstest]
	fn test_parse_keeps_comments_and_boolean_attributes() {
		let fragment = parse_fragment("<!--note--><input disabled>").unwrap();

		assert_eq!(fragment.child(0).unwrap().kind(), NodeKind::Comment);
		let input = fragment.child(1).unwrap();
		assert_eq!(input.attribute("disabled").as_deref(), Some(""));
	}

	#[rstest]
	fn test_parse_empty_markup() {
		let fragment = parse_fragment("").unwrap();
		assert!(!fragment.has_children());
	}
}
