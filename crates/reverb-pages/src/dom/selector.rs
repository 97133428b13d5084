//! Selector matching
//!
//! Supports the subset needed to resolve mount points: compound selectors
//! (`tag#id.class[attr][attr=value]`, `*`), descendant combinators (whitespace)
//! and comma-separated groups.

use core::iter::Peekable;
use core::str::Chars;

use super::NodeKind;
use super::node::Node;
use crate::error::DomError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeTest {
	name: String,
	value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
	tag: Option<String>,
	id: Option<String>,
	classes: Vec<String>,
	attributes: Vec<AttributeTest>,
}

impl Compound {
	fn matches(&self, node: &Node) -> bool {
		if node.kind() != NodeKind::Element {
			return false;
		}
		if let Some(tag) = &self.tag
			&& node.tag_name().as_deref() != Some(tag.as_str())
		{
			return false;
		}
		if let Some(id) = &self.id
			&& node.attribute("id").as_deref() != Some(id.as_str())
		{
			return false;
		}
		if !self.classes.is_empty() {
			let class_attr = node.attribute("class").unwrap_or_default();
			let present: Vec<&str> = class_attr.split_whitespace().collect();
			if !self.classes.iter().all(|c| present.contains(&c.as_str())) {
				return false;
			}
		}
		self.attributes.iter().all(|test| match &test.value {
			None => node.has_attribute(&test.name),
			Some(expected) => node.attribute(&test.name).as_deref() == Some(expected.as_str()),
		})
	}
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
	/// Each group is a descendant chain, outermost compound first
	groups: Vec<Vec<Compound>>,
}

impl Selector {
	/// Parses a selector list.
	///
	/// # Errors
	///
	/// Returns [`DomError::InvalidSelector`] for empty groups or unsupported syntax.
	pub fn parse(source: &str) -> Result<Self, DomError> {
		let mut groups = Vec::new();
		for group in source.split(',') {
			let chain = group
				.split_whitespace()
				.map(|part| parse_compound(part, source))
				.collect::<Result<Vec<_>, _>>()?;
			if chain.is_empty() {
				return Err(DomError::InvalidSelector(source.to_string()));
			}
			groups.push(chain);
		}
		Ok(Self { groups })
	}

	/// Returns `true` when `node` matches any group.
	pub fn matches(&self, node: &Node) -> bool {
		self.groups.iter().any(|chain| chain_matches(chain, node))
	}
}

fn chain_matches(chain: &[Compound], node: &Node) -> bool {
	let Some((last, ancestors)) = chain.split_last() else {
		return false;
	};
	if !last.matches(node) {
		return false;
	}
	let mut current = node.parent();
	for compound in ancestors.iter().rev() {
		loop {
			match current {
				Some(ancestor) => {
					current = ancestor.parent();
					if compound.matches(&ancestor) {
						break;
					}
				}
				None => return false,
			}
		}
	}
	true
}

fn is_ident_char(c: char) -> bool {
	c.is_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &mut Peekable<Chars<'_>>) -> String {
	let mut ident = String::new();
	while let Some(&c) = chars.peek() {
		if !is_ident_char(c) {
			break;
		}
		ident.push(c);
		chars.next();
	}
	ident
}

fn parse_compound(text: &str, source: &str) -> Result<Compound, DomError> {
	let invalid = || DomError::InvalidSelector(source.to_string());
	let mut compound = Compound::default();
	let mut chars = text.chars().peekable();

	match chars.peek() {
		Some('*') => {
			chars.next();
		}
		Some(&c) if is_ident_char(c) => {
			compound.tag = Some(read_ident(&mut chars).to_ascii_lowercase());
		}
		_ => {}
	}

	while let Some(c) = chars.next() {
		match c {
			'#' => {
				let id = read_ident(&mut chars);
				if id.is_empty() {
					return Err(invalid());
				}
				compound.id = Some(id);
			}
			'.' => {
				let class = read_ident(&mut chars);
				if class.is_empty() {
					return Err(invalid());
				}
				compound.classes.push(class);
			}
			'[' => {
				let mut body = String::new();
				let mut closed = false;
				for c in chars.by_ref() {
					if c == ']' {
						closed = true;
						break;
					}
					body.push(c);
				}
				if !closed {
					return Err(invalid());
				}
				compound.attributes.push(parse_attribute_test(&body).ok_or_else(invalid)?);
			}
			_ => return Err(invalid()),
		}
	}
	Ok(compound)
}

fn parse_attribute_test(body: &str) -> Option<AttributeTest> {
	let (name, value) = match body.split_once('=') {
		Some((name, value)) => {
			let value = value.trim();
			let unquoted = value
				.strip_prefix('"')
				.and_then(|v| v.strip_suffix('"'))
				.or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
				.unwrap_or(value);
			(name.trim(), Some(unquoted.to_string()))
		}
		None => (body.trim(), None),
	};
	if name.is_empty() || !name.chars().all(is_ident_char) {
		return None;
	}
	Some(AttributeTest {
		name: name.to_ascii_lowercase(),
		value,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn item() -> Node {
		let node = Node::element("li");
		node.set_attribute("id", "first");
		node.set_attribute("class", "row active");
		node.set_attribute("data-kind", "todo");
		node
	}

	#[rstest]
	#[case("li", true)]
	#[case("*", true)]
	#[case("#first", true)]
	#[case("li.row.active", true)]
	#[case(".row.done", false)]
	#[case("[data-kind]", true)]
	#[case("[data-kind=todo]", true)]
	#[case("[data-kind=\"done\"]", false)]
	#[case("p, li#first", true)]
	#[case("div", false)]
	fn test_compound_matching(#[case] selector: &str, #[case] expected: bool) {
		let selector = Selector::parse(selector).unwrap();
		assert_eq!(selector.matches(&item()), expected);
	}

	#[rstest]
	fn test_descendant_chain() {
		let list = Node::element("ul");
		list.set_attribute("class", "todos");
		let node = item();
		list.append_child(&node).unwrap();

		assert!(Selector::parse("ul.todos li").unwrap().matches(&node));
		assert!(!Selector::parse("ol li").unwrap().matches(&node));
	}

	#[rstest]
	#[case("")]
	#[case("li,")]
	#[case("#")]
	#[case("[unterminated")]
	#[case("li > p")]
	fn test_invalid_selectors(#[case] selector: &str) {
		assert!(matches!(
			Selector::parse(selector),
			Err(DomError::InvalidSelector(_))
		));
	}
}
