/// Kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
	/// An element with a tag name and attributes
	Element,
	/// A text node
	Text,
	/// A comment node
	Comment,
	/// A detached container for a list of nodes
	Fragment,
	/// A document root
	Document,
}
