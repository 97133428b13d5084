//! Host tree
//!
//! The node tree render units mount into. Two backends share one surface:
//!
//! - native targets: an in-memory tree of shared [`Node`] handles, a
//!   [`Document`] with identifier and selector lookup, `scraper` markup
//!   parsing and an opt-in `Mutation` record used to observe exactly what a
//!   render changed
//! - `wasm32`: the page's own DOM through `web_sys`
//!
//! Reconciliation and mount resolution only use the shared surface: node
//! kind, tag and attributes, the value property, children, text, structural
//! edits, and lookups on the current document.

mod kind;

#[cfg(not(target_arch = "wasm32"))]
mod document;
#[cfg(not(target_arch = "wasm32"))]
mod markup;
#[cfg(not(target_arch = "wasm32"))]
mod mutation;
#[cfg(not(target_arch = "wasm32"))]
mod node;
#[cfg(not(target_arch = "wasm32"))]
mod selector;

#[cfg(target_arch = "wasm32")]
mod web;

pub use kind::NodeKind;

#[cfg(not(target_arch = "wasm32"))]
pub use document::{Document, current_document, reset_current_document, set_current_document};
#[cfg(not(target_arch = "wasm32"))]
pub use markup::parse_fragment;
#[cfg(not(target_arch = "wasm32"))]
pub use mutation::Mutation;
#[cfg(not(target_arch = "wasm32"))]
pub use node::Node;
#[cfg(not(target_arch = "wasm32"))]
pub use selector::Selector;

#[cfg(target_arch = "wasm32")]
pub use web::{
	Document, Node, current_document, parse_fragment, reset_current_document, set_current_document,
};
