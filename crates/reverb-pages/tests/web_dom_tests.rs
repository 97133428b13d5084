//! Browser tests for the DOM-backed host tree
//!
//! Run with `wasm-pack test --headless --firefox crates/reverb-pages`.

#![cfg(target_arch = "wasm32")]

use reverb_pages::dom::current_document;
use reverb_pages::reconcile::{Template, apply};
use reverb_pages::{MountSpec, Node, make_render_unit, scheduler};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn mount_point(id: &str) -> Node {
	let document = current_document();
	let node = document.create_element("div").unwrap();
	node.set_attribute("id", id);
	document.body().unwrap().append_child(&node).unwrap();
	node
}

#[wasm_bindgen_test]
fn test_markup_is_reconciled_into_page_document() {
	let root = mount_point("web-reconcile");

	apply(&Template::from(r#"<div id="a">A</div><div id="b">B</div>"#), &root).unwrap();
	let a = root.child(0).unwrap();
	apply(&Template::from(r#"<div id="b">B</div><div id="a">A</div>"#), &root).unwrap();

	assert_eq!(root.child_count(), 2);
	assert!(root.child(1).unwrap().ptr_eq(&a));
	assert!(a.is_connected());
	assert_eq!(root.inner_html(), r#"<div id="b">B</div><div id="a">A</div>"#);
	root.remove();
}

#[wasm_bindgen_test]
fn test_boolean_and_value_attributes_reach_dom() {
	let root = mount_point("web-attributes");
	apply(&Template::from(r#"<input id="field" value="one" disabled="disabled">"#), &root).unwrap();
	let input = root.child(0).unwrap();

	apply(&Template::from(r#"<input id="field" value="two" disabled="false">"#), &root).unwrap();

	assert!(root.child(0).unwrap().ptr_eq(&input));
	assert_eq!(input.value(), "two");
	assert!(!input.has_attribute("disabled"));
	root.remove();
}

#[wasm_bindgen_test]
fn test_render_unit_mounts_by_id_in_page_document() {
	let root = mount_point("web-unit");

	make_render_unit(
		"web-unit",
		MountSpec::id("web-unit"),
		|| Ok("<span>live</span>".into()),
		&["web-unit"],
		false,
	);
	scheduler::flush().unwrap();

	assert_eq!(root.inner_html(), "<span>live</span>");
	reverb_pages::reset();
	root.remove();
}
