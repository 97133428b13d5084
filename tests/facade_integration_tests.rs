//! End-to-end tests through the `reverb` facade

use reverb::pages::dom::{Document, set_current_document};
use reverb::pages::{ManualHost, scheduler};
use reverb::prelude::*;
use reverb::RenderSettings;
use rstest::rstest;
use serde_json::json;
use serial_test::serial;
use std::rc::Rc;

#[rstest]
#[serial(scheduler)]
fn test_todo_list_renders_through_facade() {
	// Arrange
	reverb::reset();
	let host = Rc::new(ManualHost::new());
	scheduler::init(host.clone(), RenderSettings::default());
	let document = Document::new();
	set_current_document(document.clone());
	let list = document.create_element("ul");
	list.set_attribute("id", "todos");
	document.body().append_child(&list).unwrap();

	let todos = make_observable(
		Some(Value::from(json!({ "items": ["write", "test"] }))),
		&["todos"],
		ObservableOptions::recursive(),
	)
	.unwrap();
	let state = todos.clone();
	make_render_unit(
		"todos",
		MountSpec::id("todos"),
		move || {
			let items = state.get("items").unwrap_or_default();
			let markup: String = items
				.container()
				.map(|c| {
					c.keys()
						.iter()
						.filter_map(|k| c.get(k))
						.map(|v| format!("<li>{}</li>", v))
						.collect()
				})
				.unwrap_or_default();
			Ok(Rendered::ready(markup))
		},
		&["todos"],
		false,
	);
	host.run_until_idle();
	assert_eq!(list.inner_html(), "<li>write</li><li>test</li>");
	let first = list.child(0).unwrap();

	// Act
	let items = todos.get("items").and_then(|v| v.as_observable().cloned()).unwrap();
	items.push("ship").unwrap();
	host.run_until_idle();

	// Assert
	assert_eq!(list.inner_html(), "<li>write</li><li>test</li><li>ship</li>");
	assert!(list.child(0).unwrap().ptr_eq(&first));
	reverb::reset();
}

#[rstest]
fn test_proxy_safe_compare_matches_wrapped_and_plain() {
	let wrapped = make_observable(None, &["cmp"], ObservableOptions::default()).unwrap();
	let a = Value::from(wrapped.clone());
	let b = Value::from(wrapped);

	assert!(reverb::proxy_safe_compare(&a, &b));
}
