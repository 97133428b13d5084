//! Integration tests for the observable → scheduler → reconciliation flow
//!
//! Every test drives time through a [`ManualHost`], so timers, frames and
//! pending template computations only advance when the test says so.

use futures::channel::oneshot;
use reverb_core::bus;
use reverb_core::{ChannelName, Observable, Value};
use reverb_pages::dom::{Document, set_current_document};
use reverb_pages::{
	ManualHost, MountSpec, ObservableOptions, RenderError, RenderSettings, Rendered, Template,
	make_observable, make_render_unit, pause_all, registry, resume_all, scheduler,
};
use rstest::{fixture, rstest};
use serde_json::json;
use serial_test::serial;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct Harness {
	host: Rc<ManualHost>,
	document: Document,
}

impl Harness {
	fn mount(&self, tag: &str, id: &str) -> reverb_pages::Node {
		let node = self.document.create_element(tag);
		node.set_attribute("id", id);
		self.document.body().append_child(&node).unwrap();
		node
	}

	fn settle(&self) {
		self.host.run_until_idle();
	}
}

impl Drop for Harness {
	fn drop(&mut self) {
		reverb_pages::reset();
	}
}

#[fixture]
fn harness() -> Harness {
	reverb_pages::reset();
	let host = Rc::new(ManualHost::new());
	scheduler::init(host.clone(), RenderSettings::default());
	let document = Document::new();
	set_current_document(document.clone());
	Harness { host, document }
}

fn count_on(channel: ChannelName) -> Rc<Cell<u32>> {
	let count = Rc::new(Cell::new(0));
	let sink = count.clone();
	bus::subscribe(channel, move |_| sink.set(sink.get() + 1));
	count
}

fn counter_data() -> Observable {
	make_observable(
		Some(Value::from(json!({ "count": 0 }))),
		&["counter"],
		ObservableOptions::default(),
	)
	.unwrap()
}

#[rstest]
#[serial(scheduler)]
fn test_counter_scenario(harness: Harness) {
	// Arrange
	let app = harness.mount("div", "app");
	let data = counter_data();
	let state = data.clone();
	make_render_unit(
		"counter",
		MountSpec::id("app"),
		move || {
			let count = state.get("count").unwrap_or_default();
			Ok(Rendered::ready(format!("<span>{}</span>", count)))
		},
		&["counter"],
		false,
	);
	harness.settle();
	let span = app.child(0).unwrap();
	assert_eq!(span.text_content(), "0");
	let rendered = count_on(ChannelName::RENDERED);
	let unit_rendered = count_on(ChannelName::unit_rendered("counter"));

	// Act
	data.set("count", 1).unwrap();
	harness.settle();

	// Assert
	assert!(app.child(0).unwrap().ptr_eq(&span));
	assert_eq!(span.text_content(), "1");
	assert_eq!(rendered.get(), 1);
	assert_eq!(unit_rendered.get(), 1);
}

#[rstest]
#[serial(scheduler)]
fn test_burst_of_writes_renders_once(harness: Harness) {
	// Arrange
	let app = harness.mount("div", "app");
	let data = counter_data();
	let state = data.clone();
	let calls = Rc::new(Cell::new(0));
	let counter = calls.clone();
	let unit = make_render_unit(
		"burst",
		&app,
		move || {
			counter.set(counter.get() + 1);
			Ok(format!("<b>{}</b>", state.get("count").unwrap_or_default()).into())
		},
		&["counter"],
		false,
	);
	harness.settle();
	let before = calls.get();
	let generation = unit.generation();

	// Act
	for i in 1..=10 {
		data.set("count", i).unwrap();
	}
	harness.settle();

	// Assert
	assert_eq!(calls.get(), before + 1);
	assert_eq!(unit.generation(), generation + 1);
	assert_eq!(app.inner_html(), "<b>10</b>");
}

#[rstest]
#[serial(scheduler)]
#[case::newest_resolves_first(&[1, 0])]
#[case::oldest_resolves_first(&[0, 1])]
fn test_stale_async_result_is_dropped(harness: Harness, #[case] resolution_order: &[usize]) {
	// Arrange
	let app = harness.mount("div", "app");
	let senders: Rc<RefCell<Vec<oneshot::Sender<Template>>>> = Rc::new(RefCell::new(Vec::new()));
	let sink = senders.clone();
	let unit = make_render_unit(
		"slow",
		&app,
		move || {
			let (tx, rx) = oneshot::channel();
			sink.borrow_mut().push(tx);
			Ok(Rendered::pending(async move {
				rx.await.map_err(|_| RenderError::template("cancelled"))
			}))
		},
		&["slow"],
		false,
	);
	harness.settle();
	unit.render();
	harness.settle();
	assert_eq!(unit.in_flight(), 2);

	// Act
	let mut pending: Vec<Option<oneshot::Sender<Template>>> =
		senders.borrow_mut().drain(..).map(Some).collect();
	let markup = ["<p>stale</p>", "<p>fresh</p>"];
	for &index in resolution_order {
		if let Some(tx) = pending[index].take() {
			tx.send(Template::from(markup[index])).unwrap();
		}
		harness.settle();
		if index == 0 {
			assert_ne!(app.inner_html(), "<p>stale</p>");
		}
	}

	// Assert
	assert_eq!(app.inner_html(), "<p>fresh</p>");
	assert_eq!(unit.in_flight(), 0);
}

#[rstest]
#[serial(scheduler)]
fn test_selector_mount_computes_template_once(harness: Harness) {
	for id in ["left", "right"] {
		let node = harness.mount("section", id);
		node.set_attribute("class", "panel");
	}
	let calls = Rc::new(Cell::new(0));
	let counter = calls.clone();

	make_render_unit(
		"panels",
		MountSpec::selector("section.panel"),
		move || {
			counter.set(counter.get() + 1);
			Ok("<em>shared</em>".into())
		},
		&["panels"],
		false,
	);
	harness.settle();

	assert_eq!(calls.get(), 1);
	for node in harness.document.query_selector_all(".panel").unwrap() {
		assert_eq!(node.inner_html(), "<em>shared</em>");
	}
}

#[rstest]
#[serial(scheduler)]
fn test_missing_target_is_skipped_then_retried(harness: Harness) {
	// Arrange
	let calls = Rc::new(Cell::new(0));
	let counter = calls.clone();
	let unit = make_render_unit(
		"late",
		MountSpec::id("late"),
		move || {
			counter.set(counter.get() + 1);
			Ok("<p>here</p>".into())
		},
		&["late"],
		false,
	);
	let unit_rendered = count_on(ChannelName::unit_rendered("late"));
	harness.settle();
	assert_eq!(calls.get(), 0);
	assert_eq!(unit_rendered.get(), 0);

	// Act
	let target = harness.mount("div", "late");
	unit.render();
	harness.settle();

	// Assert
	assert_eq!(calls.get(), 1);
	assert_eq!(target.inner_html(), "<p>here</p>");
	assert_eq!(unit_rendered.get(), 1);
}

#[rstest]
#[serial(scheduler)]
fn test_failed_template_suppresses_named_completion(harness: Harness) {
	let app = harness.mount("div", "app");
	let rendered = count_on(ChannelName::RENDERED);
	let unit_rendered = count_on(ChannelName::unit_rendered("failing"));

	make_render_unit(
		"failing",
		&app,
		|| Err(RenderError::template("missing data")),
		&["failing"],
		false,
	);
	harness.settle();

	assert_eq!(rendered.get(), 1);
	assert_eq!(unit_rendered.get(), 0);
	assert_eq!(app.child_count(), 0);
}

#[rstest]
#[serial(scheduler)]
fn test_async_failure_suppresses_named_completion(harness: Harness) {
	let app = harness.mount("div", "app");
	let unit_rendered = count_on(ChannelName::unit_rendered("rejected"));

	make_render_unit(
		"rejected",
		&app,
		|| Ok(Rendered::pending(async { Err::<Template, _>(RenderError::template("fetch failed")) })),
		&["rejected"],
		false,
	);
	harness.settle();

	assert_eq!(unit_rendered.get(), 0);
	assert_eq!(app.child_count(), 0);
}

#[rstest]
#[serial(scheduler)]
fn test_global_pause_defers_until_resume(harness: Harness) {
	// Arrange
	let app = harness.mount("div", "app");
	let data = counter_data();
	let state = data.clone();
	make_render_unit(
		"paused",
		&app,
		move || Ok(format!("{}", state.get("count").unwrap_or_default()).into()),
		&["counter"],
		false,
	);
	harness.settle();

	// Act
	pause_all();
	data.set("count", 5).unwrap();
	harness.settle();
	let while_paused = app.text_content();
	resume_all();
	harness.settle();

	// Assert
	assert_eq!(while_paused, "0");
	assert_eq!(app.text_content(), "5");
}

#[rstest]
#[serial(scheduler)]
fn test_start_paused_unit_waits_for_resume(harness: Harness) {
	let app = harness.mount("div", "app");

	let unit = make_render_unit("dormant", &app, || Ok("<i>awake</i>".into()), &["dormant"], true);
	harness.settle();
	assert_eq!(app.child_count(), 0);

	unit.resume(true);
	harness.settle();

	assert_eq!(app.inner_html(), "<i>awake</i>");
}

#[rstest]
#[serial(scheduler)]
fn test_muted_writes_render_once_on_unmute(harness: Harness) {
	// Arrange
	let app = harness.mount("div", "app");
	let data = counter_data();
	let state = data.clone();
	let calls = Rc::new(Cell::new(0));
	let counter = calls.clone();
	make_render_unit(
		"muted",
		&app,
		move || {
			counter.set(counter.get() + 1);
			Ok(format!("{}", state.get("count").unwrap_or_default()).into())
		},
		&["counter"],
		false,
	);
	harness.settle();
	let before = calls.get();

	// Act
	data.set_muted(true);
	for i in 1..=3 {
		data.set("count", i).unwrap();
		harness.settle();
	}
	let while_muted = calls.get();
	data.set_muted(false);
	harness.settle();

	// Assert
	assert_eq!(while_muted, before);
	assert_eq!(calls.get(), before + 1);
	assert_eq!(app.text_content(), "3");
}

#[rstest]
#[serial(scheduler)]
fn test_registration_overwrites_by_name(harness: Harness) {
	let app = harness.mount("div", "app");

	let first = make_render_unit("main", &app, || Ok("<p>1</p>".into()), &["main"], true);
	let second = make_render_unit("main", &app, || Ok("<p>2</p>".into()), &["main"], true);

	let registered = registry::get("main").unwrap();
	assert!(registered.ptr_eq(&second));
	assert!(!registered.ptr_eq(&first));
	assert_eq!(registry::names(), vec!["main"]);
}

#[rstest]
#[serial(scheduler)]
fn test_debounce_setting_delays_pass(harness: Harness) {
	let host = Rc::new(ManualHost::new());
	scheduler::init(host.clone(), RenderSettings::from_json(r#"{ "debounce_ms": 50 }"#).unwrap());
	let app = harness.mount("div", "app");
	make_render_unit("delayed", &app, || Ok("<p>late</p>".into()), &["delayed"], false);

	host.advance(std::time::Duration::from_millis(49));
	host.run_frame();
	assert_eq!(app.child_count(), 0);

	host.advance(std::time::Duration::from_millis(1));
	host.run_frame();
	assert_eq!(app.inner_html(), "<p>late</p>");
}

#[rstest]
#[serial(scheduler)]
fn test_flush_without_init_applies_ready_async_result() {
	// Arrange
	reverb_pages::reset();
	let mount = reverb_pages::Node::element("div");
	let unit = make_render_unit(
		"implicit",
		&mount,
		|| Ok(Rendered::pending(async { Ok(Template::from("<b>x</b>")) })),
		&["implicit"],
		false,
	);

	// Act
	scheduler::flush().unwrap();

	// Assert
	assert_eq!(mount.inner_html(), "<b>x</b>");
	assert_eq!(unit.in_flight(), 0);
	reverb_pages::reset();
}

#[rstest]
#[serial(scheduler)]
fn test_unit_renders_after_scheduler_is_replaced(harness: Harness) {
	// Arrange
	let app = harness.mount("div", "app");
	let unit = make_render_unit("moved", &app, || Ok("<p>moved</p>".into()), &["moved"], false);
	assert_eq!(scheduler::pending_count(), 1);

	// Act
	let replacement = Rc::new(ManualHost::new());
	scheduler::init(replacement.clone(), RenderSettings::default());
	unit.render();
	replacement.run_until_idle();

	// Assert
	assert!(!unit.is_debounced());
	assert_eq!(app.inner_html(), "<p>moved</p>");
}
