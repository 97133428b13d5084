//! Render Units
//!
//! A [`RenderUnit`] binds a template computation to one or more mount points
//! and a set of trigger channels. A notification on any trigger channel
//! requests a render; the [scheduler](crate::scheduler) batches requests and
//! runs the unit's pass, which computes the template once and reconciles it
//! into every resolved mount.
//!
//! ## Staleness
//!
//! Each accepted request mints a new generation. A pass captures the
//! generation it started with; when its template is pending, the result is
//! only applied while that generation is still current. A superseded result
//! is dropped without touching the tree.
//!
//! ## Example
//!
//! ```ignore
//! use reverb_pages::{MountSpec, Rendered, RenderUnit};
//!
//! let unit = RenderUnit::new("clock", MountSpec::id("clock"), || {
//!     Ok(Rendered::ready("<time>now</time>"))
//! }, &["clock"]);
//! unit.render();
//! ```

mod mount;
mod template;

pub use mount::MountSpec;
pub use template::Rendered;

use core::cell::{Cell, RefCell};
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

extern crate alloc;
use alloc::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use reverb_core::bus::{self, SubscriptionId};
use reverb_core::ChannelName;

use crate::dom::Node;
use crate::error::{DomError, RenderResult};
use crate::reconcile::{self, Template};
use crate::scheduler::{self, Completion, Renderable, completed};
use mount::MountTarget;

type TemplateFn = Box<dyn Fn() -> RenderResult<Rendered>>;

struct UnitState {
	id: u64,
	name: String,
	mount: MountTarget,
	template: TemplateFn,
	channels: Vec<ChannelName>,
	active: Cell<bool>,
	/// Set while a request is waiting for the scheduler to pick it up
	debounced: Cell<bool>,
	generation: Cell<u64>,
	in_flight: Cell<usize>,
	subscriptions: RefCell<Vec<SubscriptionId>>,
}

impl UnitState {
	fn request(self: &Rc<Self>) {
		if self.debounced.get() || !self.active.get() {
			return;
		}
		self.debounced.set(true);
		self.generation.set(self.generation.get() + 1);
		tracing::debug!(unit = %self.name, generation = self.generation.get(), "render requested");
		scheduler::enqueue(self.clone());
	}

	async fn settle(
		&self,
		pending: LocalBoxFuture<'static, RenderResult<Template>>,
		generation: u64,
		mounts: Vec<Node>,
	) -> RenderResult<()> {
		let template = pending.await?;
		for mount in &mounts {
			if self.generation.get() != generation {
				tracing::debug!(
					unit = %self.name,
					generation,
					current = self.generation.get(),
					"dropping stale render"
				);
				return Ok(());
			}
			reconcile::apply(&template, mount)?;
		}
		Ok(())
	}
}

impl Renderable for UnitState {
	fn unit_id(&self) -> u64 {
		self.id
	}

	fn name(&self) -> &str {
		&self.name
	}

	fn is_active(&self) -> bool {
		self.active.get()
	}

	fn clear_debounce(&self) {
		self.debounced.set(false);
	}

	fn render_queue_callback(self: Rc<Self>) -> RenderResult<Option<Completion>> {
		self.debounced.set(false);

		let mounts = self.mount.resolve()?;
		if mounts.is_empty() {
			tracing::debug!(unit = %self.name, "no mount target resolved");
			return Ok(None);
		}

		let generation = self.generation.get();
		match (self.template)()? {
			Rendered::Ready(template) => {
				for mount in &mounts {
					reconcile::apply(&template, mount)?;
				}
				Ok(Some(completed()))
			}
			Rendered::Pending(pending) => {
				self.in_flight.set(self.in_flight.get() + 1);
				let unit = self.clone();
				let completion = async move {
					let outcome = unit.settle(pending, generation, mounts).await;
					unit.in_flight.set(unit.in_flight.get().saturating_sub(1));
					outcome
				}
				.boxed_local()
				.shared();

				let driver = completion.clone().map(|_| ()).boxed_local();
				if let Err(e) = scheduler::spawn_local(driver) {
					self.in_flight.set(self.in_flight.get().saturating_sub(1));
					return Err(e);
				}
				Ok(Some(completion))
			}
		}
	}
}

impl Drop for UnitState {
	fn drop(&mut self) {
		for id in self.subscriptions.get_mut().drain(..) {
			bus::unsubscribe(id);
		}
	}
}

/// A template computation bound to mount points and trigger channels.
///
/// Cloning yields another handle to the same unit.
#[derive(Clone)]
pub struct RenderUnit {
	state: Rc<UnitState>,
}

impl RenderUnit {
	/// Creates a unit and subscribes it to its trigger channels.
	///
	/// `channels` are user channel names; an empty list subscribes to the base
	/// channel, so the unit reacts to every observable. The unit is active but
	/// does not render until asked to.
	pub fn new<F, S>(name: impl Into<String>, mount: impl Into<MountSpec>, template: F, channels: &[S]) -> Self
	where
		F: Fn() -> RenderResult<Rendered> + 'static,
		S: AsRef<str>,
	{
		static NEXT_ID: AtomicU64 = AtomicU64::new(1);

		let channels: Vec<ChannelName> = if channels.is_empty() {
			vec![ChannelName::BASE]
		} else {
			channels.iter().map(|c| ChannelName::user(c.as_ref())).collect()
		};

		let state = Rc::new(UnitState {
			id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
			name: name.into(),
			mount: MountTarget::new(mount.into()),
			template: Box::new(template),
			channels,
			active: Cell::new(true),
			debounced: Cell::new(false),
			generation: Cell::new(0),
			in_flight: Cell::new(0),
			subscriptions: RefCell::new(Vec::new()),
		});

		for channel in &state.channels {
			let unit = Rc::downgrade(&state);
			let id = bus::subscribe(channel.clone(), move |_| {
				if let Some(unit) = unit.upgrade() {
					unit.request();
				}
			});
			state.subscriptions.borrow_mut().push(id);
		}
		tracing::debug!(unit = %state.name, channels = state.channels.len(), "render unit created");

		Self { state }
	}

	/// Registered name of the unit.
	pub fn name(&self) -> &str {
		&self.state.name
	}

	/// Channels the unit listens on.
	pub fn channels(&self) -> &[ChannelName] {
		&self.state.channels
	}

	/// Where the unit mounts.
	pub fn mount_spec(&self) -> &MountSpec {
		self.state.mount.spec()
	}

	/// Resolves the unit's mount points against the current document.
	pub fn mounts(&self) -> Result<Vec<Node>, DomError> {
		self.state.mount.resolve()
	}

	/// Requests a render.
	///
	/// Ignored while paused or while a request is already waiting.
	pub fn render(&self) {
		self.state.request();
	}

	/// Stops reacting to requests and notifications.
	pub fn pause(&self) {
		self.state.active.set(false);
	}

	/// Reacts to requests again, optionally rendering right away.
	pub fn resume(&self, render_now: bool) {
		self.state.active.set(true);
		if render_now {
			self.render();
		}
	}

	/// Whether the unit reacts to requests.
	pub fn is_active(&self) -> bool {
		self.state.active.get()
	}

	/// Whether a request is waiting for the scheduler.
	pub fn is_debounced(&self) -> bool {
		self.state.debounced.get()
	}

	/// The current render generation.
	pub fn generation(&self) -> u64 {
		self.state.generation.get()
	}

	/// Number of pending template computations not yet settled.
	pub fn in_flight(&self) -> usize {
		self.state.in_flight.get()
	}

	/// Returns `true` when both handles refer to the same unit.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.state, &other.state)
	}
}

impl fmt::Debug for RenderUnit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderUnit")
			.field("name", &self.state.name)
			.field("channels", &self.state.channels)
			.field("active", &self.state.active.get())
			.field("generation", &self.state.generation.get())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::ManualHost;
	use crate::settings::RenderSettings;
	use rstest::rstest;
	use serial_test::serial;

	fn setup() -> (Rc<ManualHost>, Node) {
		bus::reset();
		let host = Rc::new(ManualHost::new());
		scheduler::init(host.clone(), RenderSettings::default());
		(host, Node::element("div"))
	}

	fn teardown() {
		scheduler::reset();
		bus::reset();
	}

	#[rstest]
	#[serial(scheduler)]
	fn test_requests_coalesce_until_picked_up() {
		// Arrange
		let (host, root) = setup();
		let calls = Rc::new(Cell::new(0));
		let counter = calls.clone();
		let unit = RenderUnit::new(
			"coalesce",
			&root,
			move || {
				counter.set(counter.get() + 1);
				Ok(Rendered::ready("<p>hi</p>"))
			},
			&["coalesce"],
		);

		// Act
		for _ in 0..4 {
			unit.render();
		}
		host.run_until_idle();

		// Assert
		assert_eq!(calls.get(), 1);
		assert_eq!(unit.generation(), 1);
		assert!(!unit.is_debounced());
		assert_eq!(root.inner_html(), "<p>hi</p>");
		teardown();
	}

	#[rstest]
	#[serial(scheduler)]
	fn test_notification_on_trigger_channel_requests_render() {
		let (host, root) = setup();
		let unit = RenderUnit::new("bound", &root, || Ok("<b>x</b>".into()), &["bound"]);

		bus::dispatch(&[ChannelName::user("bound")], None);
		assert!(unit.is_debounced());
		host.run_until_idle();

		assert_eq!(root.inner_html(), "<b>x</b>");
		teardown();
	}

	#[rstest]
	#[serial(scheduler)]
	fn test_unit_without_channels_listens_on_base() {
		let (_host, root) = setup();

		let unit = RenderUnit::new("any", &root, || Ok("".into()), &[] as &[&str]);

		assert_eq!(unit.channels(), &[ChannelName::BASE]);
		assert_eq!(bus::listener_count(&ChannelName::BASE), 1);
		teardown();
	}

	#[rstest]
	#[serial(scheduler)]
	fn test_paused_unit_ignores_requests_and_resume_renders() {
		let (host, root) = setup();
		let unit = RenderUnit::new("paused", &root, || Ok("<i>on</i>".into()), &["paused"]);
		unit.pause();

		unit.render();
		host.run_until_idle();
		assert_eq!(root.child_count(), 0);

		unit.resume(true);
		host.run_until_idle();
		assert_eq!(root.inner_html(), "<i>on</i>");
		teardown();
	}

	#[rstest]
	#[serial(scheduler)]
	fn test_dropping_unit_unsubscribes() {
		let (_host, root) = setup();
		let unit = RenderUnit::new("short", &root, || Ok("".into()), &["short"]);
		assert_eq!(bus::listener_count(&ChannelName::user("short")), 1);

		drop(unit);

		assert_eq!(bus::listener_count(&ChannelName::user("short")), 0);
		teardown();
	}

	#[rstest]
	#[serial(scheduler)]
	fn test_template_error_propagates_from_pass() {
		let (host, root) = setup();
		let unit = RenderUnit::new(
			"broken",
			&root,
			|| Err(crate::error::RenderError::template("no data")),
			&["broken"],
		);
		unit.render();
		host.run_timers();

		let result = scheduler::flush();

		assert!(result.is_err());
		assert!(!unit.is_debounced());
		assert_eq!(root.child_count(), 0);
		teardown();
	}
}
