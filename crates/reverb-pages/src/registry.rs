//! Named registry of render units.
//!
//! Units are kept alive by the registry until [`reset`]. Registering a name
//! again replaces the previous entry.

use core::cell::RefCell;

use indexmap::IndexMap;

use crate::render_unit::RenderUnit;

thread_local! {
	static UNITS: RefCell<IndexMap<String, RenderUnit>> = RefCell::new(IndexMap::new());
}

/// Registers `unit` under its name, returning the unit it replaced.
pub fn register(unit: RenderUnit) -> Option<RenderUnit> {
	let replaced = UNITS.with(|units| units.borrow_mut().insert(unit.name().to_string(), unit));
	if let Some(previous) = &replaced {
		tracing::debug!(unit = previous.name(), "render unit replaced");
	}
	replaced
}

/// The unit registered under `name`.
pub fn get(name: &str) -> Option<RenderUnit> {
	UNITS.with(|units| units.borrow().get(name).cloned())
}

/// Registered names, in registration order.
pub fn names() -> Vec<String> {
	UNITS.with(|units| units.borrow().keys().cloned().collect())
}

/// Removes and returns the unit registered under `name`.
pub fn remove(name: &str) -> Option<RenderUnit> {
	UNITS.with(|units| units.borrow_mut().shift_remove(name))
}

/// Drops every registered unit.
pub fn reset() {
	let units = UNITS
		.try_with(|units| core::mem::take(&mut *units.borrow_mut()))
		.unwrap_or_default();
	// Units unsubscribe on drop, which must not happen under the borrow.
	drop(units);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::Node;
	use reverb_core::bus;
	use rstest::rstest;
	use serial_test::serial;

	fn unit(name: &str) -> RenderUnit {
		RenderUnit::new(name, Node::element("div"), || Ok("".into()), &[name])
	}

	#[rstest]
	#[serial(scheduler)]
	fn test_register_overwrites_same_name() {
		reset();
		let first = unit("main");
		let second = unit("main");

		assert!(register(first.clone()).is_none());
		let replaced = register(second.clone()).unwrap();

		assert!(replaced.ptr_eq(&first));
		assert!(get("main").unwrap().ptr_eq(&second));
		assert_eq!(names(), vec!["main"]);
		reset();
		bus::reset();
	}

	#[rstest]
	#[serial(scheduler)]
	fn test_reset_drops_units() {
		reset();
		register(unit("a"));
		register(unit("b"));
		assert_eq!(names(), vec!["a", "b"]);

		reset();

		assert!(names().is_empty());
		assert!(get("a").is_none());
		bus::reset();
	}
}
