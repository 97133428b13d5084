//! Attribute reconciliation between a proposed element and its live counterpart.

use crate::dom::Node;

/// Attributes that are present-or-absent rather than valued.
pub const BOOLEAN_ATTRIBUTES: &[&str] = &["checked", "selected", "required", "disabled", "readonly"];

/// Literal values that turn a boolean attribute off.
const FALSEY_LITERALS: &[&str] = &["false", "null", "undefined", "0", "-0", "NaN", "0n", "-0n"];

/// Returns `true` when `value` switches a boolean attribute off.
pub fn is_falsey(value: &str) -> bool {
	FALSEY_LITERALS.contains(&value.trim())
}

/// Brings the attributes of `live` in line with `proposed`.
///
/// Writes are skipped when the live element already holds the target value.
pub(crate) fn reconcile_attributes(proposed: &Node, live: &Node) {
	if !proposed.is_element() || !live.is_element() {
		return;
	}

	for (name, value) in proposed.attributes() {
		if BOOLEAN_ATTRIBUTES.contains(&name.as_str()) {
			if is_falsey(&value) {
				live.remove_attribute(&name);
			} else if live.attribute(&name).as_deref() != Some(name.as_str()) {
				live.set_attribute(&name, &name);
			}
		} else if name == "value" {
			if live.value() != value {
				live.set_value(&value);
			}
		} else if live.attribute(&name).as_deref() != Some(value.as_str()) {
			live.set_attribute(&name, &value);
		}
	}

	for name in live.attribute_names() {
		if proposed.has_attribute(&name) {
			continue;
		}
		if name == "value" {
			if !live.value().is_empty() {
				live.set_value("");
			}
		} else {
			live.remove_attribute(&name);
		}
	}
}
