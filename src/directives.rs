//! The built-in directives.
//!
//! A directive is an expression value that takes over rendering for its
//! position (see [`Directive`]); these two cover the common cases of custom
//! list keys and asynchronous content, and double as reference
//! implementations of the protocol.

use crate::{
	keyed::{self, Key},
	part::Part,
	value::{Directive, TemplateResult, Value},
};
use std::rc::Rc;

/// Keyed-list rendering with a caller-supplied key and item template.
///
/// Reorders reuse the existing instances instead of rebuilding them, so item
/// state (focus, media playback, part caches) survives moves.
pub fn repeat(
	items: Vec<Value>,
	key_of: impl Fn(&Value, usize) -> Key + 'static,
	template_of: impl Fn(&Value) -> TemplateResult + 'static,
) -> Value {
	Value::Directive(Rc::new(Repeat {
		items,
		key_of: Box::new(key_of),
		template_of: Box::new(template_of),
	}))
}

struct Repeat {
	items: Vec<Value>,
	key_of: Box<dyn Fn(&Value, usize) -> Key>,
	template_of: Box<dyn Fn(&Value) -> TemplateResult>,
}

impl Directive for Repeat {
	fn apply(&self, part: &Rc<Part>) {
		keyed::reconcile(part, self.items.clone(), self.key_of.as_ref(), self.template_of.as_ref());
	}
}

/// Renders `placeholder` synchronously, then the settled value of `deferred`
/// once it arrives. Success path only: a rejected promise leaves the
/// placeholder in place.
pub fn until(deferred: js_sys::Promise, placeholder: Value) -> Value {
	Value::Directive(Rc::new(Until { deferred, placeholder }))
}

struct Until {
	deferred: js_sys::Promise,
	placeholder: Value,
}

impl Directive for Until {
	fn apply(&self, part: &Rc<Part>) {
		part.update(self.placeholder.clone());
		part.update(Value::Deferred(self.deferred.clone()));
	}
}
