use crate::{
	instance::TemplateInstance,
	keyed::{self, ListState},
	region::{Bound, EdgeRegion},
	template::{svg_namespace, PartPath, Templates},
	value::{TemplateResult, Value},
};
use std::{
	cell::RefCell,
	rc::{Rc, Weak},
};
use tracing::{error, trace, trace_span};
use wasm_bindgen::{closure::Closure, throw_str, JsCast, JsValue, UnwrapThrowExt};

const EMPTY_REGION: &str = "xylem-dom: part region is empty";
const NO_PARENT: &str = "xylem-dom: part region has no parent node";

/// What a part last rendered; the delta against the incoming value decides
/// how little work an update can get away with.
pub(crate) enum Current {
	/// Nothing rendered yet: the compile-time anchor (content) or the
	/// untouched authored attribute.
	Unset,
	/// An anchor comment standing in for a null value.
	Empty,
	Text(String),
	Node(web_sys::Node),
	Instance(Rc<TemplateInstance>),
	List(ListState),
	/// Last written attribute string; [`None`] after removal.
	Attribute(Option<String>),
}

/// The live binding at one dynamic position.
///
/// A part owns the [`EdgeRegion`] spanning whatever it currently renders and
/// re-renders only what changed when a new value arrives, dispatching on the
/// value's runtime shape.
pub struct Part {
	weak: Weak<Part>,
	templates: Rc<Templates>,
	node: web_sys::Node,
	attribute: Option<String>,
	svg: bool,
	region: Rc<RefCell<EdgeRegion>>,
	current: RefCell<Current>,
	/// Deferred-value continuations; kept alive exactly as long as the part.
	pending: RefCell<Vec<Closure<dyn FnMut(JsValue)>>>,
	disposers: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Part {
	pub(crate) fn new(templates: &Rc<Templates>, node: web_sys::Node, path: &PartPath) -> Rc<Self> {
		Rc::new_cyclic(|weak| Self {
			weak: weak.clone(),
			templates: Rc::clone(templates),
			region: Rc::new(RefCell::new(EdgeRegion::around(&node))),
			node,
			attribute: path.attribute.clone(),
			svg: path.svg,
			current: RefCell::new(Current::Unset),
			pending: RefCell::new(Vec::new()),
			disposers: RefCell::new(Vec::new()),
		})
	}

	pub(crate) fn is_content(&self) -> bool {
		self.attribute.is_none()
	}

	pub(crate) fn anchor(&self) -> &web_sys::Node {
		&self.node
	}

	#[must_use]
	pub fn region(&self) -> Rc<RefCell<EdgeRegion>> {
		Rc::clone(&self.region)
	}

	pub(crate) fn templates(&self) -> &Rc<Templates> {
		&self.templates
	}

	pub(crate) fn take_current(&self) -> Current {
		self.current.replace(Current::Unset)
	}

	pub(crate) fn set_current(&self, current: Current) {
		self.current.replace(current);
	}

	fn rc(&self) -> Rc<Part> {
		self.weak.upgrade().expect_throw("xylem-dom: part outlived its allocation")
	}

	/// Registers a callback fired once when the owning instance is discarded.
	pub fn on_dispose(&self, disposer: impl FnOnce() + 'static) {
		self.disposers.borrow_mut().push(Box::new(disposer));
	}

	/// Applies `value` to this position, re-rendering only what changed.
	///
	/// Deferred values re-apply themselves when they settle, with no
	/// cancellation: the last resolution wins, even one that is logically
	/// stale by then.
	pub fn update(&self, value: Value) {
		let span = trace_span!("Updating part", value = ?value, attribute = ?self.attribute);
		let _enter = span.enter();

		match value {
			Value::Directive(directive) => directive.apply(&self.rc()),
			Value::Deferred(promise) => self.defer(&promise),
			other if self.attribute.is_some() => self.update_attribute(&other),
			Value::List(items) => keyed::reconcile_positional(self, items),
			Value::Template(result) => self.update_template(&result),
			other => self.update_content(&other),
		}
	}

	fn defer(&self, promise: &js_sys::Promise) {
		trace!("Deferring until the value settles.");
		let weak = self.weak.clone();
		let continuation = Closure::wrap(Box::new(move |settled: JsValue| {
			if let Some(part) = weak.upgrade() {
				part.update(Value::from_js(&settled));
			}
		}) as Box<dyn FnMut(JsValue)>);
		let _retained = promise.then(&continuation);
		self.pending.borrow_mut().push(continuation);
	}

	fn update_attribute(&self, value: &Value) {
		let element = self
			.node
			.dyn_ref::<web_sys::Element>()
			.expect_throw("xylem-dom: attribute position is not on an element");
		let name = self.attribute.as_deref().unwrap_throw();
		let span = trace_span!("Updating attribute", name, svg = self.svg);
		let _enter = span.enter();

		if let Current::Attribute(previous) = &*self.current.borrow() {
			if let Value::Text(text) = value {
				if previous.as_deref() == Some(text) {
					trace!("Unchanged attribute value.");
					return;
				}
			}
		}

		let target: &JsValue = element.as_ref();
		let key = JsValue::from_str(name);
		let callable = matches!(value, Value::Callable(_));
		let live_property = js_sys::Reflect::has(target, &key).unwrap_or(false);

		if (name.starts_with("on") && callable) || (live_property && !self.svg) {
			// Some live properties are read-only; the attribute fallback below still runs.
			if js_sys::Reflect::set(target, &key, &value.property_value()).is_err() {
				trace!("Rejected property assignment.");
			}
		}
		if callable {
			self.current.replace(Current::Attribute(None));
			return;
		}

		match value.attribute_text() {
			None => {
				let removal = if self.svg {
					element.remove_attribute_ns(svg_namespace(), name)
				} else {
					element.remove_attribute(name)
				};
				if let Err(error) = removal {
					error!("Failed to remove attribute {:?}: {:?}", name, error);
				}
				self.current.replace(Current::Attribute(None));
			}
			Some(text) => {
				let assignment = if self.svg {
					element.set_attribute_ns(svg_namespace(), name, &text)
				} else {
					element.set_attribute(name, &text)
				};
				if let Err(error) = assignment {
					error!("Failed to set attribute {:?}: {:?}", name, error);
				}
				self.current.replace(Current::Attribute(Some(text)));
			}
		}
	}

	fn update_content(&self, value: &Value) {
		match value {
			Value::Null => self.render_empty(),
			Value::Node(node) => self.render_node(node),
			Value::Callable(_) => throw_str("xylem-dom: a callable has no renderable form at a content position"),
			other => {
				let text = other.content_text().unwrap_throw();
				self.render_text(text);
			}
		}
	}

	fn render_empty(&self) {
		if matches!(&*self.current.borrow(), Current::Empty) {
			return;
		}
		// The compile-time anchor is already exactly an empty placeholder.
		if matches!(&*self.current.borrow(), Current::Unset) {
			trace!("Keeping the compiled anchor for a null value.");
			self.current.replace(Current::Empty);
			return;
		}
		let anchor: web_sys::Node = self.templates.document().create_comment("").into();
		self.replace_span(std::slice::from_ref(&anchor));
		self.retire(self.current.replace(Current::Empty));
	}

	fn render_text(&self, text: String) {
		let is_text = matches!(&*self.current.borrow(), Current::Text(_));
		if is_text {
			if let Current::Text(previous) = &*self.current.borrow() {
				if *previous == text {
					trace!("Unchanged text.");
					return;
				}
			}
			// A lone text node is rewritten in place instead of being replaced.
			let node = self.region.borrow().first_node().expect_throw(EMPTY_REGION);
			node.dyn_ref::<web_sys::Text>()
				.expect_throw("xylem-dom: text region lost its text node")
				.set_data(&text);
			self.current.replace(Current::Text(text));
			return;
		}

		let node: web_sys::Node = self.templates.document().create_text_node(&text).into();
		self.replace_span(std::slice::from_ref(&node));
		self.retire(self.current.replace(Current::Text(text)));
	}

	fn render_node(&self, node: &web_sys::Node) {
		if let Current::Node(previous) = &*self.current.borrow() {
			if previous.is_same_node(Some(node)) {
				trace!("Unchanged node value.");
				return;
			}
		}

		if node.node_type() == web_sys::Node::DOCUMENT_FRAGMENT_NODE {
			match (node.first_child(), node.last_child()) {
				(Some(first), Some(last)) => {
					self.insert_replacing(node, &first, &last);
					self.retire(self.current.replace(Current::Node(node.clone())));
				}
				// An already-drained fragment renders like a null value.
				_ => self.render_empty(),
			}
		} else {
			self.replace_span(std::slice::from_ref(node));
			self.retire(self.current.replace(Current::Node(node.clone())));
		}
	}

	fn update_template(&self, result: &TemplateResult) {
		let definition = self.templates.definition(result);
		let reusable = match &*self.current.borrow() {
			Current::Instance(instance) if instance.template_id() == definition.id() => Some(Rc::clone(instance)),
			_ => None,
		};
		if let Some(instance) = reusable {
			trace!("Updating nested instance in place.");
			instance.update(result.values().to_vec());
			return;
		}

		let span = trace_span!("Mounting nested template", id = definition.id());
		let _enter = span.enter();

		let instance = TemplateInstance::new(definition);
		let fragment = instance.materialize(&self.templates);
		instance.update(result.values().to_vec());

		// Insert ahead of the old content, then retire it; the bounds defer
		// to the instance's own region from here on.
		let old = self.region.borrow().nodes();
		let old_first = old.first().expect_throw(EMPTY_REGION);
		let parent = old_first.parent_node().expect_throw(NO_PARENT);
		if let Err(error) = parent.insert_before(fragment.as_ref(), Some(old_first)) {
			error!("Failed to insert nested template: {:?}", error);
		}
		remove_all(&parent, &old);

		let bound = Bound::Region(instance.region());
		self.region.borrow_mut().set(bound.clone(), bound);
		self.retire(self.current.replace(Current::Instance(instance)));
	}

	/// Replaces the region's span with `nodes` (non-empty), adopting them as
	/// the new bounds.
	fn replace_span(&self, nodes: &[web_sys::Node]) {
		let old = self.region.borrow().nodes();
		let first = old.first().expect_throw(EMPTY_REGION);
		let parent = first.parent_node().expect_throw(NO_PARENT);
		let after = old.last().unwrap_throw().next_sibling();

		for node in nodes {
			if let Err(error) = parent.insert_before(node, after.as_ref()) {
				error!("Failed to insert node: {:?}", error);
			}
		}
		remove_all(&parent, &old);

		self.region.borrow_mut().set(
			Bound::Node(nodes.first().unwrap_throw().clone()),
			Bound::Node(nodes.last().unwrap_throw().clone()),
		);
	}

	/// Inserts `inserted` (typically a fragment) ahead of the current span,
	/// retires the span, and adopts `[first_new, last_new]` as the bounds.
	fn insert_replacing(&self, inserted: &web_sys::Node, first_new: &web_sys::Node, last_new: &web_sys::Node) {
		let old = self.region.borrow().nodes();
		let first = old.first().expect_throw(EMPTY_REGION);
		let parent = first.parent_node().expect_throw(NO_PARENT);

		if let Err(error) = parent.insert_before(inserted, Some(first)) {
			error!("Failed to insert content: {:?}", error);
		}
		remove_all(&parent, &old);

		self.region
			.borrow_mut()
			.set(Bound::Node(first_new.clone()), Bound::Node(last_new.clone()));
	}

	/// Releases whatever the previous value had mounted.
	pub(crate) fn retire(&self, previous: Current) {
		match previous {
			Current::Instance(instance) => instance.dispose(),
			Current::List(state) => state.dispose(),
			_ => (),
		}
	}

	pub(crate) fn dispose(&self) {
		for disposer in self.disposers.borrow_mut().drain(..) {
			disposer();
		}
		self.pending.borrow_mut().clear();
		self.retire(self.current.replace(Current::Unset));
	}
}

impl core::fmt::Debug for Part {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Part")
			.field("attribute", &self.attribute)
			.field("svg", &self.svg)
			.finish()
	}
}

fn remove_all(parent: &web_sys::Node, nodes: &[web_sys::Node]) {
	for node in nodes {
		if let Err(error) = parent.remove_child(node) {
			error!("Failed to remove node: {:?}", error);
		}
	}
}
