use crate::{
	part::Part,
	region::{Bound, EdgeRegion},
	template::{TemplateDefinition, Templates},
	value::Value,
};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};
use tracing::trace_span;
use wasm_bindgen::{throw_str, JsCast, UnwrapThrowExt};

/// A live pairing of one compiled template with concrete expression values.
///
/// The physical fragment is materialized from the cached definition exactly
/// once; afterwards every update only forwards value `i` to part `i`. Two
/// instances with the same definition id are structurally interchangeable.
pub struct TemplateInstance {
	definition: Rc<TemplateDefinition>,
	parts: RefCell<Vec<Rc<Part>>>,
	values: RefCell<Vec<Value>>,
	region: Rc<RefCell<EdgeRegion>>,
	materialized: Cell<bool>,
}

impl TemplateInstance {
	#[must_use]
	pub fn new(definition: Rc<TemplateDefinition>) -> Rc<Self> {
		Rc::new(Self {
			definition,
			parts: RefCell::new(Vec::new()),
			values: RefCell::new(Vec::new()),
			region: Rc::new(RefCell::new(EdgeRegion::empty())),
			materialized: Cell::new(false),
		})
	}

	#[must_use]
	pub fn template_id(&self) -> u64 {
		self.definition.id()
	}

	#[must_use]
	pub fn region(&self) -> Rc<RefCell<EdgeRegion>> {
		Rc::clone(&self.region)
	}

	/// The first physical node currently representing this instance.
	#[must_use]
	pub fn first_node(&self) -> web_sys::Node {
		self.region
			.borrow()
			.first_node()
			.expect_throw("xylem-dom: instance region is empty")
	}

	#[must_use]
	pub fn values(&self) -> Vec<Value> {
		self.values.borrow().clone()
	}

	/// Clones the definition's fragment, resolves every compiled path into a
	/// live [`Part`] and adopts the clone's first/last nodes as this
	/// instance's region. Where an edge node is itself a part's anchor, the
	/// bound delegates to that part's region so it keeps tracking whatever
	/// the part renders there later.
	///
	/// The returned fragment still has to be inserted by the caller.
	pub fn materialize(&self, templates: &Rc<Templates>) -> web_sys::DocumentFragment {
		if self.materialized.get() {
			throw_str("xylem-dom: template instance materialized twice");
		}
		let span = trace_span!("Materializing instance", id = self.definition.id());
		let _enter = span.enter();

		let fragment: web_sys::DocumentFragment = self
			.definition
			.fragment()
			.clone_node_with_deep(true)
			.unwrap_throw()
			.dyn_into()
			.unwrap_throw();

		// A childless template would leave the region boundary-less.
		if fragment.first_child().is_none() {
			let anchor = templates.document().create_comment("");
			fragment.append_child(anchor.as_ref()).unwrap_throw();
		}

		let root: &web_sys::Node = fragment.as_ref();
		let parts: Vec<Rc<Part>> = self
			.definition
			.paths()
			.iter()
			.map(|path| Part::new(templates, path.resolve(root), path))
			.collect();

		let first = root.first_child().unwrap_throw();
		let last = root.last_child().unwrap_throw();
		let start = edge_bound(&first, &parts);
		let end = edge_bound(&last, &parts);
		self.region.borrow_mut().set(start, end);

		self.parts.replace(parts);
		self.materialized.set(true);
		fragment
	}

	/// Replaces the expression values wholesale, propagating value `i` to
	/// part `i`. Each part decides on its own whether anything changed.
	pub fn update(&self, values: Vec<Value>) {
		let span = trace_span!("Updating instance", id = self.definition.id(), values = values.len());
		let _enter = span.enter();

		if !self.materialized.get() {
			throw_str("xylem-dom: template instance updated before materialization");
		}
		let parts: Vec<Rc<Part>> = self.parts.borrow().iter().cloned().collect();
		if parts.len() != values.len() {
			throw_str("xylem-dom: expression value count does not match template positions");
		}

		for (part, value) in parts.iter().zip(values.iter().cloned()) {
			part.update(value);
		}
		self.values.replace(values);
	}

	/// Fires disposers depth-first, nested instances included. The caller is
	/// responsible for detaching the region's nodes.
	pub fn dispose(&self) {
		for part in self.parts.borrow().iter() {
			part.dispose();
		}
	}
}

fn edge_bound(node: &web_sys::Node, parts: &[Rc<Part>]) -> Bound {
	for part in parts {
		if part.is_content() && part.anchor().is_same_node(Some(node)) {
			return Bound::Region(part.region());
		}
	}
	Bound::Node(node.clone())
}
