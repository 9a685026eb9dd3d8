use crate::value::TemplateResult;
use hashbrown::HashMap;
use std::{
	cell::RefCell,
	collections::hash_map::DefaultHasher,
	hash::{Hash, Hasher},
	rc::Rc,
};
use tracing::{trace, trace_span};
use wasm_bindgen::{throw_str, JsCast, UnwrapThrowExt};

/// The reserved placeholder token marking a dynamic position in authored markup.
pub const MARKER: &str = "{{}}";

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

pub(crate) fn svg_namespace() -> Option<&'static str> {
	Some(SVG_NAMESPACE)
}

/// The compiled-template cache.
///
/// Owns the [***Document***](https://developer.mozilla.org/en-US/docs/Web/API/Document)
/// handle all nodes are created from, plus one [`TemplateDefinition`] per
/// distinct segment list, keyed by segment hash. Definitions are immutable
/// once compiled and live until [`Templates::clear`].
pub struct Templates {
	document: web_sys::Document,
	definitions: RefCell<HashMap<u64, Rc<TemplateDefinition>>>,
}

impl Templates {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Rc<Self> {
		Rc::new(Self {
			document,
			definitions: RefCell::new(HashMap::new()),
		})
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	/// Evicts every cached definition. Instances materialized earlier keep
	/// their own definition handles and stay valid.
	pub fn clear(&self) {
		self.definitions.borrow_mut().clear();
	}

	/// The definition for `result`'s static shape, compiling it on first sight.
	#[must_use]
	pub fn definition(&self, result: &TemplateResult) -> Rc<TemplateDefinition> {
		let id = segment_hash(result.strings());
		if let Some(definition) = self.definitions.borrow().get(&id) {
			return Rc::clone(definition);
		}

		let definition = Rc::new(TemplateDefinition::compile(&self.document, id, result.strings()));
		self.definitions.borrow_mut().insert(id, Rc::clone(&definition));
		definition
	}
}

fn segment_hash(strings: &[String]) -> u64 {
	let mut hasher = DefaultHasher::new();
	strings.hash(&mut hasher);
	hasher.finish()
}

/// A path from a template fragment's root to one dynamic position: a child
/// index walk, optionally terminated by an attribute name.
#[derive(Clone, Debug)]
pub struct PartPath {
	pub(crate) indices: Vec<u32>,
	pub(crate) attribute: Option<String>,
	pub(crate) svg: bool,
}

impl PartPath {
	#[must_use]
	pub fn indices(&self) -> &[u32] {
		&self.indices
	}

	/// The terminating attribute name; [`None`] for a content position.
	#[must_use]
	pub fn attribute(&self) -> Option<&str> {
		self.attribute.as_deref()
	}

	#[must_use]
	pub fn is_svg(&self) -> bool {
		self.svg
	}

	/// Re-walks the recorded indices against a (cloned) fragment.
	///
	/// The result is the anchor comment for a content position, or the owning
	/// element for an attribute position. Paths are compiled against the
	/// definition's own fragment, so failure to resolve means the tree was
	/// mutated externally — not recoverable.
	pub(crate) fn resolve(&self, root: &web_sys::Node) -> web_sys::Node {
		let mut node = root.clone();
		for &index in &self.indices {
			node = node
				.child_nodes()
				.get(index)
				.expect_throw("xylem-dom: template path does not resolve");
		}
		node
	}
}

/// One compiled template shape: the marker-annotated fragment (inside a
/// [***template***](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/template)
/// element) and the ordered list of position paths.
pub struct TemplateDefinition {
	id: u64,
	template: web_sys::HtmlTemplateElement,
	paths: Vec<PartPath>,
}

impl TemplateDefinition {
	fn compile(document: &web_sys::Document, id: u64, strings: &[String]) -> Self {
		let span = trace_span!("Compiling template", id, segments = strings.len());
		let _enter = span.enter();

		let template: web_sys::HtmlTemplateElement = document
			.create_element("template")
			.unwrap_throw()
			.dyn_into()
			.unwrap_throw();
		template.set_inner_html(&strings.join(MARKER));

		let mut paths = Vec::with_capacity(strings.len() - 1);
		let fragment = template.content();
		compile_children(fragment.as_ref(), &mut Vec::new(), &mut paths, document);

		if paths.len() != strings.len() - 1 {
			// A marker landed somewhere the parser ate it (or split it apart).
			throw_str("xylem-dom: malformed placeholder; marker count does not match expression count");
		}

		trace!("Compiled {} position(s).", paths.len());
		Self { id, template, paths }
	}

	#[must_use]
	pub fn id(&self) -> u64 {
		self.id
	}

	pub(crate) fn fragment(&self) -> web_sys::DocumentFragment {
		self.template.content()
	}

	/// The compiled position paths, in expression order.
	#[must_use]
	pub fn paths(&self) -> &[PartPath] {
		&self.paths
	}
}

/// Depth-first walk recording dynamic positions in expression order.
///
/// `path` holds the child-index stack for `parent` itself; the trailing
/// component of each recorded path accounts for the siblings inserted by
/// earlier marker splits at the same level.
fn compile_children(parent: &web_sys::Node, path: &mut Vec<u32>, out: &mut Vec<PartPath>, document: &web_sys::Document) {
	let mut index: u32 = 0;
	let mut child = parent.first_child();
	while let Some(node) = child {
		// Captured up front; splitting below replaces `node` entirely.
		let next = node.next_sibling();

		if let Some(element) = node.dyn_ref::<web_sys::Element>() {
			let attributes = element.attributes();
			for position in 0..attributes.length() {
				let attribute = attributes.item(position).unwrap_throw();
				if attribute.value() == MARKER {
					let svg = svg_context(&node);
					trace!(index, name = %attribute.name(), svg, "Recording attribute position");
					out.push(PartPath {
						indices: appended(path, index),
						attribute: Some(attribute.name()),
						svg,
					});
				}
			}

			path.push(index);
			compile_children(&node, path, out, document);
			path.pop();
			index += 1;
		} else if let Some(text) = node.dyn_ref::<web_sys::Text>() {
			let data = text.data();
			if data.contains(MARKER) {
				index += split_text(text, &data, parent, path, index, out, document);
			} else {
				assert_well_formed(&data);
				index += 1;
			}
		} else {
			index += 1;
		}

		child = next;
	}
}

/// Splits one text node on the marker, re-inserting literal runs as text
/// nodes and each marker as an anchor comment, in original order. Returns the
/// number of nodes that replaced the original at this level.
fn split_text(
	text: &web_sys::Text,
	data: &str,
	parent: &web_sys::Node,
	path: &[u32],
	base: u32,
	out: &mut Vec<PartPath>,
	document: &web_sys::Document,
) -> u32 {
	let span = trace_span!("Splitting text", markers = data.matches(MARKER).count());
	let _enter = span.enter();

	let reference: &web_sys::Node = text.as_ref();
	let svg = svg_context(reference);
	let mut inserted: u32 = 0;

	for (position, segment) in data.split(MARKER).enumerate() {
		if position > 0 {
			let anchor = document.create_comment("");
			parent.insert_before(anchor.as_ref(), Some(reference)).unwrap_throw();
			out.push(PartPath {
				indices: appended(path, base + inserted),
				attribute: None,
				svg,
			});
			inserted += 1;
		}
		if !segment.is_empty() {
			assert_well_formed(segment);
			let run = document.create_text_node(segment);
			parent.insert_before(run.as_ref(), Some(reference)).unwrap_throw();
			inserted += 1;
		}
	}

	parent.remove_child(reference).unwrap_throw();
	inserted
}

fn assert_well_formed(segment: &str) {
	if segment.contains("{{") || segment.contains("}}") {
		throw_str("xylem-dom: unterminated placeholder in template text");
	}
}

fn appended(path: &[u32], index: u32) -> Vec<u32> {
	let mut indices = path.to_vec();
	indices.push(index);
	indices
}

/// Whether a position at `node` sits in SVG namespace context: an `svg`
/// ancestor applies it unless a closer `foreignObject` cancels it first.
fn svg_context(node: &web_sys::Node) -> bool {
	let mut current = node.parent_node();
	while let Some(ancestor) = current {
		if let Some(element) = ancestor.dyn_ref::<web_sys::Element>() {
			let name = element.local_name();
			if name.eq_ignore_ascii_case("foreignobject") {
				return false;
			}
			if name.eq_ignore_ascii_case("svg") {
				return true;
			}
		}
		current = ancestor.parent_node();
	}
	false
}
