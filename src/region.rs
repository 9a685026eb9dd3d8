use std::{cell::RefCell, rc::Rc};
use tracing::error;
use wasm_bindgen::UnwrapThrowExt;

/// One end of an [`EdgeRegion`]: either a concrete node, or another region to
/// defer to (a nested instance's region, which keeps moving as that instance
/// rewrites its own content).
#[derive(Clone)]
pub enum Bound {
	Node(web_sys::Node),
	Region(Rc<RefCell<EdgeRegion>>),
}

impl Bound {
	fn first(&self) -> Option<web_sys::Node> {
		match self {
			Bound::Node(node) => Some(node.clone()),
			Bound::Region(region) => region.borrow().first_node(),
		}
	}

	fn last(&self) -> Option<web_sys::Node> {
		match self {
			Bound::Node(node) => Some(node.clone()),
			Bound::Region(region) => region.borrow().last_node(),
		}
	}
}

/// Tracks the first and last physical node currently representing one logical
/// region of the tree.
///
/// The span `[first, last]` is always a contiguous sibling run in document
/// order; both ends resolve through nested regions recursively. An empty
/// region resolves to no nodes at all and only occurs before materialization.
pub struct EdgeRegion {
	start: Option<Bound>,
	end: Option<Bound>,
}

impl EdgeRegion {
	#[must_use]
	pub fn empty() -> Self {
		Self { start: None, end: None }
	}

	/// A region spanning exactly one node.
	#[must_use]
	pub fn around(node: &web_sys::Node) -> Self {
		Self {
			start: Some(Bound::Node(node.clone())),
			end: Some(Bound::Node(node.clone())),
		}
	}

	pub fn set(&mut self, start: Bound, end: Bound) {
		self.start = Some(start);
		self.end = Some(end);
	}

	#[must_use]
	pub fn first_node(&self) -> Option<web_sys::Node> {
		self.start.as_ref().and_then(Bound::first)
	}

	#[must_use]
	pub fn last_node(&self) -> Option<web_sys::Node> {
		self.end.as_ref().and_then(Bound::last)
	}

	/// The inclusive sibling run `[first, last]`, collected up front so the
	/// caller can mutate the tree without invalidating its own iteration.
	#[must_use]
	pub fn nodes(&self) -> Vec<web_sys::Node> {
		let first = match self.first_node() {
			Some(first) => first,
			None => return Vec::new(),
		};
		let last = self.last_node().unwrap_throw();

		let mut nodes = vec![first.clone()];
		let mut current = first;
		while !current.is_same_node(Some(&last)) {
			current = current
				.next_sibling()
				.expect_throw("xylem-dom: region end is not a following sibling of its start");
			nodes.push(current.clone());
		}
		nodes
	}

	/// Atomically detaches the whole span into a portable fragment, preserving
	/// document order.
	#[must_use]
	pub fn detach(&self, document: &web_sys::Document) -> web_sys::DocumentFragment {
		let fragment = document.create_document_fragment();
		for node in self.nodes() {
			if let Err(error) = fragment.append_child(&node) {
				error!("Failed to detach node into fragment: {:?}", error);
			}
		}
		fragment
	}

	/// Removes the whole span from its parent without keeping it.
	pub fn clear(&self) {
		for node in self.nodes() {
			match node.parent_node() {
				Some(parent) => {
					if let Err(error) = parent.remove_child(&node) {
						error!("Failed to remove node: {:?}", error);
					}
				}
				None => error!("Could not find parent node of node to remove. Ignoring."),
			}
		}
	}
}
