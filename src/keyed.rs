use crate::{
	instance::TemplateInstance,
	part::{Current, Part},
	region::Bound,
	value::{TemplateResult, Value},
};
use hashbrown::{HashMap, HashSet};
use std::rc::Rc;
use tracing::{error, trace, trace_span};
use wasm_bindgen::UnwrapThrowExt;

/// Identifies one rendered item across renders of the same list position.
///
/// Key uniqueness within one render is required; a duplicate key leaves the
/// resulting order and instance identity unspecified.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
	Index(usize),
	Int(i64),
	Text(String),
}

/// The per-part cache the diff runs against: current key order plus the
/// instance each key rendered last time.
pub(crate) struct ListState {
	keys: Vec<Key>,
	instances: HashMap<Key, Rc<TemplateInstance>>,
}

impl ListState {
	pub(crate) fn dispose(&self) {
		for instance in self.instances.values() {
			instance.dispose();
		}
	}
}

/// Array values use positional keys and pass template items through as-is;
/// anything else is wrapped in the shared single-expression template.
pub(crate) fn reconcile_positional(part: &Part, items: Vec<Value>) {
	reconcile(part, items, &|_, index| Key::Index(index), &default_template);
}

fn default_template(item: &Value) -> TemplateResult {
	match item {
		Value::Template(result) => result.clone(),
		other => TemplateResult::new(&["", ""], vec![other.clone()]),
	}
}

/// Maps the previous keyed sequence of instances onto the requested one with
/// minimal moves, creations and removals. The final document order is exactly
/// the order of `items`.
pub(crate) fn reconcile(
	part: &Part,
	items: Vec<Value>,
	key_of: &dyn Fn(&Value, usize) -> Key,
	template_of: &dyn Fn(&Value) -> TemplateResult,
) {
	let span = trace_span!("Reconciling keyed list", items = items.len());
	let _enter = span.enter();

	let document = part.templates().document().clone();

	let mut new_keys = Vec::with_capacity(items.len());
	let mut results = Vec::with_capacity(items.len());
	for (index, item) in items.iter().enumerate() {
		new_keys.push(key_of(item, index));
		results.push(template_of(item));
	}
	{
		let mut seen = HashSet::with_capacity(new_keys.len());
		for key in &new_keys {
			if !seen.insert(key) {
				error!("Duplicate list key {:?}; resulting order and identity are unspecified.", key);
				debug_assert!(false, "duplicate list key");
			}
		}
	}

	let state = match part.take_current() {
		Current::List(state) => diff(part, &document, state, &new_keys, &results),
		other => {
			let state = rebuild(part, &document, &new_keys, &results);
			part.retire(other);
			state
		}
	};
	part.set_current(Current::List(state));
}

/// First run (or a type change into a list): no diffing, just bulk-build all
/// instances in order, replacing whatever the position held.
fn rebuild(part: &Part, document: &web_sys::Document, new_keys: &[Key], results: &[TemplateResult]) -> ListState {
	let span = trace_span!("Building list", len = new_keys.len());
	let _enter = span.enter();

	let templates = part.templates();
	let region = part.region();
	let old = region.borrow().nodes();
	let first = old.first().expect_throw("xylem-dom: list region is empty");
	let parent = first.parent_node().expect_throw("xylem-dom: list region has no parent node");
	let tail = old.last().unwrap_throw().next_sibling();

	let mut instances = HashMap::with_capacity(new_keys.len());
	let mut order = Vec::with_capacity(new_keys.len());
	for (key, result) in new_keys.iter().zip(results) {
		let instance = TemplateInstance::new(templates.definition(result));
		let fragment = instance.materialize(templates);
		instance.update(result.values().to_vec());
		if let Err(error) = parent.insert_before(fragment.as_ref(), tail.as_ref()) {
			error!("Failed to insert list item: {:?}", error);
		}
		instances.insert(key.clone(), Rc::clone(&instance));
		order.push(instance);
	}

	for node in &old {
		if let Err(error) = parent.remove_child(node) {
			error!("Failed to remove node: {:?}", error);
		}
	}

	if order.is_empty() {
		let anchor: web_sys::Node = document.create_comment("").into();
		if let Err(error) = parent.insert_before(&anchor, tail.as_ref()) {
			error!("Failed to insert list placeholder: {:?}", error);
		}
		region.borrow_mut().set(Bound::Node(anchor.clone()), Bound::Node(anchor));
	} else {
		region.borrow_mut().set(
			Bound::Region(order.first().unwrap_throw().region()),
			Bound::Region(order.last().unwrap_throw().region()),
		);
	}

	ListState {
		keys: new_keys.to_vec(),
		instances,
	}
}

fn diff(part: &Part, document: &web_sys::Document, mut state: ListState, new_keys: &[Key], results: &[TemplateResult]) -> ListState {
	let span = trace_span!("Diffing keyed list", old = state.keys.len(), new = new_keys.len());
	let _enter = span.enter();

	let templates = part.templates();
	let region = part.region();

	let first = region.borrow().first_node().expect_throw("xylem-dom: list region is empty");
	let last = region.borrow().last_node().unwrap_throw();
	let parent = first.parent_node().expect_throw("xylem-dom: list region has no parent node");
	// The first node past the whole region; unaffected by any removal inside it.
	let tail = last.next_sibling();

	// An empty cache means the region is the placeholder anchor.
	let placeholder = if state.keys.is_empty() { Some(first) } else { None };

	// Removal pass: drop every key the new render no longer wants.
	let keep: HashSet<&Key> = new_keys.iter().collect();
	let mut removed = 0_usize;
	let instances = &mut state.instances;
	state.keys.retain(|key| {
		if keep.contains(key) {
			true
		} else {
			if let Some(instance) = instances.remove(key) {
				instance.region().borrow().clear();
				instance.dispose();
			}
			removed += 1;
			false
		}
	});
	if removed > 0 {
		trace!("Removed {} instance(s).", removed);
	}

	if new_keys.is_empty() {
		if placeholder.is_none() {
			let anchor: web_sys::Node = document.create_comment("").into();
			if let Err(error) = parent.insert_before(&anchor, tail.as_ref()) {
				error!("Failed to insert list placeholder: {:?}", error);
			}
			region.borrow_mut().set(Bound::Node(anchor.clone()), Bound::Node(anchor));
		}
		return state;
	}

	for (index, key) in new_keys.iter().enumerate() {
		let result = &results[index];
		let definition = templates.definition(result);

		if state.keys.get(index) == Some(key) {
			// Same key at the same position: in-place update, or a swap if
			// the template shape itself changed.
			let instance = Rc::clone(state.instances.get(key).unwrap_throw());
			if instance.template_id() == definition.id() {
				instance.update(result.values().to_vec());
			} else {
				let fresh = TemplateInstance::new(definition);
				let fragment = fresh.materialize(templates);
				fresh.update(result.values().to_vec());
				let before = instance.first_node();
				if let Err(error) = parent.insert_before(fragment.as_ref(), Some(&before)) {
					error!("Failed to insert list item: {:?}", error);
				}
				instance.region().borrow().clear();
				instance.dispose();
				state.instances.insert(key.clone(), fresh);
			}
		} else if state.instances.contains_key(key) {
			// The key still exists later in the old order: move, never
			// remove-and-recreate, so the instance keeps its identity.
			let source = state
				.keys
				.iter()
				.position(|existing| existing == key)
				.expect_throw("xylem-dom: keyed cache lost an instance");
			let instance = Rc::clone(state.instances.get(key).unwrap_throw());
			let before = occupant(&state, index, &tail);

			if instance.template_id() == definition.id() {
				let fragment = instance.region().borrow().detach(document);
				instance.update(result.values().to_vec());
				if let Err(error) = parent.insert_before(fragment.as_ref(), before.as_ref()) {
					error!("Failed to move list item: {:?}", error);
				}
			} else {
				instance.region().borrow().clear();
				instance.dispose();
				let fresh = TemplateInstance::new(definition);
				let fragment = fresh.materialize(templates);
				fresh.update(result.values().to_vec());
				if let Err(error) = parent.insert_before(fragment.as_ref(), before.as_ref()) {
					error!("Failed to insert list item: {:?}", error);
				}
				state.instances.insert(key.clone(), fresh);
			}
			state.keys.remove(source);
			state.keys.insert(index, key.clone());
		} else {
			// Brand-new key: insert at its position, never append blindly.
			let before = occupant(&state, index, &tail);
			let fresh = TemplateInstance::new(definition);
			let fragment = fresh.materialize(templates);
			fresh.update(result.values().to_vec());
			if let Err(error) = parent.insert_before(fragment.as_ref(), before.as_ref()) {
				error!("Failed to insert list item: {:?}", error);
			}
			state.instances.insert(key.clone(), Rc::clone(&fresh));
			state.keys.insert(index, key.clone());
		}
	}

	if let Some(anchor) = placeholder {
		if let Err(error) = parent.remove_child(&anchor) {
			error!("Failed to remove list placeholder: {:?}", error);
		}
	}

	debug_assert_eq!(state.keys.as_slice(), new_keys);

	let first_instance = state.instances.get(&state.keys[0]).unwrap_throw();
	let last_instance = state.instances.get(state.keys.last().unwrap_throw()).unwrap_throw();
	region.borrow_mut().set(
		Bound::Region(first_instance.region()),
		Bound::Region(last_instance.region()),
	);
	state
}

/// The first node of whatever currently occupies position `index`, or the
/// node just past the region when inserting at the end.
fn occupant(state: &ListState, index: usize, tail: &Option<web_sys::Node>) -> Option<web_sys::Node> {
	match state.keys.get(index) {
		Some(key) => Some(state.instances.get(key).unwrap_throw().first_node()),
		None => tail.clone(),
	}
}
