use crate::{instance::TemplateInstance, template::Templates, value::TemplateResult};
use hashbrown::HashMap;
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};
use tracing::{error, trace, trace_span};
use wasm_bindgen::JsValue;

/// The property name carrying a mounted container's back-reference. The DOM
/// side only ever sees an opaque number; the instance itself lives in the
/// renderer's root registry.
const MOUNT_KEY: &str = "__xylemRoot";

/// The attach point: renders template results into container elements and
/// finds the previous instance again on the next call, updating it in place
/// whenever the template shape is unchanged.
pub struct Renderer {
	templates: Rc<Templates>,
	roots: RefCell<HashMap<u32, Rc<TemplateInstance>>>,
	next_root: Cell<u32>,
}

impl Renderer {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self::with_templates(Templates::new(document))
	}

	/// Shares an existing template cache, e.g. across several renderers.
	#[must_use]
	pub fn with_templates(templates: Rc<Templates>) -> Self {
		Self {
			templates,
			roots: RefCell::new(HashMap::new()),
			next_root: Cell::new(1),
		}
	}

	#[must_use]
	pub fn templates(&self) -> &Rc<Templates> {
		&self.templates
	}

	pub fn render(&self, view: TemplateResult, container: &web_sys::Element) {
		let span = trace_span!("Rendering", container = %container.tag_name());
		let _enter = span.enter();

		let definition = self.templates.definition(&view);

		if let Some(id) = mounted_id(container) {
			let mounted = self.roots.borrow().get(&id).cloned();
			if let Some(instance) = mounted {
				if instance.template_id() == definition.id() {
					trace!("Updating the mounted instance in place.");
					instance.update(view.values);
					return;
				}
				trace!("Template shape changed; replacing the mounted instance.");
				instance.dispose();
				instance.region().borrow().clear();
				self.roots.borrow_mut().remove(&id);
			}
		}

		// Fresh mount: the engine owns the container's child list.
		while let Some(child) = container.first_child() {
			if let Err(error) = container.remove_child(&child) {
				error!("Failed to clear container: {:?}", error);
				break;
			}
		}

		let instance = TemplateInstance::new(definition);
		let fragment = instance.materialize(&self.templates);
		instance.update(view.values);
		if let Err(error) = container.append_child(fragment.as_ref()) {
			error!("Failed to mount instance: {:?}", error);
		}

		let id = self.next_root.replace(self.next_root.get() + 1);
		self.roots.borrow_mut().insert(id, instance);
		tag(container, id);
	}

	/// Tears the mounted instance down: disposers fire, its span is removed
	/// and the container forgets its back-reference.
	pub fn unmount(&self, container: &web_sys::Element) {
		if let Some(id) = mounted_id(container) {
			if let Some(instance) = self.roots.borrow_mut().remove(&id) {
				instance.dispose();
				instance.region().borrow().clear();
			}
			untag(container);
		}
	}
}

fn mounted_id(container: &web_sys::Element) -> Option<u32> {
	let target: &JsValue = container.as_ref();
	js_sys::Reflect::get(target, &JsValue::from_str(MOUNT_KEY))
		.ok()
		.and_then(|value| value.as_f64())
		.map(|id| id as u32)
}

fn tag(container: &web_sys::Element, id: u32) {
	let target: &JsValue = container.as_ref();
	if js_sys::Reflect::set(target, &JsValue::from_str(MOUNT_KEY), &JsValue::from_f64(f64::from(id))).is_err() {
		error!("Failed to tag container with its mount id.");
	}
}

fn untag(container: &web_sys::Element) {
	let target: &js_sys::Object = container.as_ref();
	if js_sys::Reflect::delete_property(target, &JsValue::from_str(MOUNT_KEY)).is_err() {
		error!("Failed to remove the container's mount tag.");
	}
}
