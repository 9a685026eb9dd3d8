use crate::part::Part;
use std::rc::Rc;
use wasm_bindgen::{throw_str, JsCast, JsValue};

/// One expression value, classified by runtime shape.
///
/// Each variant updates a [`Part`] differently: scalars become character data,
/// [`Value::Node`] splices the node in directly, [`Value::Template`] reconciles a nested
/// instance, [`Value::List`] runs the keyed reconciler, [`Value::Deferred`] re-applies
/// itself once settled and [`Value::Directive`] hands the position over entirely.
#[derive(Clone)]
pub enum Value {
	/// Nothing to render; removes an attribute, leaves an anchor comment at a content position.
	Null,
	Bool(bool),
	Text(String),
	/// A callable. Assigned as a live property at attribute positions, never stringified.
	Callable(js_sys::Function),
	/// A node (or [***DocumentFragment***](https://developer.mozilla.org/en-US/docs/Web/API/DocumentFragment)) adopted as-is.
	Node(web_sys::Node),
	Template(TemplateResult),
	List(Vec<Value>),
	Directive(Rc<dyn Directive>),
	/// A promise-like value; the position updates again when it settles.
	Deferred(js_sys::Promise),
}

impl Value {
	/// Classifies a settled JS value, so a deferred resolution re-enters the
	/// same dispatch as a directly supplied one.
	#[must_use]
	pub fn from_js(value: &JsValue) -> Self {
		if value.is_null() || value.is_undefined() {
			Value::Null
		} else if let Some(text) = value.as_string() {
			Value::Text(text)
		} else if let Some(flag) = value.as_bool() {
			Value::Bool(flag)
		} else if let Some(number) = value.as_f64() {
			Value::Text(fmt_number(number))
		} else if value.is_function() {
			Value::Callable(value.clone().unchecked_into())
		} else if value.has_type::<js_sys::Promise>() {
			Value::Deferred(value.clone().unchecked_into())
		} else if js_sys::Array::is_array(value) {
			Value::List(js_sys::Array::from(value).iter().map(|item| Value::from_js(&item)).collect())
		} else if let Some(node) = value.dyn_ref::<web_sys::Node>() {
			Value::Node(node.clone())
		} else if let Some(object) = value.dyn_ref::<js_sys::Object>() {
			Value::Text(String::from(object.to_string()))
		} else {
			throw_str("xylem-dom: settled value has no usable form")
		}
	}

	/// The string written by `setAttribute`, or [`None`] for the removal cases.
	///
	/// Values without a string form cannot appear at an attribute position.
	pub(crate) fn attribute_text(&self) -> Option<String> {
		match self {
			Value::Null | Value::Bool(false) => None,
			Value::Bool(true) => Some("true".to_owned()),
			Value::Text(text) => Some(text.clone()),
			Value::Callable(_) | Value::Node(_) | Value::Template(_) | Value::List(_) | Value::Directive(_) | Value::Deferred(_) => {
				throw_str("xylem-dom: value has no string form for an attribute position")
			}
		}
	}

	/// The raw JS form used for live-property assignment.
	pub(crate) fn property_value(&self) -> JsValue {
		match self {
			Value::Null => JsValue::NULL,
			Value::Bool(flag) => JsValue::from_bool(*flag),
			Value::Text(text) => JsValue::from_str(text),
			Value::Callable(function) => function.clone().into(),
			Value::Node(node) => node.clone().into(),
			Value::Template(_) | Value::List(_) | Value::Directive(_) | Value::Deferred(_) => {
				throw_str("xylem-dom: value has no property form")
			}
		}
	}

	/// The text rendered at a content position, for the scalar variants.
	pub(crate) fn content_text(&self) -> Option<String> {
		match self {
			Value::Text(text) => Some(text.clone()),
			Value::Bool(flag) => Some(if *flag { "true" } else { "false" }.to_owned()),
			_ => None,
		}
	}
}

impl core::fmt::Debug for Value {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self {
			Value::Null => f.write_str("Null"),
			Value::Bool(flag) => write!(f, "Bool({:?})", flag),
			Value::Text(text) => write!(f, "Text({:?})", text),
			Value::Callable(_) => f.write_str("Callable"),
			Value::Node(node) => write!(f, "Node({:?})", node.node_name()),
			Value::Template(result) => write!(f, "Template(values: {})", result.values.len()),
			Value::List(items) => write!(f, "List(len: {})", items.len()),
			Value::Directive(_) => f.write_str("Directive"),
			Value::Deferred(_) => f.write_str("Deferred"),
		}
	}
}

impl From<&str> for Value {
	fn from(text: &str) -> Self {
		Value::Text(text.to_owned())
	}
}
impl From<String> for Value {
	fn from(text: String) -> Self {
		Value::Text(text)
	}
}
impl From<bool> for Value {
	fn from(flag: bool) -> Self {
		Value::Bool(flag)
	}
}
impl From<i32> for Value {
	fn from(number: i32) -> Self {
		Value::Text(number.to_string())
	}
}
impl From<u32> for Value {
	fn from(number: u32) -> Self {
		Value::Text(number.to_string())
	}
}
impl From<i64> for Value {
	fn from(number: i64) -> Self {
		Value::Text(number.to_string())
	}
}
impl From<usize> for Value {
	fn from(number: usize) -> Self {
		Value::Text(number.to_string())
	}
}
impl From<f64> for Value {
	fn from(number: f64) -> Self {
		Value::Text(fmt_number(number))
	}
}
impl From<web_sys::Node> for Value {
	fn from(node: web_sys::Node) -> Self {
		Value::Node(node)
	}
}
impl From<js_sys::Function> for Value {
	fn from(function: js_sys::Function) -> Self {
		Value::Callable(function)
	}
}
impl From<js_sys::Promise> for Value {
	fn from(promise: js_sys::Promise) -> Self {
		Value::Deferred(promise)
	}
}
impl From<TemplateResult> for Value {
	fn from(result: TemplateResult) -> Self {
		Value::Template(result)
	}
}
impl From<Vec<Value>> for Value {
	fn from(items: Vec<Value>) -> Self {
		Value::List(items)
	}
}
impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(option: Option<T>) -> Self {
		option.map_or(Value::Null, Into::into)
	}
}

// JS number formatting: integral doubles print without a fraction.
fn fmt_number(number: f64) -> String {
	if number.is_infinite() {
		if number > 0.0 { "Infinity".to_owned() } else { "-Infinity".to_owned() }
	} else if number.fract() == 0.0 && number.abs() < 9_007_199_254_740_992.0 {
		#[allow(clippy::cast_possible_truncation)]
		format!("{}", number as i64)
	} else {
		format!("{}", number)
	}
}

/// The (static segments, expression values) pair one render call is made of.
///
/// Two results built from equal segment lists share one compiled
/// [`TemplateDefinition`](crate::template::TemplateDefinition) and are
/// structurally interchangeable: their instances can be diffed value-for-value.
#[derive(Clone, Debug)]
pub struct TemplateResult {
	strings: Rc<[String]>,
	pub(crate) values: Vec<Value>,
}

impl TemplateResult {
	/// # Panics (as a JS exception)
	///
	/// Iff `strings.len() != values.len() + 1` — every expression sits between
	/// two static segments, even empty ones.
	#[must_use]
	pub fn new(strings: &[&str], values: Vec<Value>) -> Self {
		if strings.len() != values.len() + 1 {
			throw_str("xylem-dom: a template takes exactly one more static segment than expression values");
		}
		Self {
			strings: strings.iter().map(|segment| (*segment).to_owned()).collect(),
			values,
		}
	}

	pub(crate) fn strings(&self) -> &[String] {
		&self.strings
	}

	#[must_use]
	pub fn values(&self) -> &[Value] {
		&self.values
	}
}

/// Shorthand for [`TemplateResult::new`].
#[must_use]
pub fn html(strings: &[&str], values: Vec<Value>) -> TemplateResult {
	TemplateResult::new(strings, values)
}

/// A value that takes over rendering for its position.
///
/// This is the engine's sole extension point: `apply` receives the live
/// [`Part`] and may call [`Part::update`] zero or more times, synchronously or
/// later (see [`crate::directives`] for the built-in implementations).
pub trait Directive {
	fn apply(&self, part: &Rc<Part>);
}
