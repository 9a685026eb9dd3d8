use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::window;
use xylem_dom::{html, Renderer, Value};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

fn test_frame() -> (Renderer, web_sys::Element) {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}

	let document = window().unwrap().document().unwrap();
	let container = document.create_element("div").unwrap();
	document.body().unwrap().append_child(container.as_ref()).unwrap();
	(Renderer::new(document), container)
}

#[wasm_bindgen_test]
fn mounts_and_updates_in_place() {
	let (renderer, container) = test_frame();
	let view = |name: &str| html(&["<h1>Hello ", "!</h1>"], vec![Value::from(name)]);

	renderer.render(view("world"), &container);
	assert_eq!(container.text_content().unwrap(), "Hello world!");
	let heading = container.first_child().unwrap();

	renderer.render(view("again"), &container);
	assert_eq!(container.text_content().unwrap(), "Hello again!");
	// Same template shape: the mounted element is reused, not remounted.
	assert!(heading.is_same_node(container.first_child().as_ref()));

	container.remove();
}

#[wasm_bindgen_test]
fn identical_rerender_touches_nothing() {
	let (renderer, container) = test_frame();
	let view = || html(&["<p>", "</p>"], vec![Value::from("still")]);

	renderer.render(view(), &container);
	let paragraph = container.first_child().unwrap();
	let text = paragraph.first_child().unwrap();

	renderer.render(view(), &container);
	renderer.render(view(), &container);

	// Same string value: the text node itself survives, by identity.
	assert!(paragraph.is_same_node(container.first_child().as_ref()));
	assert!(text.is_same_node(paragraph.first_child().as_ref()));
	assert_eq!(paragraph.child_nodes().length(), 1);
	assert_eq!(text.text_content().unwrap(), "still");

	container.remove();
}

#[wasm_bindgen_test]
fn string_then_node_leaves_exactly_the_node() {
	let (renderer, container) = test_frame();
	let document = window().unwrap().document().unwrap();

	renderer.render(html(&["<div>", "</div>"], vec![Value::from("text first")]), &container);
	let host = container.first_child().unwrap();
	assert_eq!(host.text_content().unwrap(), "text first");

	let replacement = document.create_element("em").unwrap();
	replacement.set_text_content(Some("node second"));
	let replacement: web_sys::Node = replacement.into();
	renderer.render(html(&["<div>", "</div>"], vec![Value::from(replacement.clone())]), &container);

	assert_eq!(host.child_nodes().length(), 1);
	assert!(replacement.is_same_node(host.first_child().as_ref()));
	assert_eq!(host.text_content().unwrap(), "node second");

	container.remove();
}

#[wasm_bindgen_test]
fn null_keeps_an_anchor_in_place() {
	let (renderer, container) = test_frame();
	let view = |value: Value| html(&["<div>", "</div>"], vec![value]);

	renderer.render(view(Value::Null), &container);
	let host = container.first_child().unwrap();
	assert_eq!(host.child_nodes().length(), 1);
	assert_eq!(host.first_child().unwrap().node_type(), web_sys::Node::COMMENT_NODE);

	renderer.render(view(Value::from("visible")), &container);
	assert_eq!(host.text_content().unwrap(), "visible");

	renderer.render(view(Value::Null), &container);
	assert_eq!(host.child_nodes().length(), 1);
	assert_eq!(host.first_child().unwrap().node_type(), web_sys::Node::COMMENT_NODE);

	container.remove();
}

#[wasm_bindgen_test]
fn fragment_children_become_the_region() {
	let (renderer, container) = test_frame();
	let document = window().unwrap().document().unwrap();

	let fragment = document.create_document_fragment();
	let one = document.create_element("b").unwrap();
	one.set_text_content(Some("one"));
	let two = document.create_element("i").unwrap();
	two.set_text_content(Some("two"));
	fragment.append_child(one.as_ref()).unwrap();
	fragment.append_child(two.as_ref()).unwrap();
	let fragment: web_sys::Node = fragment.into();

	let view = |value: Value| html(&["<div>", "</div>"], vec![value]);
	renderer.render(view(Value::from(fragment)), &container);
	let host = container.first_child().unwrap();
	assert_eq!(host.child_nodes().length(), 2);
	assert_eq!(host.text_content().unwrap(), "onetwo");

	// Replacing the fragment span swaps out both children at once.
	renderer.render(view(Value::from("collapsed")), &container);
	assert_eq!(host.child_nodes().length(), 1);
	assert_eq!(host.text_content().unwrap(), "collapsed");

	container.remove();
}

#[wasm_bindgen_test]
fn nested_template_reconciles_by_shape() {
	let (renderer, container) = test_frame();
	let inner_a = |text: &str| html(&["<span>", "</span>"], vec![Value::from(text)]);
	let inner_b = |text: &str| html(&["<strong>", "</strong>"], vec![Value::from(text)]);
	let outer = |inner: Value| html(&["<div>", "</div>"], vec![inner]);

	renderer.render(outer(Value::from(inner_a("first"))), &container);
	let host = container.first_child().unwrap();
	let span = host.first_child().unwrap();
	assert_eq!(span.node_name(), "SPAN");

	// Same shape: the nested instance updates in place.
	renderer.render(outer(Value::from(inner_a("second"))), &container);
	assert!(span.is_same_node(host.first_child().as_ref()));
	assert_eq!(span.text_content().unwrap(), "second");

	// Different shape: the nested instance is replaced wholesale.
	renderer.render(outer(Value::from(inner_b("third"))), &container);
	let strong = host.first_child().unwrap();
	assert_eq!(strong.node_name(), "STRONG");
	assert_eq!(strong.text_content().unwrap(), "third");
	assert_eq!(host.child_nodes().length(), 1);

	container.remove();
}

#[wasm_bindgen_test]
fn template_change_remounts_the_container() {
	let (renderer, container) = test_frame();

	renderer.render(html(&["<p>", "</p>"], vec![Value::from("one")]), &container);
	assert_eq!(container.first_child().unwrap().node_name(), "P");

	renderer.render(html(&["<section>", "</section>"], vec![Value::from("two")]), &container);
	assert_eq!(container.child_nodes().length(), 1);
	let section = container.first_child().unwrap();
	assert_eq!(section.node_name(), "SECTION");
	assert_eq!(section.text_content().unwrap(), "two");

	container.remove();
}

#[wasm_bindgen_test]
fn unmount_clears_the_container() {
	let (renderer, container) = test_frame();

	renderer.render(html(&["<p>", "</p>"], vec![Value::from("gone soon")]), &container);
	assert_eq!(container.child_nodes().length(), 1);

	renderer.unmount(&container);
	assert_eq!(container.child_nodes().length(), 0);

	// The next render is a fresh mount again.
	renderer.render(html(&["<p>", "</p>"], vec![Value::from("back")]), &container);
	assert_eq!(container.text_content().unwrap(), "back");

	container.remove();
}

#[wasm_bindgen_test]
fn childless_template_still_mounts() {
	let (renderer, container) = test_frame();

	renderer.render(html(&[""], Vec::new()), &container);
	assert_eq!(container.child_nodes().length(), 1);
	assert_eq!(container.first_child().unwrap().node_type(), web_sys::Node::COMMENT_NODE);

	container.remove();
}

#[wasm_bindgen_test]
fn callable_reaches_a_live_property() {
	let (renderer, container) = test_frame();

	let handler = js_sys::Function::new_no_args("this.ownerDocument.defaultView.__xylemClicked = true;");
	renderer.render(
		html(&["<button onclick=\"", "\">go</button>"], vec![Value::from(handler)]),
		&container,
	);

	let button: web_sys::HtmlElement = container.first_child().unwrap().dyn_into().unwrap();
	button.click();

	let global = js_sys::global();
	let clicked = js_sys::Reflect::get(&global, &wasm_bindgen::JsValue::from_str("__xylemClicked")).unwrap();
	assert_eq!(clicked.as_bool(), Some(true));

	container.remove();
}
