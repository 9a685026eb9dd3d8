use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::window;
use xylem_dom::{directives::until, html, Renderer, Value};

wasm_bindgen_test_configure!(run_in_browser);

fn test_frame() -> (Renderer, web_sys::Element) {
	let document = window().unwrap().document().unwrap();
	let container = document.create_element("div").unwrap();
	document.body().unwrap().append_child(container.as_ref()).unwrap();
	(Renderer::new(document), container)
}

/// Lets already-queued continuations run.
async fn settle() {
	JsFuture::from(js_sys::Promise::resolve(&JsValue::NULL)).await.unwrap();
	JsFuture::from(js_sys::Promise::resolve(&JsValue::NULL)).await.unwrap();
}

#[wasm_bindgen_test]
async fn deferred_value_applies_when_it_settles() {
	let (renderer, container) = test_frame();
	let view = |value: Value| html(&["<div>", "</div>"], vec![value]);

	let promise = js_sys::Promise::resolve(&JsValue::from_str("later"));
	renderer.render(view(Value::from(promise)), &container);

	// Nothing is mutated synchronously; the compile anchor is still in place.
	let host = container.first_child().unwrap();
	assert_eq!(host.first_child().unwrap().node_type(), web_sys::Node::COMMENT_NODE);

	settle().await;
	assert_eq!(host.text_content().unwrap(), "later");

	container.remove();
}

#[wasm_bindgen_test]
async fn until_shows_the_placeholder_first() {
	let (renderer, container) = test_frame();
	let view = |value: Value| html(&["<div>", "</div>"], vec![value]);

	let promise = js_sys::Promise::resolve(&JsValue::from_str("content"));
	renderer.render(view(until(promise, Value::from("loading"))), &container);

	let host = container.first_child().unwrap();
	assert_eq!(host.text_content().unwrap(), "loading");

	settle().await;
	assert_eq!(host.text_content().unwrap(), "content");

	container.remove();
}

#[wasm_bindgen_test]
async fn late_resolution_overwrites_newer_content() {
	let (renderer, container) = test_frame();
	let view = |value: Value| html(&["<div>", "</div>"], vec![value]);

	let promise = js_sys::Promise::resolve(&JsValue::from_str("stale"));
	renderer.render(view(Value::from(promise)), &container);
	renderer.render(view(Value::from("newer")), &container);

	let host = container.first_child().unwrap();
	assert_eq!(host.text_content().unwrap(), "newer");

	// No cancellation: whichever resolution settles last wins, even a
	// logically stale one.
	settle().await;
	assert_eq!(host.text_content().unwrap(), "stale");

	container.remove();
}

#[wasm_bindgen_test]
async fn settled_lists_reconcile_like_direct_ones() {
	let (renderer, container) = test_frame();
	let view = |value: Value| html(&["<ul>", "</ul>"], vec![value]);

	let items = js_sys::Array::of2(&JsValue::from_str("a"), &JsValue::from_str("b"));
	let promise = js_sys::Promise::resolve::<JsValue>(items.as_ref());
	renderer.render(view(Value::from(promise)), &container);

	settle().await;
	let list = container.first_child().unwrap();
	assert_eq!(list.text_content().unwrap(), "ab");
	assert_eq!(list.child_nodes().length(), 2);

	container.remove();
}
