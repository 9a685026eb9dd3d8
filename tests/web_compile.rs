use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::window;
use xylem_dom::{html, Renderer, Templates, Value};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
	window().unwrap().document().unwrap()
}

#[wasm_bindgen_test]
fn split_paths_stay_resolvable() {
	let templates = Templates::new(document());
	let result = html(&["<p>a", "b", "c</p>"], vec![Value::Null, Value::Null]);
	let definition = templates.definition(&result);

	// "a{{}}b{{}}c" splits into [a][anchor][b][anchor][c]; the recorded
	// trailing indices account for the inserted siblings.
	let paths = definition.paths();
	assert_eq!(paths.len(), 2);
	assert_eq!(paths[0].indices(), [0, 1]);
	assert_eq!(paths[1].indices(), [0, 3]);
	assert!(paths[0].attribute().is_none());
	assert!(paths[1].attribute().is_none());
}

#[wasm_bindgen_test]
fn split_positions_update_left_to_right() {
	let renderer = Renderer::new(document());
	let container = document().create_element("div").unwrap();
	document().body().unwrap().append_child(container.as_ref()).unwrap();

	let view = |one: &str, two: &str| html(&["<p>a", "b", "c</p>"], vec![Value::from(one), Value::from(two)]);
	renderer.render(view("X", "Y"), &container);
	assert_eq!(container.text_content().unwrap(), "aXbYc");

	renderer.render(view("1", "2"), &container);
	assert_eq!(container.text_content().unwrap(), "a1b2c");

	container.remove();
}

#[wasm_bindgen_test]
fn attribute_positions_precede_content() {
	let templates = Templates::new(document());
	let result = html(&["<p title=\"", "\">", "</p>"], vec![Value::Null, Value::Null]);
	let definition = templates.definition(&result);

	let paths = definition.paths();
	assert_eq!(paths.len(), 2);
	assert_eq!(paths[0].indices(), [0]);
	assert_eq!(paths[0].attribute(), Some("title"));
	assert_eq!(paths[1].indices(), [0, 0]);
	assert!(paths[1].attribute().is_none());
}

#[wasm_bindgen_test]
fn definitions_are_cached_by_shape() {
	let templates = Templates::new(document());
	let a = templates.definition(&html(&["<p>", "</p>"], vec![Value::from("one")]));
	let b = templates.definition(&html(&["<p>", "</p>"], vec![Value::from("two")]));
	let c = templates.definition(&html(&["<div>", "</div>"], vec![Value::from("three")]));

	assert_eq!(a.id(), b.id());
	assert!(std::rc::Rc::ptr_eq(&a, &b));
	assert_ne!(a.id(), c.id());

	templates.clear();
	let again = templates.definition(&html(&["<p>", "</p>"], vec![Value::from("four")]));
	assert_eq!(again.id(), a.id());
	assert!(!std::rc::Rc::ptr_eq(&again, &a));
}

#[wasm_bindgen_test]
fn svg_context_follows_ancestors() {
	let templates = Templates::new(document());
	let result = html(
		&[
			"<svg><circle r=\"",
			"\"></circle><foreignObject><div class=\"",
			"\"></div></foreignObject></svg>",
		],
		vec![Value::Null, Value::Null],
	);
	let definition = templates.definition(&result);

	let paths = definition.paths();
	assert_eq!(paths.len(), 2);
	assert!(paths[0].is_svg());
	assert_eq!(paths[0].attribute(), Some("r"));
	// A foreignObject cancels the svg context even inside the subtree.
	assert!(!paths[1].is_svg());
	assert_eq!(paths[1].attribute(), Some("class"));
}
