#![doc(html_root_url = "https://docs.rs/xylem-dom/0.1.0")]
#![warn(clippy::pedantic)]

//! A template compiler and incremental DOM patcher.
//!
//! Each distinct template shape — a list of static markup segments with one
//! dynamic expression between each pair — is compiled once into a cached
//! [`template::TemplateDefinition`] recording a stable path to every dynamic
//! position. Rendering materializes the definition against the live
//! document; rendering again walks the recorded positions and mutates only
//! the ones whose values changed.
//!
//! All updates are synchronous and unscheduled. The single suspension point
//! is a deferred ([***Promise***](https://developer.mozilla.org/en-US/docs/Web/JavaScript/Reference/Global_Objects/Promise))
//! value, which re-applies itself when it settles; the last resolution wins.

pub use instance::TemplateInstance;
pub use keyed::Key;
pub use part::Part;
pub use render::Renderer;
pub use template::{Templates, MARKER};
pub use value::{html, Directive, TemplateResult, Value};

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod directives;
pub mod instance;
pub mod keyed;
pub mod part;
pub mod region;
pub mod render;
pub mod template;
pub mod value;
