//! # fob-markup
//!
//! Declarative markup selection for verifying rendered HTML in tests.
//!
//! Given a parsed document, this crate resolves path-like selector
//! expressions into nodes, text, attribute values, or component views built
//! from named sub-selectors.
//!
//! ## Architecture
//!
//! - **Document**: Parses markup (full documents or fragments) and validates the doctype
//! - **Selector**: Parses the selector grammar (`::text`, `[attr]`, `>` prefix)
//! - **Resolver**: Runs selectors against a scope, including direct-child queries
//! - **ComponentView**: Lazy named-property view over a container node
//! - **probe / ServerProcess**: Launching servers and waiting for them to answer
//!
//! ## Selector Syntax
//!
//! | Selector            | Result                                         |
//! |---------------------|------------------------------------------------|
//! | `body h1`           | the first matching node                        |
//! | `body h1::text`     | its text content, untrimmed                    |
//! | `img[src]`          | its `src` attribute (`None` if absent)         |
//! | `[href]`            | attribute of the current scope node itself     |
//! | `> img`             | direct children of the current scope only      |
//!
//! ## Example Usage
//!
//! ```
//! use fob_markup::{ComponentDescriptor, Document, Selection};
//!
//! let doc = Document::parse(
//!     r#"<!DOCTYPE html>
//!     <body>
//!         <h1>Hello World</h1>
//!         <footer><div><img src="beacon.gif"></div><img src="logo.png"></footer>
//!     </body>"#,
//! )?;
//!
//! assert_eq!(doc.select_one("body h1::text")?.as_text(), Some("Hello World"));
//!
//! let sources: Vec<_> = doc
//!     .select_all("footer img[src]")?
//!     .iter()
//!     .filter_map(Selection::as_attribute)
//!     .map(str::to_string)
//!     .collect();
//! assert_eq!(sources, ["beacon.gif", "logo.png"]);
//!
//! let footer = ComponentDescriptor::new("footer").with("logo", "> img[src]");
//! let view = doc.select_one(&footer)?.into_component().unwrap();
//! assert_eq!(view.get("logo")?.as_attribute(), Some("logo.png"));
//! # Ok::<(), fob_markup::MarkupError>(())
//! ```
//!
//! ## Testing Strategy
//!
//! Unit tests live next to each module. Integration tests in `tests/` serve
//! fixtures from a local HTTP server; tests that need Python's `http.server`
//! are `#[ignore]`d.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod component;
pub mod document;
pub mod error;
pub mod http;
pub mod logging;
pub mod probe;
pub mod resolve;
pub mod selector;
pub mod server;

// Re-export main types for convenience
pub use component::{ComponentView, CONTAINER_PROPERTY};
pub use document::{Document, DocumentKind, ParseOptions, HTML5_DOCTYPE};
pub use error::{MarkupError, QueryKind, Result};
pub use probe::{probe, Delay, ProbeConfig, DEFAULT_PROBE_DELAY, DEFAULT_RETRIES};
pub use resolve::{Cardinality, MarkerSource, Resolver, Selection, SequentialMarkers, UuidMarkers};
pub use selector::{ComponentDescriptor, Extract, Selector, SelectorInput};
pub use server::{DevServer, LaunchOptions, ServerProcess, StaticUrlServer};

pub use kuchikiki::NodeRef;
