//! Selector grammar and component descriptors.
//!
//! A raw selector is a regular CSS selector extended with three conventions:
//!
//! - `<base>::text` extracts the matched node's text content
//! - `<base>[<attr>]` extracts an attribute value (`<base>` may be empty)
//! - `> <base>` restricts matching to direct children of the current scope
//!
//! Parsing happens once, into an immutable [`Selector`], before resolution.
//! An empty base selector refers to the scope node itself, so `[href]` on an
//! anchor reads the anchor's own attribute.

use crate::error::{MarkupError, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::rc::Rc;

const TEXT_SUFFIX: &str = "::text";

/// What to extract from a matched node instead of returning it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extract {
    /// Full text content, including descendant text, untrimmed.
    Text,
    /// Value of the named attribute.
    Attribute(String),
}

/// A parsed selector string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    base: String,
    extract: Option<Extract>,
    child_scoped: bool,
}

impl Selector {
    /// Parses a raw selector string.
    ///
    /// The text suffix is checked before the attribute suffix, and the
    /// direct-child prefix is checked after either suffix has been stripped.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelector` if the selector ends with `]` but contains
    /// no `[`.
    pub fn parse(raw: &str) -> Result<Self> {
        let (base, extract) = if let Some(base) = raw.strip_suffix(TEXT_SUFFIX) {
            (base, Some(Extract::Text))
        } else if let Some(inner) = raw.strip_suffix(']') {
            let open = inner
                .rfind('[')
                .ok_or_else(|| MarkupError::InvalidSelector(raw.to_string()))?;
            let name = &inner[open + 1..];
            (&inner[..open], Some(Extract::Attribute(name.to_string())))
        } else {
            (raw, None)
        };

        let (base, child_scoped) = match base.strip_prefix('>') {
            Some(rest) => (rest.trim_start(), true),
            None => (base, false),
        };

        Ok(Self {
            base: base.to_string(),
            extract,
            child_scoped,
        })
    }

    /// The CSS selector left after stripping the custom markers.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The extraction modifier, if any.
    #[must_use]
    pub fn extract(&self) -> Option<&Extract> {
        self.extract.as_ref()
    }

    /// Whether matching is restricted to direct children of the scope.
    #[must_use]
    pub fn is_child_scoped(&self) -> bool {
        self.child_scoped
    }

    /// Whether this selector refers to the scope node itself.
    #[must_use]
    pub fn is_self_reference(&self) -> bool {
        self.base.is_empty()
    }
}

/// Anything that can be resolved against a scope: a raw selector string or a
/// component descriptor.
///
/// Deserializes from a string or from a map carrying a `container` key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SelectorInput {
    /// A raw selector string.
    Raw(String),
    /// A component descriptor; matches are wrapped in component views.
    Component(Rc<ComponentDescriptor>),
}

impl SelectorInput {
    /// The selector string that locates the node(s).
    ///
    /// For descriptors this is the `container` selector.
    #[must_use]
    pub fn selector(&self) -> &str {
        match self {
            SelectorInput::Raw(raw) => raw,
            SelectorInput::Component(descriptor) => &descriptor.container,
        }
    }

    /// The descriptor to wrap matches with, if any.
    #[must_use]
    pub fn component(&self) -> Option<&Rc<ComponentDescriptor>> {
        match self {
            SelectorInput::Raw(_) => None,
            SelectorInput::Component(descriptor) => Some(descriptor),
        }
    }
}

impl From<&str> for SelectorInput {
    fn from(raw: &str) -> Self {
        SelectorInput::Raw(raw.to_string())
    }
}

impl From<String> for SelectorInput {
    fn from(raw: String) -> Self {
        SelectorInput::Raw(raw)
    }
}

impl From<&String> for SelectorInput {
    fn from(raw: &String) -> Self {
        SelectorInput::Raw(raw.clone())
    }
}

impl From<ComponentDescriptor> for SelectorInput {
    fn from(descriptor: ComponentDescriptor) -> Self {
        SelectorInput::Component(Rc::new(descriptor))
    }
}

impl From<&ComponentDescriptor> for SelectorInput {
    fn from(descriptor: &ComponentDescriptor) -> Self {
        SelectorInput::Component(Rc::new(descriptor.clone()))
    }
}

impl From<Rc<ComponentDescriptor>> for SelectorInput {
    fn from(descriptor: Rc<ComponentDescriptor>) -> Self {
        SelectorInput::Component(descriptor)
    }
}

impl From<&SelectorInput> for SelectorInput {
    fn from(input: &SelectorInput) -> Self {
        input.clone()
    }
}

/// A named bundle of selectors sharing one container root.
///
/// # Example
///
/// ```
/// use fob_markup::ComponentDescriptor;
///
/// let footer = ComponentDescriptor::new("footer").with("logo", "> img[src]");
/// assert_eq!(footer.container(), "footer");
/// assert!(footer.property("logo").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentDescriptor {
    container: String,
    #[serde(flatten)]
    properties: IndexMap<String, SelectorInput>,
}

impl ComponentDescriptor {
    /// Creates a descriptor without properties.
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            properties: IndexMap::new(),
        }
    }

    /// Adds a property; a later property with the same name replaces it.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, selector: impl Into<SelectorInput>) -> Self {
        self.properties.insert(name.into(), selector.into());
        self
    }

    /// The container selector.
    #[must_use]
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Looks up a property's selector.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&SelectorInput> {
        self.properties.get(name)
    }

    /// Declared property names, in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }
}
