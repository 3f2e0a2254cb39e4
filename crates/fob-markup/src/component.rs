//! Lazy component views.
//!
//! A [`ComponentView`] binds a container node to the [`ComponentDescriptor`]
//! it was selected with. Properties are resolved on every access, against
//! the tree as it is at that moment; nothing is cached.

use crate::error::{MarkupError, Result};
use crate::resolve::{Resolver, Selection};
use crate::selector::{ComponentDescriptor, SelectorInput};
use kuchikiki::NodeRef;
use std::fmt;
use std::rc::Rc;

/// Reserved property name that yields the backing container node.
pub const CONTAINER_PROPERTY: &str = "container";

/// A read-only view over a container node, exposing the descriptor's named
/// properties.
///
/// # Example
///
/// ```
/// use fob_markup::{ComponentDescriptor, Document};
///
/// let doc = Document::fragment(r#"<footer><img src="logo.png"></footer>"#)?;
/// let footer = ComponentDescriptor::new("footer").with("logo", "> img[src]");
///
/// let view = doc.select_one(&footer)?.into_component().unwrap();
/// assert_eq!(view.get("logo")?.as_attribute(), Some("logo.png"));
/// # Ok::<(), fob_markup::MarkupError>(())
/// ```
#[derive(Clone)]
pub struct ComponentView {
    container: NodeRef,
    descriptor: Rc<ComponentDescriptor>,
    resolver: Rc<Resolver>,
}

impl ComponentView {
    pub(crate) fn new(
        container: NodeRef,
        descriptor: Rc<ComponentDescriptor>,
        resolver: Rc<Resolver>,
    ) -> Self {
        Self {
            container,
            descriptor,
            resolver,
        }
    }

    /// The node this view is bound to.
    #[must_use]
    pub fn container(&self) -> &NodeRef {
        &self.container
    }

    /// The descriptor this view was built from.
    #[must_use]
    pub fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    /// Declared property names, in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.descriptor.property_names()
    }

    /// Resolves a named property.
    ///
    /// `container` returns the bound node. Any other name is looked up in
    /// the descriptor and resolved against the container with single-match
    /// rules; descriptor-valued properties yield nested views.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentProperty` for undeclared names, and any
    /// resolution error of the property's selector.
    pub fn get(&self, name: &str) -> Result<Selection> {
        if name == CONTAINER_PROPERTY {
            return Ok(Selection::Node(self.container.clone()));
        }

        let selector = self
            .descriptor
            .property(name)
            .ok_or_else(|| MarkupError::InvalidComponentProperty(name.to_string()))?;
        self.resolver.select_one(selector, &self.container)
    }

    /// Resolves an ad-hoc selector against the container, first match only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelector` or `NoMatch`.
    pub fn select(&self, input: impl Into<SelectorInput>) -> Result<Selection> {
        self.resolver.select_one(&input.into(), &self.container)
    }

    /// Resolves an ad-hoc selector against the container, all matches.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelector` or `NoMatch`.
    pub fn select_all(&self, input: impl Into<SelectorInput>) -> Result<Vec<Selection>> {
        self.resolver.select_all(&input.into(), &self.container)
    }
}

impl PartialEq for ComponentView {
    fn eq(&self, other: &Self) -> bool {
        self.container == other.container && self.descriptor == other.descriptor
    }
}

impl fmt::Debug for ComponentView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentView")
            .field("container", &self.container)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    const PAGE: &str = r##"<!DOCTYPE html>
<html><body>
<nav class="site-nav"><a href="#main">skip</a><ul><li><a href="/">home</a></li></ul></nav>
<main id="main"><h1>Title</h1></main>
</body></html>"##;

    #[test]
    fn container_property_returns_bound_node() {
        let doc = Document::parse(PAGE).unwrap();
        let view = doc
            .select_one(ComponentDescriptor::new("main"))
            .unwrap()
            .into_component()
            .unwrap();

        let node = view.get(CONTAINER_PROPERTY).unwrap();
        assert_eq!(node.as_node(), Some(view.container()));
    }

    #[test]
    fn undeclared_property_is_rejected() {
        let doc = Document::parse(PAGE).unwrap();
        let view = doc
            .select_one(ComponentDescriptor::new("main").with("title", "h1::text"))
            .unwrap()
            .into_component()
            .unwrap();

        let err = view.get("dummy").unwrap_err();
        assert!(err.to_string().contains("dummy"));
        assert_eq!(view.get("title").unwrap().as_text(), Some("Title"));
    }

    #[test]
    fn nested_descriptor_yields_nested_view() {
        let link = ComponentDescriptor::new("ul a")
            .with("uri", "[href]")
            .with("caption", "::text");
        let nav = ComponentDescriptor::new(".site-nav")
            .with("jumpLink", "> a[href]")
            .with("link", link);

        let doc = Document::parse(PAGE).unwrap();
        let view = doc.select_one(&nav).unwrap().into_component().unwrap();
        assert_eq!(
            view.property_names().collect::<Vec<_>>(),
            vec!["jumpLink", "link"]
        );
        assert_eq!(view.get("jumpLink").unwrap().as_attribute(), Some("#main"));

        let link = view.get("link").unwrap().into_component().unwrap();
        assert_eq!(link.get("uri").unwrap().as_attribute(), Some("/"));
        assert_eq!(link.get("caption").unwrap().as_text(), Some("home"));
    }

    #[test]
    fn same_tag_views_resolve_below_their_container() {
        let list = ComponentDescriptor::new("ul").with("id", "[id]");
        let doc = Document::fragment(
            r#"<ul id="outer"><li><ul id="inner"><li>x</li></ul></li></ul>"#,
        )
        .unwrap();

        let outer = doc.select_one(&list).unwrap().into_component().unwrap();
        assert_eq!(outer.get("id").unwrap().as_attribute(), Some("outer"));

        let inner = outer.select(&list).unwrap().into_component().unwrap();
        assert_eq!(inner.get("id").unwrap().as_attribute(), Some("inner"));
        assert!(inner.select(&list).unwrap_err().is_no_match());
    }

    #[test]
    fn property_matching_only_the_container_fails() {
        let doc = Document::fragment("<section><p>a</p></section>").unwrap();
        let view = doc
            .select_one(ComponentDescriptor::new("section").with("inner", "section"))
            .unwrap()
            .into_component()
            .unwrap();

        let err = view.get("inner").unwrap_err();
        assert!(err.is_no_match());
        assert!(doc.select_one("html").unwrap_err().is_no_match());
    }

    #[test]
    fn properties_reflect_current_tree() {
        let doc = Document::parse(PAGE).unwrap();
        let view = doc
            .select_one(ComponentDescriptor::new("main").with("title", "h1::text"))
            .unwrap()
            .into_component()
            .unwrap();
        assert_eq!(view.get("title").unwrap().as_text(), Some("Title"));

        let heading = view.select("h1").unwrap().as_node().cloned().unwrap();
        heading.first_child().unwrap().detach();
        heading.append(NodeRef::new_text("Renamed"));

        assert_eq!(view.get("title").unwrap().as_text(), Some("Renamed"));
    }
}
