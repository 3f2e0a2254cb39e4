//! Selector resolution against a scope node.
//!
//! The resolver runs a parsed [`Selector`] as a descendant query (or as a
//! direct-children query for `>`-prefixed selectors) and post-processes every
//! match into a [`Selection`].
//!
//! Direct-children queries are not something the underlying selector engine
//! offers for descendant-rooted queries, so the scope element is tagged with a
//! one-off marker class and the query `.<marker> > <base>` is issued from the
//! scope's parent, once per entry of a selector list. Marker ids come from the resolver's [`MarkerSource`] and
//! are fresh per call, so nested or sibling child queries never collide.

use crate::component::ComponentView;
use crate::error::{MarkupError, QueryKind, Result};
use crate::selector::{ComponentDescriptor, Extract, Selector, SelectorInput};
use kuchikiki::iter::NodeIterator;
use kuchikiki::{NodeRef, Selectors};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Class-name prefix for transient scope markers.
pub const MARKER_PREFIX: &str = "fob-scope-";

/// Produces identifiers for scope marker classes.
///
/// Every call must return an id that has not been handed out before by the
/// same source.
pub trait MarkerSource {
    /// Returns a fresh marker id (valid as part of a CSS class name).
    fn next_marker(&self) -> String;
}

/// Random marker ids (UUID v4, simple form). The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidMarkers;

impl MarkerSource for UuidMarkers {
    fn next_marker(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Counter-based marker ids, starting at zero.
///
/// Deterministic, which makes it handy in tests.
#[derive(Debug, Default)]
pub struct SequentialMarkers {
    next: Cell<u64>,
}

impl MarkerSource for SequentialMarkers {
    fn next_marker(&self) -> String {
        let id = self.next.get();
        self.next.set(id + 1);
        id.to_string()
    }
}

/// How many matches a resolution must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// First match only.
    Single,
    /// All matches, in document order.
    Multi,
}

/// The result of resolving a selector against one matched node.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// The matched node itself.
    Node(NodeRef),
    /// Text content of the matched node (`::text`).
    Text(String),
    /// Attribute value of the matched node (`[attr]`); `None` if absent.
    Attribute(Option<String>),
    /// A component view over the matched node.
    Component(ComponentView),
}

impl Selection {
    /// Returns the node, if this is a node selection.
    #[must_use]
    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Selection::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Returns the text, if this is a text selection.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Selection::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the attribute value, if this is an attribute selection and the
    /// attribute was present.
    #[must_use]
    pub fn as_attribute(&self) -> Option<&str> {
        match self {
            Selection::Attribute(value) => value.as_deref(),
            _ => None,
        }
    }

    /// Returns the component view, if this is a component selection.
    #[must_use]
    pub fn as_component(&self) -> Option<&ComponentView> {
        match self {
            Selection::Component(view) => Some(view),
            _ => None,
        }
    }

    /// Converts into a component view, if this is a component selection.
    #[must_use]
    pub fn into_component(self) -> Option<ComponentView> {
        match self {
            Selection::Component(view) => Some(view),
            _ => None,
        }
    }
}

/// Executes selectors against scope nodes.
pub struct Resolver {
    markers: Box<dyn MarkerSource>,
}

impl Resolver {
    /// Creates a resolver that takes marker ids from `markers`.
    pub fn new(markers: impl MarkerSource + 'static) -> Self {
        Self {
            markers: Box::new(markers),
        }
    }

    /// Resolves `input` against `scope`, returning the first match.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelector` for malformed selectors and `NoMatch` when
    /// nothing matches.
    pub fn select_one(self: &Rc<Self>, input: &SelectorInput, scope: &NodeRef) -> Result<Selection> {
        self.resolve(input, scope, Cardinality::Single)?
            .into_iter()
            .next()
            .ok_or_else(|| MarkupError::NoMatch {
                selector: input.selector().to_string(),
                query: QueryKind::Node,
            })
    }

    /// Resolves `input` against `scope`, returning all matches in document
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelector` for malformed selectors and `NoMatch` when
    /// nothing matches.
    pub fn select_all(self: &Rc<Self>, input: &SelectorInput, scope: &NodeRef) -> Result<Vec<Selection>> {
        self.resolve(input, scope, Cardinality::Multi)
    }

    /// Resolves `input` against `scope`.
    ///
    /// With `Cardinality::Single` the result holds exactly one selection;
    /// with `Cardinality::Multi` it holds at least one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelector` for malformed selectors and `NoMatch` when
    /// nothing matches.
    pub fn resolve(
        self: &Rc<Self>,
        input: &SelectorInput,
        scope: &NodeRef,
        cardinality: Cardinality,
    ) -> Result<Vec<Selection>> {
        let selector = Selector::parse(input.selector())?;
        let nodes = self.find(&selector, scope, cardinality)?;
        trace!(
            selector = input.selector(),
            matches = nodes.len(),
            "resolved selector"
        );

        Ok(nodes
            .into_iter()
            .map(|node| self.wrap(node, &selector, input.component()))
            .collect())
    }

    fn find(&self, selector: &Selector, scope: &NodeRef, cardinality: Cardinality) -> Result<Vec<NodeRef>> {
        let base = selector.base();

        if selector.is_child_scoped() {
            let mut nodes = self.find_children(base, scope)?;
            if cardinality == Cardinality::Single {
                nodes.truncate(1);
            }
            return Ok(nodes);
        }

        // implicit self reference, e.g. `[href]` on an anchor
        if selector.is_self_reference() {
            return Ok(vec![scope.clone()]);
        }

        let mut found = scope
            .descendants()
            .select(base)
            .map_err(|()| MarkupError::InvalidSelector(base.to_string()))?;

        let (nodes, query) = match cardinality {
            Cardinality::Single => (
                found.next().map(|el| el.as_node().clone()).into_iter().collect(),
                QueryKind::Node,
            ),
            Cardinality::Multi => (
                found.map(|el| el.as_node().clone()).collect::<Vec<_>>(),
                QueryKind::Nodes,
            ),
        };

        if nodes.is_empty() {
            return Err(MarkupError::NoMatch {
                selector: base.to_string(),
                query,
            });
        }
        Ok(nodes)
    }

    fn find_children(&self, base: &str, scope: &NodeRef) -> Result<Vec<NodeRef>> {
        let invalid = || MarkupError::InvalidSelector(base.to_string());
        let compiled = Selectors::compile(base).map_err(|()| invalid())?;
        let parent = scope.parent().filter(|_| scope.as_element().is_some());

        let nodes: Vec<NodeRef> = if let Some(parent) = parent {
            let marker = format!("{MARKER_PREFIX}{}", self.markers.next_marker());
            // every entry of a selector list gets its own marker prefix
            let query = compiled
                .0
                .iter()
                .map(|part| format!(".{marker} > {part}"))
                .collect::<Vec<_>>()
                .join(", ");

            let _tag = ScopeTag::apply(scope, &marker);
            debug!(%marker, selector = base, "tagged scope for child query");

            parent
                .select(&query)
                .map_err(|()| invalid())?
                .map(|el| el.as_node().clone())
                .collect()
        } else {
            // the document root has no parent to query from
            scope
                .children()
                .elements()
                .filter(|el| compiled.matches(el))
                .map(|el| el.as_node().clone())
                .collect()
        };

        if nodes.is_empty() {
            return Err(MarkupError::NoMatch {
                selector: base.to_string(),
                query: QueryKind::ChildNodes,
            });
        }
        Ok(nodes)
    }

    fn wrap(
        self: &Rc<Self>,
        node: NodeRef,
        selector: &Selector,
        component: Option<&Rc<ComponentDescriptor>>,
    ) -> Selection {
        match (selector.extract(), component) {
            (Some(Extract::Text), _) => Selection::Text(node.text_contents()),
            (Some(Extract::Attribute(name)), _) => Selection::Attribute(attribute(&node, name)),
            (None, Some(descriptor)) => Selection::Component(ComponentView::new(
                node,
                Rc::clone(descriptor),
                Rc::clone(self),
            )),
            (None, None) => Selection::Node(node),
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(UuidMarkers)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}

/// Reads an attribute from an element node; non-elements have none.
fn attribute(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()
        .and_then(|el| el.attributes.borrow().get(name).map(str::to_string))
}

/// A marker class applied to an element for the duration of one query.
///
/// Dropping the tag restores the element's original `class` attribute.
struct ScopeTag {
    node: NodeRef,
    previous: Option<String>,
}

impl ScopeTag {
    fn apply(node: &NodeRef, marker: &str) -> Option<Self> {
        let element = node.as_element()?;
        let mut attrs = element.attributes.borrow_mut();
        let previous = attrs.get("class").map(str::to_string);
        let tagged = match previous.as_deref() {
            Some(classes) if !classes.trim().is_empty() => format!("{classes} {marker}"),
            _ => marker.to_string(),
        };
        attrs.insert("class", tagged);

        Some(Self {
            node: node.clone(),
            previous,
        })
    }
}

impl Drop for ScopeTag {
    fn drop(&mut self) {
        if let Some(element) = self.node.as_element() {
            let mut attrs = element.attributes.borrow_mut();
            match self.previous.take() {
                Some(classes) => {
                    attrs.insert("class", classes);
                }
                None => {
                    attrs.remove("class");
                }
            }
        }
    }
}
