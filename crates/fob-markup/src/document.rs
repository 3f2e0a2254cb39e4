//! Parsed documents and fragments.
//!
//! A [`Document`] owns one parsed tree and is the entry point for selection.
//! Full documents must start with the expected doctype literal; fragments
//! must not carry a doctype at all.

use crate::error::{MarkupError, Result};
use crate::http;
use crate::resolve::{MarkerSource, Resolver, Selection};
use crate::selector::SelectorInput;
use crate::server::DevServer;
use html5ever::{LocalName, Namespace, QualName};
use kuchikiki::iter::NodeIterator;
use kuchikiki::traits::TendrilSink;
use kuchikiki::NodeRef;
use serde::Deserialize;
use std::rc::Rc;
use tracing::debug;

/// The HTML5 doctype literal expected by default.
pub const HTML5_DOCTYPE: &str = "<!DOCTYPE html>";

const DTD: &str = "document-type declaration";
const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Options for parsing full documents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Literal the markup must start with; `None` skips the check.
    pub doctype: Option<String>,
}

impl ParseOptions {
    /// Creates options expecting the HTML5 doctype.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a custom doctype literal.
    #[must_use]
    pub fn with_doctype(mut self, doctype: impl Into<String>) -> Self {
        self.doctype = Some(doctype.into());
        self
    }

    /// Accepts markup regardless of its doctype.
    #[must_use]
    pub fn without_doctype_check(mut self) -> Self {
        self.doctype = None;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            doctype: Some(HTML5_DOCTYPE.to_string()),
        }
    }
}

/// Whether a document was parsed as a whole page or as a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// A full document with a doctype.
    Full,
    /// A fragment parsed in a `<body>` context.
    Fragment,
}

/// A parsed markup tree.
///
/// # Example
///
/// ```
/// use fob_markup::Document;
///
/// let doc = Document::parse("<!DOCTYPE html><title>Hello World</title>")?;
/// assert_eq!(doc.select_one("title::text")?.as_text(), Some("Hello World"));
/// # Ok::<(), fob_markup::MarkupError>(())
/// ```
#[derive(Debug)]
pub struct Document {
    root: NodeRef,
    kind: DocumentKind,
    resolver: Rc<Resolver>,
}

impl Document {
    /// Parses a full document that must start with `<!DOCTYPE html>`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMarkup` if the doctype is missing or different.
    pub fn parse(markup: &str) -> Result<Self> {
        Self::parse_with(markup, &ParseOptions::default())
    }

    /// Parses a full document with custom options.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMarkup` if `options.doctype` is set and the markup
    /// does not start with it exactly.
    pub fn parse_with(markup: &str, options: &ParseOptions) -> Result<Self> {
        if let Some(doctype) = options.doctype.as_deref() {
            if !markup.starts_with(doctype) {
                return Err(MarkupError::InvalidMarkup(format!(
                    "missing or invalid {DTD}; expected `{doctype}`"
                )));
            }
        }

        debug!(len = markup.len(), "parsing document");
        Ok(Self::from_root(
            kuchikiki::parse_html().one(markup),
            DocumentKind::Full,
        ))
    }

    /// Parses a fragment, which must not include a doctype.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMarkup` if the leading text looks like a doctype in
    /// any letter case.
    pub fn fragment(markup: &str) -> Result<Self> {
        let head: String = markup.trim_start().chars().take(9).collect();
        if head.to_uppercase().contains("<!DOCTYPE") {
            return Err(MarkupError::InvalidMarkup(format!(
                "document fragment must not include {DTD}"
            )));
        }

        debug!(len = markup.len(), "parsing fragment");
        let context = QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from("body"),
        );
        let document = kuchikiki::parse_fragment(context, Vec::new()).one(markup);

        // fragment nodes live under a synthetic <html> element
        let root = document
            .children()
            .elements()
            .next()
            .map_or(document, |html| html.as_node().clone());
        Ok(Self::from_root(root, DocumentKind::Fragment))
    }

    /// Fetches `uri` over HTTP and parses the body as a full document.
    ///
    /// # Errors
    ///
    /// Returns transport errors, `UnexpectedStatus` for non-2xx responses and
    /// `InvalidMarkup` for a missing doctype.
    pub async fn from_remote(uri: &str) -> Result<Self> {
        let markup = http::fetch(uri).await?;
        Self::parse(&markup)
    }

    /// Fetches a server-relative path and parses it as a full document.
    ///
    /// The server's health check runs first to fail fast.
    ///
    /// # Errors
    ///
    /// Same as [`Document::from_remote`], plus health check failures.
    pub async fn from_server(server: &dyn DevServer, path: &str) -> Result<Self> {
        server.health_check().await?;
        Self::from_remote(&server.url(path)).await
    }

    fn from_root(root: NodeRef, kind: DocumentKind) -> Self {
        Self {
            root,
            kind,
            resolver: Rc::new(Resolver::default()),
        }
    }

    /// Replaces the source of marker ids used for child-scoped queries.
    #[must_use]
    pub fn with_markers(mut self, markers: impl MarkerSource + 'static) -> Self {
        self.resolver = Rc::new(Resolver::new(markers));
        self
    }

    /// The root scope: the document node, or the fragment's container.
    #[must_use]
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// Whether this is a full document or a fragment.
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Resolves a selector or component descriptor; first match only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelector` or `NoMatch`.
    pub fn select_one(&self, input: impl Into<SelectorInput>) -> Result<Selection> {
        self.resolver.select_one(&input.into(), &self.root)
    }

    /// Resolves a selector or component descriptor; all matches in document
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelector` or `NoMatch`.
    pub fn select_all(&self, input: impl Into<SelectorInput>) -> Result<Vec<Selection>> {
        self.resolver.select_all(&input.into(), &self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::SequentialMarkers;

    #[test]
    fn full_document_requires_doctype() {
        let err = Document::parse("<html>…</html>").unwrap_err();
        assert!(matches!(err, MarkupError::InvalidMarkup(_)));
        assert!(err
            .to_string()
            .contains("missing or invalid document-type declaration"));
    }

    #[test]
    fn custom_doctype_must_match_exactly() {
        let options = ParseOptions::new().with_doctype("<!DOCTYPE HTML PUBLIC>");
        let err = Document::parse_with("<!DOCTYPE html><html>…</html>", &options).unwrap_err();
        assert!(err.to_string().contains("expected `<!DOCTYPE HTML PUBLIC>`"));
    }

    #[test]
    fn doctype_check_can_be_disabled() {
        let options = ParseOptions::new().without_doctype_check();
        let doc = Document::parse_with("<p>plain</p>", &options).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Full);
        assert_eq!(doc.select_one("p::text").unwrap().as_text(), Some("plain"));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ParseOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.doctype.as_deref(), Some(HTML5_DOCTYPE));

        let options: ParseOptions = serde_json::from_str(r#"{"doctype": null}"#).unwrap();
        assert_eq!(options.doctype, None);
    }

    #[test]
    fn empty_selector_returns_root() {
        let doc = Document::parse("<!DOCTYPE html><p>x</p>").unwrap();
        assert_eq!(doc.select_one("").unwrap().as_node(), Some(doc.root()));
    }

    #[test]
    fn fragment_rejects_doctype_in_any_case() {
        for markup in [
            "<!DOCTYPE html><html>…</html>",
            "  <!doctype html>",
            "\n<!DocType HTML PUBLIC \"-//W3C//DTD HTML 4.01//EN\">",
        ] {
            let err = Document::fragment(markup).unwrap_err();
            assert_eq!(
                err.to_string(),
                "document fragment must not include document-type declaration"
            );
        }
    }

    #[test]
    fn fragment_direct_children_of_root() {
        let doc = Document::fragment("<p>a</p><div><p>b</p></div>")
            .unwrap()
            .with_markers(SequentialMarkers::default());
        assert_eq!(doc.kind(), DocumentKind::Fragment);

        let texts: Vec<_> = doc
            .select_all("> p::text")
            .unwrap()
            .into_iter()
            .map(|s| s.as_text().map(str::to_string))
            .collect();
        assert_eq!(texts, vec![Some("a".to_string())]);

        assert_eq!(doc.select_all("p").unwrap().len(), 2);
    }
}
