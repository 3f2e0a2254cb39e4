//! Error types for markup selection and its I/O collaborators.
//!
//! Selection failures (`InvalidMarkup`, `InvalidSelector`, `NoMatch`,
//! `InvalidComponentProperty`) are raised synchronously where they happen and
//! always embed the offending selector or property name verbatim. The
//! remaining variants come from fetching documents, probing servers and
//! launching server processes.

use std::fmt;
use std::process::ExitStatus;
use thiserror::Error;

/// The main error type for all markup operations.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// The markup failed doctype validation.
    ///
    /// Raised when a full document lacks the expected doctype, or when a
    /// fragment carries one.
    #[error("{0}")]
    InvalidMarkup(String),

    /// A selector could not be parsed or compiled.
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),

    /// A required query yielded zero nodes.
    #[error("no matching {query} for `{selector}`")]
    NoMatch {
        /// The base selector that was queried
        selector: String,
        /// Which kind of query came up empty
        query: QueryKind,
    },

    /// A component view was asked for a property its descriptor lacks.
    #[error("invalid component property `{0}`")]
    InvalidComponentProperty(String),

    /// The URI is neither `http://` nor `https://`.
    #[error("unrecognized URI: {0}")]
    UnrecognizedUri(String),

    /// The server answered with a status outside 200-299.
    #[error("unexpected HTTP response: {status} {uri}")]
    UnexpectedStatus {
        /// The response status code
        status: u16,
        /// The requested URI
        uri: String,
    },

    /// The URI never became available within the retry budget.
    #[error("timeout while probing {uri} after {attempts} attempts")]
    ProbeTimeout {
        /// The probed URI
        uri: String,
        /// How many requests were issued
        attempts: u32,
    },

    /// Failed to start a server process.
    #[error("failed to launch server: {reason}")]
    LaunchFailed {
        /// Human-readable reason for the launch failure
        reason: String,
        /// Optional underlying error that caused the failure
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The server process exited before it became available.
    #[error("child process died unexpectedly ({status})")]
    ServerExited {
        /// Exit status of the child
        status: ExitStatus,
    },

    /// Wraps transport errors from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MarkupError {
    /// Returns true if this error means nothing matched a selector.
    ///
    /// There is no optional selection mode; callers that treat absence as a
    /// valid outcome match on this.
    #[must_use]
    pub fn is_no_match(&self) -> bool {
        matches!(self, MarkupError::NoMatch { .. })
    }
}

/// The kind of query that produced an empty match set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Single descendant lookup
    Node,
    /// Multi descendant lookup
    Nodes,
    /// Direct-children lookup
    ChildNodes,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueryKind::Node => "node",
            QueryKind::Nodes => "nodes",
            QueryKind::ChildNodes => "child nodes",
        })
    }
}

/// A specialized Result type for markup operations.
pub type Result<T> = std::result::Result<T, MarkupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_names_selector_and_query() {
        let err = MarkupError::NoMatch {
            selector: "footer img".to_string(),
            query: QueryKind::ChildNodes,
        };
        assert_eq!(err.to_string(), "no matching child nodes for `footer img`");
        assert!(err.is_no_match());
    }

    #[test]
    fn component_property_message() {
        let err = MarkupError::InvalidComponentProperty("dummy".to_string());
        assert_eq!(err.to_string(), "invalid component property `dummy`");
        assert!(!err.is_no_match());
    }
}
