//! Minimal HTTP helpers for fetching documents and probing servers.

use crate::error::{MarkupError, Result};
use reqwest::{Method, Response};
use tracing::debug;

/// Fetches `uri` with GET and returns the full response body as text.
///
/// # Errors
///
/// Returns `UnrecognizedUri` for non-HTTP URIs, `UnexpectedStatus` for
/// statuses outside 200-299 and `Http` for transport failures.
pub async fn fetch(uri: &str) -> Result<String> {
    let response = request(Method::GET, uri).await?;
    Ok(response.text().await?)
}

/// Issues a HEAD request against `uri`.
///
/// # Errors
///
/// Same as [`fetch`].
pub async fn head(uri: &str) -> Result<()> {
    request(Method::HEAD, uri).await?;
    Ok(())
}

async fn request(method: Method, uri: &str) -> Result<Response> {
    if !(uri.starts_with("http://") || uri.starts_with("https://")) {
        return Err(MarkupError::UnrecognizedUri(uri.to_string()));
    }

    debug!(%method, uri, "sending request");
    let client = reqwest::Client::builder().build()?;
    let response = client.request(method, uri).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(MarkupError::UnexpectedStatus {
            status: status.as_u16(),
            uri: uri.to_string(),
        });
    }
    Ok(response)
}
