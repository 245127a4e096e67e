//! Link resolution and origin checks.

use url::Url;

/// Why an href cannot be followed in place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("hash-only link: {0}")]
    HashOnly(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("cross-origin URL: {0}")]
    CrossOrigin(String),
}

/// Resolve an href against the document URL.
///
/// Steps:
/// 1. Trim leading/trailing whitespace
/// 2. Reject empty and hash-only hrefs (in-page anchors)
/// 3. Resolve relative to `base`
/// 4. Accept only http and https
pub fn resolve(href: &str, base: &Url) -> Result<Url, UrlError> {
    let trimmed = href.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }
    if trimmed.starts_with('#') {
        return Err(UrlError::HashOnly(trimmed.to_string()));
    }

    let resolved = base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match resolved.scheme() {
        "http" | "https" => Ok(resolved),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

/// Resolve an href and require it to stay on the base origin.
pub fn resolve_same_origin(href: &str, base: &Url) -> Result<Url, UrlError> {
    let resolved = resolve(href, base)?;
    if same_origin(&resolved, base) { Ok(resolved) } else { Err(UrlError::CrossOrigin(resolved.to_string())) }
}

/// Scheme, host and port all match.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
