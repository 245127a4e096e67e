//! Route keys: the comparable form of a same-document URL.
//!
//! Two URLs that resolve to the same document normalize to the same key:
//! `/about/` and `/about/index.html`, `/` and `/index.html`. Query strings
//! and fragments never take part in the comparison.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

const INDEX_DOCUMENT: &str = "index.html";

/// A normalized absolute path used to compare navigation targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteKey(String);

impl RouteKey {
    /// Normalize `input` (absolute or relative) against `base`.
    ///
    /// Rules, in order:
    /// 1. resolve against `base`, dropping query and fragment
    /// 2. an empty path or `/` becomes `/index.html`
    /// 3. a path ending in `/` gets `index.html` appended
    /// 4. anything else passes through unchanged
    ///
    /// Input that cannot be resolved is treated as the base document itself.
    pub fn normalize(input: &str, base: &Url) -> Self {
        let resolved = base.join(input.trim()).unwrap_or_else(|_| base.clone());
        Self::from_url(&resolved)
    }

    /// Normalize an already-resolved URL.
    pub fn from_url(url: &Url) -> Self {
        let path = url.path();
        let key = if path.is_empty() || path == "/" {
            format!("/{INDEX_DOCUMENT}")
        } else if path.ends_with('/') {
            format!("{path}{INDEX_DOCUMENT}")
        } else {
            path.to_string()
        };
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
