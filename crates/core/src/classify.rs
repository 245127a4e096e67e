//! Request classification for the worker's fetch strategies.
//!
//! Every intercepted path maps to exactly one [`RequestClass`]; each class
//! maps to exactly one [`Strategy`].

use serde::{Deserialize, Serialize};

use crate::AppConfig;

/// What kind of resource a request path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    /// Stylesheets, scripts, images and fonts.
    StaticAsset,
    /// `/` or any page document.
    HtmlPage,
    /// Documents under the fragment directory.
    PartialFragment,
    Other,
}

/// How a request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
}

impl RequestClass {
    pub fn strategy(self) -> Strategy {
        match self {
            RequestClass::StaticAsset => Strategy::CacheFirst,
            RequestClass::HtmlPage | RequestClass::PartialFragment | RequestClass::Other => Strategy::NetworkFirst,
        }
    }
}

/// Path classifier.
///
/// Precedence: static extension, then fragment directory, then page document.
/// Extension matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    static_extensions: Vec<String>,
    fragment_dir: String,
    page_extension: String,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl Classifier {
    pub fn new(static_extensions: Vec<String>, fragment_dir: impl Into<String>) -> Self {
        Self { static_extensions, fragment_dir: fragment_dir.into(), page_extension: ".html".into() }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.static_extensions.clone(), config.fragment_dir.clone())
    }

    /// Classify a request path. Never fails; unmatched paths are `Other`.
    pub fn classify(&self, path: &str) -> RequestClass {
        if self.static_extensions.iter().any(|ext| path.ends_with(ext.as_str())) {
            RequestClass::StaticAsset
        } else if !self.fragment_dir.is_empty() && path.starts_with(&self.fragment_dir) {
            RequestClass::PartialFragment
        } else if path == "/" || path.ends_with(&self.page_extension) {
            RequestClass::HtmlPage
        } else {
            RequestClass::Other
        }
    }
}

/// Classify with the built-in extension list and fragment directory.
pub fn classify(path: &str) -> RequestClass {
    Classifier::default().classify(path)
}
