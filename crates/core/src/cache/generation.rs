//! Versioned precache generations.

use serde::{Deserialize, Serialize};

use crate::AppConfig;

/// One versioned snapshot of the precache manifest.
///
/// A generation is created at worker install and superseded wholesale at
/// the next activation; it is never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheGeneration {
    prefix: String,
    version: String,
    manifest: Vec<String>,
}

impl CacheGeneration {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>, manifest: Vec<String>) -> Self {
        let mut manifest = manifest;
        let mut seen = std::collections::HashSet::new();
        manifest.retain(|path| seen.insert(path.clone()));

        Self { prefix: prefix.into(), version: version.into(), manifest }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.cache_prefix.clone(), config.cache_version.clone(), config.precache.clone())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Absolute paths written at install, without duplicates.
    pub fn manifest(&self) -> &[String] {
        &self.manifest
    }

    /// Store name for this generation, e.g. `yunoxia-v1.0.0`.
    pub fn store_name(&self) -> String {
        format!("{}{}", self.prefix, self.version)
    }

    /// Whether `name` is a store this application owns.
    pub fn owns(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_name() {
        let generation = CacheGeneration::new("yunoxia-", "v2", vec!["/".into()]);
        assert_eq!(generation.store_name(), "yunoxia-v2");
        assert_eq!(generation.version(), "v2");
    }

    #[test]
    fn test_manifest_deduplicated_in_order() {
        let generation =
            CacheGeneration::new("app-", "v1", vec!["/".into(), "/a.html".into(), "/".into(), "/b.css".into()]);
        assert_eq!(generation.manifest(), &["/", "/a.html", "/b.css"]);
    }

    #[test]
    fn test_owns() {
        let generation = CacheGeneration::from_config(&AppConfig::default());
        assert!(generation.owns("yunoxia-v0.9.0"));
        assert!(generation.owns("yunoxia-runtime"));
        assert!(!generation.owns("other-app-v1"));
    }
}
