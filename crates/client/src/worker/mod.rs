//! Worker-context cache engine.
//!
//! A [`Registration`] sits between pages and the network. While a worker
//! is active every request from a page passes through its
//! [`CacheStrategyEngine`]; installs and activations go through the
//! [`CacheLifecycleManager`]. Pages never see which path served them.

pub mod lifecycle;
pub mod message;
pub mod registration;
pub mod strategy;

pub use lifecycle::CacheLifecycleManager;
pub use message::WorkerMessage;
pub use registration::{Registration, ServiceWorker, WorkerState};
pub use strategy::CacheStrategyEngine;

use pjax_core::{AppConfig, Classifier, Error};
use url::Url;

/// Settings shared by every worker of a registration.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Only requests to this origin are intercepted.
    pub origin: Url,
    /// Prefix of every store the application owns.
    pub cache_prefix: String,
    /// Unversioned store written on successful fetches.
    pub runtime_store: String,
    /// Absolute path served to failed navigations.
    pub offline_page: String,
    pub classifier: Classifier,
    pub skip_waiting_on_install: bool,
}

impl WorkerSettings {
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the configured origin does not parse.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            origin,
            cache_prefix: config.cache_prefix.clone(),
            runtime_store: config.runtime_cache.clone(),
            offline_page: config.offline_page.clone(),
            classifier: Classifier::from_config(config),
            skip_waiting_on_install: config.skip_waiting_on_install,
        })
    }

    /// Absolute URL of the offline page.
    pub fn offline_url(&self) -> Result<Url, Error> {
        self.origin
            .join(&self.offline_page)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.offline_page)))
    }
}
