//! One headless browsing session: a page controlled by a worker registration.
//!
//! The session plays the browser's part: it performs the full-document
//! loads the navigator asks for and owns the single registration every
//! page request goes through.

use std::sync::Arc;

use pjax_client::nav::{NavSettings, NavigationOutcome, Navigator};
use pjax_client::worker::{Registration, ServiceWorker, WorkerSettings};
use pjax_client::{FetchClient, FetchConfig, Fetcher};
use pjax_core::{AppConfig, CacheDb, CacheGeneration, Error};
use serde::Serialize;
use url::Url;

/// Result of a full-document load performed after a failed navigation.
#[derive(Debug, Clone, Serialize)]
pub struct FullLoad {
    pub url: String,
    pub loaded: bool,
    pub error: Option<String>,
}

/// Worker registration state as reported to tools.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerSummary {
    pub controller: Option<String>,
    pub waiting: Option<String>,
    pub stores: Vec<String>,
}

pub struct Session {
    config: AppConfig,
    origin: Url,
    storage: CacheDb,
    registration: Arc<Registration>,
    navigator: Navigator,
}

impl Session {
    /// Open cache storage and the network client named by `config`.
    pub async fn start(config: AppConfig) -> Result<Self, Error> {
        let storage = CacheDb::open(&config.db_path).await?;
        let network = Arc::new(FetchClient::new(FetchConfig::from_config(&config))?);
        Self::with_parts(config, storage, network)
    }

    /// Assemble a session over existing storage and network.
    pub fn with_parts(config: AppConfig, storage: CacheDb, network: Arc<dyn Fetcher>) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let registration = Arc::new(Registration::new(storage.clone(), network, WorkerSettings::from_config(&config)?));
        let start = resolve_on(&origin, &config.start_path)?;
        let navigator = Navigator::new(registration.clone(), NavSettings::from_config(&config)?, start);

        Ok(Self { config, origin, storage, registration, navigator })
    }

    /// Register a worker for the configured cache generation.
    pub async fn install(&self) -> Result<Arc<ServiceWorker>, Error> {
        self.registration.register(CacheGeneration::from_config(&self.config)).await
    }

    pub fn start_url(&self) -> Result<Url, Error> {
        self.resolve(&self.config.start_path)
    }

    /// Resolve `input` against the site origin.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        resolve_on(&self.origin, input)
    }

    /// Perform the full-document load a failed navigation requested.
    ///
    /// The loaded document becomes a new history entry, as an assigned
    /// location does in a browser.
    pub async fn settle(&self, outcome: &NavigationOutcome) -> Option<FullLoad> {
        if !matches!(outcome, NavigationOutcome::FullReload { .. }) {
            return None;
        }
        let url = self.navigator.take_pending_location().await?;

        tracing::info!("full document load of {}", url);
        let result = self.navigator.follow_location(url.clone()).await;
        if let Err(e) = &result {
            tracing::warn!("full document load of {} failed: {}", url, e);
        }
        Some(FullLoad { url: url.to_string(), loaded: result.is_ok(), error: result.err().map(|e| e.to_string()) })
    }

    pub async fn worker_summary(&self) -> Result<WorkerSummary, Error> {
        let store = |worker: Option<Arc<ServiceWorker>>| worker.map(|w| w.generation().store_name());
        Ok(WorkerSummary {
            controller: store(self.registration.controller().await),
            waiting: store(self.registration.waiting().await),
            stores: self.storage.store_names().await?,
        })
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn registration(&self) -> &Arc<Registration> {
        &self.registration
    }

    pub fn storage(&self) -> &CacheDb {
        &self.storage
    }
}

fn resolve_on(origin: &Url, input: &str) -> Result<Url, Error> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("URL must not be empty".into()));
    }
    origin.join(trimmed).map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing;

    #[tokio::test]
    async fn test_install_and_open() {
        let session = testing::session().await;
        assert_eq!(session.worker_summary().await.unwrap().controller.as_deref(), Some("yunoxia-v1.0.0"));

        session.navigator().open(session.start_url().unwrap()).await.unwrap();
        let snapshot = session.navigator().snapshot().await;
        assert_eq!(snapshot.location, "https://yunoxia.one/");
    }

    #[tokio::test]
    async fn test_resolve() {
        let session = testing::session().await;
        assert_eq!(session.resolve("about.html").unwrap().as_str(), "https://yunoxia.one/about.html");
        assert_eq!(session.resolve("https://yunoxia.one/log.html").unwrap().path(), "/log.html");
        assert!(matches!(session.resolve("  "), Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_settle_performs_full_load() {
        let (session, fetcher) = testing::session_with_fetcher().await;
        session.navigator().open(session.start_url().unwrap()).await.unwrap();

        fetcher.set_route("/works.html", 200, "<p>no container</p>");
        let outcome = session.navigator().navigate(session.resolve("/works.html").unwrap(), true).await;
        let load = session.settle(&outcome).await.unwrap();

        assert_eq!(load.url, "https://yunoxia.one/works.html");
        assert!(!load.loaded);
        assert!(load.error.unwrap().contains("MALFORMED_RESPONSE"));
        assert_eq!(session.navigator().snapshot().await.location, "https://yunoxia.one/");
    }

    #[tokio::test]
    async fn test_offline_full_load_keeps_requested_location() {
        let (session, fetcher) = testing::session_with_fetcher().await;
        session.navigator().open(session.start_url().unwrap()).await.unwrap();

        fetcher.set_offline(true);
        let outcome = session.navigator().navigate(session.resolve("/notes.html").unwrap(), true).await;
        let load = session.settle(&outcome).await.unwrap();
        assert!(load.loaded);

        let snapshot = session.navigator().snapshot().await;
        assert_eq!(snapshot.location, "https://yunoxia.one/notes.html");
        assert_eq!(snapshot.history, vec!["https://yunoxia.one/", "https://yunoxia.one/notes.html"]);
        assert!(snapshot.content.contains("Home"));
        assert!(session.navigator().back().await.is_some());
    }

    #[tokio::test]
    async fn test_settle_ignores_swaps() {
        let session = testing::session().await;
        let outcome = NavigationOutcome::Swapped { url: "https://yunoxia.one/".into() };
        assert!(session.settle(&outcome).await.is_none());
    }
}
