//! Cache-first and network-first request handling.

use std::sync::Arc;

use pjax_core::cache::hash::compute_request_key;
use pjax_core::{CacheDb, Error, RequestClass, Strategy};
use reqwest::{Method, StatusCode};

use super::WorkerSettings;
use crate::fetch::{FetchRequest, FetchResponse, Fetcher, same_origin};

/// Serves intercepted requests from cache storage and the network.
pub struct CacheStrategyEngine {
    storage: CacheDb,
    network: Arc<dyn Fetcher>,
    settings: WorkerSettings,
}

impl CacheStrategyEngine {
    pub fn new(storage: CacheDb, network: Arc<dyn Fetcher>, settings: WorkerSettings) -> Self {
        Self { storage, network, settings }
    }

    /// Same-origin http(s) GETs are intercepted; everything else passes through.
    pub fn intercepts(&self, request: &FetchRequest) -> bool {
        request.method == Method::GET
            && matches!(request.url.scheme(), "http" | "https")
            && same_origin(&request.url, &self.settings.origin)
    }

    pub fn classify(&self, request: &FetchRequest) -> RequestClass {
        self.settings.classifier.classify(request.url.path())
    }

    /// Answer `request` with the strategy its class selects.
    pub async fn handle(&self, request: &FetchRequest) -> Result<FetchResponse, Error> {
        if !self.intercepts(request) {
            return self.network.fetch(request).await;
        }

        match self.classify(request).strategy() {
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
        }
    }

    /// Cached copy if present, otherwise the network. A hit never touches the network.
    pub async fn cache_first(&self, request: &FetchRequest) -> Result<FetchResponse, Error> {
        if let Some(cached) = self.lookup(request).await {
            tracing::debug!("cache hit: {}", request.url);
            return Ok(cached);
        }

        tracing::debug!("cache miss, fetching: {}", request.url);
        let response = self.network.fetch(request).await?;
        self.store(request, &response).await;
        Ok(response)
    }

    /// Network if reachable, then any cached copy, then the offline page
    /// for navigations.
    pub async fn network_first(&self, request: &FetchRequest) -> Result<FetchResponse, Error> {
        let error = match self.network.fetch(request).await {
            Ok(response) => {
                self.store(request, &response).await;
                return Ok(response);
            }
            Err(e) => e,
        };

        tracing::warn!("network failed, trying cache: {} ({})", request.url, error);
        if let Some(cached) = self.lookup(request).await {
            return Ok(cached);
        }

        if request.is_navigation()
            && let Some(offline) = self.offline_page(request).await
        {
            tracing::warn!("serving offline page for {}", request.url);
            return Ok(offline);
        }

        Err(error)
    }

    /// First match across every store, oldest first. Storage errors count as a miss.
    async fn lookup(&self, request: &FetchRequest) -> Option<FetchResponse> {
        let key = compute_request_key(request.method.as_str(), &request.url);
        match self.storage.match_any(&key).await {
            Ok(Some(entry)) => match FetchResponse::from_cache_entry(entry) {
                Ok(response) => Some(response),
                Err(e) => {
                    tracing::warn!("unreadable cache entry for {}: {}", request.url, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("cache lookup failed for {}: {}", request.url, e);
                None
            }
        }
    }

    /// Copy a 200 response into the runtime store. Failures are logged only.
    async fn store(&self, request: &FetchRequest, response: &FetchResponse) {
        if response.status != StatusCode::OK {
            return;
        }
        let entry = response.to_cache_entry(&self.settings.runtime_store, request);
        if let Err(e) = self.storage.put_entry(&entry).await {
            tracing::warn!("failed to cache {}: {}", request.url, e);
        }
    }

    /// The cached offline page, answering for `request`'s URL.
    async fn offline_page(&self, request: &FetchRequest) -> Option<FetchResponse> {
        let url = match self.settings.offline_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("offline page unavailable: {}", e);
                return None;
            }
        };
        let mut page = self.lookup(&FetchRequest::get(url)).await?;
        page.url = request.url.clone();
        page.final_url = request.url.clone();
        Some(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StubFetcher;
    use crate::worker::fixtures::{self, url};

    async fn engine(fetcher: Arc<StubFetcher>) -> (CacheStrategyEngine, CacheDb) {
        let db = CacheDb::open_in_memory().await.unwrap();
        (CacheStrategyEngine::new(db.clone(), fetcher, fixtures::settings()), db)
    }

    #[tokio::test]
    async fn test_intercepts_same_origin_get_only() {
        let (engine, _) = engine(Arc::new(StubFetcher::new())).await;

        assert!(engine.intercepts(&FetchRequest::get(url("/about.html"))));
        assert!(!engine.intercepts(&FetchRequest::get(url("/about.html")).with_method(Method::POST)));
        assert!(!engine.intercepts(&FetchRequest::get("https://fonts.example.com/a.woff2".parse().unwrap())));
        assert!(!engine.intercepts(&FetchRequest::get("http://yunoxia.one/about.html".parse().unwrap())));
    }

    #[tokio::test]
    async fn test_pass_through_is_not_cached() {
        let fetcher = Arc::new(StubFetcher::new().route("/api", 200, "ok"));
        let (engine, db) = engine(fetcher.clone()).await;

        let request = FetchRequest::get(url("/api")).with_method(Method::POST);
        let response = engine.handle(&request).await.unwrap();
        assert_eq!(response.text(), "ok");
        assert!(!db.has_store("yunoxia-runtime").await.unwrap());
    }

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let fetcher = Arc::new(StubFetcher::new().route("/assets/css/style.css", 200, "body{}"));
        let (engine, db) = engine(fetcher.clone()).await;
        let request = FetchRequest::get(url("/assets/css/style.css"));

        let first = engine.handle(&request).await.unwrap();
        assert!(first.cache_store.is_none());
        assert_eq!(db.entry_count("yunoxia-runtime").await.unwrap(), 1);

        let second = engine.handle(&request).await.unwrap();
        assert_eq!(second.cache_store.as_deref(), Some("yunoxia-runtime"));
        assert_eq!(second.text(), "body{}");
        assert_eq!(second.content_type.as_deref(), Some("text/css"));
        assert_eq!(fetcher.request_count("/assets/css/style.css"), 1);
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_failures() {
        let fetcher = Arc::new(StubFetcher::new());
        let (engine, db) = engine(fetcher.clone()).await;

        let response = engine.handle(&FetchRequest::get(url("/assets/js/missing.js"))).await.unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(!db.has_store("yunoxia-runtime").await.unwrap());

        engine.handle(&FetchRequest::get(url("/assets/js/missing.js"))).await.unwrap();
        assert_eq!(fetcher.request_count("/assets/js/missing.js"), 2);
    }

    #[tokio::test]
    async fn test_network_first_refreshes_cache() {
        let fetcher = Arc::new(StubFetcher::new().route("/about.html", 200, "v1"));
        let (engine, _) = engine(fetcher.clone()).await;
        let request = FetchRequest::get(url("/about.html"));

        engine.handle(&request).await.unwrap();
        fetcher.set_route("/about.html", 200, "v2");
        assert_eq!(engine.handle(&request).await.unwrap().text(), "v2");

        fetcher.set_offline(true);
        let cached = engine.handle(&request).await.unwrap();
        assert_eq!(cached.text(), "v2");
        assert_eq!(cached.cache_store.as_deref(), Some("yunoxia-runtime"));
    }

    #[tokio::test]
    async fn test_network_first_bad_status_keeps_cached_copy() {
        let fetcher = Arc::new(StubFetcher::new().route("/log.html", 200, "good"));
        let (engine, db) = engine(fetcher.clone()).await;
        let request = FetchRequest::get(url("/log.html"));
        engine.handle(&request).await.unwrap();

        fetcher.set_route("/log.html", 500, "oops");
        let response = engine.handle(&request).await.unwrap();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);

        let key = compute_request_key("GET", &url("/log.html"));
        let entry = db.match_entry("yunoxia-runtime", &key).await.unwrap().unwrap();
        assert_eq!(entry.body, b"good");
    }

    #[tokio::test]
    async fn test_offline_navigation_gets_offline_page() {
        let fetcher = Arc::new(StubFetcher::new().route("/index.html", 200, "<main>home</main>"));
        let (engine, _) = engine(fetcher.clone()).await;
        engine.handle(&FetchRequest::get(url("/index.html"))).await.unwrap();

        fetcher.set_offline(true);
        let response = engine.handle(&FetchRequest::navigate(url("/works.html"))).await.unwrap();
        assert_eq!(response.text(), "<main>home</main>");
        assert_eq!(response.url.path(), "/works.html");
        assert_eq!(response.final_url.path(), "/works.html");
    }

    #[tokio::test]
    async fn test_offline_subresource_propagates_failure() {
        let fetcher = Arc::new(StubFetcher::new().route("/index.html", 200, "<main>home</main>"));
        let (engine, _) = engine(fetcher.clone()).await;
        engine.handle(&FetchRequest::get(url("/index.html"))).await.unwrap();

        fetcher.set_offline(true);
        let result = engine.handle(&FetchRequest::get(url("/works.html"))).await;
        assert!(matches!(result, Err(Error::NetworkFailure(_))));

        let css = engine.handle(&FetchRequest::get(url("/assets/css/style.css"))).await;
        assert!(matches!(css, Err(Error::NetworkFailure(_))));
    }

    #[tokio::test]
    async fn test_offline_navigation_without_offline_page() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.set_offline(true);
        let (engine, _) = engine(fetcher).await;

        let result = engine.handle(&FetchRequest::navigate(url("/about.html"))).await;
        assert!(matches!(result, Err(Error::NetworkFailure(_))));
    }

    #[tokio::test]
    async fn test_fragment_is_network_first() {
        let fetcher = Arc::new(StubFetcher::new().route("/partials/header.html", 200, "<header>h</header>"));
        let (engine, _) = engine(fetcher.clone()).await;
        let request = FetchRequest::get(url("/partials/header.html"));
        assert_eq!(engine.classify(&request), RequestClass::PartialFragment);

        engine.handle(&request).await.unwrap();
        engine.handle(&request).await.unwrap();
        assert_eq!(fetcher.request_count("/partials/header.html"), 2);
    }
}
