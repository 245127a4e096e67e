//! Fetch seam and HTTP client.
//!
//! ### The `Fetcher` seam
//! - Everything that issues a request (the navigator, the worker's
//!   strategies, the precache installer) goes through `Fetcher`.
//! - `FetchClient` is the network; a worker `Registration` wraps a
//!   network fetcher and is itself a `Fetcher`, so pages never know
//!   whether a worker is in control.
//!
//! ### Response handling
//! - Any HTTP status is a response; only transport failures are errors.
//! - Max body bytes: 5MB (configurable).
//! - Max redirects: 5

pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use pjax_core::{AppConfig, CacheEntry, Error};
use reqwest::{
    Client,
    header::{self, HeaderMap, HeaderName, HeaderValue},
};
use ::url::Url;

pub use self::url::{UrlError, resolve, resolve_same_origin, same_origin};
pub use reqwest::{Method, StatusCode};

/// Whether a request loads a whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Subresource or script-issued fetch.
    #[default]
    SameOrigin,
    /// Full-document navigation.
    Navigate,
}

/// A request handed to a [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub method: Method,
    pub mode: RequestMode,
    pub accept: Option<String>,
}

impl FetchRequest {
    /// A plain GET, as issued by page scripts.
    pub fn get(url: Url) -> Self {
        Self { url, method: Method::GET, mode: RequestMode::SameOrigin, accept: None }
    }

    /// A full-document navigation.
    pub fn navigate(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            mode: RequestMode::Navigate,
            accept: Some("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".into()),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
    /// Response headers
    pub headers: HeaderMap,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
    /// Store the response was served from, if it came from cache
    pub cache_store: Option<String>,
}

impl FetchResponse {
    /// 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Copy this response into a cache entry for `request`.
    pub fn to_cache_entry(&self, store: &str, request: &FetchRequest) -> CacheEntry {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
            .collect();

        CacheEntry::new(store, request.method.as_str(), &request.url, self.status.as_u16(), self.bytes.to_vec())
            .with_content_type(self.content_type.clone())
            .with_headers_json(serde_json::to_string(&headers).ok())
    }

    /// Rebuild a response from a cache entry.
    pub fn from_cache_entry(entry: CacheEntry) -> Result<Self, Error> {
        let url = Url::parse(&entry.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", entry.url)))?;
        let status = StatusCode::from_u16(entry.status)
            .map_err(|_| Error::MalformedResponse(format!("cached status {} for {}", entry.status, entry.url)))?;

        let mut headers = HeaderMap::new();
        let pairs: Vec<(String, String)> = entry
            .headers_json
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();
        for (name, value) in pairs {
            if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
                headers.append(name, value);
            }
        }

        Ok(Self {
            url: url.clone(),
            final_url: url,
            status,
            content_type: entry.content_type,
            bytes: Bytes::from(entry.body),
            headers,
            fetch_ms: 0,
            cache_store: Some(entry.store),
        })
    }
}

/// Anything that can answer a request.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issue `request`. Non-success statuses are returned as responses;
    /// an `Err` means no response was obtained.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "pjax/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "pjax/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// HTTP fetch client backed by reqwest.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::NetworkFailure(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetcher for FetchClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        let mut builder = self.http.request(request.method.clone(), request.url.as_str());
        if let Some(accept) = &request.accept {
            builder = builder.header(header::ACCEPT, accept.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::NetworkFailure(format!("timed out: {}", e))
            } else {
                Error::NetworkFailure(format!("network error: {}", e))
            }
        })?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::NetworkFailure(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} {} -> {} ({}) in {}ms ({} bytes)",
            request.method,
            request.url,
            final_url,
            status.as_u16(),
            fetch_ms,
            bytes.len()
        );

        Ok(FetchResponse {
            url: request.url.clone(),
            final_url,
            status,
            content_type,
            bytes,
            headers,
            fetch_ms,
            cache_store: None,
        })
    }
}
