//! cache_lookup tool implementation.
//!
//! Retrieves the cached response for a GET request, from one store or from
//! whichever store the worker would answer with.

use pjax_core::cache::hash::compute_request_key;
use pjax_core::{CacheEntry, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;
use crate::session::Session;

/// Parameters for the cache_lookup tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheLookupParams {
    /// Path or absolute URL of the cached request.
    pub url: String,

    /// Only look in this store. Defaults to the first store holding a match.
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_lookup tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheLookupOutput {
    pub store: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub cached_at: String,
    pub body_bytes: usize,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
}

impl From<CacheEntry> for CacheLookupOutput {
    fn from(entry: CacheEntry) -> Self {
        Self {
            body_bytes: entry.body.len(),
            body: String::from_utf8_lossy(&entry.body).into_owned(),
            store: entry.store,
            url: entry.url,
            status: entry.status,
            content_type: entry.content_type,
            cached_at: entry.cached_at,
        }
    }
}

/// Implementation of the cache_lookup tool.
pub async fn lookup_impl(session: &Session, params: CacheLookupParams) -> Result<CallToolResult, McpError> {
    let url = session.resolve(&params.url)?;
    let key = compute_request_key("GET", &url);

    let entry = match params.store.as_deref() {
        Some(store) => session.storage().match_entry(store, &key).await?,
        None => session.storage().match_any(&key).await?,
    }
    .ok_or_else(|| Error::CacheMiss(url.to_string()))?;

    json_result(&CacheLookupOutput::from(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{self, json};

    fn lookup(url: &str, store: Option<&str>) -> CacheLookupParams {
        CacheLookupParams { url: url.to_string(), store: store.map(String::from) }
    }

    #[tokio::test]
    async fn test_lookup_impl_missing() {
        let session = testing::session().await;
        let result = lookup_impl(&session, lookup("/missing.png", None)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_lookup_impl_precached() {
        let session = testing::session().await;
        let output = json(&lookup_impl(&session, lookup("/assets/css/style.css", None)).await.unwrap());

        assert_eq!(output["store"], "yunoxia-v1.0.0");
        assert_eq!(output["url"], "https://yunoxia.one/assets/css/style.css");
        assert_eq!(output["status"], 200);
        assert_eq!(output["body"], "/* /assets/css/style.css */");
        assert_eq!(output["body_bytes"], 27);
    }

    #[tokio::test]
    async fn test_lookup_impl_named_store() {
        let session = testing::session().await;
        let result = lookup_impl(&session, lookup("/about.html", Some("yunoxia-runtime"))).await;
        assert!(result.is_err());

        let output = json(&lookup_impl(&session, lookup("about.html", Some("yunoxia-v1.0.0"))).await.unwrap());
        assert!(output["body"].as_str().unwrap().contains("<main>"));
    }

    #[tokio::test]
    async fn test_lookup_impl_runtime_entry() {
        let session = testing::session().await;
        let url = session.resolve("/assets/img/new.png").unwrap();
        let entry = CacheEntry::new("yunoxia-runtime", "GET", &url, 200, vec![0x89, 0x50]);
        session.storage().put_entry(&entry).await.unwrap();

        let output = json(&lookup_impl(&session, lookup("/assets/img/new.png", None)).await.unwrap());
        assert_eq!(output["store"], "yunoxia-runtime");
        assert_eq!(output["body_bytes"], 2);
    }
}
