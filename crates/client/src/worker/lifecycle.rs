//! Precache install, generation cleanup, and application cache clearing.

use std::sync::Arc;

use pjax_core::{CacheDb, CacheGeneration, Error};
use url::Url;

use crate::fetch::{FetchRequest, Fetcher, same_origin};

/// Installs and retires cache generations.
pub struct CacheLifecycleManager {
    storage: CacheDb,
    network: Arc<dyn Fetcher>,
    origin: Url,
}

impl CacheLifecycleManager {
    pub fn new(storage: CacheDb, network: Arc<dyn Fetcher>, origin: Url) -> Self {
        Self { storage, network, origin }
    }

    /// Fetch every manifest path and publish the generation's store.
    ///
    /// Nothing is written unless every path fetched successfully, so a failed
    /// install leaves storage exactly as it was. Returns the number of
    /// entries written.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailure` naming the first path that failed.
    pub async fn install(&self, generation: &CacheGeneration) -> Result<usize, Error> {
        let store = generation.store_name();
        tracing::info!("installing {} ({} paths)", store, generation.manifest().len());

        let mut entries = Vec::with_capacity(generation.manifest().len());
        for path in generation.manifest() {
            let url = self
                .origin
                .join(path)
                .map_err(|e| Error::InstallFailure(format!("{path}: {e}")))?;
            if !same_origin(&url, &self.origin) {
                return Err(Error::InstallFailure(format!("{path}: not on {}", self.origin)));
            }

            let request = FetchRequest::get(url);
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailure(format!("{path}: {e}")))?;
            if !response.is_success() {
                return Err(Error::InstallFailure(format!("{path}: status {}", response.status.as_u16())));
            }

            entries.push(response.to_cache_entry(&store, &request));
        }

        let count = entries.len();
        self.storage
            .publish_store(&store, entries)
            .await
            .map_err(|e| Error::InstallFailure(format!("publishing {store}: {e}")))?;

        tracing::info!("installed {} ({} entries)", store, count);
        Ok(count)
    }

    /// Delete every application store except the generation's own.
    ///
    /// Returns the names of the deleted stores.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailure` if the generation's store was never
    /// published; no store is deleted in that case.
    pub async fn activate(&self, generation: &CacheGeneration) -> Result<Vec<String>, Error> {
        let current = generation.store_name();
        if !self.storage.has_store(&current).await? {
            return Err(Error::InstallFailure(format!("{current} is not installed")));
        }

        let mut deleted = Vec::new();
        for name in self.storage.store_names().await? {
            if generation.owns(&name) && name != current && self.storage.delete_store(&name).await? {
                tracing::info!("deleted old cache {}", name);
                deleted.push(name);
            }
        }

        tracing::info!("activated {}", current);
        Ok(deleted)
    }

    /// Delete every store whose name starts with `prefix`.
    pub async fn clear_app_caches(&self, prefix: &str) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.storage.store_names().await? {
            if name.starts_with(prefix) && self.storage.delete_store(&name).await? {
                deleted.push(name);
            }
        }
        tracing::info!("cleared {} caches with prefix {}", deleted.len(), prefix);
        Ok(deleted)
    }

    pub fn storage(&self) -> &CacheDb {
        &self.storage
    }
}
