//! Worker registration: installing, waiting and active workers.
//!
//! ### Lifecycle
//! - `register` installs a new worker; a failed install makes it redundant
//!   and leaves the active worker serving.
//! - An installed worker waits until there is no controller, the
//!   registration skips waiting on install, or a `SKIP_WAITING` message
//!   arrives.
//! - Activation retires old generations and makes the worker the
//!   controller of every page fetching through the registration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pjax_core::{CacheDb, CacheGeneration, Error};
use serde::Serialize;
use tokio::sync::{RwLock, mpsc};

use super::WorkerSettings;
use super::lifecycle::CacheLifecycleManager;
use super::message::WorkerMessage;
use super::strategy::CacheStrategyEngine;
use crate::fetch::{FetchRequest, FetchResponse, Fetcher};

const MESSAGE_QUEUE: usize = 16;

/// Worker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Precache install in progress.
    Installing,
    /// Installed, waiting for activation.
    Installed,
    /// Retiring old generations.
    Activating,
    /// Controlling pages.
    Activated,
    /// Install failed or replaced.
    Redundant,
}

/// One worker generation.
pub struct ServiceWorker {
    id: u64,
    generation: CacheGeneration,
    engine: CacheStrategyEngine,
    state: Mutex<WorkerState>,
}

impl ServiceWorker {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn generation(&self) -> &CacheGeneration {
        &self.generation
    }

    pub fn engine(&self) -> &CacheStrategyEngine {
        &self.engine
    }

    pub fn state(&self) -> WorkerState {
        self.state.lock().map(|state| *state).unwrap_or(WorkerState::Redundant)
    }

    fn set_state(&self, state: WorkerState) {
        if let Ok(mut current) = self.state.lock() {
            tracing::debug!("worker {} ({}) {:?} -> {:?}", self.id, self.generation.version(), *current, state);
            *current = state;
        }
    }
}

impl std::fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("id", &self.id)
            .field("version", &self.generation.version())
            .field("state", &self.state())
            .finish()
    }
}

/// The worker container pages fetch through.
pub struct Registration {
    storage: CacheDb,
    network: Arc<dyn Fetcher>,
    settings: WorkerSettings,
    lifecycle: CacheLifecycleManager,
    waiting: RwLock<Option<Arc<ServiceWorker>>>,
    active: RwLock<Option<Arc<ServiceWorker>>>,
    next_id: AtomicU64,
}

impl Registration {
    pub fn new(storage: CacheDb, network: Arc<dyn Fetcher>, settings: WorkerSettings) -> Self {
        let lifecycle = CacheLifecycleManager::new(storage.clone(), network.clone(), settings.origin.clone());
        Self {
            storage,
            network,
            settings,
            lifecycle,
            waiting: RwLock::new(None),
            active: RwLock::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Install a worker for `generation`.
    ///
    /// On success the worker is waiting, or already active when nothing
    /// controlled the registration or skip-waiting-on-install is set.
    ///
    /// # Errors
    ///
    /// `Error::InstallFailure` if precaching failed; the worker is redundant.
    /// Activation errors are returned as-is with the worker left waiting.
    pub async fn register(&self, generation: CacheGeneration) -> Result<Arc<ServiceWorker>, Error> {
        let engine = CacheStrategyEngine::new(self.storage.clone(), self.network.clone(), self.settings.clone());
        let worker = Arc::new(ServiceWorker {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            generation,
            engine,
            state: Mutex::new(WorkerState::Installing),
        });

        if let Err(e) = self.lifecycle.install(worker.generation()).await {
            tracing::error!("worker {} install failed: {}", worker.id, e);
            worker.set_state(WorkerState::Redundant);
            return Err(e);
        }
        worker.set_state(WorkerState::Installed);

        if let Some(replaced) = self.waiting.write().await.replace(worker.clone()) {
            replaced.set_state(WorkerState::Redundant);
        }

        let uncontrolled = self.active.read().await.is_none();
        if uncontrolled || self.settings.skip_waiting_on_install {
            self.activate_waiting().await?;
        }

        Ok(worker)
    }

    /// Activate the waiting worker, if any, and make it the controller.
    pub async fn activate_waiting(&self) -> Result<Option<Arc<ServiceWorker>>, Error> {
        let Some(worker) = self.waiting.write().await.take() else {
            return Ok(None);
        };
        worker.set_state(WorkerState::Activating);

        if let Err(e) = self.lifecycle.activate(worker.generation()).await {
            tracing::error!("worker {} activation failed: {}", worker.id, e);
            let mut waiting = self.waiting.write().await;
            if waiting.is_none() {
                worker.set_state(WorkerState::Installed);
                *waiting = Some(worker);
            } else {
                worker.set_state(WorkerState::Redundant);
            }
            return Err(e);
        }

        if let Some(previous) = self.active.write().await.replace(worker.clone()) {
            previous.set_state(WorkerState::Redundant);
        }
        worker.set_state(WorkerState::Activated);
        tracing::info!("worker {} ({}) now controls pages", worker.id, worker.generation.store_name());

        Ok(Some(worker))
    }

    /// Handle a control message.
    pub async fn post_message(&self, message: WorkerMessage) -> Result<(), Error> {
        tracing::debug!("worker message {}", message.as_str());
        match message {
            WorkerMessage::SkipWaiting => {
                self.activate_waiting().await?;
            }
            WorkerMessage::ClearCache => {
                self.lifecycle.clear_app_caches(&self.settings.cache_prefix).await?;
            }
        }
        Ok(())
    }

    /// A channel whose messages are handled in order by a spawned task.
    ///
    /// The task ends when every sender is dropped.
    pub fn message_port(self: &Arc<Self>) -> mpsc::Sender<WorkerMessage> {
        let (tx, mut rx) = mpsc::channel(MESSAGE_QUEUE);
        let registration = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = registration.post_message(message).await {
                    tracing::warn!("worker message {} failed: {}", message.as_str(), e);
                }
            }
        });
        tx
    }

    pub async fn controller(&self) -> Option<Arc<ServiceWorker>> {
        self.active.read().await.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<ServiceWorker>> {
        self.waiting.read().await.clone()
    }

    pub fn storage(&self) -> &CacheDb {
        &self.storage
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }
}

#[async_trait]
impl Fetcher for Registration {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, Error> {
        let controller = self.active.read().await.clone();
        match controller {
            Some(worker) => worker.engine().handle(request).await,
            None => self.network.fetch(request).await,
        }
    }
}
