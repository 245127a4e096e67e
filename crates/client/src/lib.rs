//! Client code for pjax.
//!
//! This crate provides the fetch seam and HTTP client, container
//! extraction, the document-side navigation engine, and the worker-side
//! cache strategy engine.

pub mod extract;
pub mod fetch;
pub mod nav;
pub mod worker;

pub use extract::{HarvestedLink, extract_container};

pub use fetch::{FetchClient, FetchConfig, FetchRequest, FetchResponse, Fetcher, RequestMode};

pub use nav::{
    ActiveRouteTracker, ClickEvent, Document, ElementKey, History, LifecycleRebinder, NavPhase, NavSettings,
    NavigationOutcome, Navigator, Page, Rect,
};

pub use worker::{
    CacheLifecycleManager, CacheStrategyEngine, Registration, ServiceWorker, WorkerMessage, WorkerSettings,
    WorkerState,
};
