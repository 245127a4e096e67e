//! Click interception, content fetch, swap and history synchronization.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use pjax_core::Error;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use url::Url;

use super::NavSettings;
use super::document::Document;
use super::event::ClickEvent;
use super::page::{NavPhase, Page, PageSnapshot};
use super::rebinder::RebindReport;
use crate::extract::extract_container;
use crate::fetch::{FetchRequest, Fetcher, resolve_same_origin};

/// Terminal result of one navigation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    /// Content replaced; history updated if requested.
    Swapped { url: String },
    /// The engine gave up; the host must load `url` as a full document.
    FullReload { url: String, reason: String },
    /// A newer navigation started before this one's response arrived.
    Superseded { url: String },
}

impl NavigationOutcome {
    pub fn url(&self) -> &str {
        match self {
            Self::Swapped { url } | Self::FullReload { url, .. } | Self::Superseded { url } => url,
        }
    }

    pub fn is_swapped(&self) -> bool {
        matches!(self, Self::Swapped { .. })
    }
}

/// Drives navigations for one page.
///
/// The page lock is never held across a fetch. Every navigation takes a
/// ticket from a monotonically increasing counter; a response whose ticket
/// is no longer the latest is discarded.
pub struct Navigator {
    page: Mutex<Page>,
    fetcher: Arc<dyn Fetcher>,
    settings: NavSettings,
    latest: AtomicU64,
}

impl Navigator {
    /// A navigator over a blank page at `start`. Call [`Navigator::open`] to load it.
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: NavSettings, start: Url) -> Self {
        let page = Page::new(Document::blank(start, &settings.container), &settings);
        Self { page: Mutex::new(page), fetcher, settings, latest: AtomicU64::new(0) }
    }

    /// Load `url` as a full document and bind the page to it.
    ///
    /// History restarts at `url`; persisted preferences carry over. Any
    /// navigation still in flight is superseded.
    ///
    /// # Errors
    ///
    /// Network failures, non-success statuses and documents without a
    /// content container. The current page is left untouched.
    pub async fn open(&self, url: Url) -> Result<RebindReport, Error> {
        self.load(url, false).await
    }

    /// Load `url` as a full document the way an assigned location does:
    /// the new document becomes a history entry after the current one.
    ///
    /// # Errors
    ///
    /// Same as [`Navigator::open`].
    pub async fn follow_location(&self, url: Url) -> Result<RebindReport, Error> {
        self.load(url, true).await
    }

    async fn load(&self, url: Url, keep_history: bool) -> Result<RebindReport, Error> {
        let response = self.fetcher.fetch(&FetchRequest::navigate(url.clone())).await?;
        if !response.is_success() {
            return Err(Error::BadStatus(response.status.as_u16()));
        }
        let parsed = Document::parse(response.final_url.clone(), &response.text(), &self.settings.container)?;

        self.latest.fetch_add(1, Ordering::SeqCst);
        let mut page = self.page.lock().await;
        let mut document = parsed.with_preferences(page.document.preferences().clone());
        if keep_history {
            document = document.with_history_from(page.document.history());
        }
        *page = Page::new(document, &self.settings);
        let report = page.reinitialize();

        tracing::info!("opened {} ({} bytes)", response.final_url, response.bytes.len());
        Ok(report)
    }

    /// Handle a click. Returns `None` when the click is left to the host.
    ///
    /// Skipped: no enclosing anchor, an anchor with a `target`, an empty or
    /// hash-only href, and hrefs to another origin.
    pub async fn intercept_click(&self, event: &mut ClickEvent) -> Option<NavigationOutcome> {
        let target = {
            let page = self.page.lock().await;
            let view = page.document.view();
            let anchor = view.closest_anchor(event.target)?;

            if anchor.value().attr("target").is_some() {
                tracing::debug!("click left to host: anchor has a target");
                return None;
            }
            let href = anchor.value().attr("href")?;

            match resolve_same_origin(href, page.document.location()) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("click left to host: {}", e);
                    return None;
                }
            }
        };

        event.prevent_default();
        Some(self.navigate(target, true).await)
    }

    /// Fetch `url`, swap its container markup in, and optionally push history.
    pub async fn navigate(&self, url: Url, push_history: bool) -> NavigationOutcome {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut page = self.page.lock().await;
            page.set_phase(NavPhase::Fetching);
            page.tracker.refresh(&url);
        }

        let result = self.fetch_content(&url).await;

        let mut page = self.page.lock().await;
        if self.latest.load(Ordering::SeqCst) != ticket {
            tracing::debug!("discarding superseded response for {}", url);
            return NavigationOutcome::Superseded { url: url.to_string() };
        }

        match result {
            Ok(markup) => {
                page.set_phase(NavPhase::Swapping);
                page.document.replace_content(markup);
                if push_history {
                    page.document.push_history(url.clone());
                }
                page.reinitialize();
                page.set_phase(NavPhase::Idle);
                NavigationOutcome::Swapped { url: url.to_string() }
            }
            Err(e) => {
                tracing::warn!("navigation to {} failed, falling back to full load: {}", url, e);
                page.set_phase(NavPhase::Failed);
                page.document.assign_location(url.clone());
                NavigationOutcome::FullReload { url: url.to_string(), reason: e.to_string() }
            }
        }
    }

    /// The history cursor moved; load the document now at the current location.
    pub async fn handle_pop_state(&self) -> NavigationOutcome {
        let url = self.page.lock().await.document.location().clone();
        self.navigate(url, false).await
    }

    /// Step back in history. `None` at the first entry.
    pub async fn back(&self) -> Option<NavigationOutcome> {
        self.page.lock().await.document.history_back()?;
        Some(self.handle_pop_state().await)
    }

    /// Step forward in history. `None` at the last entry.
    pub async fn forward(&self) -> Option<NavigationOutcome> {
        self.page.lock().await.document.history_forward()?;
        Some(self.handle_pop_state().await)
    }

    /// Take the full-document load requested by a failed navigation.
    pub async fn take_pending_location(&self) -> Option<Url> {
        self.page.lock().await.document.take_pending_location()
    }

    pub async fn page(&self) -> MutexGuard<'_, Page> {
        self.page.lock().await
    }

    pub async fn snapshot(&self) -> PageSnapshot {
        self.page.lock().await.snapshot()
    }

    pub fn settings(&self) -> &NavSettings {
        &self.settings
    }

    async fn fetch_content(&self, url: &Url) -> Result<String, Error> {
        let request = FetchRequest::get(url.clone()).with_accept("text/html");
        let response = self.fetcher.fetch(&request).await?;
        if !response.is_success() {
            return Err(Error::BadStatus(response.status.as_u16()));
        }
        extract_container(&response.text(), &self.settings.container)
    }
}
