//! One page: the document plus the components bound to it.

use serde::Serialize;
use url::Url;

use super::NavSettings;
use super::document::Document;
use super::rebinder::{LifecycleRebinder, RebindReport};
use super::tracker::{ActiveRouteTracker, TrackedLink, Underline};

/// Where the navigation state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavPhase {
    #[default]
    Idle,
    Fetching,
    Swapping,
    Failed,
}

/// Page context shared by the navigator, tracker and rebinder.
#[derive(Debug, Clone)]
pub struct Page {
    pub document: Document,
    pub tracker: ActiveRouteTracker,
    pub rebinder: LifecycleRebinder,
    phase: NavPhase,
}

impl Page {
    pub fn new(document: Document, settings: &NavSettings) -> Self {
        Self {
            document,
            tracker: ActiveRouteTracker::new(settings.nav_links.clone()),
            rebinder: LifecycleRebinder::new(settings.clone()),
            phase: NavPhase::Idle,
        }
    }

    /// Rebind behaviour to the current content, then refresh highlighting.
    pub fn reinitialize(&mut self) -> RebindReport {
        let report = self.rebinder.rebind(&self.document);
        self.tracker.bind(&self.document);
        self.tracker.refresh(self.document.location());
        report
    }

    pub fn phase(&self) -> NavPhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: NavPhase) {
        if self.phase != phase {
            tracing::debug!("navigation phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    pub fn snapshot(&self) -> PageSnapshot {
        let history = self.document.history();
        PageSnapshot {
            location: self.document.location().to_string(),
            phase: self.phase,
            history: history.entries().iter().map(Url::to_string).collect(),
            history_index: history.index(),
            content_generation: self.document.content_generation(),
            content: self.document.content().to_string(),
            links: self.tracker.links().to_vec(),
            underline: self.tracker.underline(),
            observed: self.rebinder.reveal().observed_count(),
            tilt_bound: self.rebinder.tilt_count(),
            toggle_checked: self.rebinder.toggle_checked(&self.document),
            pending_location: self.document.pending_location().map(Url::to_string),
        }
    }
}

/// Serializable view of a page for hosts and tools.
#[derive(Debug, Clone, Serialize)]
pub struct PageSnapshot {
    pub location: String,
    pub phase: NavPhase,
    pub history: Vec<String>,
    pub history_index: usize,
    pub content_generation: u64,
    pub content: String,
    pub links: Vec<TrackedLink>,
    pub underline: Option<Underline>,
    pub observed: usize,
    pub tilt_bound: usize,
    pub toggle_checked: bool,
    pub pending_location: Option<String>,
}
