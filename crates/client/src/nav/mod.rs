//! Document-context navigation engine.
//!
//! ### Pipeline
//! click → [`Navigator::intercept_click`] → fetch → container swap →
//! history push → [`LifecycleRebinder`] → [`ActiveRouteTracker`]
//!
//! ### Headless page
//! - [`Document`] keeps the shell and the swapped content as markup and
//!   parses on demand; elements are addressed by [`ElementKey`].
//! - Layout comes from the host as [`Rect`]s; nothing is measured.
//! - A failed navigation records a full-document location on the
//!   document; the host loads it with [`Navigator::open`].

pub mod document;
pub mod event;
pub mod navigator;
pub mod page;
pub mod rebinder;
pub mod tracker;

pub use document::{Document, DocumentView, ElementKey, History, Rect, Scope};
pub use event::ClickEvent;
pub use navigator::{NavigationOutcome, Navigator};
pub use page::{NavPhase, Page, PageSnapshot};
pub use rebinder::{LifecycleRebinder, PointerEvent, PointerKind, RebindReport, RevealObserver, Subscription, TiltState};
pub use tracker::{ActiveRouteTracker, TrackedLink, Underline};

use pjax_core::{AppConfig, Error};
use scraper::Selector;

/// Parsed selectors the document-context components work with.
#[derive(Debug, Clone)]
pub struct NavSettings {
    /// Content container swapped on navigation.
    pub container: Selector,
    /// Navigation links that carry the active marker.
    pub nav_links: Selector,
    /// Elements revealed once on intersection.
    pub reveal: Selector,
    /// Elements with pointer-driven tilt.
    pub tilt: Selector,
    /// Persisted preference toggle.
    pub toggle: Selector,
}

impl NavSettings {
    /// Parse every selector named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` naming the first selector that fails to parse.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self {
            container: parse_selector("container_selector", &config.container_selector)?,
            nav_links: parse_selector("nav_link_selector", &config.nav_link_selector)?,
            reveal: parse_selector("reveal_selector", &config.reveal_selector)?,
            tilt: parse_selector("tilt_selector", &config.tilt_selector)?,
            toggle: parse_selector("toggle_selector", &config.toggle_selector)?,
        })
    }
}

fn parse_selector(field: &str, selector: &str) -> Result<Selector, Error> {
    Selector::parse(selector).map_err(|e| Error::InvalidInput(format!("{field} '{selector}': {e}")))
}
