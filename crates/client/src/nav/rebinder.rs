//! Re-establishing swap-sensitive behaviour after content replacement.
//!
//! Each rebind must leave every behaviour bound exactly once:
//! - reveal: the observer is rebuilt over the new content only
//! - tilt: a per-element guard makes re-running the initializer a no-op
//! - toggle: one subscription per target, replaced rather than stacked

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::NavSettings;
use super::document::{Document, ElementKey, Rect};

/// Maximum tilt rotation in degrees.
pub const MAX_TILT_DEGREES: f64 = 4.0;

const THEME_PREFERENCE: &str = "theme";

/// Fire-once intersection observer over reveal-eligible elements.
#[derive(Debug, Clone, Default)]
pub struct RevealObserver {
    observed: HashSet<ElementKey>,
    revealed: HashSet<ElementKey>,
}

impl RevealObserver {
    /// Disconnect, then observe every target not already revealed.
    pub fn connect(&mut self, targets: impl IntoIterator<Item = ElementKey>) {
        self.disconnect();
        for key in targets {
            if !self.revealed.contains(&key) {
                self.observed.insert(key);
            }
        }
    }

    pub fn disconnect(&mut self) {
        self.observed.clear();
    }

    /// `key` scrolled into view. Returns true the first time only.
    pub fn on_intersect(&mut self, key: ElementKey) -> bool {
        if self.observed.remove(&key) {
            self.revealed.insert(key);
            true
        } else {
            false
        }
    }

    pub fn is_observing(&self, key: ElementKey) -> bool {
        self.observed.contains(&key)
    }

    pub fn is_revealed(&self, key: ElementKey) -> bool {
        self.revealed.contains(&key)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    fn retain_revealed(&mut self, live: impl Fn(&ElementKey) -> bool) {
        self.revealed.retain(|key| live(key));
    }
}

/// Current rotation of a tilted element, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TiltState {
    pub rotate_x: f64,
    pub rotate_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Pen,
    Touch,
}

/// Pointer position in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
}

/// Handle for one toggle change handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Subscription(u64);

/// Counts from one rebind pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RebindReport {
    /// Elements now observed for reveal.
    pub observed: usize,
    /// Elements that received tilt handlers in this pass.
    pub tilt_initialized: usize,
    /// Tilted elements whose guard was dropped because they left the page.
    pub tilt_pruned: usize,
    /// Whether a new toggle subscription was created.
    pub toggle_subscribed: bool,
}

/// Owns every swap-sensitive binding for one page.
#[derive(Debug, Clone)]
pub struct LifecycleRebinder {
    settings: NavSettings,
    reveal: RevealObserver,
    tilted: HashMap<ElementKey, TiltState>,
    toggle_target: Option<ElementKey>,
    toggle_handlers: HashMap<ElementKey, Vec<Subscription>>,
    next_subscription: u64,
}

impl LifecycleRebinder {
    pub fn new(settings: NavSettings) -> Self {
        Self {
            settings,
            reveal: RevealObserver::default(),
            tilted: HashMap::new(),
            toggle_target: None,
            toggle_handlers: HashMap::new(),
            next_subscription: 0,
        }
    }

    /// Bind reveal, tilt and toggle behaviour to the current document.
    ///
    /// Running this twice without an intervening swap changes nothing.
    pub fn rebind(&mut self, doc: &Document) -> RebindReport {
        let view = doc.view();
        let mut report = RebindReport::default();

        let live: HashSet<ElementKey> = view.elements().map(|(key, _)| key).collect();
        self.reveal.retain_revealed(|key| live.contains(key));
        self.reveal.connect(view.select_content(&self.settings.reveal).map(|(key, _)| key));
        report.observed = self.reveal.observed_count();

        let before = self.tilted.len();
        self.tilted.retain(|key, _| live.contains(key));
        report.tilt_pruned = before - self.tilted.len();
        for (key, _) in view.select(&self.settings.tilt) {
            if let std::collections::hash_map::Entry::Vacant(slot) = self.tilted.entry(key) {
                slot.insert(TiltState::default());
                report.tilt_initialized += 1;
            }
        }

        let target = view.select(&self.settings.toggle).map(|(key, _)| key).next();
        self.toggle_handlers.retain(|key, _| Some(*key) == target);
        if let Some(key) = target {
            let handlers = self.toggle_handlers.entry(key).or_default();
            if handlers.is_empty() {
                self.next_subscription += 1;
                handlers.push(Subscription(self.next_subscription));
                report.toggle_subscribed = true;
            }
        }
        self.toggle_target = target;

        tracing::debug!(
            "rebind: observing {}, tilt +{} -{}, toggle {}",
            report.observed,
            report.tilt_initialized,
            report.tilt_pruned,
            if report.toggle_subscribed { "subscribed" } else { "unchanged" }
        );

        report
    }

    pub fn reveal(&self) -> &RevealObserver {
        &self.reveal
    }

    pub fn on_intersect(&mut self, key: ElementKey) -> bool {
        self.reveal.on_intersect(key)
    }

    pub fn is_tilt_bound(&self, key: ElementKey) -> bool {
        self.tilted.contains_key(&key)
    }

    pub fn tilt_count(&self) -> usize {
        self.tilted.len()
    }

    pub fn tilt(&self, key: ElementKey) -> Option<TiltState> {
        self.tilted.get(&key).copied()
    }

    /// Pointer moved over a tilt-bound element occupying `rect`.
    ///
    /// Touch pointers and unbound elements are ignored.
    pub fn on_pointer_move(&mut self, key: ElementKey, event: PointerEvent, rect: Rect) -> Option<TiltState> {
        if event.kind == PointerKind::Touch || rect.width <= 0.0 || rect.height <= 0.0 {
            return None;
        }
        let state = self.tilted.get_mut(&key)?;

        let dx = (event.x - rect.left) / rect.width - 0.5;
        let dy = (event.y - rect.top) / rect.height - 0.5;
        state.rotate_y = dx * MAX_TILT_DEGREES * 2.0;
        state.rotate_x = -dy * MAX_TILT_DEGREES * 2.0;
        Some(*state)
    }

    /// Pointer left or was cancelled.
    pub fn on_pointer_leave(&mut self, key: ElementKey) {
        if let Some(state) = self.tilted.get_mut(&key) {
            *state = TiltState::default();
        }
    }

    pub fn toggle_subscription(&self) -> Option<Subscription> {
        self.toggle_handlers(self.toggle_target?).first().copied()
    }

    /// Handlers bound to `target`.
    pub fn toggle_handlers(&self, target: ElementKey) -> &[Subscription] {
        self.toggle_handlers.get(&target).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether the toggle reflects the persisted preference.
    pub fn toggle_checked(&self, doc: &Document) -> bool {
        doc.preference(THEME_PREFERENCE) == Some("dark")
    }

    /// User changed the toggle. Returns the number of handlers that ran.
    pub fn dispatch_toggle(&self, doc: &mut Document, checked: bool) -> usize {
        let Some(target) = self.toggle_target else {
            return 0;
        };
        let handlers = self.toggle_handlers(target);
        let theme = if checked { "dark" } else { "light" };
        for subscription in handlers {
            doc.set_preference(THEME_PREFERENCE, theme);
            tracing::debug!("toggle {:?} persisted theme={}", subscription, theme);
        }
        handlers.len()
    }
}
