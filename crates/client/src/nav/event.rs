//! Click events dispatched into the page.

use super::document::ElementKey;

/// A primary-button click on `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub target: ElementKey,
    default_prevented: bool,
}

impl ClickEvent {
    pub fn new(target: ElementKey) -> Self {
        Self { target, default_prevented: false }
    }

    /// Suppress the host's default handling (a full-document load).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
