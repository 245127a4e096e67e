//! Active navigation link tracking and underline placement.

use pjax_core::RouteKey;
use scraper::Selector;
use serde::Serialize;
use url::Url;

use super::document::{Document, ElementKey, Rect};
use crate::extract::HarvestedLink;

/// A navigation link and its highlight state.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedLink {
    pub key: ElementKey,
    pub link: HarvestedLink,
    pub route: RouteKey,
    pub active: bool,
    pub rect: Rect,
}

/// Indicator position relative to the navigation region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Underline {
    pub offset: f64,
    pub width: f64,
}

/// Marks the navigation link(s) whose target is the current page.
#[derive(Debug, Clone)]
pub struct ActiveRouteTracker {
    selector: Selector,
    links: Vec<TrackedLink>,
    nav_rect: Rect,
    underline: Option<Underline>,
    hovered: Option<usize>,
}

impl ActiveRouteTracker {
    pub fn new(selector: Selector) -> Self {
        Self { selector, links: Vec::new(), nav_rect: Rect::default(), underline: None, hovered: None }
    }

    /// Collect the live navigation links of `doc`.
    ///
    /// Layout already supplied for a link that is still live is kept.
    pub fn bind(&mut self, doc: &Document) {
        let view = doc.view();
        let base = doc.location();
        let links: Vec<TrackedLink> = view
            .select(&self.selector)
            .filter_map(|(key, element)| {
                let link = HarvestedLink::from_element(element, base)?;
                let route = RouteKey::from_url(&link.target);
                let rect = self.links.iter().find(|l| l.key == key).map(|l| l.rect).unwrap_or_default();
                Some(TrackedLink { key, link, route, active: false, rect })
            })
            .collect();

        tracing::debug!("tracking {} navigation links", links.len());
        self.links = links;
        self.hovered = None;
    }

    /// Mark exactly the links whose route matches `current`, then move the
    /// underline to the active link.
    pub fn refresh(&mut self, current: &Url) {
        let target = RouteKey::from_url(current);
        for link in &mut self.links {
            link.active = link.route == target;
        }
        self.underline = self.active_underline();
    }

    /// Supply the navigation region's box and each link's box, in link order.
    pub fn set_layout(&mut self, nav: Rect, rects: &[Rect]) {
        self.nav_rect = nav;
        for (link, rect) in self.links.iter_mut().zip(rects) {
            link.rect = *rect;
        }
        self.underline = self.active_underline();
    }

    pub fn on_resize(&mut self) {
        self.underline = self.active_underline();
    }

    /// Pointer entered link `index`.
    pub fn on_hover(&mut self, index: usize) {
        if let Some(link) = self.links.get(index) {
            self.hovered = Some(index);
            self.underline = Some(self.underline_for(link));
        }
    }

    /// Pointer left the navigation region.
    pub fn on_hover_exit(&mut self) {
        self.hovered = None;
        self.underline = self.active_underline();
    }

    pub fn links(&self) -> &[TrackedLink] {
        &self.links
    }

    pub fn active_links(&self) -> impl Iterator<Item = &TrackedLink> {
        self.links.iter().filter(|link| link.active)
    }

    pub fn underline(&self) -> Option<Underline> {
        self.underline
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    fn active_underline(&self) -> Option<Underline> {
        self.links.iter().find(|link| link.active).map(|link| self.underline_for(link))
    }

    fn underline_for(&self, link: &TrackedLink) -> Underline {
        Underline { offset: link.rect.left - self.nav_rect.left, width: link.rect.width }
    }
}
