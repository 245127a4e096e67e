//! Headless document: shell, swapped content, location and history.

use std::collections::BTreeMap;

use pjax_core::Error;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

const BLANK_SHELL: &str = "<!DOCTYPE html><html><head></head><body></body></html>";

/// Which parsed tree an element lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Markup outside the content container, fixed until the next full load.
    Shell,
    /// Content container markup of the given generation.
    Content(u64),
}

/// Stable address of an element within one document load.
///
/// The ordinal is the element's pre-order position in its tree. Content
/// keys stop resolving once the content they point into is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementKey {
    pub scope: Scope,
    pub ordinal: usize,
}

impl ElementKey {
    pub fn shell(ordinal: usize) -> Self {
        Self { scope: Scope::Shell, ordinal }
    }

    pub fn content(generation: u64, ordinal: usize) -> Self {
        Self { scope: Scope::Content(generation), ordinal }
    }

    pub fn is_content(&self) -> bool {
        matches!(self.scope, Scope::Content(_))
    }
}

/// Bounding box supplied by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }
}

/// Session history: URLs with a cursor.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Url>,
    index: usize,
}

impl History {
    pub fn new(initial: Url) -> Self {
        Self { entries: vec![initial], index: 0 }
    }

    /// Push `url` after the cursor, dropping any forward entries.
    pub fn push(&mut self, url: Url) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url);
        self.index = self.entries.len() - 1;
    }

    pub fn back(&mut self) -> Option<&Url> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    pub fn forward(&mut self) -> Option<&Url> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    pub fn current(&self) -> Option<&Url> {
        self.entries.get(self.index)
    }

    pub fn entries(&self) -> &[Url] {
        &self.entries
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The page as the document context sees it.
#[derive(Debug, Clone)]
pub struct Document {
    location: Url,
    history: History,
    shell: String,
    content: String,
    content_generation: u64,
    container: Selector,
    pending_location: Option<Url>,
    preferences: BTreeMap<String, String>,
}

impl Document {
    /// An empty document at `location` with no content container.
    pub fn blank(location: Url, container: &Selector) -> Self {
        let history = History::new(location.clone());
        Self {
            location,
            history,
            shell: BLANK_SHELL.to_string(),
            content: String::new(),
            content_generation: 0,
            container: container.clone(),
            pending_location: None,
            preferences: BTreeMap::new(),
        }
    }

    /// Parse a full document loaded at `location`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedResponse` when `html` has no element matching `container`.
    pub fn parse(location: Url, html: &str, container: &Selector) -> Result<Self, Error> {
        let content = crate::extract::extract_container(html, container)?;
        let history = History::new(location.clone());
        Ok(Self {
            location,
            history,
            shell: html.to_string(),
            content,
            content_generation: 0,
            container: container.clone(),
            pending_location: None,
            preferences: BTreeMap::new(),
        })
    }

    /// Continue `previous` history with this document's location as a new entry.
    pub fn with_history_from(mut self, previous: &History) -> Self {
        let mut history = previous.clone();
        history.push(self.location.clone());
        self.history = history;
        self
    }

    /// Carry persisted preferences over from a previous load.
    pub fn with_preferences(mut self, preferences: BTreeMap<String, String>) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_generation(&self) -> u64 {
        self.content_generation
    }

    /// Replace the content container's markup wholesale.
    pub fn replace_content(&mut self, markup: String) {
        self.content = markup;
        self.content_generation += 1;
    }

    /// Push a history entry and move the location to it.
    pub fn push_history(&mut self, url: Url) {
        self.history.push(url.clone());
        self.location = url;
    }

    /// Move the history cursor back; the location follows it.
    pub fn history_back(&mut self) -> Option<Url> {
        let url = self.history.back()?.clone();
        self.location = url.clone();
        Some(url)
    }

    pub fn history_forward(&mut self) -> Option<Url> {
        let url = self.history.forward()?.clone();
        self.location = url.clone();
        Some(url)
    }

    /// Request a full-document load of `url`.
    pub fn assign_location(&mut self, url: Url) {
        self.pending_location = Some(url);
    }

    pub fn pending_location(&self) -> Option<&Url> {
        self.pending_location.as_ref()
    }

    pub fn take_pending_location(&mut self) -> Option<Url> {
        self.pending_location.take()
    }

    pub fn preference(&self, key: &str) -> Option<&str> {
        self.preferences.get(key).map(String::as_str)
    }

    pub fn set_preference(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.preferences.insert(key.into(), value.into());
    }

    pub fn preferences(&self) -> &BTreeMap<String, String> {
        &self.preferences
    }

    /// Parse the current markup for reading.
    pub fn view(&self) -> DocumentView {
        DocumentView {
            shell: Html::parse_document(&self.shell),
            content: Html::parse_fragment(&self.content),
            generation: self.content_generation,
            container: self.container.clone(),
        }
    }

    pub fn is_live(&self, key: ElementKey) -> bool {
        self.view().get(key).is_some()
    }
}

/// Parsed snapshot of a [`Document`].
///
/// Not `Send`; build one, read from it, and drop it before awaiting.
pub struct DocumentView {
    shell: Html,
    content: Html,
    generation: u64,
    container: Selector,
}

impl DocumentView {
    /// Every live element: shell elements outside the container, then
    /// the current content.
    pub fn elements(&self) -> impl Iterator<Item = (ElementKey, ElementRef<'_>)> + '_ {
        let container = self.shell.select(&self.container).next().map(|element| element.id());

        let shell = self
            .shell
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .enumerate()
            .filter(move |(_, element)| match container {
                Some(id) => !element.ancestors().any(|ancestor| ancestor.id() == id),
                None => true,
            })
            .map(|(ordinal, element)| (ElementKey::shell(ordinal), element));

        let generation = self.generation;
        // ordinal 0 is the fragment's synthetic root
        let content = self
            .content
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .enumerate()
            .skip(1)
            .map(move |(ordinal, element)| (ElementKey::content(generation, ordinal), element));

        shell.chain(content)
    }

    /// Content elements only.
    pub fn content_elements(&self) -> impl Iterator<Item = (ElementKey, ElementRef<'_>)> + '_ {
        self.elements().filter(|(key, _)| key.is_content())
    }

    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = (ElementKey, ElementRef<'a>)> + 'a {
        self.elements().filter(move |(_, element)| selector.matches(element))
    }

    pub fn select_content<'a>(
        &'a self, selector: &'a Selector,
    ) -> impl Iterator<Item = (ElementKey, ElementRef<'a>)> + 'a {
        self.content_elements().filter(move |(_, element)| selector.matches(element))
    }

    pub fn get(&self, key: ElementKey) -> Option<ElementRef<'_>> {
        self.elements().find(|(k, _)| *k == key).map(|(_, element)| element)
    }

    /// Key of a live element, looked up by node identity.
    pub fn key_of(&self, element: ElementRef<'_>) -> Option<ElementKey> {
        self.elements().find(|(_, e)| e.id() == element.id()).map(|(key, _)| key)
    }

    /// The element itself if it is an anchor, otherwise its nearest anchor ancestor.
    pub fn closest_anchor(&self, key: ElementKey) -> Option<ElementRef<'_>> {
        let element = self.get(key)?;
        std::iter::once(element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .find(|e| e.value().name() == "a")
    }

    /// First live anchor whose href is exactly `href`, preferring content.
    pub fn find_link(&self, href: &str) -> Option<ElementKey> {
        let mut anchors = self
            .elements()
            .filter(|(_, e)| e.value().name() == "a" && e.value().attr("href") == Some(href))
            .map(|(key, _)| key);
        let first = anchors.next()?;
        if first.is_content() {
            return Some(first);
        }
        Some(anchors.find(ElementKey::is_content).unwrap_or(first))
    }

    /// First live element with the given `id` attribute.
    pub fn find_by_id(&self, id: &str) -> Option<ElementKey> {
        self.elements().find(|(_, e)| e.value().id() == Some(id)).map(|(key, _)| key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::fixtures::{self, url};

    fn home() -> Document {
        Document::parse(url("/index.html"), &fixtures::home(), &fixtures::settings().container).unwrap()
    }

    #[test]
    fn test_history_push_truncates_forward() {
        let mut history = History::new(url("/"));
        history.push(url("/about.html"));
        history.push(url("/works.html"));
        assert_eq!(history.back().unwrap().path(), "/about.html");
        history.push(url("/log.html"));

        let paths: Vec<_> = history.entries().iter().map(Url::path).collect();
        assert_eq!(paths, vec!["/", "/about.html", "/log.html"]);
        assert_eq!(history.index(), 2);
        assert!(history.forward().is_none());
    }

    #[test]
    fn test_history_back_at_start() {
        let mut history = History::new(url("/"));
        assert!(history.back().is_none());
        assert_eq!(history.current().unwrap().path(), "/");
    }

    #[test]
    fn test_parse_splits_shell_and_content() {
        let doc = home();
        assert!(doc.content().contains("Welcome"));
        assert_eq!(doc.content_generation(), 0);
        assert_eq!(doc.history().len(), 1);
    }

    #[test]
    fn test_parse_missing_container() {
        let result = Document::parse(url("/"), "<p>no main</p>", &fixtures::settings().container);
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn test_view_hides_original_container_children() {
        let doc = home();
        let view = doc.view();
        let headings: Vec<_> = view
            .elements()
            .filter(|(_, e)| e.value().name() == "h1")
            .map(|(key, _)| key)
            .collect();
        assert_eq!(headings.len(), 1);
        assert!(headings[0].is_content());

        // the container itself stays in the shell
        assert!(view.elements().any(|(key, e)| e.value().name() == "main" && !key.is_content()));
    }

    #[test]
    fn test_replace_content_retires_old_keys() {
        let mut doc = home();
        let old = doc.view().find_by_id("to-about").unwrap();
        assert!(doc.is_live(old));

        doc.replace_content(r#"<a id="to-about" href="about.html">About</a>"#.into());
        assert_eq!(doc.content_generation(), 1);
        assert!(!doc.is_live(old));

        let new = doc.view().find_by_id("to-about").unwrap();
        assert_eq!(new.scope, Scope::Content(1));
    }

    #[test]
    fn test_shell_keys_survive_swap() {
        let mut doc = home();
        let toggle = doc.view().find_by_id("theme-toggle").unwrap();
        doc.replace_content("<p>new</p>".into());
        assert!(doc.is_live(toggle));
    }

    #[test]
    fn test_closest_anchor_from_child() {
        let doc = home();
        let view = doc.view();
        let label = view.find_by_id("about-label").unwrap();
        let anchor = view.closest_anchor(label).unwrap();
        assert_eq!(anchor.value().attr("href"), Some("about.html"));
        assert_eq!(view.key_of(anchor), view.find_by_id("to-about"));
    }

    #[test]
    fn test_closest_anchor_none() {
        let doc = home();
        let view = doc.view();
        let heading = view.select(&Selector::parse("h1").unwrap()).next().unwrap().0;
        assert!(view.closest_anchor(heading).is_none());
    }

    #[test]
    fn test_find_link_prefers_content() {
        let doc = home();
        let view = doc.view();
        let key = view.find_link("about.html").unwrap();
        assert!(key.is_content());

        let nav_only = view.find_link("log.html").unwrap();
        assert_eq!(nav_only.scope, Scope::Shell);
        assert!(view.find_link("missing.html").is_none());
    }

    #[test]
    fn test_history_navigation_moves_location() {
        let mut doc = home();
        doc.push_history(url("/about.html"));
        assert_eq!(doc.location().path(), "/about.html");

        assert_eq!(doc.history_back().unwrap().path(), "/index.html");
        assert_eq!(doc.location().path(), "/index.html");
        assert_eq!(doc.history_forward().unwrap().path(), "/about.html");
        assert!(doc.history_forward().is_none());
    }

    #[test]
    fn test_pending_location() {
        let mut doc = Document::blank(url("/"), &fixtures::settings().container);
        assert!(doc.pending_location().is_none());
        doc.assign_location(url("/about.html"));
        assert_eq!(doc.take_pending_location().unwrap().path(), "/about.html");
        assert!(doc.take_pending_location().is_none());
    }

    #[test]
    fn test_blank_has_no_content() {
        let doc = Document::blank(url("/"), &fixtures::settings().container);
        let view = doc.view();
        assert_eq!(view.content_elements().count(), 0);
        assert!(view.elements().any(|(_, e)| e.value().name() == "body"));
    }

    #[test]
    fn test_preferences() {
        let mut doc = home();
        assert!(doc.preference("theme").is_none());
        doc.set_preference("theme", "dark");
        let reloaded = Document::blank(url("/"), &fixtures::settings().container)
            .with_preferences(doc.preferences().clone());
        assert_eq!(reloaded.preference("theme"), Some("dark"));
    }
}
