//! Navigation-link harvesting.

use scraper::ElementRef;
use url::Url;

/// An anchor matched by the navigation-link selector.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HarvestedLink {
    /// Link text content
    pub text: String,
    /// href attribute as written
    pub href: String,
    /// href resolved against the document URL
    #[serde(serialize_with = "serialize_url")]
    pub target: Url,
}

impl HarvestedLink {
    /// Build a link from an anchor element, resolving its href against `base`.
    ///
    /// Returns `None` when the element has no href or the href does not resolve.
    pub fn from_element(element: ElementRef<'_>, base: &Url) -> Option<Self> {
        let href = element.value().attr("href")?.to_string();
        let target = base.join(href.trim()).ok()?;
        let text = element.text().collect::<Vec<_>>().join(" ").trim().to_string();
        let text = if text.is_empty() { "[link]".to_string() } else { text };
        Some(Self { text, href, target })
    }
}

fn serialize_url<S: serde::Serializer>(url: &Url, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(url.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn harvest(html: &str, selector: &str, base: &str) -> Vec<HarvestedLink> {
        let document = Html::parse_document(html);
        let selector = Selector::parse(selector).unwrap();
        let base = Url::parse(base).unwrap();
        document.select(&selector).filter_map(|e| HarvestedLink::from_element(e, &base)).collect()
    }

    #[test]
    fn test_harvest_nav_links() {
        let html = r#"
            <nav>
                <a class="nav-link" href="/">Home</a>
                <a class="nav-link" href="about.html">About</a>
            </nav>
            <main><a href="/works.html">Works</a></main>
        "#;

        let links = harvest(html, ".nav-link", "https://yunoxia.one/log.html");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].text, "Home");
        assert_eq!(links[0].target.as_str(), "https://yunoxia.one/");
        assert_eq!(links[1].href, "about.html");
        assert_eq!(links[1].target.as_str(), "https://yunoxia.one/about.html");
    }

    #[test]
    fn test_harvest_skips_missing_href() {
        let html = r#"<a class="nav-link">No href</a><a class="nav-link" href="/log.html"></a>"#;
        let links = harvest(html, ".nav-link", "https://yunoxia.one/");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text, "[link]");
    }

    #[test]
    fn test_unresolvable_href_skipped() {
        let base = Url::parse("https://yunoxia.one/").unwrap();
        let document = Html::parse_fragment(r#"<a href="http://[::1">Broken</a>"#);
        let anchor = document.select(&Selector::parse("a").unwrap()).next().unwrap();
        assert!(HarvestedLink::from_element(anchor, &base).is_none());
    }

    #[test]
    fn test_harvest_multiline_text() {
        let html = r#"<a class="nav-link" href="/">
            Line 1
            Line 2
        </a>"#;
        let links = harvest(html, ".nav-link", "https://yunoxia.one/");
        assert!(links[0].text.contains("Line 1"));
        assert!(links[0].text.contains("Line 2"));
    }
}
