//! Content-container extraction from fetched documents.
//!
//! A navigation only uses the inner markup of the designated container
//! (default `main`) of the fetched document; everything outside it is
//! discarded.

pub mod links;

pub use links::HarvestedLink;

use pjax_core::Error;
use scraper::{Html, Selector};

/// Extract the inner markup of the first element matching `container`.
///
/// # Errors
///
/// Returns `Error::MalformedResponse` when the document has no such element.
pub fn extract_container(html: &str, container: &Selector) -> Result<String, Error> {
    let document = Html::parse_document(html);
    document
        .select(container)
        .next()
        .map(|element| element.inner_html())
        .ok_or_else(|| Error::MalformedResponse("content container not found in response".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn main_selector() -> Selector {
        Selector::parse("main").unwrap()
    }

    #[test]
    fn test_extract_container_inner_markup() {
        let html = r#"
            <!DOCTYPE html>
            <html>
            <head><title>About</title></head>
            <body>
                <nav><a class="nav-link" href="/">Home</a></nav>
                <main><h1>About</h1><p class="fade-in">Hello</p></main>
                <footer>footer</footer>
            </body>
            </html>
        "#;

        let markup = extract_container(html, &main_selector()).unwrap();
        assert_eq!(markup, r#"<h1>About</h1><p class="fade-in">Hello</p>"#);
    }

    #[test]
    fn test_extract_first_container_only() {
        let html = "<main><p>one</p></main><main><p>two</p></main>";
        let markup = extract_container(html, &main_selector()).unwrap();
        assert_eq!(markup, "<p>one</p>");
    }

    #[test]
    fn test_extract_empty_container() {
        let markup = extract_container("<main></main>", &main_selector()).unwrap();
        assert!(markup.is_empty());
    }

    #[test]
    fn test_extract_missing_container() {
        let result = extract_container("<html><body><p>no main</p></body></html>", &main_selector());
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn test_extract_custom_selector() {
        let selector = Selector::parse("#content").unwrap();
        let html = r#"<main>ignored</main><div id="content"><span>kept</span></div>"#;
        assert_eq!(extract_container(html, &selector).unwrap(), "<span>kept</span>");
    }
}
