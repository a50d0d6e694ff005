//! HTML query helpers for page producers
//!
//! Site rules query parsed pages by tag, id, class and rel, and resolve the links they
//! find against the page's own URL.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Parses page text into a queryable document
pub fn parse_document(html: &str) -> Html {
    Html::parse_document(html)
}

/// Returns the first element matching a CSS selector
///
/// An invalid selector matches nothing.
pub fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

/// Returns every element matching a CSS selector, in document order
pub fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Returns the first descendant of `element` matching a CSS selector
pub fn select_within<'a>(element: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    element.select(&selector).next()
}

/// Checks whether an element carries a class
pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Resolves an element attribute holding a link (e.g., `src`, `href`)
pub fn attr_link(element: ElementRef<'_>, attr: &str, base_url: &Url) -> Option<Url> {
    element
        .value()
        .attr(attr)
        .and_then(|href| resolve_link(href, base_url))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/comic/page").unwrap()
    }

    #[test]
    fn test_resolve_absolute_link() {
        let url = resolve_link("https://other.com/a.png", &base_url()).unwrap();
        assert_eq!(url.as_str(), "https://other.com/a.png");
    }

    #[test]
    fn test_resolve_relative_links() {
        assert_eq!(
            resolve_link("/other", &base_url()).unwrap().as_str(),
            "https://example.com/other"
        );
        assert_eq!(
            resolve_link("next", &base_url()).unwrap().as_str(),
            "https://example.com/comic/next"
        );
        assert_eq!(
            resolve_link("//cdn.example.com/a.png", &base_url())
                .unwrap()
                .as_str(),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn test_skip_special_links() {
        for href in [
            "",
            "   ",
            "#top",
            "javascript:void(0)",
            "mailto:test@example.com",
            "tel:+1234567890",
            "data:image/png;base64,AAAA",
            "ftp://example.com/a.png",
        ] {
            assert!(resolve_link(href, &base_url()).is_none(), "{}", href);
        }
    }

    #[test]
    fn test_select_and_classes() {
        let document = parse_document(
            r#"<html><body>
                <div id="comic"><img src="/strip.png"></div>
                <a class="navi comic-nav-next" href="/comic/2">Next</a>
                <a class="navi" href="/comic/0">Prev</a>
            </body></html>"#,
        );

        let comic = select_first(&document, "div#comic").unwrap();
        let img = select_within(comic, "img").unwrap();
        assert_eq!(
            attr_link(img, "src", &base_url()).unwrap().as_str(),
            "https://example.com/strip.png"
        );

        let links = select_all(&document, "a.navi");
        assert_eq!(links.len(), 2);
        assert!(has_class(links[0], "comic-nav-next"));
        assert!(!has_class(links[1], "comic-nav-next"));
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let document = parse_document("<p>text</p>");
        assert!(select_first(&document, "p[").is_none());
        assert!(select_all(&document, "p[").is_empty());
    }
}
