//! Story-based webcomics with a title card
//!
//! A story's first page (`/<story>/` or `/<story>/1/`) shows a headline image in
//! `div#tt` before the strip itself; later pages (`/<story>/<n>/`) only show the strip.

use super::{PageExtract, PageProducer};
use crate::crawler::{attr_link, select_first, select_within};
use scraper::Html;
use url::Url;

pub struct HeadlineStrip;

impl HeadlineStrip {
    /// Whether the page opens a story
    fn is_story_start(page_url: &Url) -> bool {
        let parts: Vec<&str> = page_url.path().split('/').collect();
        // Segments enclosed by slashes on both sides
        let enclosed = if parts.len() > 2 {
            &parts[1..parts.len() - 1]
        } else {
            &[][..]
        };

        let mut numbered = enclosed
            .iter()
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .peekable();

        numbered.peek().is_none() || enclosed.contains(&"1")
    }
}

impl PageProducer for HeadlineStrip {
    fn site(&self) -> &'static str {
        "headline-strip"
    }

    fn extract(&self, page_url: &Url, document: &Html) -> PageExtract {
        let mut images = Vec::new();

        if Self::is_story_start(page_url) {
            if let Some(headline) = select_first(document, "div#tt")
                .and_then(|tt| select_within(tt, "img"))
                .and_then(|img| attr_link(img, "src", page_url))
            {
                images.push(headline);
            }
        }

        if let Some(strip) =
            select_first(document, "img#strip").and_then(|img| attr_link(img, "src", page_url))
        {
            images.push(strip);
        }

        let next = select_first(document, r#"a[rel="next"].button.next"#)
            .and_then(|link| attr_link(link, "href", page_url));

        PageExtract { images, next }
    }
}
