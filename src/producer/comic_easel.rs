//! Comic Easel themed webcomics
//!
//! The strip sits in `div#comic`; the next link is `a.comic-nav-next`, which gains the
//! `comic-nav-void` class on the newest page.

use super::{PageExtract, PageProducer};
use crate::crawler::{attr_link, has_class, select_first, select_within};
use scraper::Html;
use url::Url;

pub struct ComicEasel;

impl PageProducer for ComicEasel {
    fn site(&self) -> &'static str {
        "comic-easel"
    }

    fn extract(&self, page_url: &Url, document: &Html) -> PageExtract {
        let images = select_first(document, "div#comic")
            .and_then(|comic| select_within(comic, "img"))
            .and_then(|img| attr_link(img, "src", page_url))
            .into_iter()
            .collect();

        let next = select_first(document, "a.comic-nav-next")
            .filter(|link| !has_class(*link, "comic-nav-void"))
            .and_then(|link| attr_link(link, "href", page_url));

        PageExtract { images, next }
    }
}
