//! Webcomics that split one page over several images

use super::{PageExtract, PageProducer};
use crate::crawler::{attr_link, select_all, select_first};
use scraper::Html;
use url::Url;

pub struct MultiImage;

impl PageProducer for MultiImage {
    fn site(&self) -> &'static str {
        "multi-image"
    }

    fn extract(&self, page_url: &Url, document: &Html) -> PageExtract {
        let images = select_all(document, "div#one-comic-option img")
            .into_iter()
            .filter_map(|img| attr_link(img, "src", page_url))
            .collect();

        let next = select_first(document, "a.next-comic")
            .and_then(|link| attr_link(link, "href", page_url));

        PageExtract { images, next }
    }
}
