//! ComicControl powered webcomics

use super::{PageExtract, PageProducer};
use crate::crawler::{attr_link, select_first};
use scraper::Html;
use url::Url;

pub struct ComicControl;

impl PageProducer for ComicControl {
    fn site(&self) -> &'static str {
        "comic-control"
    }

    fn extract(&self, page_url: &Url, document: &Html) -> PageExtract {
        let images = select_first(document, "img#cc-comic")
            .and_then(|img| attr_link(img, "src", page_url))
            .into_iter()
            .collect();

        let next = select_first(document, r#"a[rel="next"]"#)
            .and_then(|link| attr_link(link, "href", page_url));

        PageExtract { images, next }
    }
}
