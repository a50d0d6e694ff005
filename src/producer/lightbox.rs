//! Single-page lightbox galleries
//!
//! Every `.lb-link` anchor on the gallery page links a full-size image. The page is
//! usually behind a login, so sources set `cookie_filename`.

use super::{PageExtract, PageProducer};
use crate::crawler::{attr_link, select_all};
use scraper::Html;
use url::Url;

pub struct LightboxGallery;

impl PageProducer for LightboxGallery {
    fn site(&self) -> &'static str {
        "lightbox-gallery"
    }

    fn extract(&self, page_url: &Url, document: &Html) -> PageExtract {
        let images = select_all(document, ".lb-link[href]")
            .into_iter()
            .filter_map(|link| attr_link(link, "href", page_url))
            .collect();

        PageExtract { images, next: None }
    }

    fn carries_position(&self) -> bool {
        false
    }
}
