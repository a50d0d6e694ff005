//! Comic hosting sites with `comicnav` navigation
//!
//! The strip is `img#comicimage`. The `rel=next` link stays on the newest page but is
//! greyed out with `comicnavlink-grayedout`. These hosts throttle aggressive clients,
//! hence the default delay.

use super::{PageExtract, PageProducer};
use crate::crawler::{attr_link, has_class, select_first};
use scraper::Html;
use std::time::Duration;
use url::Url;

pub struct ComicNav;

impl PageProducer for ComicNav {
    fn site(&self) -> &'static str {
        "comicnav"
    }

    fn extract(&self, page_url: &Url, document: &Html) -> PageExtract {
        let images = select_first(document, "img#comicimage")
            .and_then(|img| attr_link(img, "src", page_url))
            .into_iter()
            .collect();

        let next = select_first(document, r#"a[rel="next"]"#)
            .filter(|link| !has_class(*link, "comicnavlink-grayedout"))
            .and_then(|link| attr_link(link, "href", page_url));

        PageExtract { images, next }
    }

    fn default_delay(&self) -> Duration {
        Duration::from_millis(500)
    }
}
