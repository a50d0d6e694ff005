//! Webcomics serving the strip in a `<picture>` element
//!
//! Pages whose last path segment starts with `S` are interludes without a strip. The
//! "Next" link is an `a.lnk`; on the newest page it is rendered silver and ends the walk.

use super::{PageExtract, PageProducer};
use crate::crawler::{attr_link, select_all, select_first, select_within};
use scraper::Html;
use url::Url;

pub struct PictureStrip;

impl PictureStrip {
    fn is_interlude(page_url: &Url) -> bool {
        page_url
            .path()
            .rsplit('/')
            .next()
            .is_some_and(|segment| segment.starts_with('S'))
    }
}

impl PageProducer for PictureStrip {
    fn site(&self) -> &'static str {
        "picture-strip"
    }

    fn extract(&self, page_url: &Url, document: &Html) -> PageExtract {
        let images = if Self::is_interlude(page_url) {
            Vec::new()
        } else {
            select_first(document, "picture")
                .and_then(|picture| select_within(picture, "img"))
                .and_then(|img| attr_link(img, "src", page_url))
                .into_iter()
                .collect()
        };

        let next = select_all(document, "a.lnk")
            .into_iter()
            .find(|link| link.text().collect::<String>().contains("Next"))
            .filter(|link| !link.html().contains("silver"))
            .and_then(|link| attr_link(link, "href", page_url));

        PageExtract { images, next }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::parse_document;

    #[test]
    fn test_extracts_picture_and_next() {
        let page = Url::parse("https://strip.example.com/chapter1/page05").unwrap();
        let document = parse_document(
            r#"<picture><source srcset="/p/05.webp"><img src="/p/05.jpg"></picture>
               <a class="lnk" href="page04">Previous</a>
               <a class="lnk" href="page06">Next</a>"#,
        );

        let extract = PictureStrip.extract(&page, &document);
        assert_eq!(
            extract.images[0].as_str(),
            "https://strip.example.com/p/05.jpg"
        );
        assert_eq!(
            extract.next.unwrap().as_str(),
            "https://strip.example.com/chapter1/page06"
        );
    }

    #[test]
    fn test_interlude_page_has_no_image() {
        let page = Url::parse("https://strip.example.com/chapter1/Sketches").unwrap();
        let document = parse_document(
            r#"<picture><img src="/p/sketch.jpg"></picture>
               <a class="lnk" href="page07">Next</a>"#,
        );

        let extract = PictureStrip.extract(&page, &document);
        assert!(extract.images.is_empty());
        assert!(extract.next.is_some());
    }

    #[test]
    fn test_silver_next_ends_walk() {
        let page = Url::parse("https://strip.example.com/chapter1/page09").unwrap();
        let document = parse_document(
            r#"<picture><img src="/p/09.jpg"></picture>
               <a class="lnk" href="page10"><font color="silver">Next</font></a>"#,
        );

        let extract = PictureStrip.extract(&page, &document);
        assert_eq!(extract.images.len(), 1);
        assert!(extract.next.is_none());
    }
}
