//! Page producers
//!
//! A page producer knows one site's layout: where the walk starts, which images a
//! page holds and where its "next" link points. The generic `PageWalker` drives a
//! producer along the next-link chain and turns its extractions into page records.
//!
//! # Components
//!
//! - `PageProducer`: the per-site extraction strategy
//! - `ProducerRegistry`: producers by site id
//! - Built-in site rules, one module each

mod comic_control;
mod comic_easel;
mod comicnav;
mod headline_strip;
mod lightbox;
mod multi_image;
mod picture_strip;
mod registry;

pub use comic_control::ComicControl;
pub use comic_easel::ComicEasel;
pub use comicnav::ComicNav;
pub use headline_strip::HeadlineStrip;
pub use lightbox::LightboxGallery;
pub use multi_image::MultiImage;
pub use picture_strip::PictureStrip;
pub use registry::ProducerRegistry;

use crate::record::{Params, PAGE_URL_KEY};
use crate::HoardError;
use scraper::Html;
use std::time::Duration;
use url::Url;

/// What a producer found on one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtract {
    /// Image locations in page order
    pub images: Vec<Url>,
    /// The page to visit next; `None` ends the walk
    pub next: Option<Url>,
}

/// Site-specific extraction strategy
pub trait PageProducer: Send + Sync {
    /// Site id the producer is registered under
    fn site(&self) -> &'static str;

    /// Parameters the producer assumes before configuration and resume state apply
    fn default_params(&self) -> Params {
        Params::new()
    }

    /// First page of the walk
    ///
    /// The default reads the `page_url` parameter.
    fn start_url(&self, params: &Params) -> Result<Url, HoardError> {
        let page_url = params
            .text(PAGE_URL_KEY)
            .ok_or_else(|| HoardError::MissingParam {
                site: self.site().to_string(),
                key: PAGE_URL_KEY.to_string(),
            })?;
        Ok(Url::parse(page_url)?)
    }

    /// Extracts images and the next link from a fetched page
    ///
    /// # Arguments
    ///
    /// * `page_url` - URL the page was served from, used to resolve relative links
    /// * `document` - The parsed page
    fn extract(&self, page_url: &Url, document: &Html) -> PageExtract;

    /// Whether records carry the page they were found on as `page_url`
    ///
    /// Single-page galleries return false so a resumed run starts from the
    /// configured gallery page again.
    fn carries_position(&self) -> bool {
        true
    }

    /// Politeness delay between page fetches
    fn default_delay(&self) -> Duration {
        Duration::ZERO
    }
}
