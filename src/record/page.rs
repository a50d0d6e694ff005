//! Page records yielded by producers and stored as resume state

use crate::record::params::{ParamValue, Params};
use serde::{Deserialize, Serialize};

/// Field every page record must carry
pub const IMAGE_URL_KEY: &str = "img_url";

/// Field linear producers use to record the page an image was found on
pub const PAGE_URL_KEY: &str = "page_url";

/// One scraped result yielded by a page producer
///
/// A record must hold an image location under [`IMAGE_URL_KEY`]. Any other fields are
/// opaque resume parameters: after the image is archived the whole record is stored
/// and overlaid on the producer's parameters at the start of the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageRecord {
    fields: Params,
}

impl PageRecord {
    /// Creates a record holding only an image location
    pub fn new(image_url: &str) -> Self {
        Self {
            fields: Params::new().with(IMAGE_URL_KEY, image_url),
        }
    }

    /// Wraps an arbitrary field set without checking it
    ///
    /// The image field is checked when the coordinator consumes the record.
    pub fn from_fields(fields: Params) -> Self {
        Self { fields }
    }

    /// Builder-style extra field
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.fields.insert(key, value);
        self
    }

    /// Returns the image location, if the record has a textual one
    pub fn image_url(&self) -> Option<&str> {
        self.fields.text(IMAGE_URL_KEY)
    }

    pub fn fields(&self) -> &Params {
        &self.fields
    }
}
