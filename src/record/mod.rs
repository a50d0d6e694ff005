//! Page records and the parameters they carry between runs

mod page;
mod params;

pub use page::{PageRecord, IMAGE_URL_KEY, PAGE_URL_KEY};
pub use params::{ParamValue, Params};
