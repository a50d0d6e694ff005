//! Crawler module for archive runs
//!
//! This module contains the run logic, including:
//! - HTTP fetching of listing pages and images, with retries for images
//! - Cookie files for sources behind a login
//! - HTML query helpers for page producers
//! - Walking a producer's chain of pages
//! - Overall run coordination

mod cookies;
mod coordinator;
mod fetcher;
mod parser;
mod walker;

pub use cookies::{load_cookie_jar, parse_netscape_cookies, CookieError, CookieLine, COOKIE_FILE_KEY};
pub use coordinator::{
    archive_pages, resolve_params, starting_sequence, ArchiveSettings, RunCoordinator, RunOptions,
    RunReport,
};
pub use fetcher::{build_http_client, FetchError, FetchResult, HttpFetcher, ImageSource};
pub use parser::{
    attr_link, has_class, parse_document, resolve_link, select_all, select_first, select_within,
};
pub use walker::{PageStream, PageWalker, StopFlag};
