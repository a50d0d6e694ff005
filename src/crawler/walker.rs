//! Page walking
//!
//! `PageWalker` follows a producer's next-link chain one page at a time and hands out
//! the page records it finds. Pages are only fetched when the records of the previous
//! page have all been consumed, so a stopped run never fetches ahead.

use crate::crawler::parser::parse_document;
use crate::crawler::{FetchResult, HttpFetcher};
use crate::producer::PageProducer;
use crate::record::{PageRecord, PAGE_URL_KEY};
use crate::robots::RobotsGate;
use crate::HoardError;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A lazy sequence of page records
#[allow(async_fn_in_trait)]
pub trait PageStream {
    /// Returns the next record, or `None` once the source is exhausted
    async fn next_record(&mut self) -> Result<Option<PageRecord>, HoardError>;
}

/// Shared cancellation flag
///
/// Cloned into the Ctrl-C handler; runs check it between records and before every
/// page fetch.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives a producer along its chain of pages
pub struct PageWalker<'a> {
    producer: &'a dyn PageProducer,
    fetcher: &'a HttpFetcher,
    next_page: Option<Url>,
    visited: HashSet<Url>,
    pending: VecDeque<PageRecord>,
    delay: Duration,
    robots: Option<RobotsGate>,
    stop: StopFlag,
}

impl<'a> PageWalker<'a> {
    /// Creates a walker starting at `start`
    ///
    /// # Arguments
    ///
    /// * `producer` - Site rule extracting images and next links
    /// * `fetcher` - HTTP access shared with image downloads
    /// * `start` - First page to fetch
    /// * `delay` - Wait between page fetches
    /// * `stop` - Checked before every page fetch
    pub fn new(
        producer: &'a dyn PageProducer,
        fetcher: &'a HttpFetcher,
        start: Url,
        delay: Duration,
        stop: StopFlag,
    ) -> Self {
        Self {
            producer,
            fetcher,
            next_page: Some(start),
            visited: HashSet::new(),
            pending: VecDeque::new(),
            delay,
            robots: None,
            stop,
        }
    }

    /// Only fetches pages the host's robots.txt allows for `user_agent`
    pub fn with_robots(mut self, user_agent: &str) -> Self {
        self.robots = Some(RobotsGate::new(user_agent));
        self
    }

    /// Number of pages fetched so far
    pub fn pages_visited(&self) -> usize {
        self.visited.len()
    }

    /// Fetches the next page and queues its records
    ///
    /// Returns false when the walk is over.
    async fn advance(&mut self) -> bool {
        let Some(url) = self.next_page.take() else {
            return false;
        };

        if self.stop.is_stopped() {
            tracing::debug!("Stop requested, not fetching {}", url);
            return false;
        }

        if !self.visited.insert(url.clone()) {
            tracing::warn!("Next link loops back to {}, stopping", url);
            return false;
        }

        let mut delay = self.delay;
        if let Some(robots) = self.robots.as_mut() {
            if !robots.is_allowed(self.fetcher, &url).await {
                tracing::warn!("{} is disallowed by robots.txt, stopping", url);
                return false;
            }
            if let Some(crawl_delay) = robots.crawl_delay(self.fetcher, &url).await {
                delay = delay.max(crawl_delay);
            }
        }

        if self.visited.len() > 1 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        tracing::debug!("Fetching page {}", url);
        let (final_url, body) = match self.fetcher.fetch_page(&url).await {
            FetchResult::Success {
                final_url, body, ..
            } => (final_url, body),
            FetchResult::HttpError { status_code } => {
                tracing::warn!(
                    "Got status code {} for {}, may need session refresh",
                    status_code,
                    url
                );
                return false;
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Failed to fetch {}: {}", url, error);
                return false;
            }
        };

        // The parsed document is not Send and must not live across an await
        let extract = {
            let document = parse_document(&body);
            self.producer.extract(&final_url, &document)
        };

        if extract.images.is_empty() {
            tracing::debug!("No images on {}", url);
        }

        for image in extract.images {
            let mut record = PageRecord::new(image.as_str());
            if self.producer.carries_position() {
                record = record.with(PAGE_URL_KEY, url.as_str());
            }
            self.pending.push_back(record);
        }

        match extract.next {
            Some(next) => self.next_page = Some(next),
            None => tracing::info!("No next page after {}, source exhausted", url),
        }

        true
    }
}

impl PageStream for PageWalker<'_> {
    async fn next_record(&mut self) -> Result<Option<PageRecord>, HoardError> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Ok(Some(record));
            }
            if !self.advance().await {
                return Ok(None);
            }
        }
    }
}
