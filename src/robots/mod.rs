//! Robots.txt handling module
//!
//! When enabled, listing pages are only fetched if the host's robots.txt allows them,
//! and the host's `Crawl-delay` lengthens the delay between page fetches.

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::{FetchResult, HttpFetcher};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Per-run robots.txt cache, one entry per host
pub struct RobotsGate {
    user_agent: String,
    by_host: HashMap<String, ParsedRobots>,
}

impl RobotsGate {
    /// Creates a gate matching rules for `user_agent` (the product token, not the full header)
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            by_host: HashMap::new(),
        }
    }

    /// Checks whether `url` may be fetched, fetching the host's robots.txt on first use
    pub async fn is_allowed(&mut self, fetcher: &HttpFetcher, url: &Url) -> bool {
        let key = self.load(fetcher, url).await;
        self.by_host
            .get(&key)
            .map_or(true, |robots| robots.is_allowed(url.as_str(), &self.user_agent))
    }

    /// Returns the crawl delay for `url`'s host, if its robots.txt sets one
    pub async fn crawl_delay(&mut self, fetcher: &HttpFetcher, url: &Url) -> Option<Duration> {
        let key = self.load(fetcher, url).await;
        self.by_host
            .get(&key)
            .and_then(|robots| robots.crawl_delay(&self.user_agent))
    }

    /// Makes sure the host's robots.txt is cached and returns its cache key
    async fn load(&mut self, fetcher: &HttpFetcher, url: &Url) -> String {
        let key = host_key(url);
        if !self.by_host.contains_key(&key) {
            let robots = fetch_robots(fetcher, url).await;
            self.by_host.insert(key.clone(), robots);
        }
        key
    }
}

fn host_key(url: &Url) -> String {
    format!(
        "{}://{}:{}",
        url.scheme(),
        url.host_str().unwrap_or(""),
        url.port_or_known_default().unwrap_or(0)
    )
}

/// Fetches robots.txt for the host of `url`
///
/// Any failure, including a missing file, yields an allow-all result.
pub async fn fetch_robots(fetcher: &HttpFetcher, url: &Url) -> ParsedRobots {
    let robots_url = match url.join("/robots.txt") {
        Ok(u) => u,
        Err(_) => return ParsedRobots::allow_all(),
    };

    tracing::debug!("Fetching {}", robots_url);
    match fetcher.fetch_page(&robots_url).await {
        FetchResult::Success { body, .. } => ParsedRobots::from_content(&body),
        FetchResult::HttpError { status_code } => {
            tracing::debug!("No robots.txt at {} (HTTP {})", robots_url, status_code);
            ParsedRobots::allow_all()
        }
        FetchResult::NetworkError { error } => {
            tracing::debug!("Could not fetch {}: {}", robots_url, error);
            ParsedRobots::allow_all()
        }
    }
}
