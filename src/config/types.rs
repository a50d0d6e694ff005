use crate::record::Params;
use serde::Deserialize;

/// Main configuration structure for Page-Hoard
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(rename = "source", default)]
    pub sources: Vec<SourceEntry>,
}

impl Config {
    /// Looks up a configured source by title
    pub fn source(&self, title: &str) -> Option<&SourceEntry> {
        self.sources.iter().find(|s| s.title == title)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default)]
    pub contact_email: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version (+ContactURL; ContactEmail)`, with the parenthesized part
    /// reduced to whatever contact details are configured.
    pub fn header_value(&self) -> String {
        let contact: Vec<String> = self
            .contact_url
            .iter()
            .map(|u| format!("+{}", u))
            .chain(self.contact_email.iter().cloned())
            .collect();

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "page-hoard".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

/// HTTP fetching behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Delay between page fetches (milliseconds), overriding the site default
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: Option<u64>,

    /// Extra attempts for a failed image download
    #[serde(rename = "image-retries")]
    pub image_retries: u32,

    /// Backoff before the first image retry, doubled per attempt (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Check robots.txt before fetching listing pages
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            page_delay_ms: None,
            image_retries: 2,
            retry_backoff_ms: 1000,
            respect_robots: false,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding one archive per source
    #[serde(rename = "archive-dir")]
    pub archive_dir: String,

    /// Archive file extension
    #[serde(rename = "archive-extension")]
    pub archive_extension: String,

    /// Path to the JSON resume state file
    #[serde(rename = "state-path")]
    pub state_path: String,

    /// Path to the SQLite run history; history is not kept when unset
    #[serde(rename = "history-path")]
    pub history_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            archive_dir: "scraped".to_string(),
            archive_extension: "cbz".to_string(),
            state_path: "scraper.json".to_string(),
            history_path: None,
        }
    }
}

/// One archivable source
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Unique run title, also the archive's file stem
    pub title: String,

    /// Registered page producer id (e.g., "comicnav")
    pub site: String,

    /// Restart numbering at 1 on every resumed run
    #[serde(default)]
    pub gallery: bool,

    /// Default producer parameters (e.g., `page_url`, `cookie_filename`)
    #[serde(default)]
    pub params: Params,
}
