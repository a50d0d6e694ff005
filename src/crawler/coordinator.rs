//! Run coordinator - archive run orchestration
//!
//! This module turns a stream of page records into archive entries:
//! - Resolving the parameters a run starts from (defaults, configuration, resume state)
//! - Opening the title's archive under its run lock
//! - Naming entries, skipping ones already archived, downloading and appending the rest
//! - Recording the last archived record after every write
//! - Reporting the outcome to the caller and the run history

use crate::archive::{
    archive_path, base_name_of, entry_name, sanitize_base_name, Archive, CbzArchive, RunLock,
};
use crate::config::Config;
use crate::crawler::cookies::{load_cookie_jar, COOKIE_FILE_KEY};
use crate::crawler::fetcher::{HttpFetcher, ImageSource};
use crate::crawler::walker::{PageStream, PageWalker, StopFlag};
use crate::producer::ProducerRegistry;
use crate::record::{PageRecord, Params};
use crate::state::ResumeStore;
use crate::storage::{RunCounts, RunStatus, Storage};
use crate::{ConfigError, HoardError};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// How a run treats stored state and numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Continue from the title's resume state if there is one
    pub use_stored_state: bool,
    /// Number entries from 1 on every run, even when resuming
    pub gallery_mode: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_stored_state: true,
            gallery_mode: false,
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub title: String,
    pub added: u64,
    pub skipped: u64,
    pub failed: u64,
    pub status: RunStatus,
}

impl RunReport {
    fn new(title: &str, counts: RunCounts, status: RunStatus) -> Self {
        Self {
            title: title.to_string(),
            added: counts.added,
            skipped: counts.skipped,
            failed: counts.failed,
            status,
        }
    }

    /// Whether the run stopped because a stop was requested
    pub fn interrupted(&self) -> bool {
        self.status == RunStatus::Interrupted
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.added > 0 {
            write!(f, "added {} entries", self.added)
        } else {
            write!(f, "done, nothing new")
        }
    }
}

/// Per-run settings of the archiving loop
#[derive(Debug, Clone, Copy)]
pub struct ArchiveSettings {
    /// The run continues from stored state
    pub resumed: bool,
    /// Numbering restarts at 1 and failed images are skipped
    pub gallery: bool,
}

/// Merges the parameters a run starts from
///
/// Producer defaults are overlaid with the configured parameters, then with the
/// stored record of a resumed run.
pub fn resolve_params(
    defaults: &Params,
    configured: &Params,
    stored: Option<&PageRecord>,
) -> Params {
    let mut params = defaults.clone();
    params.overlay(configured);
    if let Some(record) = stored {
        params.overlay(record.fields());
    }
    params
}

/// First sequence number of a run
///
/// A resumed sequential run continues from the number of existing entries: the
/// producer restarts on the last archived page, whose record reuses that number and
/// is skipped as already archived.
pub fn starting_sequence(settings: ArchiveSettings, existing_entries: usize) -> u32 {
    if settings.resumed && !settings.gallery {
        u32::try_from(existing_entries).unwrap_or(u32::MAX)
    } else {
        1
    }
}

/// Archives every new record of `stream`
///
/// Counters are updated in place so they survive an error return.
///
/// # Returns
///
/// * `Ok(RunStatus)` - `Completed`, `Interrupted` after a stop request, or `Incomplete`
///   when a sequential run stopped at an image that could not be fetched
/// * `Err(HoardError)` - A record broke the producer contract, or the archive or the
///   resume state could not be written
#[allow(clippy::too_many_arguments)]
pub async fn archive_pages<S, I, A>(
    title: &str,
    stream: &mut S,
    images: &I,
    archive: &mut A,
    state: &mut ResumeStore,
    settings: ArchiveSettings,
    stop: &StopFlag,
    counts: &mut RunCounts,
) -> Result<RunStatus, HoardError>
where
    S: PageStream,
    I: ImageSource,
    A: Archive,
{
    let existing_names: HashSet<String> = archive.entry_names().iter().cloned().collect();
    let existing_bases: HashSet<String> = if settings.resumed {
        archive
            .entry_names()
            .iter()
            .map(|name| base_name_of(name).to_string())
            .collect()
    } else {
        HashSet::new()
    };

    let mut sequence = starting_sequence(settings, existing_names.len());

    loop {
        if stop.is_stopped() {
            tracing::info!("Stop requested, ending run of {}", title);
            return Ok(RunStatus::Interrupted);
        }

        let Some(record) = stream.next_record().await? else {
            break;
        };

        let image_url = record
            .image_url()
            .ok_or_else(|| HoardError::ProducerContract {
                title: title.to_string(),
                message: format!("record without an image location: {:?}", record.fields()),
            })?
            .to_string();

        let base = sanitize_base_name(&image_url);
        let name = entry_name(sequence, &base);

        if settings.resumed && existing_bases.contains(&base) {
            tracing::debug!("Skipping {}, already archived", image_url);
            counts.skipped += 1;
        } else if existing_names.contains(&name) {
            tracing::warn!("Entry {} already exists, skipping {}", name, image_url);
            counts.skipped += 1;
        } else {
            match images.fetch_image(&image_url).await {
                Ok(bytes) => {
                    archive.append(&name, &bytes)?;
                    counts.added += 1;
                    tracing::info!("Added {} ({} bytes)", name, bytes.len());
                    state.record(title, record)?;
                }
                Err(e) if settings.gallery => {
                    counts.failed += 1;
                    tracing::warn!("Skipping image: {}", e);
                }
                Err(e) => {
                    counts.failed += 1;
                    tracing::warn!(
                        "Stopping run of {}: {}. The next run resumes after the last archived page",
                        title,
                        e
                    );
                    return Ok(RunStatus::Incomplete);
                }
            }
        }

        sequence = sequence.saturating_add(1);
    }

    if stop.is_stopped() {
        Ok(RunStatus::Interrupted)
    } else {
        Ok(RunStatus::Completed)
    }
}

/// Runs configured sources against their archives
pub struct RunCoordinator {
    config: Config,
    resume: ResumeStore,
    registry: ProducerRegistry,
    history: Option<Box<dyn Storage>>,
    config_hash: String,
    stop: StopFlag,
}

impl RunCoordinator {
    /// Creates a coordinator
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `resume` - The loaded resume state; runs write through it
    /// * `registry` - Producers for every site the configuration uses
    ///
    /// # Returns
    ///
    /// * `Ok(RunCoordinator)` - Every configured source has a producer
    /// * `Err(HoardError::Config)` - A source names an unregistered site
    pub fn new(
        config: Config,
        resume: ResumeStore,
        registry: ProducerRegistry,
    ) -> Result<Self, HoardError> {
        for source in &config.sources {
            if registry.get(&source.site).is_none() {
                return Err(ConfigError::Validation(format!(
                    "Source '{}' uses unknown site '{}' (known: {})",
                    source.title,
                    source.site,
                    registry.sites().collect::<Vec<_>>().join(", ")
                ))
                .into());
            }
        }

        Ok(Self {
            config,
            resume,
            registry,
            history: None,
            config_hash: String::new(),
            stop: StopFlag::new(),
        })
    }

    /// Records every run in `storage`
    pub fn with_history(mut self, storage: Box<dyn Storage>, config_hash: &str) -> Self {
        self.history = Some(storage);
        self.config_hash = config_hash.to_string();
        self
    }

    /// Flag that stops the current run between records
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Configured titles in configuration order
    pub fn titles(&self) -> Vec<String> {
        self.config.sources.iter().map(|s| s.title.clone()).collect()
    }

    /// Runs one source
    ///
    /// # Arguments
    ///
    /// * `title` - The configured source title
    /// * `options` - Stored state and numbering behavior; the source's own `gallery`
    ///   setting also enables gallery mode
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - The run ended normally, was interrupted or stopped at a
    ///   failed image
    /// * `Err(HoardError)` - The run could not start or could not persist its progress
    pub async fn run(&mut self, title: &str, options: RunOptions) -> Result<RunReport, HoardError> {
        let source = self
            .config
            .source(title)
            .ok_or_else(|| HoardError::UnknownSource {
                title: title.to_string(),
            })?
            .clone();
        let producer = self
            .registry
            .get(&source.site)
            .ok_or_else(|| HoardError::UnknownSite {
                site: source.site.clone(),
            })?;

        let stored = if options.use_stored_state {
            self.resume.get(title).cloned()
        } else {
            None
        };
        let settings = ArchiveSettings {
            resumed: stored.is_some(),
            gallery: options.gallery_mode || source.gallery,
        };
        let params = resolve_params(&producer.default_params(), &source.params, stored.as_ref());
        let start = producer.start_url(&params)?;

        let cookies = match params.text(COOKIE_FILE_KEY) {
            Some(file) => Some(load_cookie_jar(Path::new(file))?),
            None => None,
        };
        let fetcher = HttpFetcher::new(&self.config.fetch, &self.config.user_agent, cookies)?;

        let archive_dir = Path::new(&self.config.output.archive_dir);
        let _lock = RunLock::acquire(archive_dir, title)?;
        let mut archive = CbzArchive::open(&archive_path(
            archive_dir,
            title,
            &self.config.output.archive_extension,
        ))?;

        tracing::info!(
            "Running {} from {} ({}{}, {} existing entries)",
            title,
            start,
            if settings.resumed { "resumed" } else { "fresh" },
            if settings.gallery { ", gallery" } else { "" },
            archive.entry_names().len()
        );

        let run_id = match self.history.as_mut() {
            Some(history) => Some(history.begin_run(
                title,
                &self.config_hash,
                settings.gallery,
                settings.resumed,
            )?),
            None => None,
        };

        let delay = self
            .config
            .fetch
            .page_delay_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| producer.default_delay());
        let mut walker =
            PageWalker::new(producer.as_ref(), &fetcher, start, delay, self.stop.clone());
        if self.config.fetch.respect_robots {
            walker = walker.with_robots(&self.config.user_agent.crawler_name);
        }

        let mut counts = RunCounts::default();
        let outcome = archive_pages(
            title,
            &mut walker,
            &fetcher,
            &mut archive,
            &mut self.resume,
            settings,
            &self.stop,
            &mut counts,
        )
        .await;

        match outcome {
            Ok(status) => {
                self.finish_history(run_id, status, counts, None);
                let report = RunReport::new(title, counts, status);
                tracing::info!(
                    "{}: {} ({} skipped, {} failed, {} pages, {})",
                    title,
                    report,
                    counts.skipped,
                    counts.failed,
                    walker.pages_visited(),
                    status
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!(
                    "Run of {} failed after {} added, {} skipped, {} failed: {}",
                    title,
                    counts.added,
                    counts.skipped,
                    counts.failed,
                    e
                );
                self.finish_history(run_id, RunStatus::Failed, counts, Some(&e.to_string()));
                Err(e)
            }
        }
    }

    fn finish_history(
        &mut self,
        run_id: Option<i64>,
        status: RunStatus,
        counts: RunCounts,
        error_message: Option<&str>,
    ) {
        let (Some(history), Some(run_id)) = (self.history.as_mut(), run_id) else {
            return;
        };
        if let Err(e) = history.finish_run(run_id, status, counts, error_message) {
            tracing::warn!("Failed to record outcome of run {}: {}", run_id, e);
        }
    }
}
