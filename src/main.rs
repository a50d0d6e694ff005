//! Page-Hoard main entry point
//!
//! This is the command-line interface for the Page-Hoard archiver.

use clap::{Parser, Subcommand};
use page_hoard::archive::{archive_path, list_entry_names};
use page_hoard::config::{load_config_with_hash, Config};
use page_hoard::crawler::{load_cookie_jar, COOKIE_FILE_KEY};
use page_hoard::record::PAGE_URL_KEY;
use page_hoard::storage::{RunStatus, SqliteStorage, Storage};
use page_hoard::{HoardError, ProducerRegistry, ResumeStore, RunCoordinator, RunOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code of a run stopped with Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

/// Page-Hoard: a resumable webcomic and gallery archiver
///
/// Page-Hoard walks each configured source page by page, appends every new image
/// to one CBZ archive per source and remembers the last archived page, so the next
/// run continues where the previous one stopped.
#[derive(Parser, Debug)]
#[command(name = "page-hoard")]
#[command(version)]
#[command(about = "A resumable webcomic and gallery archiver", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE", default_value = "page-hoard.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Archive new pages of one or more sources
    Run {
        /// Source titles to run, in order
        #[arg(required_unless_present = "all")]
        titles: Vec<String>,

        /// Run every configured source
        #[arg(long, conflicts_with = "titles")]
        all: bool,

        /// Ignore stored resume state and start from the configured page
        #[arg(long)]
        fresh: bool,

        /// Number entries from 1 on every run
        #[arg(long)]
        gallery: bool,
    },

    /// Show configured sources with their archive and resume state
    List,

    /// Show recent runs from the run history
    History {
        /// Only show runs of this source
        title: Option<String>,

        /// Maximum number of runs to show
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Validate the configuration, site ids and cookie files without fetching
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<ExitCode, HoardError> {
    // Load and validate configuration
    tracing::debug!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::debug!("Configuration loaded successfully (hash: {})", config_hash);

    match cli.command {
        Command::Run {
            titles,
            all,
            fresh,
            gallery,
        } => {
            let titles = if all {
                config.sources.iter().map(|s| s.title.clone()).collect()
            } else {
                titles
            };
            let options = RunOptions {
                use_stored_state: !fresh,
                gallery_mode: gallery,
            };
            handle_run(config, &config_hash, &titles, options).await
        }
        Command::List => handle_list(&config),
        Command::History { title, limit } => handle_history(&config, title.as_deref(), limit),
        Command::Check => handle_check(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_hoard=info,warn"),
            1 => EnvFilter::new("page_hoard=debug,info"),
            2 => EnvFilter::new("page_hoard=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the run command: archives the given titles one after another
async fn handle_run(
    config: Config,
    config_hash: &str,
    titles: &[String],
    options: RunOptions,
) -> Result<ExitCode, HoardError> {
    let resume = ResumeStore::load(Path::new(&config.output.state_path))?;
    let history = match &config.output.history_path {
        Some(path) => Some(SqliteStorage::new(Path::new(path))?),
        None => None,
    };

    let mut coordinator = RunCoordinator::new(config, resume, ProducerRegistry::with_builtin())?;
    if let Some(storage) = history {
        coordinator = coordinator.with_history(Box::new(storage), config_hash);
    }

    let stop = coordinator.stop_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current entry");
            stop.request_stop();
        }
    });

    let mut failed = false;
    for title in titles {
        match coordinator.run(title, options).await {
            Ok(report) => {
                println!("{}: {}", title, report);
                if report.interrupted() {
                    println!("Interrupted, the next run resumes from the last archived page");
                    return Ok(ExitCode::from(EXIT_INTERRUPTED));
                }
                if report.failed > 0 {
                    println!(
                        "  {} images could not be fetched ({})",
                        report.failed, report.status
                    );
                }
                failed |= report.status == RunStatus::Incomplete;
            }
            Err(e) => {
                tracing::error!("Run of {} failed: {}", title, e);
                failed = true;
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Handles the list command: shows every source with its archive size and resume point
fn handle_list(config: &Config) -> Result<ExitCode, HoardError> {
    let resume = ResumeStore::load(Path::new(&config.output.state_path))?;
    let archive_dir = Path::new(&config.output.archive_dir);

    println!("=== Sources ({}) ===\n", config.sources.len());
    for source in &config.sources {
        let path = archive_path(archive_dir, &source.title, &config.output.archive_extension);
        let entries = if path.exists() {
            list_entry_names(&path)?.len().to_string()
        } else {
            "no archive".to_string()
        };

        println!(
            "{} [{}{}]",
            source.title,
            source.site,
            if source.gallery { ", gallery" } else { "" }
        );
        println!("  Archive: {} ({})", path.display(), entries);
        match resume.get(&source.title) {
            Some(record) => println!(
                "  Resumes at: {}",
                record
                    .fields()
                    .text(PAGE_URL_KEY)
                    .or(record.image_url())
                    .unwrap_or("?")
            ),
            None => println!("  Resumes at: start"),
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Handles the history command: shows recent runs from the history database
fn handle_history(config: &Config, title: Option<&str>, limit: u32) -> Result<ExitCode, HoardError> {
    let Some(history_path) = &config.output.history_path else {
        println!("Run history is disabled (set history-path in [output])");
        return Ok(ExitCode::SUCCESS);
    };

    println!("Database: {}\n", history_path);
    let storage = SqliteStorage::new(Path::new(history_path))?;
    let runs = storage.list_runs(title, limit)?;

    if runs.is_empty() {
        println!("No runs recorded");
        return Ok(ExitCode::SUCCESS);
    }

    for run in &runs {
        println!(
            "#{:<5} {:<24} {:<12} {} +{} ={} !{}{}",
            run.id,
            run.title,
            run.status,
            run.started_at,
            run.counts.added,
            run.counts.skipped,
            run.counts.failed,
            run.error_message
                .as_deref()
                .map(|e| format!("  ({})", e))
                .unwrap_or_default()
        );
    }

    if let Some(title) = title {
        println!("\nTotal entries added to {}: {}", title, storage.total_added(title)?);
    }

    Ok(ExitCode::SUCCESS)
}

/// Handles the check command: validates everything a run needs before fetching
fn handle_check(config: &Config) -> Result<ExitCode, HoardError> {
    println!("=== Page-Hoard Check ===\n");

    let registry = ProducerRegistry::with_builtin();
    let mut problems = 0;

    println!("Output:");
    println!("  Archives: {}/*.{}", config.output.archive_dir, config.output.archive_extension);
    println!("  Resume state: {}", config.output.state_path);
    println!(
        "  Run history: {}",
        config.output.history_path.as_deref().unwrap_or("disabled")
    );

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        let Some(producer) = registry.get(&source.site) else {
            println!("  ✗ {}: unknown site '{}'", source.title, source.site);
            problems += 1;
            continue;
        };

        let mut params = producer.default_params();
        params.overlay(&source.params);
        match producer.start_url(&params) {
            Ok(start) => println!("  ✓ {} [{}] starts at {}", source.title, source.site, start),
            Err(e) => {
                println!("  ✗ {}: {}", source.title, e);
                problems += 1;
            }
        }

        if let Some(file) = params.text(COOKIE_FILE_KEY) {
            if let Err(e) = load_cookie_jar(Path::new(file)) {
                println!("    ✗ {}", e);
                problems += 1;
            }
        }
    }

    if problems > 0 {
        println!("\n✗ {} problems found", problems);
        return Ok(ExitCode::FAILURE);
    }

    println!("\n✓ Configuration is valid");
    Ok(ExitCode::SUCCESS)
}
