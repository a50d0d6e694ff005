//! Integration tests for archive runs
//!
//! These tests use wiremock to serve small webcomics and galleries and run the
//! coordinator end-to-end against real CBZ files, resume state and run history.

use page_hoard::archive::{entry_name, list_entry_names, sanitize_base_name};
use page_hoard::config::{parse_config, Config};
use page_hoard::record::PAGE_URL_KEY;
use page_hoard::storage::{RunStatus, SqliteStorage, Storage};
use page_hoard::{ProducerRegistry, ResumeStore, RunCoordinator, RunOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration around the given `[[source]]` tables
fn create_test_config(dir: &Path, sources: &str) -> Config {
    parse_config(&format!(
        r#"
[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-email = "test@example.com"

[fetch]
page-delay-ms = 0
image-retries = 0
retry-backoff-ms = 1

[output]
archive-dir = '{dir}/scraped'
state-path = '{dir}/scraper.json'
history-path = '{dir}/history.db'

{sources}
"#,
        dir = dir.display(),
        sources = sources
    ))
    .expect("Failed to parse test config")
}

fn strip_source(base_url: &str) -> String {
    format!(
        r#"
[[source]]
title = "strip"
site = "comic-control"

[source.params]
page_url = "{}/comic/1"
"#,
        base_url
    )
}

/// Builds a coordinator the way `page-hoard run` does, reloading state from disk
fn create_coordinator(config: &Config) -> RunCoordinator {
    let resume = ResumeStore::load(Path::new(&config.output.state_path)).unwrap();
    let history =
        SqliteStorage::new(Path::new(config.output.history_path.as_deref().unwrap())).unwrap();

    RunCoordinator::new(config.clone(), resume, ProducerRegistry::with_builtin())
        .unwrap()
        .with_history(Box::new(history), "test-config-hash")
}

fn archive_file(config: &Config, title: &str) -> PathBuf {
    Path::new(&config.output.archive_dir).join(format!("{}.cbz", title))
}

fn image_bytes(n: u32) -> Vec<u8> {
    vec![n as u8; 16]
}

/// Mounts pages `/comic/1..=last` linking each to the next, with `last` linking nowhere
async fn mount_strip(server: &MockServer, last: u32) {
    for n in 1..=last {
        let next = if n < last {
            format!(r#"<a class="cc-next" rel="next" href="/comic/{}">&gt;</a>"#, n + 1)
        } else {
            String::new()
        };

        Mock::given(method("GET"))
            .and(path(format!("/comic/{}", n)))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<html><body><img id="cc-comic" src="/img/{}.png">{}</body></html>"#,
                n, next
            )))
            .mount(server)
            .await;
    }
}

async fn mount_images(server: &MockServer, numbers: impl IntoIterator<Item = u32>) {
    for n in numbers {
        Mock::given(method("GET"))
            .and(path(format!("/img/{}.png", n)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes(n)))
            .mount(server)
            .await;
    }
}

fn expected_entry(base_url: &str, sequence: u32, image: u32) -> String {
    entry_name(
        sequence,
        &sanitize_base_name(&format!("{}/img/{}.png", base_url, image)),
    )
}

async fn image_requests(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .filter(|p| p.starts_with("/img/"))
        .collect()
}

#[tokio::test]
async fn test_fresh_run_then_idempotent_rerun() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_strip(&server, 3).await;
    mount_images(&server, 1..=3).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &strip_source(&base_url));

    // First run archives every page
    let report = create_coordinator(&config)
        .run("strip", RunOptions::default())
        .await
        .expect("First run failed");
    assert_eq!(report.added, 3);
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.to_string(), "added 3 entries");

    let archive = archive_file(&config, "strip");
    let entries = list_entry_names(&archive).unwrap();
    assert_eq!(
        entries,
        vec![
            expected_entry(&base_url, 1, 1),
            expected_entry(&base_url, 2, 2),
            expected_entry(&base_url, 3, 3),
        ]
    );

    // Entry bytes are the downloaded image
    let mut zip = zip::ZipArchive::new(std::fs::File::open(&archive).unwrap()).unwrap();
    let mut content = Vec::new();
    zip.by_name(&entries[1])
        .unwrap()
        .read_to_end(&mut content)
        .unwrap();
    assert_eq!(content, image_bytes(2));

    let state = ResumeStore::load(Path::new(&config.output.state_path)).unwrap();
    let stored = state.get("strip").unwrap();
    assert_eq!(
        stored.fields().text(PAGE_URL_KEY),
        Some(format!("{}/comic/3", base_url).as_str())
    );

    // Second run starts on the last page and finds nothing new
    let report = create_coordinator(&config)
        .run("strip", RunOptions::default())
        .await
        .expect("Second run failed");
    assert_eq!(report.added, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.to_string(), "done, nothing new");
    assert_eq!(list_entry_names(&archive).unwrap().len(), 3);
    assert_eq!(
        image_requests(&server).await,
        vec!["/img/1.png", "/img/2.png", "/img/3.png"]
    );

    // Both runs are in the history, newest first
    let history = SqliteStorage::new(Path::new(config.output.history_path.as_deref().unwrap()))
        .unwrap();
    let runs = history.list_runs(Some("strip"), 10).unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs[0].resumed);
    assert_eq!(runs[0].counts.added, 0);
    assert!(!runs[1].resumed);
    assert_eq!(runs[1].counts.added, 3);
    assert!(runs.iter().all(|r| r.status == RunStatus::Completed));
    assert_eq!(history.total_added("strip").unwrap(), 3);

    // The run lock is released
    assert!(!Path::new(&config.output.archive_dir)
        .join("strip.lock")
        .exists());
}

#[tokio::test]
async fn test_resume_fetches_only_new_pages() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_strip(&server, 3).await;
    mount_images(&server, 1..=5).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &strip_source(&base_url));

    let report = create_coordinator(&config)
        .run("strip", RunOptions::default())
        .await
        .unwrap();
    assert_eq!(report.added, 3);

    // Two more pages get published
    server.reset().await;
    mount_strip(&server, 5).await;
    mount_images(&server, 1..=5).await;

    let report = create_coordinator(&config)
        .run("strip", RunOptions::default())
        .await
        .unwrap();
    assert_eq!(report.added, 2);
    assert_eq!(image_requests(&server).await, vec!["/img/4.png", "/img/5.png"]);

    let entries = list_entry_names(&archive_file(&config, "strip")).unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[3], expected_entry(&base_url, 4, 4));
    assert_eq!(entries[4], expected_entry(&base_url, 5, 5));
}

#[tokio::test]
async fn test_failed_image_is_retried_next_run() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_strip(&server, 3).await;
    mount_images(&server, [1, 3]).await;
    Mock::given(method("GET"))
        .and(path("/img/2.png"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &strip_source(&base_url));

    let report = create_coordinator(&config)
        .run("strip", RunOptions::default())
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Incomplete);
    assert_eq!(report.added, 1);
    assert_eq!(report.failed, 1);

    let state = ResumeStore::load(Path::new(&config.output.state_path)).unwrap();
    assert_eq!(
        state.get("strip").unwrap().image_url(),
        Some(format!("{}/img/1.png", base_url).as_str())
    );

    // The image is back
    server.reset().await;
    mount_strip(&server, 3).await;
    mount_images(&server, 1..=3).await;

    let report = create_coordinator(&config)
        .run("strip", RunOptions::default())
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.added, 2);
    assert_eq!(image_requests(&server).await, vec!["/img/2.png", "/img/3.png"]);
    assert_eq!(
        list_entry_names(&archive_file(&config, "strip")).unwrap(),
        vec![
            expected_entry(&base_url, 1, 1),
            expected_entry(&base_url, 2, 2),
            expected_entry(&base_url, 3, 3),
        ]
    );
}

#[tokio::test]
async fn test_gallery_with_cookie_file() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/gallery/7"))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div><a class="lb-link" href="/full/a.jpg"></a><a class="lb-link" href="/full/b.jpg"></a></div>"#,
        ))
        .mount(&server)
        .await;
    for name in ["a", "b"] {
        Mock::given(method("GET"))
            .and(path(format!("/full/{}.jpg", name)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(name.as_bytes().to_vec()))
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let cookie_file = dir.path().join("cookies.txt");
    std::fs::write(
        &cookie_file,
        "# Netscape HTTP Cookie File\n127.0.0.1\tFALSE\t/\tFALSE\t0\tsession\tabc123\n",
    )
    .unwrap();

    let config = create_test_config(
        dir.path(),
        &format!(
            r#"
[[source]]
title = "album"
site = "lightbox-gallery"
gallery = true

[source.params]
page_url = "{}/gallery/7"
cookie_filename = '{}'
"#,
            base_url,
            cookie_file.display()
        ),
    );

    let report = create_coordinator(&config)
        .run("album", RunOptions::default())
        .await
        .unwrap();
    assert_eq!(report.added, 2);

    // Gallery reruns number from 1 and skip what is archived
    let report = create_coordinator(&config)
        .run("album", RunOptions::default())
        .await
        .unwrap();
    assert_eq!(report.added, 0);
    assert_eq!(report.skipped, 2);

    let state = ResumeStore::load(Path::new(&config.output.state_path)).unwrap();
    let stored = state.get("album").unwrap();
    assert_eq!(stored.fields().len(), 1);
    assert_eq!(
        stored.image_url(),
        Some(format!("{}/full/b.jpg", base_url).as_str())
    );
}

#[tokio::test]
async fn test_gallery_error_status_is_nothing_new() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gallery/7"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        dir.path(),
        &format!(
            r#"
[[source]]
title = "album"
site = "lightbox-gallery"

[source.params]
page_url = "{}/gallery/7"
"#,
            server.uri()
        ),
    );

    let report = create_coordinator(&config)
        .run("album", RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.added, 0);
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.to_string(), "done, nothing new");
    assert!(list_entry_names(&archive_file(&config, "album"))
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_fresh_option_ignores_stored_state() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_strip(&server, 2).await;
    mount_images(&server, 1..=2).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &strip_source(&base_url));

    create_coordinator(&config)
        .run("strip", RunOptions::default())
        .await
        .unwrap();

    // A fresh run walks from page 1 again; every name already exists
    let options = RunOptions {
        use_stored_state: false,
        ..RunOptions::default()
    };
    let report = create_coordinator(&config)
        .run("strip", options)
        .await
        .unwrap();

    assert_eq!(report.added, 0);
    assert_eq!(report.skipped, 2);
    assert_eq!(
        list_entry_names(&archive_file(&config, "strip")).unwrap().len(),
        2
    );
}
