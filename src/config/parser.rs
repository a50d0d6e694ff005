use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use page_hoard::config::load_config;
///
/// let config = load_config(Path::new("page-hoard.toml")).unwrap();
/// println!("Sources: {}", config.sources.len());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Recorded with every run so the history shows which configuration produced it.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ParamValue;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[user-agent]
crawler-name = "TestHoard"
crawler-version = "1.0"
contact-email = "admin@example.com"

[fetch]
page-delay-ms = 250
image-retries = 0

[output]
archive-dir = "../scraped"
state-path = "scraper.json"
history-path = "history.db"

[[source]]
title = "succubus"
site = "comicnav"
[source.params]
page_url = "https://example.com/comic/1"

[[source]]
title = "gallery"
site = "lightbox-gallery"
gallery = true
[source.params]
page_url = "https://example.com/gallery"
cookie_filename = "cookies.txt"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.user_agent.crawler_name, "TestHoard");
        assert_eq!(config.fetch.page_delay_ms, Some(250));
        assert_eq!(config.fetch.image_retries, 0);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.output.archive_extension, "cbz");
        assert_eq!(config.output.history_path.as_deref(), Some("history.db"));
        assert_eq!(config.sources.len(), 2);

        let gallery = config.source("gallery").unwrap();
        assert!(gallery.gallery);
        assert_eq!(
            gallery.params.get("cookie_filename"),
            Some(&ParamValue::Text("cookies.txt".to_string()))
        );
        assert!(!config.source("succubus").unwrap().gallery);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.output.archive_dir, "scraped");
        assert_eq!(config.output.state_path, "scraper.json");
        assert!(config.sources.is_empty());
        assert_eq!(config.user_agent.crawler_name, "page-hoard");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[fetch]
timeout-secs = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_config_hash_matches_content() {
        let file1 = create_temp_config("");
        let file2 = create_temp_config("\n[fetch]\n");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let (_, hash1_again) = load_config_with_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_eq!(hash1, hash1_again);
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, hash2);
    }
}
