use crate::config::types::{Config, FetchConfig, OutputConfig, SourceEntry, UserAgentConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_user_agent_config(&config.user_agent)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.archive_dir.is_empty() {
        return Err(ConfigError::Validation(
            "archive_dir cannot be empty".to_string(),
        ));
    }

    if config.state_path.is_empty() {
        return Err(ConfigError::Validation(
            "state_path cannot be empty".to_string(),
        ));
    }

    if config.archive_extension.is_empty()
        || !config
            .archive_extension
            .chars()
            .all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ConfigError::Validation(format!(
            "archive_extension must be non-empty and alphanumeric, got '{}'",
            config.archive_extension
        )));
    }

    if matches!(&config.history_path, Some(p) if p.is_empty()) {
        return Err(ConfigError::Validation(
            "history_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates source entries
fn validate_sources(sources: &[SourceEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in sources {
        validate_title(&entry.title)?;

        if !seen.insert(entry.title.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate source title '{}'",
                entry.title
            )));
        }

        if entry.site.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Source '{}' must name a site",
                entry.title
            )));
        }

        if let Some(page_url) = entry.params.text("page_url") {
            Url::parse(page_url).map_err(|e| {
                ConfigError::InvalidUrl(format!(
                    "Invalid page_url '{}' for source '{}': {}",
                    page_url, entry.title, e
                ))
            })?;
        }
    }

    Ok(())
}

/// Validates a run title, which doubles as a file stem
fn validate_title(title: &str) -> Result<(), ConfigError> {
    if title.is_empty() {
        return Err(ConfigError::Validation(
            "Source title cannot be empty".to_string(),
        ));
    }

    if title.starts_with('.')
        || title
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':') || c.is_control())
    {
        return Err(ConfigError::Validation(format!(
            "Source title '{}' must be usable as a file name",
            title
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Params;

    fn source(title: &str) -> SourceEntry {
        SourceEntry {
            title: title.to_string(),
            site: "comicnav".to_string(),
            gallery: false,
            params: Params::new().with("page_url", "https://example.com/comic/1"),
        }
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("my-comic").is_ok());
        assert!(validate_title("Comic 2").is_ok());

        assert!(validate_title("").is_err());
        assert!(validate_title(".hidden").is_err());
        assert!(validate_title("a/b").is_err());
        assert!(validate_title("a\\b").is_err());
        assert!(validate_title("..").is_err());
    }

    #[test]
    fn test_duplicate_titles_rejected() {
        let result = validate_sources(&[source("a"), source("b"), source("a")]);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_invalid_page_url_rejected() {
        let mut entry = source("a");
        entry.params.insert("page_url", "not a url");
        assert!(matches!(
            validate_sources(&[entry]),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    #[test]
    fn test_archive_extension_must_be_alphanumeric() {
        let mut output = OutputConfig::default();
        output.archive_extension = "c/bz".to_string();
        assert!(validate_output_config(&output).is_err());
    }
}
