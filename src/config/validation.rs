use crate::config::types::{Config, CrawlerConfig, OutputConfig, RetryConfig, UserAgentConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.listing_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid listing_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "listing_url '{}' must use HTTP or HTTPS scheme",
            config.listing_url
        )));
    }

    validate_letters(&config.letters)?;

    if config.readiness_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "readiness_timeout_ms must be >= 100ms, got {}ms",
            config.readiness_timeout_ms
        )));
    }

    if config.request_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 100ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    if config.max_pages_per_letter < 1 {
        return Err(ConfigError::Validation(
            "max_pages_per_letter must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Letters must be plain uppercase A-Z, each at most once
fn validate_letters(letters: &str) -> Result<(), ConfigError> {
    if letters.is_empty() {
        return Err(ConfigError::Validation("letters cannot be empty".to_string()));
    }

    let mut seen = HashSet::new();
    for letter in letters.chars() {
        if !letter.is_ascii_uppercase() {
            return Err(ConfigError::Validation(format!(
                "letters must contain only A-Z, got '{}'",
                letter
            )));
        }
        if !seen.insert(letter) {
            return Err(ConfigError::Validation(format!(
                "letter '{}' appears more than once",
                letter
            )));
        }
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    for (name, attempts) in [
        ("detail_attempts", config.detail_attempts),
        ("advance_attempts", config.advance_attempts),
    ] {
        if !(1..=10).contains(&attempts) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and 10, got {}",
                name, attempts
            )));
        }
    }

    Ok(())
}

/// The identification string is sent on every request, so each part has to
/// survive as a header token.
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    for (field, value) in [
        ("crawler_name", &config.crawler_name),
        ("crawler_version", &config.crawler_version),
    ] {
        let is_token = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'));
        if !is_token {
            return Err(ConfigError::Validation(format!(
                "{} '{}' may only use ASCII letters, digits, '-', '.' and '_'",
                field, value
            )));
        }
    }

    let contact = Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("contact_url: {}", e)))?;
    if contact.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(format!(
            "contact_url '{}' is not a web address",
            config.contact_url
        )));
    }

    check_contact_email(&config.contact_email)?;

    reqwest::header::HeaderValue::from_str(&config.header_value()).map_err(|_| {
        ConfigError::Validation("user agent contains characters not allowed in a header".to_string())
    })?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.trim().is_empty() {
        return Err(ConfigError::Validation("csv_path cannot be empty".to_string()));
    }

    Ok(())
}

/// Loose shape check: one `@`, something on both sides, a dotted domain.
fn check_contact_email(email: &str) -> Result<(), ConfigError> {
    let looks_valid = match email.split_once('@') {
        Some((user, host)) => {
            !user.is_empty()
                && !host.contains('@')
                && host.split('.').count() > 1
                && host.split('.').all(|label| !label.is_empty())
        }
        None => false,
    };

    if looks_valid {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "contact_email '{}' is not an email address",
            email
        )))
    }
}
