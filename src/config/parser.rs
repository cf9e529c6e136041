use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads, parses and validates the configuration file at `path`
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Validated configuration
/// * `Err(ConfigError)` - The file could not be read, parsed or validated
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use fti_directory::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Listing endpoint: {}", config.crawler.listing_url);
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

/// Hex-encoded SHA-256 of the configuration file at `path`
///
/// Logged at startup so an output file can be traced back to the exact
/// configuration that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Loads a configuration together with the hash of the exact bytes parsed
///
/// The file is read once, so the hash always matches the loaded config.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
[crawler]
listing-url = "https://directory.example.com/resultEN.aspx"
letters = "ABC"
readiness-timeout-ms = 2000

[retry]
detail-attempts = 3

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
csv-path = "./members.csv"
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.letters, "ABC");
        assert_eq!(config.crawler.readiness_timeout_ms, 2000);
        assert_eq!(config.crawler.search_type, 4);
        assert_eq!(config.retry.detail_attempts, 3);
        assert_eq!(config.retry.advance_attempts, 2);
        assert_eq!(config.user_agent.crawler_name, "TestCrawler");
        assert_eq!(config.output.csv_path, "./members.csv");
    }

    #[test]
    fn test_defaults_cover_whole_alphabet() {
        let config_content = r#"
[crawler]

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
csv-path = "./members.csv"
"#;
        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.letter_list().len(), 26);
        assert!(config.crawler.listing_url.ends_with("resultEN.aspx"));
        assert_eq!(config.retry.backoff_ms, 500);
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            load_config(Path::new("/nonexistent/config.toml")),
            Err(ConfigError::Io(_))
        ));
        assert!(matches!(
            parse_config("[crawler\nletters = "),
            Err(ConfigError::Parse(_))
        ));

        let digit = VALID_CONFIG.replace(r#"letters = "ABC""#, r#"letters = "A1""#);
        assert!(matches!(
            parse_config(&digit),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_load_config_with_hash() {
        let file = create_temp_config(VALID_CONFIG);
        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.crawler.letters, "ABC");
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
    }

    #[test]
    fn test_parse_config_rejects_non_http_listing() {
        let content = VALID_CONFIG.replace("https://directory.example.com", "ftp://directory.example.com");
        assert!(matches!(
            parse_config(&content),
            Err(ConfigError::InvalidUrl(_) | ConfigError::Validation(_))
        ));
        assert!(parse_config(VALID_CONFIG).is_ok());
    }

    #[test]
    fn test_hash_tracks_content() {
        let first = create_temp_config("letters = \"A\"");
        let same = create_temp_config("letters = \"A\"");
        let other = create_temp_config("letters = \"B\"");

        let hash = compute_config_hash(first.path()).unwrap();
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, compute_config_hash(same.path()).unwrap());
        assert_ne!(hash, compute_config_hash(other.path()).unwrap());
    }
}
