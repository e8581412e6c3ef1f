use std::collections::HashSet;

use super::{types::Config, ConfigError, SourceBackend};
use crate::parser::is_valid_slug;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Scraper concurrency and timeout are at least 1
/// - Source names are non-empty and unique, URLs are set
/// - Torznab sources name an indexer
/// - Alias keys and values are valid slugs
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.scraper.max_web_request == 0 {
        return Err(ConfigError::ValidationError(
            "scraper.max_web_request must be at least 1".to_string(),
        ));
    }

    if config.scraper.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "scraper.request_timeout_secs must be at least 1".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for source in &config.sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "source name cannot be empty".to_string(),
            ));
        }
        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate source name: {}",
                source.name
            )));
        }
        if source.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "source {}: url cannot be empty",
                source.name
            )));
        }
        if source.backend == SourceBackend::Torznab
            && source.indexer.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::ValidationError(format!(
                "source {}: torznab backend requires an indexer",
                source.name
            )));
        }
        for (from, to) in &source.aliases {
            if !is_valid_slug(from) || !is_valid_slug(to) {
                return Err(ConfigError::ValidationError(format!(
                    "source {}: invalid alias {} -> {}",
                    source.name, from, to
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{QueryConfig, SourceConfig};
    use crate::content::ContentKind;
    use std::collections::BTreeMap;

    fn source(name: &str) -> SourceConfig {
        SourceConfig {
            name: name.to_string(),
            kind: ContentKind::Show,
            backend: SourceBackend::Eztv,
            url: "https://eztv.example".to_string(),
            api_key: None,
            indexer: None,
            query: QueryConfig::default(),
            language: "en".to_string(),
            aliases: BTreeMap::new(),
            enabled: true,
        }
    }

    fn assert_invalid(config: &Config) {
        let result = validate_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_valid_config() {
        let mut config = Config::default();
        config.sources.push(source("eztv"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        assert_invalid(&config);
    }

    #[test]
    fn test_validate_zero_concurrency_fails() {
        let mut config = Config::default();
        config.scraper.max_web_request = 0;
        assert_invalid(&config);
    }

    #[test]
    fn test_validate_duplicate_source_fails() {
        let mut config = Config::default();
        config.sources.push(source("eztv"));
        config.sources.push(source("eztv"));
        assert_invalid(&config);
    }

    #[test]
    fn test_validate_empty_source_name_fails() {
        let mut config = Config::default();
        config.sources.push(source(" "));
        assert_invalid(&config);
    }

    #[test]
    fn test_validate_torznab_without_indexer_fails() {
        let mut config = Config::default();
        let mut jackett = source("jackett");
        jackett.backend = SourceBackend::Torznab;
        config.sources.push(jackett.clone());
        assert_invalid(&config);

        jackett.indexer = Some("eztv".to_string());
        config.sources = vec![jackett];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_bad_alias_fails() {
        let mut config = Config::default();
        let mut eztv = source("eztv");
        eztv.aliases
            .insert("The Office".to_string(), "the-office".to_string());
        config.sources.push(eztv);
        assert_invalid(&config);
    }
}
