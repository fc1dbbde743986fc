//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `cache_ttl_secs` is 0
    /// - `page_size` is outside 1..=100
    /// - `enrich_chunk_size` is outside 1..=50
    /// - `mount_poll_interval_ms` is below 10ms or `mount_budget` is 0
    /// - `user_agent`, an endpoint or a tap field is empty
    /// - `tap_method` is not uppercase or `tap_path` does not start with `/`
    /// - a `trusted_origins` entry is blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.cache_ttl_secs == 0 {
            return Err(invalid("cache_ttl_secs", "must be greater than 0"));
        }

        if !(1..=100).contains(&self.page_size) {
            return Err(invalid("page_size", "must be between 1 and 100"));
        }

        if !(1..=50).contains(&self.enrich_chunk_size) {
            return Err(invalid("enrich_chunk_size", "must be between 1 and 50"));
        }

        if self.mount_poll_interval_ms < 10 {
            return Err(invalid("mount_poll_interval_ms", "must be at least 10ms"));
        }
        if self.mount_budget == 0 {
            return Err(invalid("mount_budget", "must be greater than 0"));
        }

        for (field, value) in [
            ("user_agent", &self.user_agent),
            ("api_endpoint", &self.api_endpoint),
            ("legacy_api_endpoint", &self.legacy_api_endpoint),
            ("site_origin", &self.site_origin),
            ("tap_host", &self.tap_host),
            ("anchor_selector", &self.anchor_selector),
            ("mount_key_prefix", &self.mount_key_prefix),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }

        if !self.tap_path.starts_with('/') {
            return Err(invalid("tap_path", "must start with '/'"));
        }

        if self.tap_method.is_empty() || self.tap_method != self.tap_method.to_ascii_uppercase() {
            return Err(invalid("tap_method", "must be an uppercase HTTP method"));
        }

        if self.trusted_origins.iter().any(|origin| origin.trim().trim_end_matches('/').is_empty()) {
            return Err(invalid("trusted_origins", "entries must not be empty"));
        }

        if self.trusted_origins.is_empty() {
            tracing::warn!("trusted_origins is empty; every cross-surface request will be rejected");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: Result<(), ConfigError>) -> Option<String> {
        match result {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("timeout_ms"));
    }

    #[test]
    fn test_validate_page_and_chunk_size() {
        let config = AppConfig { page_size: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("page_size"));

        let config = AppConfig { enrich_chunk_size: 51, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("enrich_chunk_size"));
    }

    #[test]
    fn test_validate_mount_settings() {
        let config = AppConfig { mount_budget: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("mount_budget"));

        let config = AppConfig { mount_poll_interval_ms: 5, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("mount_poll_interval_ms"));
    }

    #[test]
    fn test_validate_tap_fields() {
        let config = AppConfig { tap_method: "post".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("tap_method"));

        let config = AppConfig { tap_path: "graphql".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("tap_path"));

        let config = AppConfig { tap_host: " ".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("tap_host"));
    }

    #[test]
    fn test_validate_blank_trusted_origin() {
        let config = AppConfig { trusted_origins: vec!["https://velog.io".into(), " ".into()], ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("trusted_origins"));

        let config = AppConfig { trusted_origins: Vec::new(), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig {
            timeout_ms: 100,
            cache_ttl_secs: 1,
            page_size: 100,
            enrich_chunk_size: 1,
            mount_budget: 1,
            mount_poll_interval_ms: 10,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
