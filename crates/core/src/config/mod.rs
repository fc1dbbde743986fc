//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (POSTMIRROR_*)
//! 2. TOML config file (if POSTMIRROR_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// What a mount scheduler does with a trigger that arrives mid-pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerPolicy {
    /// Ignore it.
    #[default]
    Drop,
    /// Run exactly one more pass once the current one finishes.
    Coalesce,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (POSTMIRROR_*)
/// 2. TOML config file (if POSTMIRROR_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for remote requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Remote request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// GraphQL endpoint for listing posts and resolving the current user.
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// GraphQL endpoint for stats and edit reads.
    #[serde(default = "default_legacy_api_endpoint")]
    pub legacy_api_endpoint: String,

    /// Origin of the host site, used to build post links.
    #[serde(default = "default_site_origin")]
    pub site_origin: String,

    /// Session cookie forwarded verbatim with every remote request.
    #[serde(default)]
    pub session_cookie: Option<String>,

    /// Maximum age of a full sync before it is redone, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Items requested per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Concurrent stats requests per enrichment chunk.
    #[serde(default = "default_enrich_chunk_size")]
    pub enrich_chunk_size: usize,

    /// Host of the endpoint the tap watches.
    #[serde(default = "default_tap_host")]
    pub tap_host: String,

    /// Path of the endpoint the tap watches.
    #[serde(default = "default_tap_path")]
    pub tap_path: String,

    /// HTTP method of the endpoint the tap watches.
    #[serde(default = "default_tap_method")]
    pub tap_method: String,

    /// Operation names classified as an edit.
    #[serde(default = "default_edited_operations")]
    pub edited_operations: Vec<String>,

    /// Operation names classified as a new post.
    #[serde(default = "default_written_operations")]
    pub written_operations: Vec<String>,

    /// Operation names classified as a deletion.
    #[serde(default = "default_removed_operations")]
    pub removed_operations: Vec<String>,

    /// Interval between anchor polls in milliseconds.
    #[serde(default = "default_mount_poll_interval_ms")]
    pub mount_poll_interval_ms: u64,

    /// Maximum anchor polls before giving up.
    #[serde(default = "default_mount_budget")]
    pub mount_budget: u32,

    /// Selector for anchor elements in the host page.
    #[serde(default = "default_anchor_selector")]
    pub anchor_selector: String,

    /// Prefix of the per-anchor mount key.
    #[serde(default = "default_mount_key_prefix")]
    pub mount_key_prefix: String,

    /// Anchors whose label equals this are never mounted on.
    #[serde(default = "default_skip_anchor_label")]
    pub skip_anchor_label: Option<String>,

    /// Behaviour for triggers arriving during a mount pass.
    #[serde(default)]
    pub mount_trigger_policy: TriggerPolicy,

    /// Origins allowed to send cross-surface requests.
    #[serde(default = "default_trusted_origins")]
    pub trusted_origins: Vec<String>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./postmirror-cache.sqlite")
}

fn default_user_agent() -> String {
    "postmirror/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_api_endpoint() -> String {
    "https://v3.velog.io/graphql".into()
}

fn default_legacy_api_endpoint() -> String {
    "https://v2.velog.io/graphql".into()
}

fn default_site_origin() -> String {
    "https://velog.io".into()
}

fn default_cache_ttl_secs() -> u64 {
    30 * 60
}

fn default_page_size() -> usize {
    50
}

fn default_enrich_chunk_size() -> usize {
    10
}

fn default_tap_host() -> String {
    "v3.velog.io".into()
}

fn default_tap_path() -> String {
    "/graphql".into()
}

fn default_tap_method() -> String {
    "POST".into()
}

fn default_edited_operations() -> Vec<String> {
    vec!["ReadPostForEdit".into(), "EditPost".into()]
}

fn default_written_operations() -> Vec<String> {
    vec!["WritePost".into()]
}

fn default_removed_operations() -> Vec<String> {
    vec!["RemovePost".into()]
}

fn default_mount_poll_interval_ms() -> u64 {
    500
}

fn default_mount_budget() -> u32 {
    20
}

fn default_anchor_selector() -> String {
    r#"a[href$="/notifications"]"#.into()
}

fn default_mount_key_prefix() -> String {
    "postmirror".into()
}

fn default_skip_anchor_label() -> Option<String> {
    Some("전체".into())
}

fn default_trusted_origins() -> Vec<String> {
    vec!["https://velog.io".into()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            api_endpoint: default_api_endpoint(),
            legacy_api_endpoint: default_legacy_api_endpoint(),
            site_origin: default_site_origin(),
            session_cookie: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            page_size: default_page_size(),
            enrich_chunk_size: default_enrich_chunk_size(),
            tap_host: default_tap_host(),
            tap_path: default_tap_path(),
            tap_method: default_tap_method(),
            edited_operations: default_edited_operations(),
            written_operations: default_written_operations(),
            removed_operations: default_removed_operations(),
            mount_poll_interval_ms: default_mount_poll_interval_ms(),
            mount_budget: default_mount_budget(),
            anchor_selector: default_anchor_selector(),
            mount_key_prefix: default_mount_key_prefix(),
            skip_anchor_label: default_skip_anchor_label(),
            mount_trigger_policy: TriggerPolicy::default(),
            trusted_origins: default_trusted_origins(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache time-to-live.
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_secs as i64)
    }

    /// Anchor poll interval.
    pub fn mount_poll_interval(&self) -> Duration {
        Duration::from_millis(self.mount_poll_interval_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `POSTMIRROR_`
    /// 2. TOML file from `POSTMIRROR_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("POSTMIRROR_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("POSTMIRROR_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Session cookie, required for anything acting as the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no cookie is configured.
    pub fn require_session_cookie(&self) -> Result<&str, ConfigError> {
        self.session_cookie.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "session_cookie".into(),
            hint: "Set POSTMIRROR_SESSION_COOKIE environment variable".into(),
        })
    }
}
