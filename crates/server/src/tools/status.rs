//! sync_status tool implementation.

use chrono::{DateTime, Duration, Utc};
use postmirror_core::{CacheStore, Theme};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;

/// Output from the sync_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncStatusOutput {
    /// Username resolved by the last sync.
    pub identity: Option<String>,
    /// Whether a record exists.
    pub cached: bool,
    /// Number of cached posts.
    pub items: usize,
    /// RFC 3339 time of the last full sync.
    pub cached_at: Option<String>,
    /// Whether the record is younger than the cache TTL.
    pub fresh: bool,
    pub theme: Theme,
}

/// Implementation of the sync_status tool.
pub async fn status_impl(store: &CacheStore, ttl: Duration, now: DateTime<Utc>) -> Result<CallToolResult, McpError> {
    let state = store.get().await?;
    let identity = store.identity().await?;
    let theme = store.theme().await?;

    let record = state.record();
    let output = SyncStatusOutput {
        identity,
        cached: state.is_present(),
        items: record.map_or(0, |r| r.items.len()),
        cached_at: record
            .and_then(|r| r.meta)
            .and_then(|meta| DateTime::from_timestamp_millis(meta.cached_at))
            .map(|at| at.to_rfc3339()),
        fresh: state.is_fresh(now, ttl),
        theme,
    };

    let json = serde_json::to_string_pretty(&output).map_err(ServerError::from)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
