//! Full synchronisation of the record from the remote listing.

use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::Error;
use crate::cache::CacheStore;
use crate::config::AppConfig;
use crate::model::CacheMeta;
use crate::pipeline::enrich_items;
use crate::remote::{RemoteSource, fetch_all_items};

/// Tunables for full syncs, taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub page_size: usize,
    pub enrich_chunk_size: usize,
    pub ttl: chrono::Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self { page_size: 50, enrich_chunk_size: 10, ttl: chrono::Duration::minutes(30) }
    }
}

impl From<&AppConfig> for SyncSettings {
    fn from(config: &AppConfig) -> Self {
        Self { page_size: config.page_size, enrich_chunk_size: config.enrich_chunk_size, ttl: config.cache_ttl() }
    }
}

/// How a sync request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The stored record was still fresh; nothing was fetched.
    Fresh { items: usize },
    /// The record was rebuilt from the remote listing.
    Synced { items: usize },
    /// Nobody is signed in; the record and identity were cleared.
    SignedOut,
}

/// Local calendar day used for the rolling view windows.
pub fn local_today(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&Local).date_naive()
}

/// Resolve the signed-in user and rebuild the record if needed.
///
/// Without `force` a fresh record for the same user is left alone. A change of
/// user always triggers a rebuild, and the new username is only stored once
/// the rebuilt record is in place.
///
/// # Errors
///
/// Returns remote errors from identity resolution or listing, and store errors.
pub async fn bulk_sync(
    store: &CacheStore, remote: &dyn RemoteSource, settings: &SyncSettings, now: DateTime<Utc>, force: bool,
) -> Result<SyncOutcome, Error> {
    let Some(username) = remote.resolve_acting_identity().await? else {
        tracing::info!("no signed-in user, clearing cached record");
        store.remove().await?;
        store.clear_identity().await?;
        return Ok(SyncOutcome::SignedOut);
    };

    let previous = store.identity().await?;
    let same_user = previous.as_deref() == Some(username.as_str());
    if !same_user {
        // The previous user's posts must not survive a failed listing.
        store.remove().await?;
    }

    if !force && same_user {
        let state = store.get().await?;
        if state.is_fresh(now, settings.ttl) {
            let items = state.record().map(|r| r.items.len()).unwrap_or(0);
            tracing::debug!(username = %username, items, "cached record is fresh, skipping sync");
            return Ok(SyncOutcome::Fresh { items });
        }
    }

    let items = fetch_all_items(remote, &username, settings.page_size).await?;
    let items = enrich_items(remote, items, settings.enrich_chunk_size, local_today(now)).await;
    let count = items.len();

    store.replace(items, CacheMeta::at(Utc::now())).await?;
    if !same_user {
        store.set_identity(&username).await?;
    }
    tracing::info!(username = %username, items = count, force, "cached record rebuilt");

    Ok(SyncOutcome::Synced { items: count })
}
