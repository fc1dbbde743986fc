//! Targeted cache updates for single mutation events.
//!
//! | event       | needs                    | effect                                  |
//! |-------------|--------------------------|-----------------------------------------|
//! | `Written`   | present record, identity | newest item fetched, deduped, prepended |
//! | `Edited(id)`| `id` cached              | edit fields merged, stats refreshed     |
//! | `Removed(id)`| `id` cached             | item filtered out                       |
//!
//! Every miss is a silent no-op reported as [`Reconciled::Skipped`].

use chrono::NaiveDate;

use crate::Error;
use crate::cache::CacheStore;
use crate::model::{CacheState, MutationEvent};
use crate::pipeline::enrich_item;
use crate::remote::RemoteSource;

/// Why an event left the cache untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The record is absent.
    NoRecord,
    /// No signed-in user is stored.
    NoIdentity,
    /// The target id is not in the cache.
    NotCached,
    /// The remote listing came back empty.
    NothingFetched,
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    Applied,
    Skipped(SkipReason),
}

/// Apply `event` to the stored record.
///
/// Must run on the single writer (see `SyncEngine`): it reads, fetches, then
/// writes back without any locking of its own.
///
/// # Errors
///
/// Remote failures on the listing or edit fetch are returned and leave the
/// record untouched. Stats failures never fail the event.
pub async fn reconcile(
    store: &CacheStore, remote: &dyn RemoteSource, event: &MutationEvent, today: NaiveDate,
) -> Result<Reconciled, Error> {
    let CacheState::Present(record) = store.get().await? else {
        return Ok(Reconciled::Skipped(SkipReason::NoRecord));
    };

    match event {
        MutationEvent::Written => {
            let Some(username) = store.identity().await? else {
                return Ok(Reconciled::Skipped(SkipReason::NoIdentity));
            };

            let page = remote.fetch_items_page(&username, 1, None).await?;
            let Some(latest) = page.items.into_iter().next() else {
                return Ok(Reconciled::Skipped(SkipReason::NothingFetched));
            };

            let latest_id = latest.id.clone();
            let latest = match enrich_item(remote, latest.clone(), today).await {
                Ok(enriched) => enriched,
                Err(err) => {
                    tracing::warn!(item_id = %latest_id, error = %err, "failed to fetch stats for new post");
                    latest
                }
            };

            let mut items = Vec::with_capacity(record.items.len() + 1);
            items.push(latest);
            items.extend(record.items.into_iter().filter(|item| item.id != latest_id));

            store.set(items).await?;
            tracing::info!(item_id = %latest_id, "reconciled new post");
        }

        MutationEvent::Edited(id) => {
            let Some(index) = record.position(id) else {
                return Ok(Reconciled::Skipped(SkipReason::NotCached));
            };

            let edit = remote.fetch_edited_fields(id).await?;
            let mut items = record.items;
            let mut merged = items[index].clone();
            merged.merge_edit(edit);

            items[index] = match enrich_item(remote, merged.clone(), today).await {
                Ok(enriched) => enriched,
                Err(err) => {
                    tracing::warn!(item_id = %id, error = %err, "failed to refresh stats for edited post");
                    merged
                }
            };

            store.set(items).await?;
            tracing::info!(item_id = %id, "reconciled edited post");
        }

        MutationEvent::Removed(id) => {
            if !record.contains(id) {
                return Ok(Reconciled::Skipped(SkipReason::NotCached));
            }

            let items = record.items.into_iter().filter(|item| &item.id != id).collect();
            store.set(items).await?;
            tracing::info!(item_id = %id, "reconciled removed post");
        }
    }

    Ok(Reconciled::Applied)
}
