//! Remote content source abstraction.
//!
//! The sync engine only talks to the remote service through [`RemoteSource`].
//! The HTTP implementation lives in the client crate.

use async_trait::async_trait;

use crate::model::{EditedFields, Item, StatSnapshot};

/// Errors from the remote content API. No variant is retried internally.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    /// Non-success HTTP status.
    #[error("remote returned status {status}")]
    Status { status: u16 },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request timeout")]
    Timeout,

    /// Response body did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// GraphQL-level error reported with a success status.
    #[error("graphql error: {0}")]
    Graphql(String),
}

/// One page of the forward-only item listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemsPage {
    pub items: Vec<Item>,
    /// Id of the last item, present only when the page was full.
    pub next_cursor: Option<String>,
}

impl ItemsPage {
    /// Build a page, deriving the cursor from `limit`.
    pub fn from_items(items: Vec<Item>, limit: usize) -> Self {
        let next_cursor = if limit > 0 && items.len() == limit { items.last().map(|i| i.id.clone()) } else { None };
        Self { items, next_cursor }
    }
}

/// Operations the mirror needs from the remote content service.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch up to `limit` items owned by `owner_id`, starting after `cursor`.
    async fn fetch_items_page(
        &self, owner_id: &str, limit: usize, cursor: Option<&str>,
    ) -> Result<ItemsPage, RemoteError>;

    /// Fetch total and per-day view counts for an item.
    async fn fetch_stats(&self, item_id: &str) -> Result<StatSnapshot, RemoteError>;

    /// Fetch the fields an edit can change.
    async fn fetch_edited_fields(&self, item_id: &str) -> Result<EditedFields, RemoteError>;

    /// Resolve the username of the signed-in user, if any.
    async fn resolve_acting_identity(&self) -> Result<Option<String>, RemoteError>;
}

/// Walk every page for `owner_id`, feeding each cursor into the next call.
///
/// Stops at the first page without a cursor. Ids already seen are dropped.
pub async fn fetch_all_items(
    remote: &dyn RemoteSource, owner_id: &str, page_size: usize,
) -> Result<Vec<Item>, RemoteError> {
    let mut items: Vec<Item> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = remote.fetch_items_page(owner_id, page_size, cursor.as_deref()).await?;
        pages += 1;

        for item in page.items {
            if seen.insert(item.id.clone()) {
                items.push(item);
            }
        }

        match page.next_cursor {
            Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
            Some(next) => {
                tracing::warn!(cursor = %next, "remote repeated a cursor, stopping pagination");
                break;
            }
            None => break,
        }
    }

    tracing::debug!(owner = owner_id, pages, items = items.len(), "fetched all items");
    Ok(items)
}
