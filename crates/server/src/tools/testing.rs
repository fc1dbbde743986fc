//! Shared fixtures for tool tests: an in-memory store, a canned remote and
//! the engine, relay and tap wired over them.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use postmirror_client::NetworkTap;
use postmirror_core::model::{EditedFields, Item, StatSnapshot};
use postmirror_core::remote::{ItemsPage, RemoteError, RemoteSource};
use postmirror_core::{AppConfig, CacheStore, RelayRouter, SyncEngine, SyncSettings};
use rmcp::model::CallToolResult;

pub fn item(id: &str, day: u32, likes: u64) -> Item {
    let ts = Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap();
    Item {
        id: id.to_string(),
        title: format!("title {id}"),
        short_description: String::new(),
        thumbnail: None,
        username: "alice".to_string(),
        profile_thumbnail: None,
        profile_display_name: "Alice".to_string(),
        url_slug: format!("slug-{id}"),
        released_at: ts,
        updated_at: ts,
        comments_count: 0,
        tags: Vec::new(),
        is_private: false,
        likes,
        series: None,
        view_stat: None,
    }
}

/// Signed in as alice with two posts; every post has 10 views.
pub struct CannedRemote;

#[async_trait]
impl RemoteSource for CannedRemote {
    async fn fetch_items_page(
        &self, _owner_id: &str, limit: usize, cursor: Option<&str>,
    ) -> Result<ItemsPage, RemoteError> {
        let items = match cursor {
            None => vec![item("p1", 1, 2), item("p2", 3, 9)],
            Some(_) => Vec::new(),
        };
        Ok(ItemsPage::from_items(items, limit))
    }

    async fn fetch_stats(&self, _item_id: &str) -> Result<StatSnapshot, RemoteError> {
        Ok(StatSnapshot { total: 10, count_by_day: BTreeMap::new() })
    }

    async fn fetch_edited_fields(&self, item_id: &str) -> Result<EditedFields, RemoteError> {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        Ok(EditedFields {
            id: item_id.to_string(),
            title: "edited".to_string(),
            short_description: String::new(),
            thumbnail: None,
            url_slug: format!("slug-{item_id}"),
            updated_at: ts,
            tags: Vec::new(),
            is_private: false,
            series: None,
        })
    }

    async fn resolve_acting_identity(&self) -> Result<Option<String>, RemoteError> {
        Ok(Some("alice".to_string()))
    }
}

pub struct Harness {
    pub config: AppConfig,
    pub store: CacheStore,
    pub engine: SyncEngine,
    pub relay: RelayRouter,
    pub tap: Arc<NetworkTap>,
}

pub async fn harness() -> Harness {
    let config = AppConfig::default();
    let store = CacheStore::open_in_memory().await.unwrap();
    let (engine, _writer) = SyncEngine::spawn(store.clone(), Arc::new(CannedRemote), SyncSettings::from(&config));
    let relay = RelayRouter::new(engine.clone(), config.trusted_origins.clone());
    let tap = Arc::new(NetworkTap::from_config(&config).unwrap());
    Harness { config, store, engine, relay, tap }
}

/// Text of the first content block of a tool result.
pub fn text_of(result: &CallToolResult) -> String {
    result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|content| content.text.clone())
        .expect("Expected text content")
}
