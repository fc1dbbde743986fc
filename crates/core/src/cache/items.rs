//! Item list and freshness metadata.
//!
//! `set` and `set_metadata` are independent writes. `replace` writes both in
//! one transaction and is what a full resync uses.

use std::collections::HashSet;

use tokio_rusqlite::{params, rusqlite};

use super::connection::CacheStore;
use super::watch::StoreChange;
use crate::Error;
use crate::model::{CacheMeta, CacheRecord, CacheState, Item};

impl CacheStore {
    /// Read the whole record, or `Absent` if it was never written or was removed.
    pub async fn get(&self) -> Result<CacheState, Error> {
        self.conn
            .call(|conn| -> Result<CacheState, Error> {
                let meta_row = conn.query_row("SELECT cached_at FROM record_meta WHERE id = 1", [], |row| {
                    row.get::<_, Option<i64>>(0)
                });

                let cached_at = match meta_row {
                    Ok(cached_at) => cached_at,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(CacheState::Absent),
                    Err(e) => return Err(e.into()),
                };

                let mut stmt = conn.prepare("SELECT data FROM items ORDER BY position ASC")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

                let mut items = Vec::new();
                for data in rows {
                    items.push(serde_json::from_str::<Item>(&data?)?);
                }

                Ok(CacheState::Present(CacheRecord {
                    items,
                    meta: cached_at.map(|cached_at| CacheMeta { cached_at }),
                }))
            })
            .await
            .map_err(Error::from)
    }

    /// Replace the item list, leaving metadata untouched.
    ///
    /// Marks the record present. Duplicate ids keep their first occurrence.
    pub async fn set(&self, items: Vec<Item>) -> Result<(), Error> {
        let items = dedupe(items);
        let written = items.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute("INSERT OR IGNORE INTO record_meta (id, cached_at) VALUES (1, NULL)", [])?;
                write_items(&tx, &items)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(items = written.len(), "cache items written");
        self.notify(StoreChange::Items(written));
        Ok(())
    }

    /// Stamp the record's metadata.
    pub async fn set_metadata(&self, meta: CacheMeta) -> Result<(), Error> {
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO record_meta (id, cached_at) VALUES (1, ?1)
                     ON CONFLICT(id) DO UPDATE SET cached_at = excluded.cached_at",
                    params![meta.cached_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Write items and metadata atomically.
    pub async fn replace(&self, items: Vec<Item>, meta: CacheMeta) -> Result<(), Error> {
        let items = dedupe(items);
        let written = items.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO record_meta (id, cached_at) VALUES (1, ?1)
                     ON CONFLICT(id) DO UPDATE SET cached_at = excluded.cached_at",
                    params![meta.cached_at],
                )?;
                write_items(&tx, &items)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(items = written.len(), cached_at = meta.cached_at, "cache record replaced");
        self.notify(StoreChange::Items(written));
        Ok(())
    }

    /// Remove the record entirely. Subsequent reads return `Absent`.
    pub async fn remove(&self) -> Result<(), Error> {
        self.conn
            .call(|conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM items", [])?;
                tx.execute("DELETE FROM record_meta", [])?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!("cache record removed");
        self.notify(StoreChange::Removed);
        Ok(())
    }
}

fn dedupe(items: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::with_capacity(items.len());
    items.into_iter().filter(|item| seen.insert(item.id.clone())).collect()
}

fn write_items(tx: &rusqlite::Transaction<'_>, items: &[Item]) -> Result<(), Error> {
    tx.execute("DELETE FROM items", [])?;
    let mut stmt = tx.prepare("INSERT INTO items (id, position, data) VALUES (?1, ?2, ?3)")?;
    for (position, item) in items.iter().enumerate() {
        let data = serde_json::to_string(item)?;
        stmt.execute(params![item.id, position as i64, data])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::item;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_absent_until_written() {
        let store = CacheStore::open_in_memory().await.unwrap();
        assert_eq!(store.get().await.unwrap(), CacheState::Absent);
    }

    #[tokio::test]
    async fn test_set_preserves_order_and_empty_is_present() {
        let store = CacheStore::open_in_memory().await.unwrap();

        store.set(vec![item("b"), item("a"), item("c")]).await.unwrap();
        let record = store.get().await.unwrap().into_record().unwrap();
        assert_eq!(record.items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert!(record.meta.is_none());

        store.set(Vec::new()).await.unwrap();
        let state = store.get().await.unwrap();
        assert_eq!(state, CacheState::Present(CacheRecord::default()));
    }

    #[tokio::test]
    async fn test_set_dedupes_ids() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let mut dup = item("a");
        dup.title = "second".to_string();

        store.set(vec![item("a"), dup, item("b")]).await.unwrap();

        let record = store.get().await.unwrap().into_record().unwrap();
        assert_eq!(record.items.len(), 2);
        assert_eq!(record.items[0].title, "title a");
    }

    #[tokio::test]
    async fn test_replace_and_metadata() {
        let store = CacheStore::open_in_memory().await.unwrap();
        store.replace(vec![item("a")], CacheMeta { cached_at: 1_000 }).await.unwrap();

        let record = store.get().await.unwrap().into_record().unwrap();
        assert_eq!(record.meta, Some(CacheMeta { cached_at: 1_000 }));

        store.set_metadata(CacheMeta { cached_at: 2_000 }).await.unwrap();
        store.set(vec![item("b")]).await.unwrap();
        let record = store.get().await.unwrap().into_record().unwrap();
        assert_eq!(record.meta, Some(CacheMeta { cached_at: 2_000 }));
        assert_eq!(record.items[0].id, "b");
    }

    #[tokio::test]
    async fn test_remove_returns_to_absent() {
        let store = CacheStore::open_in_memory().await.unwrap();
        store.replace(vec![item("a")], CacheMeta { cached_at: 1 }).await.unwrap();
        store.remove().await.unwrap();
        assert_eq!(store.get().await.unwrap(), CacheState::Absent);
    }

    #[tokio::test]
    async fn test_watch_sees_writes_in_order() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let sub = store.watch(move |change| sink.lock().unwrap().push(change.clone()));

        store.set(vec![item("a")]).await.unwrap();
        store.remove().await.unwrap();
        drop(sub);
        store.set(vec![item("b")]).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(&seen[0], StoreChange::Items(items) if items[0].id == "a"));
        assert_eq!(seen[1], StoreChange::Removed);
    }

    #[tokio::test]
    async fn test_item_round_trips_view_stat() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let mut enriched = item("a");
        enriched.view_stat = Some(crate::model::ViewStat { views: 5, ..Default::default() });

        store.set(vec![enriched.clone()]).await.unwrap();

        let record = store.get().await.unwrap().into_record().unwrap();
        assert_eq!(record.items[0], enriched);
    }
}
