//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! (WAL mode), and running migrations.

use std::path::Path;
use std::sync::Arc;

use tokio_rusqlite::Connection;

use super::migrations;
use super::watch::{StoreChange, Subscription, Watchers};
use crate::Error;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Persistent cache store handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations on a
/// background thread, plus the change subscribers shared by every clone.
#[derive(Clone, Debug)]
pub struct CacheStore {
    pub(crate) conn: Connection,
    pub(crate) watchers: Arc<Watchers>,
}

impl CacheStore {
    /// Open a store at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas, and runs any
    /// pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Open an in-memory store for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn, watchers: Arc::new(Watchers::default()) })
    }

    /// Register a callback fired after every item write or removal.
    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StoreChange) + Send + Sync + 'static,
    {
        self.watchers.subscribe(Arc::new(callback))
    }

    pub(crate) fn notify(&self, change: StoreChange) {
        self.watchers.notify(&change);
    }
}
