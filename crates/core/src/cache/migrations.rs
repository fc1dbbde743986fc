//! Schema upgrades for the cache database.
//!
//! The schema version lives in SQLite's `user_version` pragma. Each step runs
//! in its own transaction together with the version bump.

use super::Error;
use tokio_rusqlite::Connection;

/// One schema step.
struct Step {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Ordered by version, each applied at most once.
const STEPS: &[Step] = &[
    Step { version: 1, name: "items", sql: include_str!("../../migrations/001_items.sql") },
    Step { version: 2, name: "settings", sql: include_str!("../../migrations/002_settings.sql") },
];

/// Schema version after every step has run.
pub const SCHEMA_VERSION: i64 = 2;

/// Bring the schema up to [`SCHEMA_VERSION`].
///
/// # Errors
///
/// Fails if a step's SQL does not apply, or if the database was written by a
/// newer schema than this build knows.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if current > SCHEMA_VERSION {
            return Err(Error::MigrationFailed(format!(
                "database schema {current} is newer than supported {SCHEMA_VERSION}"
            )));
        }

        for step in STEPS.iter().filter(|step| step.version > current) {
            tracing::debug!(version = step.version, name = step.name, "applying schema step");
            let tx = conn.transaction()?;
            tx.execute_batch(step.sql)
                .map_err(|e| Error::MigrationFailed(format!("{}: {e}", step.name)))?;
            tx.pragma_update(None, "user_version", step.version)?;
            tx.commit()?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user_version(conn: &Connection) -> i64 {
        conn.call(|conn| conn.query_row("PRAGMA user_version", [], |row| row.get(0)))
            .await
            .unwrap()
    }

    #[test]
    fn test_steps_end_at_schema_version() {
        assert_eq!(STEPS.last().map(|step| step.version), Some(SCHEMA_VERSION));
        assert!(STEPS.windows(2).all(|pair| pair[0].version < pair[1].version));
    }

    #[tokio::test]
    async fn test_rerun_is_a_no_op() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        let tables: i64 = conn
            .call(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('items', 'record_meta', 'settings')",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();

        assert_eq!(tables, 3);
        assert_eq!(user_version(&conn).await, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_newer_schema_is_refused() {
        let conn = Connection::open_in_memory().await.unwrap();
        conn.call(|conn| conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1))
            .await
            .unwrap();

        let err = run(&conn).await.unwrap_err();
        assert!(matches!(err, Error::MigrationFailed(_)));
    }
}
