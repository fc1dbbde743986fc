//! Small persisted values: the signed-in identity and the theme flag.

use chrono::Utc;
use tokio_rusqlite::{params, rusqlite};

use super::connection::CacheStore;
use crate::Error;
use crate::model::Theme;

const IDENTITY_KEY: &str = "current_username";
const THEME_KEY: &str = "theme";

impl CacheStore {
    /// Username resolved during the last bulk sync.
    pub async fn identity(&self) -> Result<Option<String>, Error> {
        self.get_setting(IDENTITY_KEY).await
    }

    pub async fn set_identity(&self, username: &str) -> Result<(), Error> {
        self.put_setting(IDENTITY_KEY, username).await
    }

    pub async fn clear_identity(&self) -> Result<(), Error> {
        self.delete_setting(IDENTITY_KEY).await
    }

    /// Persisted theme, defaulting to light.
    pub async fn theme(&self) -> Result<Theme, Error> {
        Ok(match self.get_setting(THEME_KEY).await?.as_deref() {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        })
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), Error> {
        self.put_setting(THEME_KEY, theme.as_str()).await
    }

    async fn get_setting(&self, key: &'static str) -> Result<Option<String>, Error> {
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result =
                    conn.query_row("SELECT value FROM settings WHERE key = ?1", params![key], |row| row.get(0));

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put_setting(&self, key: &'static str, value: &str) -> Result<(), Error> {
        let value = value.to_string();
        let updated_at = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at",
                    params![key, value, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_setting(&self, key: &'static str) -> Result<(), Error> {
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identity_lifecycle() {
        let store = CacheStore::open_in_memory().await.unwrap();
        assert!(store.identity().await.unwrap().is_none());

        store.set_identity("alice").await.unwrap();
        store.set_identity("bob").await.unwrap();
        assert_eq!(store.identity().await.unwrap().as_deref(), Some("bob"));

        store.clear_identity().await.unwrap();
        assert!(store.identity().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_theme_defaults_to_light() {
        let store = CacheStore::open_in_memory().await.unwrap();
        assert_eq!(store.theme().await.unwrap(), Theme::Light);

        store.set_theme(Theme::Dark).await.unwrap();
        assert_eq!(store.theme().await.unwrap(), Theme::Dark);
    }
}
