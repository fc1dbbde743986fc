//! Cache record, freshness and the absent/present distinction.

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::item::Item;

/// Metadata written alongside a full population of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheMeta {
    /// Epoch milliseconds of the last full population.
    pub cached_at: i64,
}

impl CacheMeta {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { cached_at: now.timestamp_millis() }
    }
}

/// Ordered items plus metadata. Index 0 is the most recent write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub items: Vec<Item>,
    pub meta: Option<CacheMeta>,
}

impl CacheRecord {
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }
}

/// Persisted cache state.
///
/// `Absent` means never synchronised or logged out; a `Present` record with no
/// items is a synchronised account without posts.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CacheState {
    #[default]
    Absent,
    Present(CacheRecord),
}

impl CacheState {
    pub fn record(&self) -> Option<&CacheRecord> {
        match self {
            CacheState::Absent => None,
            CacheState::Present(record) => Some(record),
        }
    }

    pub fn into_record(self) -> Option<CacheRecord> {
        match self {
            CacheState::Absent => None,
            CacheState::Present(record) => Some(record),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, CacheState::Present(_))
    }

    /// Fresh iff present, stamped, and younger than `ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let Some(meta) = self.record().and_then(|r| r.meta) else {
            return false;
        };
        now.timestamp_millis() - meta.cached_at < ttl.num_milliseconds()
    }
}

/// Light/dark theme flag mirrored from the host page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Interpret a `data-theme` attribute value. Anything but `dark` is light.
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::fixtures::item;

    fn stamped(minutes_ago: i64, now: DateTime<Utc>) -> CacheState {
        CacheState::Present(CacheRecord {
            items: vec![item("p1")],
            meta: Some(CacheMeta::at(now - Duration::minutes(minutes_ago))),
        })
    }

    #[test]
    fn test_freshness_boundary() {
        let now = Utc::now();
        let ttl = Duration::minutes(30);
        assert!(stamped(29, now).is_fresh(now, ttl));
        assert!(!stamped(31, now).is_fresh(now, ttl));
        assert!(!stamped(30, now).is_fresh(now, ttl));
    }

    #[test]
    fn test_absent_and_unstamped_are_stale() {
        let now = Utc::now();
        let ttl = Duration::minutes(30);
        assert!(!CacheState::Absent.is_fresh(now, ttl));
        assert!(!CacheState::Present(CacheRecord::default()).is_fresh(now, ttl));
    }

    #[test]
    fn test_empty_present_is_distinct_from_absent() {
        let empty = CacheState::Present(CacheRecord::default());
        assert!(empty.is_present());
        assert_ne!(empty, CacheState::Absent);
    }

    #[test]
    fn test_theme_from_attribute() {
        assert_eq!(Theme::from_attribute(Some("dark")), Theme::Dark);
        assert_eq!(Theme::from_attribute(Some("light")), Theme::Light);
        assert_eq!(Theme::from_attribute(None), Theme::Light);
    }
}
