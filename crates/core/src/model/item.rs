//! Cached post items and the partial records used to patch them.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::stat::ViewStat;

/// Series a post belongs to, as reported by the edit read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SeriesRef {
    pub id: String,
    pub name: String,
}

/// A single cached post.
///
/// Field set mirrors what the paginated listing returns. `view_stat` is only
/// populated after enrichment and `series` only after an edit reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    pub short_description: String,
    pub thumbnail: Option<String>,

    pub username: String,
    pub profile_thumbnail: Option<String>,
    pub profile_display_name: String,

    pub url_slug: String,
    pub released_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comments_count: u64,
    pub tags: Vec<String>,
    pub is_private: bool,
    pub likes: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<SeriesRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_stat: Option<ViewStat>,
}

impl Item {
    /// Public URL of the post on the host site.
    pub fn permalink(&self, site_origin: &str) -> String {
        format!("{}/@{}/{}", site_origin.trim_end_matches('/'), self.username, self.url_slug)
    }

    /// Overlay the fields an edit can change.
    ///
    /// Counters, author fields, release time and view stats are left as they were.
    pub fn merge_edit(&mut self, edit: EditedFields) {
        self.title = edit.title;
        self.short_description = edit.short_description;
        self.thumbnail = edit.thumbnail;
        self.url_slug = edit.url_slug;
        self.updated_at = edit.updated_at;
        self.tags = edit.tags;
        self.is_private = edit.is_private;
        self.series = edit.series;
    }

    /// Total views, or zero when the item was never enriched.
    pub fn views(&self) -> u64 {
        self.view_stat.as_ref().map(|s| s.views).unwrap_or(0)
    }
}

/// The subset of an item returned by the edit read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditedFields {
    pub id: String,
    pub title: String,
    pub short_description: String,
    pub thumbnail: Option<String>,
    pub url_slug: String,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub is_private: bool,
    pub series: Option<SeriesRef>,
}
