//! GraphQL response types and conversion into domain types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use postmirror_core::RemoteError;
use postmirror_core::model::{EditedFields, Item, SeriesRef, StatSnapshot};

/// Top-level GraphQL envelope.
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<D> {
    pub data: Option<D>,
    #[serde(default)]
    pub errors: Vec<GraphqlErrorDto>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlErrorDto {
    pub message: String,
}

impl<D> GraphqlResponse<D> {
    /// Take the data, turning a data-less error list into `RemoteError::Graphql`.
    pub fn into_data(self) -> Result<D, RemoteError> {
        match self.data {
            Some(data) => {
                if !self.errors.is_empty() {
                    tracing::debug!(errors = self.errors.len(), "graphql response carried partial errors");
                }
                Ok(data)
            }
            None if !self.errors.is_empty() => {
                let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
                Err(RemoteError::Graphql(messages.join("; ")))
            }
            None => Err(RemoteError::Parse("response has neither data nor errors".into())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileDto {
    pub thumbnail: Option<String>,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UserDto {
    pub username: String,
    pub profile: ProfileDto,
}

#[derive(Debug, Deserialize)]
pub struct PostDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    pub thumbnail: Option<String>,
    pub user: UserDto,
    pub url_slug: String,
    pub released_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comments_count: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_private: bool,
    pub likes: u64,
}

impl From<PostDto> for Item {
    fn from(dto: PostDto) -> Self {
        Item {
            id: dto.id,
            title: dto.title,
            short_description: dto.short_description,
            thumbnail: dto.thumbnail,
            username: dto.user.username,
            profile_thumbnail: dto.user.profile.thumbnail,
            profile_display_name: dto.user.profile.display_name,
            url_slug: dto.url_slug,
            released_at: dto.released_at,
            updated_at: dto.updated_at,
            comments_count: dto.comments_count,
            tags: dto.tags,
            is_private: dto.is_private,
            likes: dto.likes,
            series: None,
            view_stat: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PostsData {
    pub posts: Vec<PostDto>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentUserDto {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct CurrentUserData {
    #[serde(rename = "currentUser")]
    pub current_user: Option<CurrentUserDto>,
}

#[derive(Debug, Deserialize)]
pub struct SeriesDto {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct EditedPostDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub short_description: String,
    pub is_private: bool,
    pub thumbnail: Option<String>,
    pub url_slug: String,
    pub updated_at: DateTime<Utc>,
    pub series: Option<SeriesDto>,
}

impl From<EditedPostDto> for EditedFields {
    fn from(dto: EditedPostDto) -> Self {
        EditedFields {
            id: dto.id,
            title: dto.title,
            short_description: dto.short_description,
            thumbnail: dto.thumbnail,
            url_slug: dto.url_slug,
            updated_at: dto.updated_at,
            tags: dto.tags,
            is_private: dto.is_private,
            series: dto.series.map(|s| SeriesRef { id: s.id, name: s.name }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PostData {
    pub post: Option<EditedPostDto>,
}

#[derive(Debug, Deserialize)]
pub struct DayCountDto {
    pub count: u64,
    pub day: String,
}

#[derive(Debug, Deserialize)]
pub struct StatDto {
    pub total: u64,
    #[serde(default)]
    pub count_by_day: Vec<DayCountDto>,
}

impl From<StatDto> for StatSnapshot {
    /// Repeated day keys are summed.
    fn from(dto: StatDto) -> Self {
        let mut count_by_day = BTreeMap::new();
        for entry in dto.count_by_day {
            *count_by_day.entry(entry.day).or_insert(0) += entry.count;
        }
        StatSnapshot { total: dto.total, count_by_day }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatsData {
    #[serde(rename = "getStats")]
    pub get_stats: Option<StatDto>,
}
