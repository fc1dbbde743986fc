//! posts_list tool implementation.
//!
//! Reads the cached record and returns it in the requested order. Never
//! touches the remote; an unsynced cache comes back empty with `cached: false`.

use postmirror_core::{CacheStore, Item, SortOption};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;

/// Parameters for the posts_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PostsListParams {
    /// Sort order: latest (default), oldest, views, likes or comments.
    #[serde(default)]
    pub sort: Option<SortOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PostEntry {
    /// Public URL of the post.
    pub permalink: String,
    #[serde(flatten)]
    pub item: Item,
}

/// Output from the posts_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PostsListOutput {
    /// Whether a record exists at all (false before the first sync and after logout).
    pub cached: bool,
    pub sort: SortOption,
    pub posts: Vec<PostEntry>,
}

/// Implementation of the posts_list tool.
pub async fn posts_impl(
    store: &CacheStore, site_origin: &str, params: PostsListParams,
) -> Result<CallToolResult, McpError> {
    let sort = params.sort.unwrap_or_default();
    let state = store.get().await?;

    let posts = state
        .record()
        .map(|record| sort.sorted(&record.items))
        .unwrap_or_default()
        .into_iter()
        .map(|item| PostEntry { permalink: item.permalink(site_origin), item })
        .collect();

    let output = PostsListOutput { cached: state.is_present(), sort, posts };
    let json = serde_json::to_string_pretty(&output).map_err(ServerError::from)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
