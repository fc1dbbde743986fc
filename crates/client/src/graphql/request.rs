//! GraphQL request bodies for the post API.

use serde::Serialize;

const POSTS_QUERY: &str = r#"
query velogPosts($input: GetPostsInput!) {
  posts(input: $input) {
    id
    title
    short_description
    thumbnail
    user {
      id
      username
      profile {
        id
        thumbnail
        display_name
      }
    }
    url_slug
    released_at
    updated_at
    comments_count
    tags
    is_private
    likes
  }
}
"#;

const CURRENT_USER_QUERY: &str = r#"
query currentUser {
  currentUser {
    id
    username
  }
}
"#;

const READ_POST_FOR_EDIT_QUERY: &str = r#"
query ReadPostForEdit($id: ID) {
  post(id: $id) {
    id
    title
    tags
    short_description
    is_private
    thumbnail
    url_slug
    updated_at
    series {
      id
      name
    }
  }
}
"#;

const GET_STATS_QUERY: &str = r#"
query GetStats($post_id: ID!) {
  getStats(post_id: $post_id) {
    total
    count_by_day {
      count
      day
    }
  }
}
"#;

/// A GraphQL POST body.
#[derive(Debug, Clone, Serialize)]
pub struct GraphqlRequest<V> {
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<&'static str>,
    pub query: &'static str,
    pub variables: V,
}

/// Listing input. An empty cursor starts from the newest post.
#[derive(Debug, Clone, Serialize)]
pub struct PostsInput {
    pub cursor: String,
    pub username: String,
    pub limit: usize,
    pub tag: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostsVariables {
    pub input: PostsInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdVariables {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostIdVariables {
    pub post_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoVariables {}

pub fn posts(username: &str, limit: usize, cursor: Option<&str>) -> GraphqlRequest<PostsVariables> {
    GraphqlRequest {
        operation_name: None,
        query: POSTS_QUERY,
        variables: PostsVariables {
            input: PostsInput {
                cursor: cursor.unwrap_or_default().to_string(),
                username: username.to_string(),
                limit,
                tag: String::new(),
            },
        },
    }
}

pub fn current_user() -> GraphqlRequest<NoVariables> {
    GraphqlRequest { operation_name: None, query: CURRENT_USER_QUERY, variables: NoVariables {} }
}

pub fn read_post_for_edit(id: &str) -> GraphqlRequest<IdVariables> {
    GraphqlRequest {
        operation_name: Some("ReadPostForEdit"),
        query: READ_POST_FOR_EDIT_QUERY,
        variables: IdVariables { id: id.to_string() },
    }
}

pub fn get_stats(post_id: &str) -> GraphqlRequest<PostIdVariables> {
    GraphqlRequest {
        operation_name: Some("GetStats"),
        query: GET_STATS_QUERY,
        variables: PostIdVariables { post_id: post_id.to_string() },
    }
}
