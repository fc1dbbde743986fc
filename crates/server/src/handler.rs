//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    ObserveRequestParams, PostsListParams, RelayRequestParams, observe_impl, posts_impl, relay_impl, status_impl,
};

use postmirror_client::NetworkTap;
use postmirror_core::{AppConfig, CacheStore, RelayRouter};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for postmirror.
#[derive(Clone)]
pub struct PostMirrorServer {
    store: CacheStore,
    relay: RelayRouter,
    tap: Arc<NetworkTap>,
    site_origin: String,
    cache_ttl: chrono::Duration,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl PostMirrorServer {
    /// Create a new server handler.
    pub fn new(store: CacheStore, relay: RelayRouter, tap: Arc<NetworkTap>, config: &AppConfig) -> Self {
        Self {
            store,
            relay,
            tap,
            site_origin: config.site_origin.clone(),
            cache_ttl: config.cache_ttl(),
            tool_router: Self::tool_router(),
        }
    }

    /// Route a cross-surface request.
    ///
    /// Always answers with `{data, error}`; failures such as an untrusted
    /// sender or a missing identity are reported inside the envelope.
    #[tool(
        description = "Handle a panel request such as {\"type\": \"refreshPosts\"}. Returns {data, error}; error carries {name, message}."
    )]
    async fn relay_request(&self, params: Parameters<RelayRequestParams>) -> Result<CallToolResult, McpError> {
        relay_impl(&self.relay, params.0).await
    }

    #[tool(description = "List cached posts with permalinks. Sort: latest (default), oldest, views, likes, comments.")]
    async fn posts_list(&self, params: Parameters<PostsListParams>) -> Result<CallToolResult, McpError> {
        posts_impl(&self.store, &self.site_origin, params.0).await
    }

    #[tool(description = "Report the signed-in identity, cached post count, last sync time, freshness and theme.")]
    async fn sync_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.store, self.cache_ttl, chrono::Utc::now()).await
    }

    /// Feed one request issued by the host page through the network tap.
    #[tool(
        description = "Observe a request issued by the host page. Mutations (write, edit, remove) are applied to the cache."
    )]
    async fn observe_request(&self, params: Parameters<ObserveRequestParams>) -> Result<CallToolResult, McpError> {
        observe_impl(&self.tap, params.0).await
    }
}

impl ServerHandler for PostMirrorServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "postmirror".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::harness;

    #[tokio::test]
    async fn test_lists_every_tool() {
        let h = harness().await;
        let server = PostMirrorServer::new(h.store, h.relay, h.tap, &h.config);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(names, vec!["observe_request", "posts_list", "relay_request", "sync_status"]);
    }
}
