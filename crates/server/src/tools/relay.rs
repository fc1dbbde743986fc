//! relay_request tool implementation.
//!
//! Panel surfaces send their cross-surface requests here and get the relay
//! envelope back. Failures are part of the envelope, not tool errors.

use postmirror_core::RelayRouter;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ServerError;

/// Parameters for the relay_request tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RelayRequestParams {
    /// The raw request, e.g. `{"type": "refreshPosts"}`.
    pub request: Value,

    /// Origin of the surface that sent the request.
    #[serde(default)]
    pub sender_origin: Option<String>,
}

/// Implementation of the relay_request tool.
pub async fn relay_impl(router: &RelayRouter, params: RelayRequestParams) -> Result<CallToolResult, McpError> {
    let response = router.handle(&params.request, params.sender_origin.as_deref()).await;
    let json = serde_json::to_string_pretty(&response).map_err(ServerError::from)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
