//! observe_request tool implementation.
//!
//! Embeddings that sit in front of the host page forward each request the
//! page issues. The tap classifies it and broadcasts any mutation, which the
//! bridge hands to the sync engine.

use std::collections::BTreeMap;

use postmirror_client::{NetworkTap, PageRequest, RequestBody};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;

/// Parameters for the observe_request tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ObserveRequestParams {
    /// Request URL, absolute or relative to the site origin.
    pub url: String,

    /// HTTP method (default: POST).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request headers as sent by the page.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request body text (JSON or URL-encoded).
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "POST".into()
}

/// Output from the observe_request tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ObserveRequestOutput {
    /// Event kind (written, edited, removed), if the request was a mutation.
    pub event: Option<String>,
    /// Affected post id, when the event names one.
    pub post_id: Option<String>,
}

/// Implementation of the observe_request tool.
pub async fn observe_impl(tap: &NetworkTap, params: ObserveRequestParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ServerError::InvalidInput("url cannot be empty".into()).into());
    }

    let mut request = PageRequest::new(params.method, params.url);
    request.headers = params.headers;
    request.body = params.body.map(RequestBody::from).unwrap_or(RequestBody::Empty);

    // The page's own request already went out; a body the tap cannot read
    // is simply not a mutation.
    let event = match tap.process(request).await {
        Ok(event) => event,
        Err(err) => {
            tracing::debug!(error = %err, "observed request not classified");
            None
        }
    };

    let output = ObserveRequestOutput {
        event: event.as_ref().map(|e| e.kind().to_string()),
        post_id: event.as_ref().and_then(|e| e.target_id()).map(str::to_string),
    };
    let json = serde_json::to_string_pretty(&output).map_err(ServerError::from)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{harness, text_of};

    fn params(url: &str, body: &str) -> ObserveRequestParams {
        ObserveRequestParams {
            url: url.to_string(),
            method: default_method(),
            headers: BTreeMap::new(),
            body: Some(body.to_string()),
        }
    }

    #[tokio::test]
    async fn test_classifies_removal() {
        let h = harness().await;
        let result = observe_impl(
            &h.tap,
            params("https://v3.velog.io/graphql", r#"{"operationName":"RemovePost","variables":{"id":"p1"}}"#),
        )
        .await
        .unwrap();

        let output: ObserveRequestOutput = serde_json::from_str(&text_of(&result)).unwrap();
        assert_eq!(output.event.as_deref(), Some("removed"));
        assert_eq!(output.post_id.as_deref(), Some("p1"));
    }

    #[tokio::test]
    async fn test_other_endpoint_is_not_an_event() {
        let h = harness().await;
        let result = observe_impl(&h.tap, params("https://velog.io/api/other", r#"{"operationName":"RemovePost"}"#))
            .await
            .unwrap();

        let output: ObserveRequestOutput = serde_json::from_str(&text_of(&result)).unwrap();
        assert_eq!(output.event, None);
    }

    #[tokio::test]
    async fn test_empty_url_is_invalid_input() {
        let h = harness().await;

        let empty = observe_impl(&h.tap, params("  ", "{}")).await;
        assert!(empty.unwrap_err().message.starts_with("INVALID_INPUT"));
    }

    #[tokio::test]
    async fn test_unreadable_body_is_not_an_event() {
        let h = harness().await;

        let result = observe_impl(&h.tap, params("https://v3.velog.io/graphql", "not a body")).await.unwrap();

        let output: ObserveRequestOutput = serde_json::from_str(&text_of(&result)).unwrap();
        assert_eq!(output.event, None);
        assert_eq!(output.post_id, None);
    }
}
