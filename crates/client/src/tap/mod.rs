//! Passive observation of the host page's own requests.
//!
//! ### Pipeline
//!
//! 1. Resolve the request URL against the page origin.
//! 2. Drop anything that is not the configured (host, path, method) triple
//!    before touching the body.
//! 3. Broadcast `{ headers }`.
//! 4. Read the body (text, form, blob or drained stream) and decode it as
//!    URL-encoded parameters, then JSON.
//! 5. Broadcast `{ body }`.
//! 6. Classify by operation name and broadcast the mutation message, if any.
//!
//! Every failure stops the pipeline for that request and is logged at debug
//! level. Nothing is ever reported back to the page.

pub mod body;
pub mod classify;
pub mod transport;
pub mod url;

pub use body::RequestBody;
pub use classify::Classifier;
pub use transport::{FetchPrimitive, PageRequest, Primitives, TappedFetch, TappedXhr, XhrPrimitive, XhrRequest};
pub use self::url::{Endpoint, UrlError};

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use postmirror_core::config::AppConfig;
use postmirror_core::model::MutationEvent;

/// Capacity of the tap broadcast channel.
const CHANNEL_CAPACITY: usize = 64;

/// Errors inside the observation continuation. Never surfaced to the page.
#[derive(Debug, thiserror::Error)]
pub enum TapError {
    #[error("invalid request url: {0}")]
    Url(#[from] UrlError),

    #[error("unsupported request body: {0}")]
    UnsupportedBody(&'static str),

    #[error("undecodable request body: {0}")]
    Undecodable(String),

    #[error("tap installed outside a tokio runtime")]
    NoRuntime,
}

/// Interception boundary: sees each request after the real one was dispatched.
#[async_trait]
pub trait RequestObserver: Send + Sync {
    async fn observe(&self, request: PageRequest);
}

/// Messages broadcast by the tap, serialized in the page message shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TapMessage {
    Headers {
        headers: BTreeMap<String, String>,
    },
    Body {
        body: Map<String, Value>,
    },
    Edited {
        #[serde(rename = "editedPostId")]
        edited_post_id: String,
    },
    Written {
        #[serde(rename = "writePost")]
        write_post: bool,
    },
    Removed {
        #[serde(rename = "removedPostId")]
        removed_post_id: String,
    },
}

impl TapMessage {
    /// The mutation a message announces, if it announces one.
    pub fn mutation_event(&self) -> Option<MutationEvent> {
        match self {
            TapMessage::Edited { edited_post_id } if !edited_post_id.is_empty() => {
                Some(MutationEvent::Edited(edited_post_id.clone()))
            }
            TapMessage::Written { write_post: true } => Some(MutationEvent::Written),
            TapMessage::Removed { removed_post_id } if !removed_post_id.is_empty() => {
                Some(MutationEvent::Removed(removed_post_id.clone()))
            }
            _ => None,
        }
    }
}

impl From<MutationEvent> for TapMessage {
    fn from(event: MutationEvent) -> Self {
        match event {
            MutationEvent::Written => TapMessage::Written { write_post: true },
            MutationEvent::Edited(id) => TapMessage::Edited { edited_post_id: id },
            MutationEvent::Removed(id) => TapMessage::Removed { removed_post_id: id },
        }
    }
}

/// The request observer that classifies traffic into mutation messages.
#[derive(Debug, Clone)]
pub struct NetworkTap {
    endpoint: Endpoint,
    page_origin: ::url::Url,
    classifier: Classifier,
    tx: broadcast::Sender<TapMessage>,
}

impl NetworkTap {
    pub fn new(endpoint: Endpoint, page_origin: ::url::Url, classifier: Classifier) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { endpoint, page_origin, classifier, tx }
    }

    /// Build from configuration, using `site_origin` as the page origin.
    ///
    /// # Errors
    ///
    /// Returns `TapError::Url` if `site_origin` is not a valid URL.
    pub fn from_config(config: &AppConfig) -> Result<Self, TapError> {
        let origin = ::url::Url::parse(&config.site_origin).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
        Ok(Self::new(Endpoint::from(config), origin, Classifier::from(config)))
    }

    /// Listen for tap messages. Only messages sent after subscribing arrive.
    pub fn subscribe(&self) -> broadcast::Receiver<TapMessage> {
        self.tx.subscribe()
    }

    fn emit(&self, message: TapMessage) {
        // No listeners is fine; the message is simply lost.
        let _ = self.tx.send(message);
    }

    /// Run the classification pipeline for one request.
    ///
    /// Returns `Ok(None)` for requests to other endpoints and for
    /// unclassified operations.
    pub async fn process(&self, request: PageRequest) -> Result<Option<MutationEvent>, TapError> {
        let url = url::resolve(&request.url, &self.page_origin)?;
        if !self.endpoint.matches(&url, &request.method) {
            return Ok(None);
        }

        let headers = request
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect();
        self.emit(TapMessage::Headers { headers });

        let text = request.body.into_text().await?;
        let body = body::decode(&text)?;
        self.emit(TapMessage::Body { body: body.clone() });

        let event = self.classifier.classify(&body);
        match &event {
            Some(event) => {
                tracing::debug!(event = %event, "classified mutation request");
                self.emit(TapMessage::from(event.clone()));
            }
            None => tracing::trace!("request matched endpoint but not a mutation"),
        }

        Ok(event)
    }
}

#[async_trait]
impl RequestObserver for NetworkTap {
    async fn observe(&self, request: PageRequest) {
        if let Err(err) = self.process(request).await {
            tracing::debug!(error = %err, "tap dropped request");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::transport::fakes::EchoFetch;
    use super::*;
    use bytes::Bytes;
    use futures_util::StreamExt;
    use serde_json::json;
    use std::sync::Arc;

    fn tap() -> NetworkTap {
        NetworkTap::from_config(&AppConfig::default()).unwrap()
    }

    fn drain(rx: &mut broadcast::Receiver<TapMessage>) -> Vec<TapMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    fn graphql(body: &str) -> PageRequest {
        PageRequest::new("POST", "https://v3.velog.io/graphql")
            .header("Content-Type", "application/json")
            .body(body)
    }

    #[tokio::test]
    async fn test_emits_headers_body_then_event() {
        let tap = tap();
        let mut rx = tap.subscribe();

        let event = tap
            .process(graphql(r#"{"operationName":"RemovePost","variables":{"id":"p1"}}"#))
            .await
            .unwrap();

        assert_eq!(event, Some(MutationEvent::Removed("p1".into())));
        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 3);
        assert!(
            matches!(&messages[0], TapMessage::Headers { headers } if headers["content-type"] == "application/json")
        );
        assert!(matches!(&messages[1], TapMessage::Body { body } if body["operationName"] == "RemovePost"));
        assert_eq!(messages[2], TapMessage::Removed { removed_post_id: "p1".into() });
    }

    #[tokio::test]
    async fn test_other_endpoints_are_ignored_before_body() {
        let tap = tap();
        let mut rx = tap.subscribe();

        let other_host = PageRequest::new("POST", "https://v2.velog.io/graphql").body(RequestBody::Unsupported("x"));
        let other_method = PageRequest::new("GET", "https://v3.velog.io/graphql").body(RequestBody::Unsupported("x"));

        assert_eq!(tap.process(other_host).await.unwrap(), None);
        assert_eq!(tap.process(other_method).await.unwrap(), None);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_relative_url_resolved_against_origin() {
        let config = AppConfig { tap_host: "velog.io".into(), ..Default::default() };
        let tap = NetworkTap::from_config(&config).unwrap();

        let request = PageRequest::new("POST", "/graphql").body(r#"{"operationName":"WritePost"}"#);
        assert_eq!(tap.process(request).await.unwrap(), Some(MutationEvent::Written));
    }

    #[tokio::test]
    async fn test_undecodable_body_stops_after_headers() {
        let tap = tap();
        let mut rx = tap.subscribe();

        let result = tap.process(graphql("not a body")).await;

        assert!(matches!(result, Err(TapError::Undecodable(_))));
        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], TapMessage::Headers { .. }));
    }

    #[tokio::test]
    async fn test_unclassified_operation_emits_no_event() {
        let tap = tap();
        let mut rx = tap.subscribe();

        let request = graphql(r#"{"operationName":"GetStats","variables":{"post_id":"p"}}"#);
        let event = tap.process(request).await.unwrap();

        assert_eq!(event, None);
        assert_eq!(drain(&mut rx).len(), 2);
    }

    #[tokio::test]
    async fn test_streamed_body_through_tapped_fetch() {
        let tap = Arc::new(tap());
        let mut rx = tap.subscribe();
        let primitives = Primitives::<Result<String, String>> {
            fetch: Arc::new(EchoFetch),
            xhr: Arc::new(transport::fakes::RecordingXhr::default()),
        }
        .install_tap(tap.clone())
        .unwrap();

        let chunks = vec![
            Bytes::from_static(br#"{"operationName":"ReadPost"#),
            Bytes::from_static(br#"ForEdit","variables":{"id":"p7"}}"#),
        ];
        let request = PageRequest::new("POST", "https://v3.velog.io/graphql")
            .body(RequestBody::Stream(futures_util::stream::iter(chunks).boxed()));

        let response = primitives.fetch.fetch(request).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert!(response.unwrap().contains("ReadPostForEdit"));
        let messages = drain(&mut rx);
        assert_eq!(messages.last(), Some(&TapMessage::Edited { edited_post_id: "p7".into() }));
    }

    #[test]
    fn test_message_shapes() {
        assert_eq!(serde_json::to_value(TapMessage::Written { write_post: true }).unwrap(), json!({"writePost": true}));
        assert_eq!(
            serde_json::to_value(TapMessage::Edited { edited_post_id: "p1".into() }).unwrap(),
            json!({"editedPostId": "p1"})
        );
        assert_eq!(
            serde_json::to_value(TapMessage::Removed { removed_post_id: "p1".into() }).unwrap(),
            json!({"removedPostId": "p1"})
        );

        let parsed: TapMessage = serde_json::from_value(json!({"removedPostId": "p2"})).unwrap();
        assert_eq!(parsed.mutation_event(), Some(MutationEvent::Removed("p2".into())));

        let parsed: TapMessage = serde_json::from_value(json!({"headers": {"a": "b"}})).unwrap();
        assert_eq!(parsed.mutation_event(), None);
    }
}
