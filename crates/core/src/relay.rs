//! Cross-surface request/response routing.
//!
//! Panel surfaces send `{ "type": "refreshPosts" }` and always get back an
//! envelope with both `data` and `error` keys, one of them null.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;
use crate::sync::SyncEngine;

/// Requests a panel surface can make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayRequest {
    /// Resync the record now, ignoring freshness.
    RefreshPosts,
}

impl RelayRequest {
    /// Read the request type from a raw message.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownRequest` if `type` is missing, not a string, or
    /// not a known request.
    pub fn parse(raw: &Value) -> Result<Self, Error> {
        let Some(kind) = raw.get("type").and_then(Value::as_str) else {
            return Err(Error::UnknownRequest("no req type".into()));
        };

        match kind {
            "refreshPosts" => Ok(RelayRequest::RefreshPosts),
            other => Err(Error::UnknownRequest(format!("unknown req type: {other}"))),
        }
    }
}

/// Error half of a relay response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayErrorBody {
    pub name: String,
    pub message: String,
}

impl From<&Error> for RelayErrorBody {
    fn from(err: &Error) -> Self {
        Self { name: err.name().to_string(), message: err.to_string() }
    }
}

/// Response envelope. Both keys are always serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub data: Option<Value>,
    pub error: Option<RelayErrorBody>,
}

impl RelayResponse {
    pub fn ok(data: Option<Value>) -> Self {
        Self { data, error: None }
    }

    pub fn failed(err: &Error) -> Self {
        Self { data: None, error: Some(err.into()) }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Checks the sender, decodes the request and runs it against the engine.
#[derive(Debug, Clone)]
pub struct RelayRouter {
    engine: SyncEngine,
    trusted_origins: Vec<String>,
}

impl RelayRouter {
    pub fn new(engine: SyncEngine, trusted_origins: Vec<String>) -> Self {
        Self { engine, trusted_origins }
    }

    /// Handle one raw request. Never fails; errors are folded into the envelope.
    pub async fn handle(&self, raw: &Value, sender_origin: Option<&str>) -> RelayResponse {
        match self.dispatch(raw, sender_origin).await {
            Ok(data) => RelayResponse::ok(data),
            Err(err) => {
                tracing::warn!(error = %err, origin = sender_origin.unwrap_or("-"), "relay request failed");
                RelayResponse::failed(&err)
            }
        }
    }

    async fn dispatch(&self, raw: &Value, sender_origin: Option<&str>) -> Result<Option<Value>, Error> {
        self.check_origin(sender_origin)?;

        match RelayRequest::parse(raw)? {
            RelayRequest::RefreshPosts => {
                let outcome = self.engine.refresh().await?;
                tracing::info!(?outcome, "refresh requested by panel");
                Ok(None)
            }
        }
    }

    fn check_origin(&self, sender_origin: Option<&str>) -> Result<(), Error> {
        let Some(sender) = sender_origin else {
            return Err(Error::OriginMismatch("missing sender origin".into()));
        };

        let origin = sender.trim_end_matches('/');
        let trusted = !origin.is_empty()
            && self.trusted_origins.iter().any(|trusted| trusted.trim_end_matches('/') == origin);
        if trusted { Ok(()) } else { Err(Error::OriginMismatch(format!("untrusted sender origin: {sender}"))) }
    }
}
