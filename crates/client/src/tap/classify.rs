//! Mapping decoded request bodies to mutation events.

use std::collections::HashSet;

use serde_json::{Map, Value};

use postmirror_core::config::AppConfig;
use postmirror_core::model::MutationEvent;

/// Operation-name rules for each event kind.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    edited: HashSet<String>,
    written: HashSet<String>,
    removed: HashSet<String>,
}

impl Classifier {
    pub fn new<I, S>(edited: I, written: I, removed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            edited: edited.into_iter().map(Into::into).collect(),
            written: written.into_iter().map(Into::into).collect(),
            removed: removed.into_iter().map(Into::into).collect(),
        }
    }

    /// Classify a decoded body. Unknown operations and missing ids yield `None`.
    pub fn classify(&self, body: &Map<String, Value>) -> Option<MutationEvent> {
        let operation = operation_name(body)?;
        let variables = variables(body);

        if self.written.contains(operation) {
            return Some(MutationEvent::Written);
        }

        if self.edited.contains(operation) {
            return target_id(variables.as_ref()).map(MutationEvent::Edited);
        }

        if self.removed.contains(operation) {
            return target_id(variables.as_ref()).map(MutationEvent::Removed);
        }

        None
    }
}

impl From<&AppConfig> for Classifier {
    fn from(config: &AppConfig) -> Self {
        Self::new(
            config.edited_operations.iter().cloned(),
            config.written_operations.iter().cloned(),
            config.removed_operations.iter().cloned(),
        )
    }
}

fn operation_name(body: &Map<String, Value>) -> Option<&str> {
    body.get("operationName")
        .or_else(|| body.get("fb_api_req_friendly_name"))
        .and_then(Value::as_str)
}

/// `variables` as an object, or a JSON string holding one (form bodies).
fn variables(body: &Map<String, Value>) -> Option<Map<String, Value>> {
    match body.get("variables")? {
        Value::Object(map) => Some(map.clone()),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

fn target_id(variables: Option<&Map<String, Value>>) -> Option<String> {
    let variables = variables?;
    let value = variables.get("id").or_else(|| variables.get("post_id"))?;

    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
