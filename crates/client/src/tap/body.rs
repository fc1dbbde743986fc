//! Request body forms and decoding into a JSON object.

use std::fmt;

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use super::TapError;

/// A request body as handed to a page request primitive.
pub enum RequestBody {
    /// No body.
    Empty,
    /// Already-buffered text.
    Text(String),
    /// URL-encoded form parameters.
    Form(Vec<(String, String)>),
    /// Binary blob read as text.
    Blob(Bytes),
    /// Incrementally readable body.
    Stream(BoxStream<'static, Bytes>),
    /// A body the tap does not read (multipart, array buffers, documents).
    Unsupported(&'static str),
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            RequestBody::Form(pairs) => f.debug_tuple("Form").field(&pairs.len()).finish(),
            RequestBody::Blob(bytes) => f.debug_tuple("Blob").field(&bytes.len()).finish(),
            RequestBody::Stream(_) => f.write_str("Stream"),
            RequestBody::Unsupported(kind) => f.debug_tuple("Unsupported").field(kind).finish(),
        }
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl RequestBody {
    /// Split into the body the real request sends and a copy for observation.
    ///
    /// Streams are teed: every chunk the real request pulls is also queued
    /// for the observer, which sees the end of the body once the real stream
    /// is dropped.
    pub fn tee(self) -> (Self, Self) {
        match self {
            RequestBody::Empty => (RequestBody::Empty, RequestBody::Empty),
            RequestBody::Text(text) => (RequestBody::Text(text.clone()), RequestBody::Text(text)),
            RequestBody::Form(pairs) => (RequestBody::Form(pairs.clone()), RequestBody::Form(pairs)),
            RequestBody::Blob(bytes) => (RequestBody::Blob(bytes.clone()), RequestBody::Blob(bytes)),
            RequestBody::Unsupported(kind) => (RequestBody::Unsupported(kind), RequestBody::Unsupported(kind)),
            RequestBody::Stream(inner) => {
                let (tx, rx) = mpsc::unbounded_channel::<Bytes>();
                let forwarded = inner
                    .inspect(move |chunk| {
                        let _ = tx.send(chunk.clone());
                    })
                    .boxed();
                let observed =
                    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|chunk| (chunk, rx)) }).boxed();
                (RequestBody::Stream(forwarded), RequestBody::Stream(observed))
            }
        }
    }

    /// Read the whole body as text. Streams are drained to the end.
    ///
    /// # Errors
    ///
    /// Returns `TapError::UnsupportedBody` for empty and unreadable bodies.
    pub async fn into_text(self) -> Result<String, TapError> {
        match self {
            RequestBody::Empty => Err(TapError::UnsupportedBody("empty")),
            RequestBody::Unsupported(kind) => Err(TapError::UnsupportedBody(kind)),
            RequestBody::Text(text) => Ok(text),
            RequestBody::Form(pairs) => Ok(url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish()),
            RequestBody::Blob(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            RequestBody::Stream(mut chunks) => {
                let mut buffer = Vec::new();
                while let Some(chunk) = chunks.next().await {
                    buffer.extend_from_slice(&chunk);
                }
                Ok(String::from_utf8_lossy(&buffer).into_owned())
            }
        }
    }
}

fn looks_like_json(text: &str) -> bool {
    matches!(text.trim_start().chars().next(), Some('{') | Some('['))
}

/// `k=v(&k=v)*` with non-empty keys and no whitespace.
fn looks_like_form(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || looks_like_json(text) {
        return false;
    }

    text.split('&').all(|pair| match pair.split_once('=') {
        Some((key, _)) => !key.is_empty() && !pair.contains(char::is_whitespace),
        None => false,
    })
}

/// Decode body text as URL-encoded parameters, then as a JSON object.
///
/// # Errors
///
/// Returns `TapError::Undecodable` when the text is neither.
pub fn decode(text: &str) -> Result<Map<String, Value>, TapError> {
    if looks_like_form(text) {
        let map = url::form_urlencoded::parse(text.trim().as_bytes())
            .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
            .collect();
        return Ok(map);
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(TapError::Undecodable("body is JSON but not an object".into())),
        Err(e) => Err(TapError::Undecodable(e.to_string())),
    }
}
