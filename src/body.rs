use bytes::Bytes;
use http::HeaderValue;
use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sanitize::sanitize_value;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum InMemoryBody {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    Text(String),
    Json(Value),
}

/// True when a `Content-Type` header value declares JSON, ignoring parameters like charset.
pub fn is_json_content_type(content_type: Option<&HeaderValue>) -> bool {
    content_type
        .and_then(|ct| ct.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .map(|mime| {
            let mime = mime.trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

impl InMemoryBody {
    pub fn new_json(value: impl Serialize) -> Result<Self> {
        Ok(InMemoryBody::Json(serde_json::to_value(value)?))
    }

    pub fn new_text(text: impl Into<String>) -> Self {
        InMemoryBody::Text(text.into())
    }

    /// Decode raw response bytes according to the declared content type.
    /// JSON that fails to parse is kept as text so the caller decides what a bad payload means.
    pub fn from_response_bytes(content_type: Option<&HeaderValue>, bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return InMemoryBody::Empty;
        }
        if is_json_content_type(content_type) {
            if let Ok(value) = serde_json::from_slice::<Value>(&bytes) {
                return InMemoryBody::Json(value);
            }
        }
        match String::from_utf8(bytes.to_vec()) {
            Ok(text) => InMemoryBody::Text(text),
            Err(e) => InMemoryBody::Bytes(e.into_bytes()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        use InMemoryBody::{Bytes, Empty, Json, Text};
        match self {
            Empty => true,
            Bytes(b) => b.is_empty(),
            Text(s) => s.is_empty(),
            Json(_) => false,
        }
    }

    /// Parse the body as a JSON value. An empty body is `None`.
    pub fn json_value(&self) -> Result<Option<Value>> {
        match self {
            InMemoryBody::Empty => Ok(None),
            InMemoryBody::Json(v) => Ok(Some(v.clone())),
            InMemoryBody::Text(t) if t.trim().is_empty() => Ok(None),
            InMemoryBody::Text(t) => Ok(Some(serde_json::from_str(t)?)),
            InMemoryBody::Bytes(b) => Ok(Some(serde_json::from_slice(b)?)),
        }
    }

    pub fn json<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        match self {
            InMemoryBody::Empty => Err(serde_json::Error::custom("Empty body")),
            InMemoryBody::Bytes(b) => serde_json::from_slice(&b),
            InMemoryBody::Text(t) => serde_json::from_str(&t),
            InMemoryBody::Json(v) => serde_json::from_value(v),
        }
    }

    pub fn text(self) -> Result<String> {
        match self {
            InMemoryBody::Empty => Ok(String::new()),
            InMemoryBody::Bytes(b) => Ok(String::from_utf8(b)?),
            InMemoryBody::Text(s) => Ok(s),
            InMemoryBody::Json(val) => Ok(serde_json::to_string(&val)?),
        }
    }

    pub fn into_bytes(self) -> Result<Bytes> {
        match self {
            InMemoryBody::Empty => Ok(Bytes::new()),
            InMemoryBody::Bytes(b) => Ok(Bytes::from(b)),
            InMemoryBody::Text(s) => Ok(Bytes::from(s)),
            InMemoryBody::Json(val) => Ok(Bytes::from(serde_json::to_vec(&val)?)),
        }
    }

    /// A copy safe to log: secret-looking JSON keys are masked.
    pub fn sanitized(&self) -> Self {
        let mut body = self.clone();
        if let InMemoryBody::Json(value) = &mut body {
            sanitize_value(value);
        }
        body
    }
}
