use http::header::{CONTENT_TYPE, SET_COOKIE};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::body::is_json_content_type;
use crate::{Error, InMemoryBody, Result};

pub type InMemoryResponse = http::Response<InMemoryBody>;

pub trait InMemoryResponseExt: Sized {
    fn new_with(status: StatusCode, headers: HeaderMap, body: InMemoryBody) -> Self;
    /// Whether the declared content type is JSON.
    fn is_json(&self) -> bool;
    /// The parsed JSON payload, only when the response declares JSON.
    fn json_payload(&self) -> Result<Option<Value>>;
    fn json<U: DeserializeOwned>(self) -> Result<U>;
    fn text(self) -> Result<String>;
    fn error_for_status(self) -> Result<Self>;
    fn get_cookie(&self, name: &str) -> Option<String>;
}

impl InMemoryResponseExt for InMemoryResponse {
    fn new_with(status: StatusCode, headers: HeaderMap, body: InMemoryBody) -> Self {
        let mut res = http::Response::new(body);
        *res.status_mut() = status;
        *res.headers_mut() = headers;
        res
    }

    fn is_json(&self) -> bool {
        is_json_content_type(self.headers().get(CONTENT_TYPE))
    }

    fn json_payload(&self) -> Result<Option<Value>> {
        if !self.is_json() {
            return Ok(None);
        }
        self.body().json_value()
    }

    fn json<U: DeserializeOwned>(self) -> Result<U> {
        Ok(self.into_body().json()?)
    }

    fn text(self) -> Result<String> {
        self.into_body().text()
    }

    fn error_for_status(self) -> Result<Self> {
        let status = self.status();
        if status.is_server_error() || status.is_client_error() {
            let message = self
                .json_payload()
                .ok()
                .flatten()
                .and_then(|payload| envelope_message(&payload))
                .unwrap_or_else(|| fallback_message(status));
            Err(Error::request_failed(status, message))
        } else {
            Ok(self)
        }
    }

    fn get_cookie(&self, name: &str) -> Option<String> {
        self.headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| cookie::Cookie::parse_encoded(value.to_string()).ok())
            .find(|c| c.name() == name)
            .map(|c| c.value().to_string())
    }
}

/// Pull `message` out of an error or success envelope. Strings are taken verbatim,
/// any other JSON value is rendered as JSON text.
pub fn envelope_message(payload: &Value) -> Option<String> {
    match payload.as_object()?.get("message")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub fn fallback_message(status: StatusCode) -> String {
    format!("Request failed: {}", status.as_u16())
}
