use std::str::FromStr;

use http::header::{HeaderName, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::uri::PathAndQuery;
use http::{HeaderMap, HeaderValue, Method, Uri};
use serde::Serialize;

use crate::{Error, InMemoryBody, Result};

pub type InMemoryRequest = http::Request<InMemoryBody>;

pub(crate) static JSON: &str = "application/json";

/// Accumulates the parts of a request. Header and URI problems are deferred to [`RequestBuilder::build`]
/// so that chained calls stay infallible.
#[derive(Debug)]
pub struct RequestBuilder {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: InMemoryBody,
    error: Option<Error>,
}

impl RequestBuilder {
    pub fn new(method: Method, uri: Uri) -> Self {
        RequestBuilder {
            method,
            uri,
            headers: HeaderMap::new(),
            body: InMemoryBody::Empty,
            error: None,
        }
    }

    pub(crate) fn fail(mut self, error: Error) -> Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        match (HeaderName::from_str(key), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
                self
            }
            _ => self.fail(Error::Custom(format!("invalid header `{key}`"))),
        }
    }

    pub fn headers<S: AsRef<str>, I: IntoIterator<Item = (S, S)>>(self, headers: I) -> Self {
        headers
            .into_iter()
            .fold(self, |builder, (k, v)| builder.header(k.as_ref(), v.as_ref()))
    }

    pub fn bearer_auth(self, token: &str) -> Self {
        self.header(AUTHORIZATION.as_str(), &format!("Bearer {token}"))
    }

    /// Serialize `obj` as the JSON body and declare it with `Content-Type: application/json`.
    pub fn json<S: Serialize>(mut self, obj: S) -> Self {
        match serde_json::to_value(obj) {
            Ok(value) => {
                self.body = InMemoryBody::Json(value);
                self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
                self.headers.entry(ACCEPT).or_insert(HeaderValue::from_static(JSON));
                self
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Add a url query parameter, but keep existing parameters.
    pub fn query(mut self, k: &str, v: &str) -> Self {
        let mut parts = std::mem::take(&mut self.uri).into_parts();
        let pq = match &parts.path_and_query {
            Some(pq) => match pq.query() {
                Some(q) => format!("{}?{}&{}={}", pq.path(), q, urlencoding::encode(k), urlencoding::encode(v)),
                None => format!("{}?{}={}", pq.path(), urlencoding::encode(k), urlencoding::encode(v)),
            },
            None => format!("/?{}={}", urlencoding::encode(k), urlencoding::encode(v)),
        };
        match PathAndQuery::from_str(&pq) {
            Ok(pq) => parts.path_and_query = Some(pq),
            Err(e) => return self.fail(Error::InvalidUri(e)),
        }
        match Uri::from_parts(parts) {
            Ok(uri) => {
                self.uri = uri;
                self
            }
            Err(e) => self.fail(Error::Http(e.into())),
        }
    }

    pub fn build(self) -> Result<InMemoryRequest> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let mut request = http::Request::builder()
            .method(self.method)
            .uri(self.uri)
            .body(self.body)?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_query_keeps_existing_params() {
        let r = RequestBuilder::new(Method::GET, "http://example.com/foo?a=1".parse().unwrap()).query("b", "2 3");
        assert_eq!(r.uri.to_string(), "http://example.com/foo?a=1&b=2%203");
    }

    #[test]
    fn test_json_sets_content_type() {
        let request = RequestBuilder::new(Method::POST, "http://example.com/products/".parse().unwrap())
            .json(json!({"name": "Lamp"}))
            .build()
            .unwrap();
        assert_eq!(request.headers()[CONTENT_TYPE], JSON);
        assert_eq!(request.body(), &InMemoryBody::Json(json!({"name": "Lamp"})));
    }

    #[test]
    fn test_invalid_header_surfaces_on_build() {
        let result = RequestBuilder::new(Method::GET, "http://example.com/".parse().unwrap())
            .header("bad header", "x")
            .build();
        assert!(matches!(result, Err(Error::Custom(_))));
    }
}
