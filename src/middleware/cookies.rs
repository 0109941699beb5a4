use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use cookie::time::OffsetDateTime;
use cookie::Cookie;
use http::header::{COOKIE, SET_COOKIE};
use http::HeaderValue;
use tracing::{debug, warn};

use crate::middleware::{Middleware, Next};
use crate::{InMemoryRequest, InMemoryResponse, Result};

/// Keeps the cookies the server sets and sends them back to the same host, the way a browser
/// does for credentialed same-origin requests. The refresh credential lives here as an
/// HTTP-only cookie; it is never handed to callers.
#[derive(Default)]
pub struct CookieJar {
    hosts: RwLock<HashMap<String, BTreeMap<String, String>>>,
}

impl std::fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hosts = self.hosts.read().unwrap_or_else(PoisonError::into_inner);
        let names: BTreeMap<&str, Vec<&str>> = hosts
            .iter()
            .map(|(host, jar)| (host.as_str(), jar.keys().map(String::as_str).collect()))
            .collect();
        f.debug_struct("CookieJar").field("cookies", &names).finish()
    }
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, host: &str, name: &str) -> bool {
        let hosts = self.hosts.read().unwrap_or_else(PoisonError::into_inner);
        hosts.get(host).is_some_and(|jar| jar.contains_key(name))
    }

    pub fn clear(&self) {
        self.hosts.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn cookie_header(&self, host: &str) -> Option<HeaderValue> {
        let hosts = self.hosts.read().unwrap_or_else(PoisonError::into_inner);
        let jar = hosts.get(host).filter(|jar| !jar.is_empty())?;
        let header = jar
            .iter()
            .map(|(name, value)| Cookie::new(name.as_str(), value.as_str()).encoded().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&header).ok()
    }

    fn store(&self, host: &str, response: &InMemoryResponse) {
        let mut hosts = self.hosts.write().unwrap_or_else(PoisonError::into_inner);
        for value in response.headers().get_all(SET_COOKIE) {
            let Some(raw) = value.to_str().ok() else {
                continue;
            };
            let cookie = match Cookie::parse_encoded(raw.to_string()) {
                Ok(cookie) => cookie,
                Err(e) => {
                    warn!(host, error = %e, "ignoring unparsable set-cookie");
                    continue;
                }
            };
            let jar = hosts.entry(host.to_string()).or_default();
            let expired = cookie.value().is_empty()
                || cookie.max_age().is_some_and(|age| age.is_zero() || age.is_negative())
                || cookie.expires_datetime().is_some_and(|at| at <= OffsetDateTime::now_utc());
            if expired {
                jar.remove(cookie.name());
                debug!(host, name = cookie.name(), "cookie removed");
            } else {
                jar.insert(cookie.name().to_string(), cookie.value().to_string());
                debug!(host, name = cookie.name(), "cookie stored");
            }
        }
    }
}

#[async_trait]
impl Middleware for CookieJar {
    async fn handle(&self, mut request: InMemoryRequest, next: Next<'_>) -> Result<InMemoryResponse> {
        let host = request.uri().host().unwrap_or_default().to_string();
        if let Some(header) = self.cookie_header(&host) {
            request.headers_mut().insert(COOKIE, header);
        }
        let res = next.run(request).await?;
        self.store(&host, &res);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use http::{HeaderMap, Method, StatusCode};

    use super::*;
    use crate::mock::MockTransport;
    use crate::{Client, InMemoryBody, InMemoryResponseExt};

    fn set_cookie(value: &'static str) -> InMemoryResponse {
        let mut headers = HeaderMap::new();
        headers.insert(SET_COOKIE, HeaderValue::from_static(value));
        InMemoryResponse::new_with(StatusCode::OK, headers, InMemoryBody::Empty)
    }

    #[tokio::test]
    async fn test_cookie_round_trips_to_same_host_only() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::POST, "/auths/login", |_| set_cookie("refresh_token=r1; HttpOnly; Path=/"));
        transport.on(Method::GET, "/me", |_| InMemoryResponse::new_with(StatusCode::OK, HeaderMap::new(), InMemoryBody::Empty));
        let jar = Arc::new(CookieJar::new());
        let client = Client::new(transport.clone())
            .base_url("http://shop.test")
            .with_shared_middleware(jar.clone());

        client.send(client.request(Method::POST, "/auths/login").build().unwrap()).await.unwrap();
        assert!(jar.contains("shop.test", "refresh_token"));

        client.send(client.request(Method::GET, "/me").build().unwrap()).await.unwrap();
        client.send(client.request(Method::GET, "http://other.test/me").build().unwrap()).await.unwrap();

        let sent = transport.requests();
        assert_eq!(sent[1].headers()[COOKIE], "refresh_token=r1");
        assert!(sent[2].headers().get(COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_max_age_zero_removes_cookie() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::POST, "/login", |_| set_cookie("refresh_token=r1"));
        transport.on(Method::POST, "/logout", |_| set_cookie("refresh_token=gone; Max-Age=0"));
        let jar = Arc::new(CookieJar::new());
        let client = Client::new(transport.clone())
            .base_url("http://shop.test")
            .with_shared_middleware(jar.clone());

        client.send(client.request(Method::POST, "/login").build().unwrap()).await.unwrap();
        client.send(client.request(Method::POST, "/logout").build().unwrap()).await.unwrap();
        assert!(!jar.contains("shop.test", "refresh_token"));
    }

    #[tokio::test]
    async fn test_past_expires_removes_cookie() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::POST, "/login", |_| set_cookie("refresh_token=r1; Expires=Fri, 01 Jan 2100 00:00:00 GMT"));
        transport.on(Method::POST, "/logout", |_| set_cookie("refresh_token=gone; Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
        let jar = Arc::new(CookieJar::new());
        let client = Client::new(transport.clone())
            .base_url("http://shop.test")
            .with_shared_middleware(jar.clone());

        client.send(client.request(Method::POST, "/login").build().unwrap()).await.unwrap();
        assert!(jar.contains("shop.test", "refresh_token"));
        client.send(client.request(Method::POST, "/logout").build().unwrap()).await.unwrap();
        assert!(!jar.contains("shop.test", "refresh_token"));
    }
}
