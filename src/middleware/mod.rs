use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, trace};

pub use cookies::CookieJar;

use crate::client::Client;
use crate::sanitize::loggable_headers;
use crate::{InMemoryRequest, InMemoryResponse, Result};

mod cookies;

pub type MiddlewareStack = Vec<Arc<dyn Middleware>>;

#[derive(Debug, Copy, Clone)]
pub struct Next<'a> {
    pub client: &'a Client,
    pub(crate) middlewares: &'a [Arc<dyn Middleware>],
}

impl Next<'_> {
    pub async fn run(self, request: InMemoryRequest) -> Result<InMemoryResponse> {
        if let Some((middleware, rest)) = self.middlewares.split_first() {
            let next = Next {
                client: self.client,
                middlewares: rest,
            };
            middleware.handle(request, next).await
        } else {
            self.client.transport().send(request).await
        }
    }
}

#[async_trait]
pub trait Middleware: Send + Sync + Debug {
    async fn handle(&self, request: InMemoryRequest, next: Next<'_>) -> Result<InMemoryResponse> {
        next.run(request).await
    }
}

/// Logs every exchange through `tracing`. Credentials are masked; bodies only appear at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct Logger;

#[async_trait]
impl Middleware for Logger {
    async fn handle(&self, request: InMemoryRequest, next: Next<'_>) -> Result<InMemoryResponse> {
        let url = request.uri().to_string();
        let method = request.method().clone();
        debug!(%method, %url, headers = %loggable_headers(request.headers()), ">>> request");
        if !request.body().is_empty() {
            trace!(body = ?request.body().sanitized(), ">>> request body");
        }
        let started = Instant::now();
        let res = next.run(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &res {
            Ok(res) => {
                debug!(%method, %url, status = res.status().as_u16(), elapsed_ms, headers = %loggable_headers(res.headers()), "<<< response");
                trace!(body = ?res.body().sanitized(), "<<< response body");
            }
            Err(e) => debug!(%method, %url, elapsed_ms, error = %e, "<<< no response"),
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::mock::{json_response, MockTransport};

    #[derive(Debug, Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl Middleware for Counting {
        async fn handle(&self, request: InMemoryRequest, next: Next<'_>) -> Result<InMemoryResponse> {
            self.0.fetch_add(1, Ordering::SeqCst);
            next.run(request).await
        }
    }

    #[tokio::test]
    async fn test_chain_runs_every_middleware_then_transport() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::GET, "/ping", |_| json_response(StatusCode::OK, json!({"message": "pong", "data": null})));
        let counting = Arc::new(Counting::default());
        let client = Client::new(transport.clone())
            .base_url("http://shop.test")
            .with_middleware(Logger)
            .with_shared_middleware(counting.clone());
        let request = client.request(Method::GET, "/ping").build().unwrap();
        let res = client.send(request).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
        assert_eq!(transport.calls("/ping"), 1);
    }
}
