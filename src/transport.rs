use std::fmt::{Debug, Formatter};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

use crate::{Error, InMemoryBody, InMemoryRequest, InMemoryResponse, Result};

/// The last hop of every request: turns a fully-prepared request into a response.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn send(&self, request: InMemoryRequest) -> Result<InMemoryResponse>;
}

/// Sends requests over the network with hyper. Every exchange, body included, is bounded by `timeout`.
pub struct HyperTransport {
    inner: hyper_util::client::legacy::Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    timeout: Duration,
}

impl Debug for HyperTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "HyperTransport {{ timeout: {:?} }}", self.timeout)
    }
}

impl HyperTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();
        let inner = hyper_util::client::legacy::Client::builder(TokioExecutor::new()).build(https);
        Ok(Self { inner, timeout })
    }

    async fn exchange(&self, request: InMemoryRequest) -> Result<InMemoryResponse> {
        let (parts, body) = request.into_parts();
        let request = http::Request::from_parts(parts, Full::new(body.into_bytes()?));
        let res = self.inner.request(request).await?;
        let (parts, body) = res.into_parts();
        let bytes = body.collect().await?.to_bytes();
        let body = InMemoryBody::from_response_bytes(parts.headers.get(CONTENT_TYPE), bytes);
        Ok(InMemoryResponse::from_parts(parts, body))
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: InMemoryRequest) -> Result<InMemoryResponse> {
        let uri = request.uri().clone();
        match tokio::time::timeout(self.timeout, self.exchange(request)).await {
            Ok(res) => res,
            Err(_) => {
                debug!(url = %uri, timeout_ms = self.timeout.as_millis() as u64, "request timed out");
                Err(Error::Timeout(self.timeout))
            }
        }
    }
}
