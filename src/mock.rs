//! In-process doubles for the transport, notification and navigation ports.
use std::fmt::{Debug, Formatter};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use serde_json::Value;

use crate::notify::{Notification, Notifier};
use crate::transport::Transport;
use crate::{Error, InMemoryBody, InMemoryRequest, InMemoryResponse, InMemoryResponseExt, Result};

type Responder = Box<dyn Fn(&InMemoryRequest) -> InMemoryResponse + Send + Sync>;

struct Route {
    method: Method,
    path: String,
    latency: Option<Duration>,
    respond: Responder,
}

/// A transport that answers from closures keyed by method and path. Every request is recorded.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<InMemoryRequest>>,
}

impl Debug for MockTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let routes: Vec<String> = routes.iter().map(|r| format!("{} {}", r.method, r.path)).collect();
        f.debug_struct("MockTransport").field("routes", &routes).finish()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, method: Method, path: &str, respond: F)
    where
        F: Fn(&InMemoryRequest) -> InMemoryResponse + Send + Sync + 'static,
    {
        self.add(method, path, None, Box::new(respond));
    }

    /// Like [`MockTransport::on`], but the response is only produced after `latency`.
    pub fn on_slow<F>(&self, method: Method, path: &str, latency: Duration, respond: F)
    where
        F: Fn(&InMemoryRequest) -> InMemoryResponse + Send + Sync + 'static,
    {
        self.add(method, path, Some(latency), Box::new(respond));
    }

    fn add(&self, method: Method, path: &str, latency: Option<Duration>, respond: Responder) {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        routes.retain(|r| !(r.method == method && r.path == path));
        routes.push(Route {
            method,
            path: path.to_string(),
            latency,
            respond,
        });
    }

    pub fn requests(&self) -> Vec<InMemoryRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of requests sent to `path`, any method.
    pub fn calls(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.uri().path() == path)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: InMemoryRequest) -> Result<InMemoryResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        let (latency, response) = {
            let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
            let route = routes
                .iter()
                .find(|r| r.method == request.method() && r.path == request.uri().path())
                .ok_or_else(|| Error::Custom(format!("no mock route for {} {}", request.method(), request.uri().path())))?;
            (route.latency, (route.respond)(&request))
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        Ok(response)
    }
}

pub fn json_response(status: StatusCode, body: Value) -> InMemoryResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    InMemoryResponse::new_with(status, headers, InMemoryBody::Json(body))
}

pub fn text_response(status: StatusCode, body: &str) -> InMemoryResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    InMemoryResponse::new_with(status, headers, InMemoryBody::Text(body.to_string()))
}

/// Keeps every notification for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Success(m) => Some(m),
                Notification::Error(_) => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Error(m) => Some(m),
                Notification::Success(_) => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(&self, message: &str) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notification::Success(message.to_string()));
    }

    fn notify_error(&self, message: &str) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notification::Error(message.to_string()));
    }
}
