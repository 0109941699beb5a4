//! Client for the storefront HTTP API.
//!
//! [`ApiClient::request_json`] sends a JSON request, unwraps the `{ message, data }` envelope and
//! keeps the session alive: an expired access token is refreshed once (concurrent callers share
//! the same refresh) and the request retried once. When refreshing fails the session is expired.
mod api;
mod body;
mod client;
mod config;
mod credential;
mod error;
pub mod middleware;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod notify;
mod refresh;
mod request;
mod response;
mod sanitize;
pub mod service;
mod session;
mod singleflight;
mod transport;

pub use http::{Method, StatusCode};

pub use crate::api::{ApiClient, ApiClientBuilder, RequestOptions};
pub use crate::body::InMemoryBody;
pub use crate::client::Client;
pub use crate::config::ClientConfig;
pub use crate::credential::{AccessToken, MemoryTokenStore, TokenStore};
pub use crate::error::{Error, RefreshError, Result};
pub use crate::middleware::{CookieJar, Logger, Middleware, Next};
pub use crate::notify::{ChannelNotifier, Notification, Notifier, TracingNotifier};
pub use crate::refresh::{RefreshCoordinator, RefreshOutcome};
pub use crate::request::{InMemoryRequest, RequestBuilder};
pub use crate::response::{InMemoryResponse, InMemoryResponseExt};
pub use crate::session::{InMemoryNavigator, Navigator, SessionExpiry, SESSION_EXPIRED_MESSAGE};
pub use crate::singleflight::SingleFlight;
pub use crate::transport::{HyperTransport, Transport};
