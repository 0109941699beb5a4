//! Envelope-aware JSON requests with transparent access-token refresh.
use std::sync::Arc;

use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::credential::{AccessToken, MemoryTokenStore, TokenStore};
use crate::middleware::{CookieJar, Logger, Middleware, MiddlewareStack};
use crate::notify::{Notifier, TracingNotifier};
use crate::refresh::RefreshCoordinator;
use crate::response::{envelope_message, fallback_message};
use crate::session::{InMemoryNavigator, Navigator, SessionExpiry};
use crate::transport::{HyperTransport, Transport};
use crate::{Client, Error, InMemoryResponseExt, RefreshError, Result};

/// How one logical call should be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    /// Sent as JSON when present.
    pub body: Option<Value>,
    /// Attach the bearer token. On by default.
    pub auth: bool,
    /// Override the success-toast policy. By default only mutating methods show the server message.
    pub show_success: Option<bool>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            auth: true,
            show_success: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post(body: Value) -> Self {
        Self::new(Method::POST).body(body)
    }

    pub fn put(body: Value) -> Self {
        Self::new(Method::PUT).body(body)
    }

    pub fn patch(body: Value) -> Self {
        Self::new(Method::PATCH).body(body)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn no_auth(mut self) -> Self {
        self.auth = false;
        self
    }

    pub fn show_success(mut self, show: bool) -> Self {
        self.show_success = Some(show);
        self
    }

    fn wants_success_notification(&self) -> bool {
        self.show_success.unwrap_or_else(|| {
            matches!(self.method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
        })
    }
}

/// Result of a single send.
enum Attempt<T> {
    Settled(T),
    /// 401 that one refresh-and-retry may fix, with the token the request carried.
    AuthExpired(Option<AccessToken>),
}

/// Entry point for the UI layer: one method, [`ApiClient::request_json`], plus session helpers.
#[derive(Debug)]
pub struct ApiClient {
    config: ClientConfig,
    client: Arc<Client>,
    store: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
    session: Arc<SessionExpiry>,
    refresher: RefreshCoordinator,
    cookies: Arc<CookieJar>,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn cookies(&self) -> &Arc<CookieJar> {
        &self.cookies
    }

    pub fn session(&self) -> &Arc<SessionExpiry> {
        &self.session
    }

    /// Send one logical call and return the envelope's `data`, decoded as `T`.
    ///
    /// A 401 (outside the login endpoint) is answered with one refresh and one retry; a 401 on the
    /// retry is final. A 2xx response without a `data` field is [`Error::ContractViolation`].
    pub async fn request_json<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        for retry in [false, true] {
            match self.attempt(path, &options, retry).await? {
                Attempt::Settled(data) => return Ok(data),
                Attempt::AuthExpired(sent) => match self.store.get() {
                    // someone else already refreshed since this attempt was sent
                    Some(current) if sent.as_ref() != Some(&current) => {
                        debug!(path, "access token rejected but already replaced, retrying");
                    }
                    _ => {
                        debug!(path, "access token rejected, refreshing before retry");
                        self.refresh().await?;
                    }
                },
            }
        }
        Err(Error::Custom(format!("{path}: retry budget exhausted")))
    }

    /// Refresh through the coordinator. A refresh that never reached the server is reported here;
    /// every other failure was already reported by the session-expiry handler.
    async fn refresh(&self) -> Result<AccessToken> {
        match self.refresher.refresh().await {
            Ok(token) => Ok(token),
            Err(e) => {
                if let RefreshError::Transport(_) = e {
                    self.notifier.notify_error(&e.to_string());
                }
                Err(Error::RefreshFailed(e))
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(&self, path: &str, options: &RequestOptions, retry: bool) -> Result<Attempt<T>> {
        let route = self.client.api_path(path)?;
        let mut builder = self.client.request(options.method.clone(), path);
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }
        let mut sent = None;
        if options.auth {
            let token = match self.store.get() {
                Some(token) => Some(token),
                None if !retry && !self.config.is_auth_path(&route) => {
                    debug!(path, "no access token in memory, refreshing before sending");
                    Some(self.refresh().await?)
                }
                None => None,
            };
            if let Some(token) = token {
                builder = builder.bearer_auth(token.as_str());
                sent = Some(token);
            }
        }
        let request = builder.build()?;

        let res = match self.client.send(request).await {
            Ok(res) => res,
            Err(e) => {
                self.notifier.notify_error(&e.to_string());
                return Err(e);
            }
        };
        let status = res.status();
        // unparseable JSON is treated like no JSON at all
        let payload = res.json_payload().ok().flatten();

        if status == StatusCode::UNAUTHORIZED && !retry && !self.config.is_login_path(&route) {
            return Ok(Attempt::AuthExpired(sent));
        }

        if !status.is_success() {
            let message = payload
                .as_ref()
                .and_then(envelope_message)
                .unwrap_or_else(|| fallback_message(status));
            self.notifier.notify_error(&message);
            return Err(Error::request_failed(status, message));
        }

        let Some(data) = payload.as_ref().and_then(|p| p.get("data")) else {
            warn!(path, status = status.as_u16(), "successful response without `data`");
            return Err(Error::ContractViolation(format!(
                "{} {path} answered {} without a `data` field",
                options.method,
                status.as_u16()
            )));
        };
        let data = serde_json::from_value(data.clone())?;

        if options.wants_success_notification() {
            if let Some(message) = payload.as_ref().and_then(envelope_message).filter(|m| !m.is_empty()) {
                self.notifier.notify_success(&message);
            }
        }
        Ok(Attempt::Settled(data))
    }

    /// The current access token, minting one from the refresh cookie if memory is empty.
    /// Used when a session is resumed, e.g. at application start.
    pub async fn ensure_session(&self) -> Result<AccessToken> {
        match self.store.get() {
            Some(token) => Ok(token),
            None => self.refresh().await,
        }
    }

    pub fn login_with_token(&self, token: AccessToken) {
        self.store.set(token);
    }

    /// Forget every local credential. The refresh cookie goes with it.
    pub fn logout(&self) {
        self.store.clear();
        self.cookies.clear();
    }

    /// Force the expired-session path: clear credentials and go to the login surface.
    pub fn expire_session(&self) {
        self.session.on_session_expired();
    }
}

#[derive(Default)]
pub struct ApiClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn TokenStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    navigator: Option<Arc<dyn Navigator>>,
    middlewares: MiddlewareStack,
}

impl ApiClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn with_middleware<T: Middleware + 'static>(mut self, middleware: T) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let config = self.config;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HyperTransport::new(config.timeout())?),
        };
        let cookies = Arc::new(CookieJar::new());
        let mut client = Client::new(transport)
            .base_url(&config.base_url)
            .with_shared_middleware(cookies.clone());
        for middleware in self.middlewares {
            client = client.with_shared_middleware(middleware);
        }
        if config.log_http {
            client = client.with_middleware(Logger);
        }
        let client = Arc::new(client);

        let store = self.store.unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier));
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(InMemoryNavigator::new(&config.login_route, "/")));
        let session = Arc::new(SessionExpiry::new(
            store.clone(),
            notifier.clone(),
            navigator,
            &config.login_route,
        ));
        let refresher = RefreshCoordinator::new(client.clone(), &config.refresh_path, store.clone(), session.clone());

        Ok(ApiClient {
            config,
            client,
            store,
            notifier,
            session,
            refresher,
            cookies,
        })
    }
}
