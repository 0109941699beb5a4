use std::fmt::Formatter;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use http::{Method, Uri};

use crate::middleware::{Middleware, MiddlewareStack, Next};
use crate::request::JSON;
use crate::transport::{HyperTransport, Transport};
use crate::{InMemoryRequest, InMemoryResponse, RequestBuilder, Result};

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Low-level HTTP client: resolves paths against a base URL, applies default headers, and runs
/// each request through the middleware stack before handing it to the transport.
pub struct Client {
    base_url: Option<String>,
    default_headers: Vec<(String, String)>,
    pub(crate) middlewares: MiddlewareStack,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Client {{ base_url: {:?}, middlewares: {:?} }}", self.base_url, self.middlewares)
    }
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Client {
            base_url: None,
            default_headers: vec![
                ("User-Agent".to_string(), APP_USER_AGENT.to_string()),
                ("Accept".to_string(), JSON.to_string()),
            ],
            middlewares: Vec::new(),
            transport,
        }
    }

    /// A client backed by the network, each exchange bounded by `timeout`.
    pub fn hyper(timeout: Duration) -> Result<Self> {
        Ok(Self::new(Arc::new(HyperTransport::new(timeout)?)))
    }

    /// Set a `base_url` so you can pass relative paths instead of full URLs.
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    pub fn with_middleware<T: Middleware + 'static>(self, middleware: T) -> Self {
        self.with_shared_middleware(Arc::new(middleware))
    }

    /// Add a middleware the caller keeps a handle to, e.g. a cookie jar to inspect later.
    pub fn with_shared_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn default_header<S: AsRef<str>>(mut self, key: S, value: S) -> Self {
        self.default_headers.push((key.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    fn build_uri(&self, uri_or_path: &str) -> Result<Uri> {
        if let Ok(uri) = Uri::from_str(uri_or_path) {
            if uri.scheme().is_some() && uri.host().is_some() {
                return Ok(uri);
            }
        }
        let uri = match &self.base_url {
            Some(base) => format!("{base}{uri_or_path}"),
            None => uri_or_path.to_string(),
        };
        Ok(Uri::from_str(&uri)?)
    }

    /// The path `uri_or_path` resolves to, relative to the base URL's own path and without the
    /// query. `/auths/login`, `http://shop.test/api/auths/login` and `/auths/login?next=1` all
    /// give `/auths/login` under a base of `http://shop.test/api`.
    pub fn api_path(&self, uri_or_path: &str) -> Result<String> {
        let uri = self.build_uri(uri_or_path)?;
        let base_path = match &self.base_url {
            Some(base) => Uri::from_str(base)?.path().trim_end_matches('/').to_string(),
            None => String::new(),
        };
        let path = uri.path();
        match path.strip_prefix(base_path.as_str()) {
            Some(rest) if !base_path.is_empty() && rest.is_empty() => Ok("/".to_string()),
            Some(rest) if rest.starts_with('/') => Ok(rest.to_string()),
            _ => Ok(path.to_string()),
        }
    }

    pub fn request(&self, method: Method, uri_or_path: &str) -> RequestBuilder {
        match self.build_uri(uri_or_path) {
            Ok(uri) => RequestBuilder::new(method, uri)
                .headers(self.default_headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
            Err(e) => RequestBuilder::new(method, Uri::default()).fail(e),
        }
    }

    pub fn get(&self, uri_or_path: &str) -> RequestBuilder {
        self.request(Method::GET, uri_or_path)
    }

    pub fn post(&self, uri_or_path: &str) -> RequestBuilder {
        self.request(Method::POST, uri_or_path)
    }

    /// Run `request` through the middleware stack and the transport.
    pub async fn send(&self, request: InMemoryRequest) -> Result<InMemoryResponse> {
        let next = Next {
            client: self,
            middlewares: self.middlewares.as_slice(),
        };
        next.run(request).await
    }
}

impl From<Arc<dyn Transport>> for Client {
    fn from(transport: Arc<dyn Transport>) -> Self {
        Client::new(transport)
    }
}

#[cfg(test)]
mod tests {
    use http::header::{ACCEPT, USER_AGENT};

    use super::*;
    use crate::mock::MockTransport;
    use crate::Error;

    fn client() -> Client {
        Client::new(Arc::new(MockTransport::new())).base_url("http://127.0.0.1:8000/")
    }

    #[test]
    fn test_relative_path_joins_base_url() {
        let request = client().get("/products/?page=2").build().unwrap();
        assert_eq!(request.uri().to_string(), "http://127.0.0.1:8000/products/?page=2");
        assert_eq!(request.headers()[ACCEPT], "application/json");
        assert!(request.headers()[USER_AGENT].to_str().unwrap().starts_with("storefront-client/"));
    }

    #[test]
    fn test_absolute_url_passes_through() {
        let request = client().get("https://cdn.example.com/a.png").build().unwrap();
        assert_eq!(request.uri().to_string(), "https://cdn.example.com/a.png");
    }

    #[test]
    fn test_api_path_strips_base_path() {
        let prefixed = Client::new(Arc::new(MockTransport::new())).base_url("http://shop.test/api/");
        assert_eq!(prefixed.api_path("/auths/login").unwrap(), "/auths/login");
        assert_eq!(prefixed.api_path("http://shop.test/api/auths/login?next=1").unwrap(), "/auths/login");
        assert_eq!(prefixed.api_path("http://shop.test/api").unwrap(), "/");
        assert_eq!(prefixed.api_path("http://shop.test/apis/x").unwrap(), "/apis/x");
        assert_eq!(client().api_path("/products/?page=2").unwrap(), "/products/");
    }

    #[test]
    fn test_invalid_path_is_an_error() {
        let result = client().get("/bad path").build();
        assert!(matches!(result, Err(Error::InvalidUri(_))));
    }
}
