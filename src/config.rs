use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::Result;

pub static ENV_PREFIX: &str = "STOREFRONT";

/// Where the API lives and which of its paths have special meaning for authentication.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Its 401s mean bad credentials, never an expired session.
    pub login_path: String,
    pub refresh_path: String,
    /// Requests below this prefix never trigger a proactive refresh.
    pub auth_prefix: String,
    /// Location of the login surface in the UI.
    pub login_route: String,
    pub timeout_secs: u64,
    /// Install the `Logger` middleware.
    pub log_http: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            login_path: "/auths/login".to_string(),
            refresh_path: "/auths/refresh".to_string(),
            auth_prefix: "/auths/".to_string(),
            login_route: "/auth/login".to_string(),
            timeout_secs: 30,
            log_http: false,
        }
    }
}

impl ClientConfig {
    /// Defaults, then the optional file at `path`, then `STOREFRONT_*` environment variables.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_login_path(&self, path: &str) -> bool {
        strip_query(path) == self.login_path
    }

    pub fn is_auth_path(&self, path: &str) -> bool {
        strip_query(path).starts_with(&self.auth_prefix)
    }
}

/// The path part of a relative path or absolute URL, without query string.
fn strip_query(path: &str) -> &str {
    let path = match path.find("://") {
        Some(scheme_end) => {
            let rest = &path[scheme_end + 3..];
            rest.find('/').map(|i| &rest[i..]).unwrap_or("/")
        }
        None => path,
    };
    path.split(['?', '#']).next().unwrap_or_default()
}
