use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::{AccessToken, ApiClient, RequestOptions, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Merchant,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthLoginIn {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthRegisterIn {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub captcha_id: String,
    pub captcha_code: String,
}

/// Body of a successful login. The refresh token normally travels as an HTTP-only cookie
/// instead, so it is usually absent here.
#[derive(Clone, PartialEq, Deserialize)]
pub struct TokenOut {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for TokenOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenOut")
            .field("access_token", &"**********")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "**********"))
            .finish()
    }
}

pub struct AuthService<'a> {
    api: &'a ApiClient,
}

impl<'a> AuthService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Exchange credentials for an access token and keep it for subsequent requests.
    pub async fn login(&self, payload: &AuthLoginIn) -> Result<TokenOut> {
        let path = self.api.config().login_path.clone();
        let tokens: TokenOut = self
            .api
            .request_json(&path, RequestOptions::post(serde_json::to_value(payload)?).no_auth())
            .await?;
        self.api.login_with_token(AccessToken::new(tokens.access_token.as_str()));
        info!(role = ?payload.role, "logged in");
        Ok(tokens)
    }

    pub async fn register(&self, payload: &AuthRegisterIn) -> Result<()> {
        let _: Value = self
            .api
            .request_json("/auths/register", RequestOptions::post(serde_json::to_value(payload)?).no_auth())
            .await?;
        Ok(())
    }

    pub fn logout(&self) {
        self.api.logout();
        info!("logged out");
    }
}

#[cfg(test)]
mod tests {
    use http::header::AUTHORIZATION;
    use http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::mock::json_response;
    use crate::service::testing::harness;
    use crate::{Error, InMemoryBody, TokenStore};

    fn login_payload() -> AuthLoginIn {
        AuthLoginIn {
            email: "shop@example.com".to_string(),
            password: "hunter22".to_string(),
            role: Role::Merchant,
        }
    }

    #[tokio::test]
    async fn test_login_stores_access_token() {
        let h = harness(None);
        h.transport.on(Method::POST, "/auths/login", |_| {
            json_response(StatusCode::OK, json!({"message": "login ok", "data": {"access_token": "a1"}}))
        });
        let tokens = h.api.auth().login(&login_payload()).await.unwrap();
        assert_eq!(tokens.access_token, "a1");
        assert_eq!(tokens.refresh_token, None);
        assert_eq!(h.store.get(), Some(AccessToken::new("a1")));

        let sent = h.transport.requests();
        assert!(sent[0].headers().get(AUTHORIZATION).is_none());
        assert_eq!(
            sent[0].body(),
            &InMemoryBody::Json(json!({"email": "shop@example.com", "password": "hunter22", "role": "merchant"}))
        );
        assert_eq!(h.notifier.successes(), vec!["login ok".to_string()]);
    }

    #[tokio::test]
    async fn test_bad_credentials_keep_store_empty() {
        let h = harness(None);
        h.transport.on(Method::POST, "/auths/login", |_| {
            json_response(StatusCode::UNAUTHORIZED, json!({"message": "invalid credentials"}))
        });
        let err = h.api.auth().login(&login_payload()).await.unwrap_err();
        assert!(matches!(err, Error::RequestFailed { .. }));
        assert_eq!(err.to_string(), "invalid credentials");
        assert_eq!(h.store.get(), None);
        assert_eq!(h.transport.calls("/auths/refresh"), 0);
    }

    #[tokio::test]
    async fn test_register_accepts_null_data() {
        let h = harness(None);
        h.transport.on(Method::POST, "/auths/register", |_| {
            json_response(StatusCode::CREATED, json!({"message": "registered", "data": null}))
        });
        let payload = AuthRegisterIn {
            username: "shop".to_string(),
            email: "shop@example.com".to_string(),
            password: "hunter22".to_string(),
            role: Role::Member,
            captcha_id: "c1".to_string(),
            captcha_code: "7x9k".to_string(),
        };
        h.api.auth().register(&payload).await.unwrap();
        assert_eq!(h.notifier.successes(), vec!["registered".to_string()]);
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let tokens = TokenOut {
            access_token: "secret".to_string(),
            refresh_token: Some("secret".to_string()),
        };
        assert!(!format!("{tokens:?}").contains("secret"));
    }

    #[test]
    fn test_logout_clears_token() {
        let h = harness(Some("a1"));
        h.api.auth().logout();
        assert_eq!(h.store.get(), None);
    }
}
