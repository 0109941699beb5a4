use serde_json::Value;

use crate::service::AuthRegisterIn;
use crate::{ApiClient, RequestOptions, Result};

/// Account endpoints outside the `/auths/` namespace.
pub struct UserService<'a> {
    api: &'a ApiClient,
}

impl<'a> UserService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Self-service sign-up through `/users/register`. Same payload as
    /// [`AuthService::register`](crate::service::AuthService::register); servers expose one or both.
    pub async fn register(&self, payload: &AuthRegisterIn) -> Result<()> {
        let _: Value = self
            .api
            .request_json("/users/register", RequestOptions::post(serde_json::to_value(payload)?).no_auth())
            .await?;
        Ok(())
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
    use crate::service::Role;

    fn payload() -> AuthRegisterIn {
        AuthRegisterIn {
            username: "buyer".to_string(),
            email: "buyer@example.com".to_string(),
            password: "hunter22".to_string(),
            role: Role::Member,
            captcha_id: "c1".to_string(),
            captcha_code: "7x9k".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_without_credentials() {
        let h = harness(None);
        h.transport.on(Method::POST, "/users/register", |_| {
            json_response(StatusCode::OK, json!({"message": "welcome", "data": null}))
        });
        h.api.users().register(&payload()).await.unwrap();
        assert!(h.transport.requests()[0].headers().get(AUTHORIZATION).is_none());
        assert_eq!(h.transport.calls("/auths/refresh"), 0);
        assert_eq!(h.notifier.successes(), vec!["welcome".to_string()]);
    }

    #[tokio::test]
    async fn test_rejected_captcha_surfaces_message() {
        let h = harness(None);
        h.transport.on(Method::POST, "/users/register", |_| {
            json_response(StatusCode::BAD_REQUEST, json!({"message": "captcha mismatch"}))
        });
        let err = h.api.users().register(&payload()).await.unwrap_err();
        assert_eq!(err.to_string(), "captcha mismatch");
    }
}
