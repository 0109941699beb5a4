use serde::Deserialize;

use crate::{ApiClient, RequestOptions, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdminProfileOut {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_merchants: u64,
    pub total_products: u64,
    pub total_orders: u64,
    pub pending_audits: u64,
}

pub struct AdminService<'a> {
    api: &'a ApiClient,
}

impl<'a> AdminService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn profile(&self) -> Result<AdminProfileOut> {
        self.api.request_json("/admin/profile", RequestOptions::get()).await
    }

    pub async fn dashboard(&self) -> Result<DashboardStats> {
        self.api.request_json("/admin/dashboard", RequestOptions::get()).await
    }
}

#[cfg(test)]
mod tests {
    use http::header::AUTHORIZATION;
    use http::{Method, StatusCode};
    use serde_json::json;

    use crate::mock::json_response;
    use crate::service::testing::harness;
    use crate::{AccessToken, TokenStore};

    #[tokio::test]
    async fn test_dashboard_after_proactive_refresh() {
        let h = harness(None);
        h.transport.on(Method::POST, "/auths/refresh", |_| {
            json_response(StatusCode::OK, json!({"message": "ok", "data": {"access_token": "minted"}}))
        });
        h.transport.on(Method::GET, "/admin/dashboard", |request| {
            assert_eq!(request.headers()[AUTHORIZATION], "Bearer minted");
            json_response(
                StatusCode::OK,
                json!({"message": "ok", "data": {
                    "total_users": 10, "total_merchants": 2, "total_products": 31,
                    "total_orders": 7, "pending_audits": 1
                }}),
            )
        });
        let stats = h.api.admin().dashboard().await.unwrap();
        assert_eq!(stats.total_products, 31);
        assert_eq!(h.store.get(), Some(AccessToken::new("minted")));
    }

    #[tokio::test]
    async fn test_profile() {
        let h = harness(Some("a1"));
        h.transport.on(Method::GET, "/admin/profile", |_| {
            json_response(
                StatusCode::OK,
                json!({"message": "ok", "data": {
                    "id": "u9", "username": "root", "email": "root@example.com",
                    "role": "admin", "is_active": true, "created_at": "2024-01-01T00:00:00Z"
                }}),
            )
        });
        let profile = h.api.admin().profile().await.unwrap();
        assert!(profile.is_active);
        assert_eq!(profile.role, "admin");
    }
}
