//! Typed endpoints of the storefront API, one module per resource.
//!
//! Every call goes through [`ApiClient::request_json`], so they all share token refresh,
//! notifications and error mapping.
use crate::ApiClient;

pub mod admin;
pub mod auth;
pub mod category;
pub mod common;
pub mod merchant;
pub mod product;
pub mod user;

pub use admin::{AdminProfileOut, AdminService, DashboardStats};
pub use auth::{AuthLoginIn, AuthRegisterIn, AuthService, Role, TokenOut};
pub use category::{Category, CategoryService};
pub use common::{CaptchaOut, CommonService};
pub use merchant::{MerchantOut, MerchantService, MerchantUpdateIn};
pub use product::{Product, ProductIn, ProductListOut, ProductQuery, ProductService, ProductStatus, ProductStatusIn};
pub use user::UserService;

/// `/<collection>/<id>` with the id as one percent-encoded segment.
pub(crate) fn resource_path(collection: &str, id: &str) -> String {
    format!("/{collection}/{}", urlencoding::encode(id))
}

impl ApiClient {
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self)
    }

    pub fn common(&self) -> CommonService<'_> {
        CommonService::new(self)
    }

    pub fn categories(&self) -> CategoryService<'_> {
        CategoryService::new(self)
    }

    pub fn products(&self) -> ProductService<'_> {
        ProductService::new(self)
    }

    pub fn merchants(&self) -> MerchantService<'_> {
        MerchantService::new(self)
    }

    pub fn admin(&self) -> AdminService<'_> {
        AdminService::new(self)
    }

    pub fn users(&self) -> UserService<'_> {
        UserService::new(self)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_path_encodes_id() {
        assert_eq!(resource_path("products", "abc-1"), "/products/abc-1");
        assert_eq!(resource_path("products", "a/b c"), "/products/a%2Fb%20c");
    }
}
