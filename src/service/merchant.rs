use serde::{Deserialize, Serialize};

use crate::service::resource_path;
use crate::{ApiClient, RequestOptions, Result};

/// The shop behind a merchant account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MerchantOut {
    pub id: String,
    pub user_id: String,
    pub shop_name: String,
    pub contact_phone: Option<String>,
    pub shop_desc: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantUpdateIn {
    pub shop_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_desc: Option<String>,
}

pub struct MerchantService<'a> {
    api: &'a ApiClient,
}

impl<'a> MerchantService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// The shop of the logged-in merchant.
    pub async fn my_merchant(&self) -> Result<MerchantOut> {
        self.api
            .request_json("/merchants/my-merchant", RequestOptions::get())
            .await
    }

    pub async fn update(&self, id: &str, payload: &MerchantUpdateIn) -> Result<MerchantOut> {
        self.api
            .request_json(&resource_path("merchants", id), RequestOptions::put(serde_json::to_value(payload)?))
            .await
    }
}
