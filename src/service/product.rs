use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::service::resource_path;
use crate::{ApiClient, Error, RequestOptions, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    On,
    Off,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Product {
    pub id: String,
    pub merchant_id: String,
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub status: ProductStatus,
    pub image_url: Option<String>,
    pub views_count: u64,
    pub sales_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductListOut {
    pub items: Vec<Product>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Create and update payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductIn {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductStatusIn {
    pub status: ProductStatus,
}

/// List filters. Unset fields are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
}

impl ProductQuery {
    fn to_path(&self) -> Result<String> {
        let qs = serde_qs::to_string(self).map_err(|e| Error::Custom(format!("product query: {e}")))?;
        if qs.is_empty() {
            Ok("/products/".to_string())
        } else {
            Ok(format!("/products/?{qs}"))
        }
    }
}

pub struct ProductService<'a> {
    api: &'a ApiClient,
}

impl<'a> ProductService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &ProductQuery) -> Result<ProductListOut> {
        self.api.request_json(&query.to_path()?, RequestOptions::get()).await
    }

    pub async fn detail(&self, id: &str) -> Result<Product> {
        self.api
            .request_json(&resource_path("products", id), RequestOptions::get())
            .await
    }

    pub async fn create(&self, payload: &ProductIn) -> Result<Product> {
        self.api
            .request_json("/products/", RequestOptions::post(to_value(payload)?))
            .await
    }

    pub async fn update(&self, id: &str, payload: &ProductIn) -> Result<Product> {
        self.api
            .request_json(&resource_path("products", id), RequestOptions::put(to_value(payload)?))
            .await
    }

    /// Put a product on or off the shelf.
    pub async fn update_status(&self, id: &str, status: ProductStatus) -> Result<Product> {
        let path = format!("{}/status", resource_path("products", id));
        self.api
            .request_json(&path, RequestOptions::patch(to_value(&ProductStatusIn { status })?))
            .await
    }
}

fn to_value<T: Serialize>(payload: &T) -> Result<Value> {
    Ok(serde_json::to_value(payload)?)
}
