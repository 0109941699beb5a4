use serde::Deserialize;

use crate::{ApiClient, RequestOptions, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

pub struct CategoryService<'a> {
    api: &'a ApiClient,
}

impl<'a> CategoryService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<Category>> {
        self.api.request_json("/categories/", RequestOptions::get()).await
    }
}
