use serde::Deserialize;

use crate::{ApiClient, RequestOptions, Result};

/// Captcha challenge. `image` is rendered by the caller as-is (typically a data URL).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaptchaOut {
    pub id: String,
    pub image: String,
}

pub struct CommonService<'a> {
    api: &'a ApiClient,
}

impl<'a> CommonService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn captcha(&self) -> Result<CaptchaOut> {
        self.api
            .request_json("/commons/captcha", RequestOptions::get().no_auth())
            .await
    }
}
