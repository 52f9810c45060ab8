use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    /// POSTs `body` as JSON with a bearer credential and decodes a JSON answer.
    /// Non-2xx statuses become `AppError::Upstream`.
    pub async fn post_json_bearer<T, R>(&self, url: &str, token: &str, body: &T) -> AppResult<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "{} returned {}: {}",
                url, status, text
            )));
        }

        Ok(response.json().await?)
    }
}
