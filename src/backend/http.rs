//! HTTP client for the backend RPC

use super::{BackendClient, BackendReply};
use eyre::{Context, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Backend reached over HTTP
///
/// Each method is `POST {base_url}/{method}` with an empty JSON object as
/// body; the response body is a [`BackendReply`].
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a new backend client
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .user_agent("UsdcPanel/0.1.0")
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { base_url, client })
    }

    /// URL a method is posted to
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str) -> Result<BackendReply<T>> {
        let url = self.method_url(method);
        tracing::debug!("Calling backend {}", url);

        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .with_context(|| format!("Failed to call backend method {}", method))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            eyre::bail!("Backend method {} failed: {} - {}", method, status, body);
        }

        let text = resp.text().await.context("Failed to read response body")?;
        serde_json::from_str(&text).with_context(|| {
            let preview: String = text.chars().take(200).collect();
            format!("Failed to parse {} response: {}", method, preview)
        })
    }
}

impl BackendClient for HttpBackend {
    async fn get_address(&self) -> Result<BackendReply<String>> {
        self.call("get_address").await
    }

    async fn transfer_usdc(&self) -> Result<BackendReply<String>> {
        self.call("transfer_usdc").await
    }
}
