use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

/// Body of the server's status route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerStatus {
    pub message: String,
    pub events: String,
}

pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Client for the server that serves `endpoint`.
    pub fn for_stream_endpoint(client: Client, endpoint: &Url) -> Self {
        let mut base_url = endpoint.clone();
        base_url.set_path("/");
        base_url.set_query(None);
        base_url.set_fragment(None);
        Self::new(client, base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn server_status(&self) -> Result<ServerStatus> {
        let response = self
            .client
            .get(self.base_url.clone())
            .send()
            .await
            .context("Failed to reach server")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            anyhow::bail!("Failed to get server status: {} - Response: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse server status")
    }
}
