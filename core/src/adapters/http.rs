//! HTTP adapter for the port-manager API.
//!
//! - `GET  /api/port-manager/ports` returns `{ "port_mappings": ["host:container", ...] }`
//! - `POST /api/port-manager/ports/add` and `/remove` take `{ "host_port", "container_port" }`

use serde::Deserialize;
use tracing::debug;

use crate::config::Settings;
use crate::domain::PortMapping;
use crate::error::{Error, Result};
use crate::ports::PortMappingPort;

const PORTS_PATH: &str = "/api/port-manager/ports";
const ADD_PATH: &str = "/api/port-manager/ports/add";
const REMOVE_PATH: &str = "/api/port-manager/ports/remove";

/// Response body of the list endpoint.
#[derive(Debug, Deserialize)]
struct PortListResponse {
    port_mappings: Vec<String>,
}

/// Port-manager client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPortManager {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPortManager {
    /// Create a client for the given base URL with default HTTP settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::build(base_url.into(), None)
    }

    /// Create a client from stored settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::build(settings.base_url.clone(), settings.request_timeout())
    }

    fn build(base_url: String, timeout: Option<std::time::Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_mapping(&self, path: &str, mapping: PortMapping) -> Result<()> {
        let url = self.url(path);
        debug!("POST {} {}", url, mapping);

        let response = self
            .client
            .post(&url)
            .json(&mapping)
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request(format!(
                "{} returned {}{}",
                path,
                status,
                if body.is_empty() {
                    String::new()
                } else {
                    format!(": {}", body.trim())
                }
            )));
        }

        Ok(())
    }
}

/// Decode the list endpoint body into typed mappings.
///
/// A missing field, wrong JSON type, or malformed entry is a fetch error.
fn decode_port_list(body: &[u8]) -> Result<Vec<PortMapping>> {
    let response: PortListResponse = serde_json::from_slice(body)
        .map_err(|e| Error::Fetch(format!("Unexpected response body: {}", e)))?;

    response
        .port_mappings
        .iter()
        .map(|entry| {
            entry
                .parse::<PortMapping>()
                .map_err(|e| Error::Fetch(e.to_string()))
        })
        .collect()
}

impl PortMappingPort for HttpPortManager {
    async fn list_mappings(&self) -> Result<Vec<PortMapping>> {
        let url = self.url(PORTS_PATH);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("{} returned {}", PORTS_PATH, status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to read response body: {}", e)))?;

        decode_port_list(&body)
    }

    async fn add_mapping(&self, mapping: PortMapping) -> Result<()> {
        self.post_mapping(ADD_PATH, mapping).await
    }

    async fn remove_mapping(&self, mapping: PortMapping) -> Result<()> {
        self.post_mapping(REMOVE_PATH, mapping).await
    }
}
