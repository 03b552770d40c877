//! Blocking HTTP transport for the relay client.

use std::time::Duration;

use reqwest::blocking::Client;

use super::ImageFetcher;
use crate::{Error, Result};

/// Fetches relay URLs with a blocking `reqwest` client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| Error::NetworkError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::image_load(url, format!("HTTP GET failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::image_load(url, format!("HTTP {}", status)));
        }

        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| Error::image_load(url, format!("Failed to read response body: {}", e)))
    }
}
