//! HTTP artifact fetcher.

use cap_core::{ArtifactFetcher, FetchError};
use std::time::Duration;

/// Blocking single-shot fetcher. No retry.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cap-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl ArtifactFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let failed = |reason: String| FetchError {
            url: url.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| failed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {}", status)));
        }
        let bytes = response.bytes().map_err(|e| failed(e.to_string()))?;
        tracing::debug!(%url, bytes = bytes.len(), "fetched artifact");
        Ok(bytes.to_vec())
    }
}
