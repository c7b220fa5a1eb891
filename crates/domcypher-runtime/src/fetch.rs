//! Page fetching, the only stage that touches the network.

use std::collections::HashMap;
use std::time::Duration;

use domcypher_core::{Error, FetchConfig, FetchError, Result};
use reqwest::blocking::Client;
use tracing::{debug, info};

/// Given a URL, return its raw HTML or fail.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> std::result::Result<String, FetchError>;
}

/// Blocking HTTP fetcher. No retries; the request timeout comes from config.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody(url.to_string()));
        }
        info!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}

/// In-memory pages keyed by URL. Unknown URLs answer 404.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.insert(url, html);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, html: impl Into<String>) {
        self.pages.insert(url.into(), html.into());
    }
}

impl PageFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
        let html = self.pages.get(url).ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })?;
        if html.trim().is_empty() {
            return Err(FetchError::EmptyBody(url.to_string()));
        }
        Ok(html.clone())
    }
}
