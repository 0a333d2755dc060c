//! HTTP client for public campaign project pages.

use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;

/// HTTP client for campaign project pages.
///
/// Fetches raw page text only; responses are classified downstream by content
/// markers ([`crate::page::parse_campaign_page`]), not by status code —
/// rate-limit notices and tombstone pages arrive as ordinary HTML. There is
/// no retry policy: pacing is the caller's inter-request sleep, and a
/// rate-limit marker halts the batch.
pub struct CampaignClient {
    client: Client,
}

impl CampaignClient {
    /// Creates a `CampaignClient` with the configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches one campaign page and returns its body text.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] on network, TLS, or timeout failures.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        tracing::debug!(url, "fetching campaign page");
        let response = self.client.get(url).send().await?;
        Ok(response.text().await?)
    }
}
