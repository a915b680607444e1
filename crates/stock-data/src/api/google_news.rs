//! Google News RSS headline source

use crate::error::{http_client, status, transport};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use stock_core::{Headline, NewsSource, Result, StockError};
use tracing::{debug, instrument};

const GOOGLE_NEWS_RSS_URL: &str = "https://news.google.com/rss/search";
const PROVIDER: &str = "Google News";

/// Headlines from the Google News search feed (US English edition)
#[derive(Debug, Clone)]
pub struct GoogleNewsClient {
    client: Client,
    base_url: String,
}

impl GoogleNewsClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: GOOGLE_NEWS_RSS_URL.to_string(),
        })
    }

    /// Point the client at another feed endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl NewsSource for GoogleNewsClient {
    #[instrument(skip(self))]
    async fn fetch_headlines(&self, company: &str, limit: usize) -> Result<Vec<Headline>> {
        let query = format!("{company} stock");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query.as_str()),
                ("hl", "en-US"),
                ("gl", "US"),
                ("ceid", "US:en"),
            ])
            .send()
            .await
            .map_err(|e| transport(PROVIDER, &e))?;

        if !response.status().is_success() {
            return Err(status(PROVIDER, response.status()));
        }

        let body = response.bytes().await.map_err(|e| transport(PROVIDER, &e))?;
        let headlines = parse_feed(&body, limit)?;
        debug!(count = headlines.len(), "Fetched headlines");
        Ok(headlines)
    }
}

/// Parse an RSS document into at most `limit` headlines, in feed order
pub fn parse_feed(bytes: &[u8], limit: usize) -> Result<Vec<Headline>> {
    let channel = rss::Channel::read_from(bytes)
        .map_err(|e| StockError::Api(format!("Failed to parse {PROVIDER} feed: {e}")))?;

    Ok(channel
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.title()?.trim();
            if title.is_empty() {
                return None;
            }
            Some(Headline {
                title: title.to_string(),
                published: item.pub_date().map(str::to_string),
                link: item.link().map(str::to_string),
            })
        })
        .take(limit)
        .collect())
}
