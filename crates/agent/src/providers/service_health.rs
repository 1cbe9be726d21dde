use async_trait::async_trait;
use chrono::Utc;
use readygate_core::readiness::bulletin::{service_health_signal, RecencyWindow};
use readygate_core::{SignalKind, SignalResult};

use super::{FetchError, SignalProvider, SignalQuery};

/// Checks the public incident feed for mentions of the target.
pub struct StatusFeedProvider {
    client: reqwest::Client,
    feed_url: String,
    recency_hours: Option<u32>,
}

impl StatusFeedProvider {
    pub fn new(
        client: reqwest::Client,
        feed_url: impl Into<String>,
        recency_hours: Option<u32>,
    ) -> Self {
        Self { client, feed_url: feed_url.into(), recency_hours }
    }

    async fn fetch_feed(&self) -> Result<String, FetchError> {
        let response = self.client.get(&self.feed_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl SignalProvider for StatusFeedProvider {
    fn kind(&self) -> SignalKind {
        SignalKind::ServiceHealth
    }

    async fn evaluate(&self, query: &SignalQuery) -> SignalResult {
        match self.fetch_feed().await {
            Ok(feed) => {
                let window = self.recency_hours.map(|hours| RecencyWindow::hours(Utc::now(), hours));
                service_health_signal(&query.target, &feed, window.as_ref())
            }
            Err(error) => error.into_signal(self.kind(), &query.target),
        }
    }
}
