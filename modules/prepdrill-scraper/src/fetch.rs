use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::debug;
use url::Url;

use prepdrill_common::{FetchError, FetchResult, ScraperConfig};

/// Request timeout for every outbound fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Boundary for fetching one page of content.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the response body as text.
    async fn fetch(&self, url: &str) -> FetchResult<String>;
}

/// Plain reqwest transport. Validates the URL, checks the response status,
/// and hands back the body.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a transport for one scrape run. Fails only if the HTTP client
    /// cannot be constructed.
    pub fn new(config: &ScraperConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| FetchError::Http(Box::new(e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))
    }
}

/// Wraps a transport with the process-wide concurrency cap and the
/// politeness delay. The delay runs while holding a permit, before the
/// request goes out.
pub struct PoliteFetcher<F> {
    inner: F,
    limiter: Arc<Semaphore>,
    delay: Duration,
}

impl<F: PageFetcher> PoliteFetcher<F> {
    pub fn new(inner: F, limiter: Arc<Semaphore>, delay: Duration) -> Self {
        Self {
            inner,
            limiter,
            delay,
        }
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for PoliteFetcher<F> {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        debug!(url, "Fetching page");
        self.inner.fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingFetcher;
    use futures::future::join_all;

    #[tokio::test]
    async fn test_rejects_invalid_urls_without_sending() {
        let transport = HttpFetcher::new(&ScraperConfig::default()).unwrap();

        let err = transport.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));

        let err = transport.fetch("ftp://example.com/file").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_fetches_never_exceed_cap() {
        let counting = CountingFetcher::new(Duration::from_millis(50));
        let fetcher = PoliteFetcher::new(
            counting.clone(),
            Arc::new(Semaphore::new(2)),
            Duration::ZERO,
        );

        let urls: Vec<String> = (0..8).map(|i| format!("https://example.com/{i}")).collect();
        let results = join_all(urls.iter().map(|u| fetcher.fetch(u))).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(counting.calls(), 8);
        assert!(
            counting.high_water() <= 2,
            "high water was {}",
            counting.high_water()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_politeness_delay_runs_before_the_request() {
        let counting = CountingFetcher::new(Duration::ZERO);
        let fetcher = PoliteFetcher::new(
            counting.clone(),
            Arc::new(Semaphore::new(5)),
            Duration::from_secs(2),
        );

        let start = tokio::time::Instant::now();
        fetcher.fetch("https://example.com/a").await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert_eq!(counting.calls(), 1);
    }
}
