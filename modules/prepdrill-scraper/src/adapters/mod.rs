//! Source adapters. Each adapter knows how to build the URL for one site,
//! fetch it through the shared transport, and turn the raw page into
//! [`ScrapedQuestion`] records.

pub mod indiabix;
pub mod prepinsta;
pub mod reddit;
pub mod tcyonline;

pub use indiabix::IndiaBix;
pub use prepinsta::PrepInsta;
pub use reddit::RedditInterviews;
pub use tcyonline::TcyOnline;

use async_trait::async_trait;
use scraper::ElementRef;
use tracing::warn;

use prepdrill_common::{FetchResult, ScrapedQuestion};

use crate::fetch::PageFetcher;

/// One scrapable site. Fetching and parsing are split so parsing stays
/// synchronous and testable against fixture HTML.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Stable source name stamped on every record this adapter produces.
    fn name(&self) -> &str;

    /// Whether this adapter only makes sense with a company to search for.
    fn requires_company(&self) -> bool {
        false
    }

    /// Fetch the raw content for `topic` (and `company` where relevant).
    async fn fetch(
        &self,
        fetcher: &dyn PageFetcher,
        topic: &str,
        company: Option<&str>,
    ) -> FetchResult<String>;

    /// Parse previously fetched raw content into question records.
    fn parse(&self, raw: &str, topic: &str, company: Option<&str>) -> Vec<ScrapedQuestion>;

    /// Fetch and parse in one step. A fetch failure is logged and yields
    /// no questions so one broken site never aborts a run.
    async fn scrape(
        &self,
        fetcher: &dyn PageFetcher,
        topic: &str,
        company: Option<&str>,
    ) -> Vec<ScrapedQuestion> {
        match self.fetch(fetcher, topic, company).await {
            Ok(raw) => self.parse(&raw, topic, company),
            Err(e) => {
                warn!(
                    source = self.name(),
                    topic,
                    error = %e,
                    "Fetch failed, returning no questions"
                );
                Vec::new()
            }
        }
    }
}

/// Collect an element's text with normalized whitespace.
pub(crate) fn element_text(element: &ElementRef) -> String {
    let joined = element.text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}
