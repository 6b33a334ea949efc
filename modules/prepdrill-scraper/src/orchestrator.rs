//! Runs every source adapter for a topic and merges the results.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use prepdrill_common::{ScrapedQuestion, ScraperConfig};

use crate::adapters::{IndiaBix, PrepInsta, QuestionSource, RedditInterviews, TcyOnline};
use crate::fetch::{HttpFetcher, PageFetcher, PoliteFetcher};

/// Counters for one scrape run.
#[derive(Debug, Default)]
pub struct ScrapeStats {
    pub sources_invoked: u32,
    pub sources_empty: u32,
    pub questions_found: u32,
    pub by_source: Vec<(String, u32)>,
}

impl fmt::Display for ScrapeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Scrape Run Complete ===")?;
        writeln!(f, "Sources invoked: {}", self.sources_invoked)?;
        writeln!(f, "Sources with no results: {}", self.sources_empty)?;
        writeln!(f, "Questions found: {}", self.questions_found)?;
        for (source, count) in &self.by_source {
            writeln!(f, "  {source}: {count}")?;
        }
        Ok(())
    }
}

/// Fans one topic out to all registered sources. Sources run concurrently;
/// the politeness wrapper keeps the actual page fetches within the
/// configured cap.
pub struct QuestionScraper {
    config: ScraperConfig,
    sources: Vec<Arc<dyn QuestionSource>>,
    limiter: Arc<Semaphore>,
}

impl QuestionScraper {
    /// Scraper over the full set of built-in sources.
    pub fn new(config: ScraperConfig) -> Self {
        let sources: Vec<Arc<dyn QuestionSource>> = vec![
            Arc::new(TcyOnline),
            Arc::new(PrepInsta),
            Arc::new(IndiaBix),
            Arc::new(RedditInterviews::new()),
        ];
        Self::with_sources(config, sources)
    }

    pub fn with_sources(config: ScraperConfig, sources: Vec<Arc<dyn QuestionSource>>) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_fetches));
        Self {
            config,
            sources,
            limiter,
        }
    }

    /// Scrape every applicable source for `topic`. Results keep source
    /// registration order. A transport that cannot be built ends the run
    /// with no questions.
    pub async fn scrape_all_sources(
        &self,
        topic: &str,
        company: Option<&str>,
    ) -> Vec<ScrapedQuestion> {
        let transport = match HttpFetcher::new(&self.config) {
            Ok(transport) => transport,
            Err(e) => {
                warn!(error = %e, "Could not build HTTP transport, skipping run");
                return Vec::new();
            }
        };
        let fetcher = PoliteFetcher::new(transport, self.limiter.clone(), self.config.scrape_delay);
        self.scrape_with(&fetcher, topic, company).await
    }

    async fn scrape_with(
        &self,
        fetcher: &dyn PageFetcher,
        topic: &str,
        company: Option<&str>,
    ) -> Vec<ScrapedQuestion> {
        let selected: Vec<&Arc<dyn QuestionSource>> = self
            .sources
            .iter()
            .filter(|s| company.is_some() || !s.requires_company())
            .collect();

        info!(topic, sources = selected.len(), "Starting scrape run");

        let batches = join_all(
            selected
                .iter()
                .map(|source| source.scrape(fetcher, topic, company)),
        )
        .await;

        let mut stats = ScrapeStats::default();
        let mut questions = Vec::new();
        for (source, batch) in selected.iter().zip(batches) {
            stats.sources_invoked += 1;
            if batch.is_empty() {
                stats.sources_empty += 1;
            }
            stats.questions_found += batch.len() as u32;
            stats.by_source.push((source.name().to_string(), batch.len() as u32));
            questions.extend(batch);
        }

        info!("Scrape run finished. {stats}");
        questions
    }
}
