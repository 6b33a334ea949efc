// Test mocks for scraper collaborators: a canned-page fetcher, an
// instrumented fetcher for concurrency assertions, and a scripted source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use prepdrill_common::{FetchError, FetchResult, ScrapedQuestion};

use crate::adapters::QuestionSource;
use crate::fetch::PageFetcher;

/// Serves canned bodies by exact URL. Unregistered URLs come back as 404,
/// `failing()` turns every fetch into a 500.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    fail_all: bool,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            pages: HashMap::new(),
            fail_all: true,
        }
    }

    pub fn on_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        if self.fail_all {
            return Err(FetchError::Status {
                status: 500,
                url: url.to_string(),
            });
        }
        match self.pages.get(url) {
            Some(body) => Ok(body.clone()),
            None => Err(FetchError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

/// Counts fetches and tracks how many run at the same time.
#[derive(Clone)]
pub struct CountingFetcher {
    delay: Duration,
    current: Arc<AtomicUsize>,
    high_water: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl CountingFetcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            current: Arc::new(AtomicUsize::new(0)),
            high_water: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PageFetcher for CountingFetcher {
    async fn fetch(&self, _url: &str) -> FetchResult<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let in_flight = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        self.high_water.fetch_max(in_flight, Ordering::Relaxed);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.current.fetch_sub(1, Ordering::Relaxed);
        Ok(String::new())
    }
}

/// Scripted source for orchestrator tests.
pub struct StubSource {
    name: String,
    questions: Vec<ScrapedQuestion>,
    fail_fetch: bool,
    needs_company: bool,
}

impl StubSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            questions: Vec::new(),
            fail_fetch: false,
            needs_company: false,
        }
    }

    pub fn with_questions(mut self, questions: Vec<ScrapedQuestion>) -> Self {
        self.questions = questions;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn requiring_company(mut self) -> Self {
        self.needs_company = true;
        self
    }
}

#[async_trait]
impl QuestionSource for StubSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires_company(&self) -> bool {
        self.needs_company
    }

    async fn fetch(
        &self,
        _fetcher: &dyn PageFetcher,
        _topic: &str,
        _company: Option<&str>,
    ) -> FetchResult<String> {
        if self.fail_fetch {
            return Err(FetchError::Status {
                status: 500,
                url: format!("stub://{}", self.name),
            });
        }
        Ok(String::new())
    }

    fn parse(&self, _raw: &str, _topic: &str, _company: Option<&str>) -> Vec<ScrapedQuestion> {
        self.questions.clone()
    }
}
