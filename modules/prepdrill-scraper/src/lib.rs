pub mod adapters;
pub mod extract;
pub mod fetch;
pub mod orchestrator;
pub mod sink;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use extract::QuestionExtractor;
pub use fetch::{HttpFetcher, PageFetcher, PoliteFetcher};
pub use orchestrator::{QuestionScraper, ScrapeStats};
pub use sink::{JsonLinesSink, QuestionSink};
