//! Reddit adapter. Searches a fixed set of interview subreddits through the
//! public JSON endpoint and mines post bodies for question sentences.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use prepdrill_common::{FetchError, FetchResult, ScrapedQuestion};

use crate::adapters::QuestionSource;
use crate::extract::QuestionExtractor;
use crate::fetch::PageFetcher;

const SOURCE_NAME: &str = "Reddit";

const SUBREDDITS: [&str; 3] = ["cscareerquestions", "interviews", "programming"];

/// Listing shape of the search endpoint. Only the fields we read.
#[derive(Deserialize)]
struct Listing {
    #[serde(default)]
    data: ListingData,
}

#[derive(Default, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    #[serde(default)]
    data: PostData,
}

#[derive(Default, Deserialize)]
struct PostData {
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    permalink: String,
}

pub struct RedditInterviews {
    extractor: QuestionExtractor,
}

impl RedditInterviews {
    pub fn new() -> Self {
        Self {
            extractor: QuestionExtractor::new(),
        }
    }

    fn search_url(subreddit: &str, query: &str) -> FetchResult<String> {
        let base = format!("https://www.reddit.com/r/{subreddit}/search.json");
        Url::parse_with_params(&base, &[("q", query), ("sort", "relevance"), ("limit", "25")])
            .map(String::from)
            .map_err(|_| FetchError::InvalidUrl { url: base })
    }
}

impl Default for RedditInterviews {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionSource for RedditInterviews {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn requires_company(&self) -> bool {
        true
    }

    /// Queries every subreddit and bundles the bodies into a JSON array so
    /// `parse` gets one string. A failed subreddit is skipped, not fatal.
    async fn fetch(
        &self,
        fetcher: &dyn PageFetcher,
        _topic: &str,
        company: Option<&str>,
    ) -> FetchResult<String> {
        let query = match company {
            Some(c) => format!("interview questions {c}"),
            None => "interview questions".to_string(),
        };

        let mut bodies = Vec::new();
        for subreddit in SUBREDDITS {
            let url = Self::search_url(subreddit, &query)?;
            match fetcher.fetch(&url).await {
                Ok(body) => bodies.push(body),
                Err(e) => {
                    warn!(subreddit, error = %e, "Subreddit search failed, skipping");
                }
            }
        }

        serde_json::to_string(&bodies).map_err(|e| FetchError::Http(Box::new(e)))
    }

    fn parse(&self, raw: &str, _topic: &str, company: Option<&str>) -> Vec<ScrapedQuestion> {
        let bodies: Vec<String> = match serde_json::from_str(raw) {
            Ok(bodies) => bodies,
            Err(e) => {
                warn!(error = %e, "Reddit raw content was not a body array");
                return Vec::new();
            }
        };

        let mut questions = Vec::new();
        for body in &bodies {
            let listing: Listing = match serde_json::from_str(body) {
                Ok(listing) => listing,
                Err(e) => {
                    warn!(error = %e, "Skipping unparseable subreddit listing");
                    continue;
                }
            };

            for child in &listing.data.children {
                let post = &child.data;
                let content = format!("{} {}", post.title, post.selftext);
                let post_url = format!("https://www.reddit.com{}", post.permalink);

                for text in self.extractor.extract(&content) {
                    let mut question = ScrapedQuestion::new(
                        text,
                        &post_url,
                        SOURCE_NAME,
                        "Interview Experience",
                    );
                    if let Some(c) = company {
                        question = question.with_company(c);
                    }
                    questions.push(question);
                }
            }
        }

        questions
    }
}
