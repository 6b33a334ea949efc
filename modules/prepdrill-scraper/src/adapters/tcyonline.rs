//! TCYOnline adapter. Topic search over their practice-question pages.

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use prepdrill_common::{FetchResult, ScrapedQuestion};

use crate::adapters::{element_text, QuestionSource};
use crate::fetch::PageFetcher;

const SOURCE_NAME: &str = "TCYOnline";
const BASE_URL: &str = "https://www.tcyonline.com/search";

pub struct TcyOnline;

impl TcyOnline {
    /// Search URL for a topic, with the query percent-encoded.
    fn search_url(topic: &str) -> String {
        Url::parse_with_params(BASE_URL, &[("q", topic)])
            .map(String::from)
            .unwrap_or_else(|_| BASE_URL.to_string())
    }
}

#[async_trait]
impl QuestionSource for TcyOnline {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(
        &self,
        fetcher: &dyn PageFetcher,
        topic: &str,
        _company: Option<&str>,
    ) -> FetchResult<String> {
        fetcher.fetch(&Self::search_url(topic)).await
    }

    fn parse(&self, raw: &str, topic: &str, _company: Option<&str>) -> Vec<ScrapedQuestion> {
        let document = Html::parse_document(raw);
        let container_sel = Selector::parse("div.question-container").unwrap();
        let question_sel = Selector::parse("div.question-text").unwrap();
        let option_sel = Selector::parse("div.option").unwrap();
        let answer_sel = Selector::parse("div.correct-answer").unwrap();

        let url = Self::search_url(topic);
        let mut questions = Vec::new();

        for container in document.select(&container_sel) {
            let question_el = match container.select(&question_sel).next() {
                Some(el) => el,
                None => continue,
            };
            let question_text = element_text(&question_el);
            if question_text.is_empty() {
                continue;
            }

            let mut question = ScrapedQuestion::new(question_text, &url, SOURCE_NAME, topic);

            let options: Vec<String> = container
                .select(&option_sel)
                .map(|el| element_text(&el))
                .filter(|text| !text.is_empty())
                .collect();
            if !options.is_empty() {
                question = question.with_options(options);
            }

            if let Some(answer_el) = container.select(&answer_sel).next() {
                let answer = element_text(&answer_el);
                if !answer.is_empty() {
                    question = question.with_correct_answer(answer);
                }
            }

            questions.push(question);
        }

        questions
    }
}
