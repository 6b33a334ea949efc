//! IndiaBIX adapter. Table-based MCQ layout with the answer letter buried
//! in an explanation block.

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};

use prepdrill_common::{FetchResult, ScrapedQuestion};

use crate::adapters::{element_text, QuestionSource};
use crate::fetch::PageFetcher;

const SOURCE_NAME: &str = "IndiaBIX";

/// Option cells shorter than this are layout artifacts, not answers.
const MIN_OPTION_CHARS: usize = 2;

pub struct IndiaBix;

impl IndiaBix {
    fn page_url(topic: &str) -> String {
        let slug = topic.to_lowercase().replace(' ', "-");
        format!("https://www.indiabix.com/{slug}/questions-and-answers")
    }
}

#[async_trait]
impl QuestionSource for IndiaBix {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(
        &self,
        fetcher: &dyn PageFetcher,
        topic: &str,
        _company: Option<&str>,
    ) -> FetchResult<String> {
        fetcher.fetch(&Self::page_url(topic)).await
    }

    fn parse(&self, raw: &str, topic: &str, _company: Option<&str>) -> Vec<ScrapedQuestion> {
        let document = Html::parse_document(raw);
        let container_sel = Selector::parse("div.bix-div-container").unwrap();
        let question_sel = Selector::parse("td.bix-td-qtxt").unwrap();
        let options_table_sel = Selector::parse("table.bix-tbl-options").unwrap();
        let cell_sel = Selector::parse("td").unwrap();
        let answer_sel = Selector::parse("div.bix-ans-description").unwrap();
        let answer_re = Regex::new(r"Answer:\s*([A-D])").expect("valid answer pattern");

        let url = Self::page_url(topic);
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

            if let Some(table) = container.select(&options_table_sel).next() {
                let options: Vec<String> = table
                    .select(&cell_sel)
                    .map(|el| element_text(&el))
                    .filter(|text| text.chars().count() > MIN_OPTION_CHARS)
                    .collect();
                if !options.is_empty() {
                    question = question.with_options(options);
                }
            }

            if let Some(answer_el) = container.select(&answer_sel).next() {
                let description = element_text(&answer_el);
                if let Some(caps) = answer_re.captures(&description) {
                    if let Some(letter) = caps.get(1) {
                        question = question.with_correct_answer(letter.as_str());
                    }
                }
            }

            questions.push(question);
        }

        questions
    }
}
