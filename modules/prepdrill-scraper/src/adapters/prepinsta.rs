//! PrepInsta adapter. Their MCQ pages live at a slug-per-topic URL.

use async_trait::async_trait;
use scraper::{Html, Selector};

use prepdrill_common::{FetchResult, ScrapedQuestion};

use crate::adapters::{element_text, QuestionSource};
use crate::fetch::PageFetcher;

const SOURCE_NAME: &str = "PrepInsta";

pub struct PrepInsta;

impl PrepInsta {
    fn slug(topic: &str) -> String {
        topic.to_lowercase().replace(' ', "-")
    }

    fn page_url(topic: &str) -> String {
        format!("https://prepinsta.com/{}-questions", Self::slug(topic))
    }
}

#[async_trait]
impl QuestionSource for PrepInsta {
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
        let container_sel = Selector::parse("div.mcq-question").unwrap();
        let question_sel = Selector::parse("p.question").unwrap();
        let option_sel = Selector::parse("li.option").unwrap();
        let answer_sel = Selector::parse("div.answer").unwrap();

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_slugifies_topic() {
        assert_eq!(
            PrepInsta::page_url("Operating Systems"),
            "https://prepinsta.com/operating-systems-questions"
        );
    }

    #[test]
    fn test_parse_reads_mcq_blocks() {
        let fixture = r#"
            <html><body>
            <div class="mcq-question">
                <p class="question">Which scheduler picks the next process to run?</p>
                <ul>
                    <li class="option">Long-term</li>
                    <li class="option">Short-term</li>
                </ul>
                <div class="answer">Short-term</div>
            </div>
            <div class="mcq-question">
                <ul><li class="option">No question paragraph here</li></ul>
            </div>
            </body></html>
        "#;

        let questions = PrepInsta.parse(fixture, "operating systems", None);

        assert_eq!(questions.len(), 1);
        assert_eq!(
            questions[0].question_text,
            "Which scheduler picks the next process to run?"
        );
        assert_eq!(
            questions[0].options.as_deref(),
            Some(&["Long-term".to_string(), "Short-term".to_string()][..])
        );
        assert_eq!(questions[0].correct_answer.as_deref(), Some("Short-term"));
        assert_eq!(
            questions[0].source_url,
            "https://prepinsta.com/operating-systems-questions"
        );
    }
}
