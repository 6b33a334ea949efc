//! Pattern-based question extraction from free-form text.

use regex::Regex;

/// Most questions kept from a single document.
const MAX_PER_DOCUMENT: usize = 5;

/// Candidates at or below this many characters are discarded as fragments.
const MIN_QUESTION_CHARS: usize = 10;

/// Phrasings that introduce a question in discussion-style text, most
/// specific first. Each pattern captures the question body up to the
/// question mark.
const QUESTION_PATTERNS: [&str; 5] = [
    r"(?i)Q\d*[:.]?\s*(.+?\?)",
    r"(?i)Question\s*\d*[:.]?\s*(.+?\?)",
    r"(?i)They asked[:\s]*(.+?\?)",
    r"(?i)The interviewer asked[:\s]*(.+?\?)",
    r#"(?i)["'](.+?\?)["']"#,
];

/// Pulls interview questions out of unstructured text such as forum posts.
pub struct QuestionExtractor {
    patterns: Vec<Regex>,
}

impl QuestionExtractor {
    pub fn new() -> Self {
        let patterns = QUESTION_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("valid question pattern"))
            .collect();
        Self { patterns }
    }

    /// Scan `text` with every pattern in order and collect up to
    /// [`MAX_PER_DOCUMENT`] distinct questions. Earlier patterns win when
    /// two patterns match the same sentence.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut questions: Vec<String> = Vec::new();

        for pattern in &self.patterns {
            for caps in pattern.captures_iter(text) {
                let candidate = match caps.get(1) {
                    Some(m) => m.as_str().trim(),
                    None => continue,
                };
                if candidate.chars().count() <= MIN_QUESTION_CHARS {
                    continue;
                }
                if questions.iter().any(|q| q == candidate) {
                    continue;
                }
                questions.push(candidate.to_string());
            }
        }

        questions.truncate(MAX_PER_DOCUMENT);
        questions
    }
}

impl Default for QuestionExtractor {
    fn default() -> Self {
        Self::new()
    }
}
