use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A question harvested from one external source. Adapters create these
/// and hand them to the ingest sink; nothing mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedQuestion {
    pub question_text: String,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub source_url: String,
    pub source_name: String,
    pub company_name: Option<String>,
    pub topic: String,
    pub difficulty: Difficulty,
}

impl ScrapedQuestion {
    pub fn new(
        question_text: impl Into<String>,
        source_url: impl Into<String>,
        source_name: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            question_text: question_text.into(),
            options: None,
            correct_answer: None,
            source_url: source_url.into(),
            source_name: source_name.into(),
            company_name: None,
            topic: topic.into(),
            difficulty: Difficulty::Medium,
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_correct_answer(mut self, answer: impl Into<String>) -> Self {
        self.correct_answer = Some(answer.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company_name = Some(company.into());
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }
}

/// Difficulty label attached to every scraped question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// How often a notification schedule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// Offset added to the schedule's time anchor after a successful send.
    /// Monthly is a fixed 30 days, not calendar-month aware.
    pub fn period(&self) -> chrono::Duration {
        match self {
            Frequency::Daily => chrono::Duration::days(1),
            Frequency::Weekly => chrono::Duration::days(7),
            Frequency::Monthly => chrono::Duration::days(30),
        }
    }
}

/// Read-only user snapshot handed to the scheduling subsystems by the store.
/// The core never mutates a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_active: bool,
    pub notification_enabled: bool,
    /// Preferred reminder time-of-day as "HH:MM", if the user set one.
    pub notification_time: Option<String>,
    /// Push token for the user's device, if registered.
    pub device_token: Option<String>,
}

impl User {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            is_active: true,
            notification_enabled: true,
            notification_time: None,
            device_token: None,
        }
    }

    pub fn with_notification_time(mut self, time: impl Into<String>) -> Self {
        self.notification_time = Some(time.into());
        self
    }

    pub fn with_device_token(mut self, token: impl Into<String>) -> Self {
        self.device_token = Some(token.into());
        self
    }
}

/// A user's association with a topic, as returned by the store ordered by
/// descending priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPriority {
    pub topic_id: i64,
    pub priority: i32,
}

/// A recurring notification schedule. Owned by the store; the dispatcher
/// mutates `last_sent`/`next_send` through the store after a successful send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: i64,
    pub user_id: i64,
    pub notification_type: String,
    /// Time anchor the frequency period is added to when rescheduling.
    pub scheduled_time: DateTime<Utc>,
    pub frequency: Frequency,
    pub is_active: bool,
    pub last_sent: Option<DateTime<Utc>>,
    pub next_send: Option<DateTime<Utc>>,
    pub title_template: String,
    pub message_template: String,
}

/// One user's quiz plan for a calendar day. At most one exists per
/// (user, day); created by the planner, completed by the quiz flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizScheduleEntry {
    pub user_id: i64,
    pub scheduled_date: NaiveDate,
    /// Topic ids in descending priority order, at most five.
    pub topics: Vec<i64>,
    pub questions_per_topic: u32,
    pub is_completed: bool,
}

impl QuizScheduleEntry {
    pub fn new(user_id: i64, scheduled_date: NaiveDate, topics: Vec<i64>) -> Self {
        Self {
            user_id,
            scheduled_date,
            topics,
            questions_per_topic: 1,
            is_completed: false,
        }
    }
}

/// Fully-prepared push payload handed to the notifier backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub device_token: Option<String>,
    pub data: HashMap<String, String>,
}

impl PushMessage {
    pub fn new(user_id: i64, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            user_id,
            title: title.into(),
            body: body.into(),
            device_token: None,
            data: HashMap::new(),
        }
    }

    pub fn with_device_token(mut self, token: impl Into<String>) -> Self {
        self.device_token = Some(token.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_periods() {
        assert_eq!(Frequency::Daily.period(), chrono::Duration::days(1));
        assert_eq!(Frequency::Weekly.period(), chrono::Duration::days(7));
        assert_eq!(Frequency::Monthly.period(), chrono::Duration::days(30));
    }

    #[test]
    fn test_frequency_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Frequency::Weekly).unwrap(),
            "\"weekly\""
        );
        assert_eq!(
            serde_json::from_str::<Frequency>("\"monthly\"").unwrap(),
            Frequency::Monthly
        );
    }

    #[test]
    fn test_difficulty_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Difficulty::Easy).unwrap(), "\"easy\"");
        assert_eq!(
            serde_json::from_str::<Difficulty>("\"hard\"").unwrap(),
            Difficulty::Hard
        );
    }

    #[test]
    fn test_scraped_question_builder() {
        let q = ScrapedQuestion::new(
            "What is a B-tree?",
            "https://example.com/dbms",
            "TCYOnline",
            "DBMS",
        )
        .with_options(vec!["A".to_string(), "B".to_string()])
        .with_correct_answer("A");

        assert_eq!(q.difficulty, Difficulty::Medium);
        assert_eq!(q.options.as_deref(), Some(&["A".to_string(), "B".to_string()][..]));
        assert_eq!(q.correct_answer.as_deref(), Some("A"));
        assert!(q.company_name.is_none());
    }

    #[test]
    fn test_difficulty_label_can_be_overridden() {
        let q = ScrapedQuestion::new(
            "How would you tune a slow execution plan?",
            "https://example.com/dbms",
            "TCYOnline",
            "DBMS",
        )
        .with_difficulty(Difficulty::Hard);

        assert_eq!(q.difficulty, Difficulty::Hard);
    }
}
