//! Daily quiz planning: one schedule per active user per day, built from
//! the user's top topics.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};

use prepdrill_common::{QuizScheduleEntry, User};

use crate::store::PrepStore;

/// Most topics included in one day's quiz.
const MAX_TOPICS_PER_DAY: usize = 5;

pub struct QuizPlanner<S> {
    store: Arc<S>,
}

impl<S: PrepStore> QuizPlanner<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Make sure each listed user has a quiz schedule for today. Users who
    /// already have one, or who follow no topics, are skipped. Returns how
    /// many schedules were created; the batch is written atomically.
    pub async fn ensure_today_schedules(&self, users: &[User]) -> Result<usize> {
        let today = Utc::now().date_naive();
        let mut batch = Vec::new();

        for user in users {
            if self.store.has_schedule_today(user.id, today).await? {
                debug!(user_id = user.id, "User already has a quiz for today");
                continue;
            }

            let topics = self.store.active_topics_for(user.id).await?;
            if topics.is_empty() {
                debug!(user_id = user.id, "User follows no topics, skipping");
                continue;
            }

            let selected: Vec<i64> = topics
                .iter()
                .take(MAX_TOPICS_PER_DAY)
                .map(|t| t.topic_id)
                .collect();
            batch.push(QuizScheduleEntry::new(user.id, today, selected));
        }

        if batch.is_empty() {
            return Ok(0);
        }

        let created = batch.len();
        self.store.create_quiz_schedules(&batch).await?;
        info!(created, "Created daily quiz schedules");
        Ok(created)
    }

    /// Single-user variant, used when a user signs up mid-day. Returns
    /// whether a schedule was created.
    pub async fn ensure_schedule_for(&self, user: &User) -> Result<bool> {
        let created = self.ensure_today_schedules(std::slice::from_ref(user)).await?;
        Ok(created > 0)
    }
}
