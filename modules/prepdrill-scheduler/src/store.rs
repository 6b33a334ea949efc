//! Storage boundary for the scheduling loop, plus the in-memory backing
//! used by the binary and the tests.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use prepdrill_common::{QuizScheduleEntry, ScheduleEntry, TopicPriority, User};

/// Everything the planner and dispatcher need from storage.
#[async_trait]
pub trait PrepStore: Send + Sync {
    async fn list_active_users(&self) -> Result<Vec<User>>;

    /// Active topic subscriptions for a user, highest priority first.
    async fn active_topics_for(&self, user_id: i64) -> Result<Vec<TopicPriority>>;

    /// Whether the user already has a quiz scheduled on `date` or later.
    async fn has_schedule_today(&self, user_id: i64, date: NaiveDate) -> Result<bool>;

    /// Persist a batch of quiz schedules. The batch is atomic: on error
    /// none of the entries are stored.
    async fn create_quiz_schedules(&self, entries: &[QuizScheduleEntry]) -> Result<()>;

    /// Notification schedules due at `now`, paired with their users.
    /// Inactive schedules, inactive users, and users who turned
    /// notifications off are excluded.
    async fn due_notification_schedules(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(ScheduleEntry, User)>>;

    /// Whether the user completed a quiz scheduled on `date` or later.
    async fn is_quiz_completed_today(&self, user_id: i64, date: NaiveDate) -> Result<bool>;

    /// Record a successful send on one schedule.
    async fn update_schedule_after_send(
        &self,
        schedule_id: i64,
        last_sent: DateTime<Utc>,
        next_send: DateTime<Utc>,
    ) -> Result<()>;

    /// Persist a new notification schedule and return its id.
    async fn create_notification_schedule(&self, entry: &ScheduleEntry) -> Result<i64>;
}

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    topics: HashMap<i64, Vec<TopicPriority>>,
    quiz_schedules: Vec<QuizScheduleEntry>,
    schedules: Vec<ScheduleEntry>,
    next_schedule_id: i64,
}

/// In-memory store. Keeps everything behind one mutex so batch writes
/// stay atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryState>,
}

impl MemoryStore {
    pub async fn add_user(&self, user: User) {
        self.inner.lock().await.users.push(user);
    }

    pub async fn set_topics(&self, user_id: i64, topics: Vec<TopicPriority>) {
        self.inner.lock().await.topics.insert(user_id, topics);
    }

    /// Insert a notification schedule directly, assigning the next id.
    pub async fn add_schedule(&self, mut entry: ScheduleEntry) -> i64 {
        let mut state = self.inner.lock().await;
        state.next_schedule_id += 1;
        entry.id = state.next_schedule_id;
        let id = entry.id;
        state.schedules.push(entry);
        id
    }

    pub async fn quiz_schedules(&self) -> Vec<QuizScheduleEntry> {
        self.inner.lock().await.quiz_schedules.clone()
    }

    pub async fn schedule(&self, id: i64) -> Option<ScheduleEntry> {
        self.inner
            .lock()
            .await
            .schedules
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    /// Mark the user's quiz on `date` (or later) completed.
    pub async fn complete_quiz(&self, user_id: i64, date: NaiveDate) {
        let mut state = self.inner.lock().await;
        for quiz in &mut state.quiz_schedules {
            if quiz.user_id == user_id && quiz.scheduled_date >= date {
                quiz.is_completed = true;
            }
        }
    }
}

#[async_trait]
impl PrepStore for MemoryStore {
    async fn list_active_users(&self) -> Result<Vec<User>> {
        let state = self.inner.lock().await;
        Ok(state
            .users
            .iter()
            .filter(|u| u.is_active)
            .cloned()
            .collect())
    }

    async fn active_topics_for(&self, user_id: i64) -> Result<Vec<TopicPriority>> {
        let state = self.inner.lock().await;
        let mut topics = state.topics.get(&user_id).cloned().unwrap_or_default();
        topics.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(topics)
    }

    async fn has_schedule_today(&self, user_id: i64, date: NaiveDate) -> Result<bool> {
        let state = self.inner.lock().await;
        Ok(state
            .quiz_schedules
            .iter()
            .any(|q| q.user_id == user_id && q.scheduled_date >= date))
    }

    async fn create_quiz_schedules(&self, entries: &[QuizScheduleEntry]) -> Result<()> {
        let mut state = self.inner.lock().await;
        state.quiz_schedules.extend_from_slice(entries);
        Ok(())
    }

    async fn due_notification_schedules(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(ScheduleEntry, User)>> {
        let state = self.inner.lock().await;
        let mut due = Vec::new();
        for schedule in &state.schedules {
            if !schedule.is_active {
                continue;
            }
            let is_due = match schedule.next_send {
                Some(next_send) => next_send <= now,
                None => false,
            };
            if !is_due {
                continue;
            }
            let user = state
                .users
                .iter()
                .find(|u| u.id == schedule.user_id && u.is_active && u.notification_enabled);
            if let Some(user) = user {
                due.push((schedule.clone(), user.clone()));
            }
        }
        Ok(due)
    }

    async fn is_quiz_completed_today(&self, user_id: i64, date: NaiveDate) -> Result<bool> {
        let state = self.inner.lock().await;
        Ok(state
            .quiz_schedules
            .iter()
            .any(|q| q.user_id == user_id && q.scheduled_date >= date && q.is_completed))
    }

    async fn update_schedule_after_send(
        &self,
        schedule_id: i64,
        last_sent: DateTime<Utc>,
        next_send: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.inner.lock().await;
        let schedule = state
            .schedules
            .iter_mut()
            .find(|s| s.id == schedule_id)
            .ok_or_else(|| anyhow::anyhow!("no notification schedule with id {schedule_id}"))?;
        schedule.last_sent = Some(last_sent);
        schedule.next_send = Some(next_send);
        Ok(())
    }

    async fn create_notification_schedule(&self, entry: &ScheduleEntry) -> Result<i64> {
        let mut state = self.inner.lock().await;
        state.next_schedule_id += 1;
        let mut entry = entry.clone();
        entry.id = state.next_schedule_id;
        let id = entry.id;
        state.schedules.push(entry);
        Ok(id)
    }
}
