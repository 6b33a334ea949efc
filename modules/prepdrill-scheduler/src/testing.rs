// Test mocks for scheduler collaborators: a store with injectable
// failures and call counters, and a capturing notifier.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use prepdrill_common::{PushMessage, QuizScheduleEntry, ScheduleEntry, TopicPriority, User};

use crate::notify::Notifier;
use crate::store::{MemoryStore, PrepStore};

/// Wraps a [`MemoryStore`] with per-operation failure switches and call
/// counters. Seed data through `inner`.
#[derive(Default)]
pub struct MockStore {
    pub inner: MemoryStore,
    fail_list_users: AtomicBool,
    fail_create_quiz: AtomicBool,
    fail_due_schedules: AtomicBool,
    fail_update_after_send: AtomicBool,
    list_users_calls: AtomicUsize,
    due_calls: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_list_users(self) -> Self {
        self.fail_list_users.store(true, Ordering::Relaxed);
        self
    }

    pub fn failing_create_quiz(self) -> Self {
        self.fail_create_quiz.store(true, Ordering::Relaxed);
        self
    }

    pub fn failing_due_schedules(self) -> Self {
        self.fail_due_schedules.store(true, Ordering::Relaxed);
        self
    }

    pub fn failing_update_after_send(self) -> Self {
        self.fail_update_after_send.store(true, Ordering::Relaxed);
        self
    }

    pub fn list_users_calls(&self) -> usize {
        self.list_users_calls.load(Ordering::Relaxed)
    }

    pub fn due_calls(&self) -> usize {
        self.due_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PrepStore for MockStore {
    async fn list_active_users(&self) -> Result<Vec<User>> {
        self.list_users_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_list_users.load(Ordering::Relaxed) {
            bail!("injected list_active_users failure");
        }
        self.inner.list_active_users().await
    }

    async fn active_topics_for(&self, user_id: i64) -> Result<Vec<TopicPriority>> {
        self.inner.active_topics_for(user_id).await
    }

    async fn has_schedule_today(&self, user_id: i64, date: NaiveDate) -> Result<bool> {
        self.inner.has_schedule_today(user_id, date).await
    }

    async fn create_quiz_schedules(&self, entries: &[QuizScheduleEntry]) -> Result<()> {
        if self.fail_create_quiz.load(Ordering::Relaxed) {
            bail!("injected create_quiz_schedules failure");
        }
        self.inner.create_quiz_schedules(entries).await
    }

    async fn due_notification_schedules(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(ScheduleEntry, User)>> {
        self.due_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_due_schedules.load(Ordering::Relaxed) {
            bail!("injected due_notification_schedules failure");
        }
        self.inner.due_notification_schedules(now).await
    }

    async fn is_quiz_completed_today(&self, user_id: i64, date: NaiveDate) -> Result<bool> {
        self.inner.is_quiz_completed_today(user_id, date).await
    }

    async fn update_schedule_after_send(
        &self,
        schedule_id: i64,
        last_sent: DateTime<Utc>,
        next_send: DateTime<Utc>,
    ) -> Result<()> {
        if self.fail_update_after_send.load(Ordering::Relaxed) {
            bail!("injected update_schedule_after_send failure");
        }
        self.inner
            .update_schedule_after_send(schedule_id, last_sent, next_send)
            .await
    }

    async fn create_notification_schedule(&self, entry: &ScheduleEntry) -> Result<i64> {
        self.inner.create_notification_schedule(entry).await
    }
}

/// Captures sent messages. `failing()` starts it in a failing state that
/// can be flipped off mid-test.
#[derive(Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<PushMessage>>,
    fail: AtomicBool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::Relaxed);
        notifier
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::Relaxed);
    }

    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, message: &PushMessage) -> Result<String> {
        if self.fail.load(Ordering::Relaxed) {
            bail!("injected notifier failure");
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(format!("mock-{}", sent.len()))
    }
}
