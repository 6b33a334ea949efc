//! Sends due quiz reminders and rolls their schedules forward.

use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveTime, Utc};
use tracing::{debug, info, warn};

use prepdrill_common::{Frequency, PushMessage, ScheduleEntry, SchedulerConfig, User};

use crate::notify::Notifier;
use crate::store::PrepStore;

/// Used when a schedule carries an empty title template.
const FALLBACK_TITLE: &str = "📚 Time for your daily quiz!";
/// Used when a schedule carries an empty message template.
const FALLBACK_BODY: &str = "Complete your quiz to stay on track with your daily goal.";

const DAILY_REMINDER_TITLE: &str = "📚 Daily Quiz Reminder";
const DAILY_REMINDER_BODY: &str =
    "Time to complete your daily quiz! Stay consistent with your learning goals.";

pub struct NotificationDispatcher<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    default_time: NaiveTime,
}

impl<S: PrepStore, N: Notifier> NotificationDispatcher<S, N> {
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: &SchedulerConfig) -> Self {
        Self {
            store,
            notifier,
            default_time: config.default_notification_time,
        }
    }

    /// Send every due reminder. A reminder is skipped without rescheduling
    /// when the user already completed today's quiz. Returns how many
    /// messages went out.
    pub async fn process_pending(&self) -> Result<usize> {
        let now = Utc::now();
        let due = self.store.due_notification_schedules(now).await?;
        let mut sent = 0;

        for (schedule, user) in due {
            if self
                .store
                .is_quiz_completed_today(user.id, now.date_naive())
                .await?
            {
                debug!(user_id = user.id, "Quiz already completed, skipping reminder");
                continue;
            }

            let message = build_reminder(&schedule, &user);
            match self.notifier.send(&message).await {
                Ok(message_id) => {
                    let next_send = schedule.scheduled_time + schedule.frequency.period();
                    self.store
                        .update_schedule_after_send(schedule.id, now, next_send)
                        .await?;
                    info!(
                        user_id = user.id,
                        schedule_id = schedule.id,
                        message_id = %message_id,
                        "Sent quiz reminder"
                    );
                    sent += 1;
                }
                Err(e) => {
                    // Schedule stays untouched so it is retried next cycle.
                    warn!(user_id = user.id, error = %e, "Failed to send quiz reminder");
                }
            }
        }

        Ok(sent)
    }

    /// Create the standing daily reminder for a user, anchored at their
    /// preferred time of day. The first send lands at the next future
    /// occurrence of that time.
    pub async fn setup_daily_reminder(&self, user: &User) -> Result<ScheduleEntry> {
        let time_of_day = user
            .notification_time
            .as_deref()
            .and_then(|s| NaiveTime::parse_from_str(s, "%H:%M").ok())
            .unwrap_or(self.default_time);

        let now = Utc::now();
        let today_at = now.date_naive().and_time(time_of_day).and_utc();
        let next_send = if today_at > now {
            today_at
        } else {
            today_at + chrono::Duration::days(1)
        };

        let entry = ScheduleEntry {
            id: 0,
            user_id: user.id,
            notification_type: "quiz_reminder".to_string(),
            scheduled_time: today_at,
            frequency: Frequency::Daily,
            is_active: true,
            last_sent: None,
            next_send: Some(next_send),
            title_template: DAILY_REMINDER_TITLE.to_string(),
            message_template: DAILY_REMINDER_BODY.to_string(),
        };
        let id = self.store.create_notification_schedule(&entry).await?;
        info!(user_id = user.id, schedule_id = id, "Created daily reminder schedule");

        Ok(ScheduleEntry { id, ..entry })
    }
}

fn build_reminder(schedule: &ScheduleEntry, user: &User) -> PushMessage {
    let title = if schedule.title_template.is_empty() {
        FALLBACK_TITLE
    } else {
        &schedule.title_template
    };
    let body = if schedule.message_template.is_empty() {
        FALLBACK_BODY
    } else {
        &schedule.message_template
    };

    let mut message = PushMessage::new(user.id, title, body)
        .with_data("type", "quiz_reminder")
        .with_data("action", "open_quiz")
        .with_data("user_id", user.id.to_string());
    if let Some(token) = &user.device_token {
        message = message.with_device_token(token);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::{MockNotifier, MockStore};
    use chrono::{DateTime, TimeZone, Timelike};

    fn dispatcher(
        store: Arc<MemoryStore>,
        notifier: Arc<MockNotifier>,
    ) -> NotificationDispatcher<MemoryStore, MockNotifier> {
        NotificationDispatcher::new(store, notifier, &SchedulerConfig::default())
    }

    fn due_schedule(user_id: i64, frequency: Frequency) -> ScheduleEntry {
        ScheduleEntry {
            id: 0,
            user_id,
            notification_type: "quiz_reminder".to_string(),
            scheduled_time: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            frequency,
            is_active: true,
            last_sent: None,
            next_send: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            title_template: "Quiz time".to_string(),
            message_template: "Your quiz is waiting".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_rolls_next_send_forward_from_the_anchor() {
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(MockNotifier::new());
        store.add_user(User::new(1)).await;
        let id = store.add_schedule(due_schedule(1, Frequency::Daily)).await;
        let dispatcher = dispatcher(store.clone(), notifier.clone());

        let sent = dispatcher.process_pending().await.unwrap();

        assert_eq!(sent, 1);
        let updated = store.schedule(id).await.unwrap();
        assert_eq!(
            updated.next_send,
            Some(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap())
        );
        assert!(updated.last_sent.is_some());
    }

    #[tokio::test]
    async fn test_weekly_and_monthly_periods() {
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(MockNotifier::new());
        store.add_user(User::new(1)).await;
        store.add_user(User::new(2)).await;
        let weekly = due_schedule(1, Frequency::Weekly);
        let monthly = due_schedule(2, Frequency::Monthly);
        let weekly_id = store.add_schedule(weekly).await;
        let monthly_id = store.add_schedule(monthly).await;
        let dispatcher = dispatcher(store.clone(), notifier.clone());

        dispatcher.process_pending().await.unwrap();

        assert_eq!(
            store.schedule(weekly_id).await.unwrap().next_send,
            Some(Utc.with_ymd_and_hms(2026, 3, 8, 9, 0, 0).unwrap())
        );
        assert_eq!(
            store.schedule(monthly_id).await.unwrap().next_send,
            Some(Utc.with_ymd_and_hms(2026, 3, 31, 9, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_completed_quiz_suppresses_the_reminder() {
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(MockNotifier::new());
        store.add_user(User::new(1)).await;
        let id = store.add_schedule(due_schedule(1, Frequency::Daily)).await;

        let today = Utc::now().date_naive();
        store
            .create_quiz_schedules(&[prepdrill_common::QuizScheduleEntry::new(1, today, vec![4])])
            .await
            .unwrap();
        store.complete_quiz(1, today).await;

        let dispatcher = dispatcher(store.clone(), notifier.clone());
        let sent = dispatcher.process_pending().await.unwrap();

        assert_eq!(sent, 0);
        assert!(notifier.sent().is_empty());
        // The schedule is untouched and picked up again next cycle.
        let untouched = store.schedule(id).await.unwrap();
        assert!(untouched.last_sent.is_none());
        assert_eq!(
            untouched.next_send,
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_failed_post_send_update_propagates_to_the_caller() {
        let store = Arc::new(MockStore::new().failing_update_after_send());
        let notifier = Arc::new(MockNotifier::new());
        store.inner.add_user(User::new(1)).await;
        store
            .inner
            .add_schedule(due_schedule(1, Frequency::Daily))
            .await;
        let dispatcher =
            NotificationDispatcher::new(store.clone(), notifier.clone(), &SchedulerConfig::default());

        let result = dispatcher.process_pending().await;

        // The message went out before the write failed.
        assert!(result.is_err());
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_send_is_retried_next_cycle() {
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(MockNotifier::failing());
        store.add_user(User::new(1)).await;
        let id = store.add_schedule(due_schedule(1, Frequency::Daily)).await;
        let dispatcher = dispatcher(store.clone(), notifier.clone());

        let sent = dispatcher.process_pending().await.unwrap();
        assert_eq!(sent, 0);
        assert!(store.schedule(id).await.unwrap().last_sent.is_none());

        notifier.set_failing(false);
        let sent = dispatcher.process_pending().await.unwrap();
        assert_eq!(sent, 1);
        assert!(store.schedule(id).await.unwrap().last_sent.is_some());
    }

    #[tokio::test]
    async fn test_reminder_carries_templates_and_quiz_data() {
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(MockNotifier::new());
        let user = User::new(7).with_device_token("device-abc");
        store.add_user(user).await;
        store.add_schedule(due_schedule(7, Frequency::Daily)).await;
        let dispatcher = dispatcher(store.clone(), notifier.clone());

        dispatcher.process_pending().await.unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        let message = &sent[0];
        assert_eq!(message.user_id, 7);
        assert_eq!(message.title, "Quiz time");
        assert_eq!(message.body, "Your quiz is waiting");
        assert_eq!(message.device_token.as_deref(), Some("device-abc"));
        assert_eq!(message.data.get("type").map(String::as_str), Some("quiz_reminder"));
        assert_eq!(message.data.get("action").map(String::as_str), Some("open_quiz"));
        assert_eq!(message.data.get("user_id").map(String::as_str), Some("7"));
    }

    #[tokio::test]
    async fn test_empty_templates_fall_back_to_defaults() {
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(MockNotifier::new());
        store.add_user(User::new(1)).await;
        let mut schedule = due_schedule(1, Frequency::Daily);
        schedule.title_template = String::new();
        schedule.message_template = String::new();
        store.add_schedule(schedule).await;
        let dispatcher = dispatcher(store.clone(), notifier.clone());

        dispatcher.process_pending().await.unwrap();

        let sent = notifier.sent();
        assert_eq!(sent[0].title, FALLBACK_TITLE);
        assert_eq!(sent[0].body, FALLBACK_BODY);
    }

    #[tokio::test]
    async fn test_setup_anchors_at_the_preferred_time() {
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(MockNotifier::new());
        let dispatcher = dispatcher(store.clone(), notifier);
        let user = User::new(3).with_notification_time("18:30");

        let before = Utc::now();
        let entry = dispatcher.setup_daily_reminder(&user).await.unwrap();

        assert_eq!(entry.scheduled_time.time().hour(), 18);
        assert_eq!(entry.scheduled_time.time().minute(), 30);
        assert_eq!(entry.frequency, Frequency::Daily);
        assert!(entry.is_active);
        assert_eq!(entry.title_template, DAILY_REMINDER_TITLE);
        assert_eq!(entry.message_template, DAILY_REMINDER_BODY);

        let next_send: DateTime<Utc> = entry.next_send.unwrap();
        assert!(next_send > before);
        assert_eq!(next_send.time().hour(), 18);
        assert_eq!(next_send.time().minute(), 30);

        // Persisted under the id the store assigned.
        assert!(entry.id > 0);
        assert!(store.schedule(entry.id).await.is_some());
    }

    #[tokio::test]
    async fn test_setup_falls_back_on_malformed_preferred_time() {
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(MockNotifier::new());
        let dispatcher = dispatcher(store, notifier);
        let user = User::new(3).with_notification_time("25:99");

        let entry = dispatcher.setup_daily_reminder(&user).await.unwrap();

        assert_eq!(entry.scheduled_time.time().hour(), 9);
        assert_eq!(entry.scheduled_time.time().minute(), 0);
    }
}
