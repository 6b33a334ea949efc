//! The scheduling loop: two periodic jobs sharing a stop flag.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use prepdrill_common::SchedulerConfig;

use crate::dispatcher::NotificationDispatcher;
use crate::notify::Notifier;
use crate::planner::QuizPlanner;
use crate::store::PrepStore;

/// How often a sleeping job re-checks the stop flag.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Sleep for `total`, waking early once `stop` is set.
async fn interruptible_sleep(total: Duration, stop: &AtomicBool) {
    let mut remaining = total;
    while !remaining.is_zero() && !stop.load(Ordering::Relaxed) {
        let slice = remaining.min(STOP_POLL_INTERVAL);
        tokio::time::sleep(slice).await;
        remaining = remaining.saturating_sub(slice);
    }
}

/// Run `body` every `period` until `stop` is set. A failed iteration logs
/// the error and sleeps `backoff` instead of the period, then the body
/// runs again.
fn spawn_job<F, Fut>(
    name: &'static str,
    period: Duration,
    backoff: Duration,
    stop: Arc<AtomicBool>,
    body: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        info!(job = name, "Job started");
        while !stop.load(Ordering::Relaxed) {
            let pause = match body().await {
                Ok(()) => period,
                Err(e) => {
                    error!(
                        job = name,
                        error = %e,
                        backoff_secs = backoff.as_secs(),
                        "Job iteration failed, backing off"
                    );
                    backoff
                }
            };
            interruptible_sleep(pause, &stop).await;
        }
        info!(job = name, "Job terminated");
    })
}

/// Owns the generator and dispatcher jobs. Built once, started once; the
/// returned handle stops both jobs.
pub struct ScheduleLoop<S, N> {
    store: Arc<S>,
    planner: Arc<QuizPlanner<S>>,
    dispatcher: Arc<NotificationDispatcher<S, N>>,
    config: SchedulerConfig,
}

impl<S, N> ScheduleLoop<S, N>
where
    S: PrepStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: SchedulerConfig) -> Self {
        let planner = Arc::new(QuizPlanner::new(store.clone()));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            store.clone(),
            notifier,
            &config,
        ));
        Self {
            store,
            planner,
            dispatcher,
            config,
        }
    }

    /// Spawn both jobs and hand back their stop handle.
    pub fn start(self) -> LoopHandle {
        let stop = Arc::new(AtomicBool::new(false));
        info!(
            generator_period_secs = self.config.generator_period.as_secs(),
            dispatcher_period_secs = self.config.dispatcher_period.as_secs(),
            "Starting schedule loop"
        );

        let store = self.store.clone();
        let planner = self.planner.clone();
        let generator = spawn_job(
            "quiz-schedule-generator",
            self.config.generator_period,
            self.config.error_backoff,
            stop.clone(),
            move || {
                let store = store.clone();
                let planner = planner.clone();
                async move {
                    let users = store.list_active_users().await?;
                    planner.ensure_today_schedules(&users).await?;
                    Ok(())
                }
            },
        );

        let dispatcher = self.dispatcher.clone();
        let sender = spawn_job(
            "notification-dispatcher",
            self.config.dispatcher_period,
            self.config.error_backoff,
            stop.clone(),
            move || {
                let dispatcher = dispatcher.clone();
                async move {
                    dispatcher.process_pending().await?;
                    Ok(())
                }
            },
        );

        LoopHandle {
            stop,
            jobs: vec![generator, sender],
        }
    }
}

/// Stops the loop's jobs and waits for them to finish.
pub struct LoopHandle {
    stop: Arc<AtomicBool>,
    jobs: Vec<JoinHandle<()>>,
}

impl LoopHandle {
    pub async fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        for job in self.jobs {
            if let Err(e) = job.await {
                error!(error = %e, "Job panicked during shutdown");
            }
        }
        info!("Schedule loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockNotifier, MockStore};
    use prepdrill_common::{TopicPriority, User};

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig {
            generator_period: Duration::from_millis(10),
            dispatcher_period: Duration::from_millis(10),
            error_backoff: Duration::from_millis(10),
            ..SchedulerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_both_jobs_tick_until_stopped() {
        let store = Arc::new(MockStore::new());
        store.inner.add_user(User::new(1)).await;
        store
            .inner
            .set_topics(1, vec![TopicPriority { topic_id: 4, priority: 2 }])
            .await;
        let notifier = Arc::new(MockNotifier::new());

        let handle = ScheduleLoop::new(store.clone(), notifier, fast_config()).start();
        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.stop().await;

        assert!(store.list_users_calls() >= 2);
        assert!(store.due_calls() >= 2);
        assert_eq!(store.inner.quiz_schedules().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_job_backs_off_without_stalling_the_other() {
        let store = Arc::new(MockStore::new().failing_list_users());
        let notifier = Arc::new(MockNotifier::new());
        let config = SchedulerConfig {
            generator_period: Duration::from_millis(10),
            dispatcher_period: Duration::from_millis(10),
            error_backoff: Duration::from_secs(5),
            ..SchedulerConfig::default()
        };

        let handle = ScheduleLoop::new(store.clone(), notifier, config).start();
        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.stop().await;

        // One failed iteration, then the generator sat in backoff while
        // the dispatcher kept its own period.
        assert_eq!(store.list_users_calls(), 1);
        assert!(store.due_calls() >= 3);
    }

    #[tokio::test]
    async fn test_dispatcher_job_backs_off_when_its_store_read_fails() {
        let store = Arc::new(MockStore::new().failing_due_schedules());
        let notifier = Arc::new(MockNotifier::new());
        let config = SchedulerConfig {
            generator_period: Duration::from_millis(10),
            dispatcher_period: Duration::from_millis(10),
            error_backoff: Duration::from_secs(5),
            ..SchedulerConfig::default()
        };

        let handle = ScheduleLoop::new(store.clone(), notifier, config).start();
        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.stop().await;

        // One failed read, then the dispatcher sat in backoff while the
        // generator kept ticking.
        assert_eq!(store.due_calls(), 1);
        assert!(store.list_users_calls() >= 3);
    }

    #[tokio::test]
    async fn test_stop_prevents_further_iterations() {
        let store = Arc::new(MockStore::new());
        let notifier = Arc::new(MockNotifier::new());

        let handle = ScheduleLoop::new(store.clone(), notifier, fast_config()).start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop().await;

        let after_stop = store.due_calls();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(store.due_calls(), after_stop);
    }
}
