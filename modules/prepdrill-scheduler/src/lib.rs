pub mod dispatcher;
pub mod notify;
pub mod planner;
pub mod run_loop;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use dispatcher::NotificationDispatcher;
pub use notify::{NoopNotifier, Notifier, WebhookNotifier};
pub use planner::QuizPlanner;
pub use run_loop::{LoopHandle, ScheduleLoop};
pub use store::{MemoryStore, PrepStore};
