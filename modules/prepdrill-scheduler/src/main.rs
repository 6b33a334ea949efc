use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use prepdrill_common::SchedulerConfig;
use prepdrill_scheduler::{MemoryStore, NoopNotifier, Notifier, ScheduleLoop, WebhookNotifier};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("PrepDrill scheduler starting");

    let config = SchedulerConfig::from_env();
    let store = Arc::new(MemoryStore::default());

    match config.push_webhook_url.clone() {
        Some(url) => {
            info!("Push webhook delivery enabled");
            run(store, Arc::new(WebhookNotifier::new(url)), config).await
        }
        None => {
            info!("No PREPDRILL_PUSH_WEBHOOK_URL set, logging reminders instead");
            run(store, Arc::new(NoopNotifier), config).await
        }
    }
}

async fn run<N: Notifier + 'static>(
    store: Arc<MemoryStore>,
    notifier: Arc<N>,
    config: SchedulerConfig,
) -> Result<()> {
    let handle = ScheduleLoop::new(store, notifier, config).start();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    handle.stop().await;

    Ok(())
}
