use std::env;
use std::time::Duration;

use chrono::NaiveTime;

const DEFAULT_SCRAPE_DELAY_SECS: u64 = 2;
const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 5;
const DEFAULT_USER_AGENT: &str = "PrepDrillBot/1.0";

const DEFAULT_GENERATOR_PERIOD_SECS: u64 = 3600;
const DEFAULT_DISPATCHER_PERIOD_SECS: u64 = 900;
const DEFAULT_ERROR_BACKOFF_SECS: u64 = 300;
const DEFAULT_NOTIFICATION_TIME: &str = "09:00";

/// Scraping configuration loaded from environment variables.
/// Every variable has a default; a set variable that fails to parse panics
/// with a clear message at startup.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Politeness delay taken before every outbound fetch.
    pub scrape_delay: Duration,
    /// Process-wide cap on simultaneously in-flight fetches.
    pub max_concurrent_fetches: usize,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            scrape_delay: Duration::from_secs(DEFAULT_SCRAPE_DELAY_SECS),
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ScraperConfig {
    /// Load scraping configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            scrape_delay: Duration::from_secs(env_u64(
                "PREPDRILL_SCRAPE_DELAY_SECS",
                DEFAULT_SCRAPE_DELAY_SECS,
            )),
            max_concurrent_fetches: env_u64(
                "PREPDRILL_MAX_CONCURRENT_FETCHES",
                DEFAULT_MAX_CONCURRENT_FETCHES as u64,
            ) as usize,
            user_agent: env::var("PREPDRILL_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        }
    }
}

/// Scheduling configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often the quiz-schedule generator runs.
    pub generator_period: Duration,
    /// How often the notification dispatcher runs.
    pub dispatcher_period: Duration,
    /// Sleep after a failed job iteration before resuming the normal period.
    pub error_backoff: Duration,
    /// Fallback reminder time-of-day for users without a preference.
    pub default_notification_time: NaiveTime,
    /// Push gateway URL. Unset means notifications are logged, not delivered.
    pub push_webhook_url: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            generator_period: Duration::from_secs(DEFAULT_GENERATOR_PERIOD_SECS),
            dispatcher_period: Duration::from_secs(DEFAULT_DISPATCHER_PERIOD_SECS),
            error_backoff: Duration::from_secs(DEFAULT_ERROR_BACKOFF_SECS),
            default_notification_time: default_notification_time(),
            push_webhook_url: None,
        }
    }
}

impl SchedulerConfig {
    /// Load scheduling configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            generator_period: Duration::from_secs(env_u64(
                "PREPDRILL_GENERATOR_PERIOD_SECS",
                DEFAULT_GENERATOR_PERIOD_SECS,
            )),
            dispatcher_period: Duration::from_secs(env_u64(
                "PREPDRILL_DISPATCHER_PERIOD_SECS",
                DEFAULT_DISPATCHER_PERIOD_SECS,
            )),
            error_backoff: Duration::from_secs(env_u64(
                "PREPDRILL_ERROR_BACKOFF_SECS",
                DEFAULT_ERROR_BACKOFF_SECS,
            )),
            default_notification_time: match env::var("PREPDRILL_DEFAULT_NOTIFICATION_TIME") {
                Ok(v) => NaiveTime::parse_from_str(&v, "%H:%M").unwrap_or_else(|_| {
                    panic!("PREPDRILL_DEFAULT_NOTIFICATION_TIME must be HH:MM, got {v:?}")
                }),
                Err(_) => default_notification_time(),
            },
            push_webhook_url: env::var("PREPDRILL_PUSH_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }
}

fn default_notification_time() -> NaiveTime {
    NaiveTime::parse_from_str(DEFAULT_NOTIFICATION_TIME, "%H:%M").expect("valid default time")
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number, got {v:?}")),
        Err(_) => default,
    }
}
