pub mod config;
pub mod error;
pub mod types;

pub use config::{ScraperConfig, SchedulerConfig};
pub use error::{FetchError, FetchResult};
pub use types::*;
