use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use prepdrill_common::ScraperConfig;
use prepdrill_scraper::{JsonLinesSink, QuestionScraper, QuestionSink};

#[derive(Parser)]
#[command(name = "prepdrill-scraper", about = "Scrape practice interview questions")]
struct Cli {
    /// Topic to scrape questions for, e.g. "operating systems"
    #[arg(long)]
    topic: String,

    /// Company to search interview experiences for
    #[arg(long)]
    company: Option<String>,

    /// Override the politeness delay between fetches, in seconds
    #[arg(long)]
    delay_secs: Option<u64>,

    /// Override the concurrent fetch cap
    #[arg(long)]
    max_concurrent: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ScraperConfig::from_env();
    if let Some(secs) = cli.delay_secs {
        config.scrape_delay = std::time::Duration::from_secs(secs);
    }
    if let Some(cap) = cli.max_concurrent {
        config.max_concurrent_fetches = cap;
    }

    info!(topic = cli.topic, company = ?cli.company, "PrepDrill scraper starting");

    let scraper = QuestionScraper::new(config);
    let questions = scraper
        .scrape_all_sources(&cli.topic, cli.company.as_deref())
        .await;

    let sink = JsonLinesSink::new(tokio::io::stdout());
    sink.ingest(&questions).await?;

    Ok(())
}
