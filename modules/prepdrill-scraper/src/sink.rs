//! Destinations for scraped questions.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use prepdrill_common::ScrapedQuestion;

/// Anything that can take a batch of scraped questions.
#[async_trait]
pub trait QuestionSink: Send + Sync {
    async fn ingest(&self, questions: &[ScrapedQuestion]) -> anyhow::Result<()>;
}

/// Writes each question as one JSON object per line.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> QuestionSink for JsonLinesSink<W> {
    async fn ingest(&self, questions: &[ScrapedQuestion]) -> anyhow::Result<()> {
        let mut writer = self.writer.lock().await;
        for question in questions {
            let line = serde_json::to_string(question)?;
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
        }
        writer.flush().await?;
        Ok(())
    }
}
