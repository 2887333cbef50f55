use crate::domain::ports::EventPublisher;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout_at};

/// Appends each published event to a file as one `{"key": .., "value": ..}` JSON line.
pub struct JsonLinesPublisher {
    file: Mutex<File>,
}

impl JsonLinesPublisher {
    /// Opens `path` for appending, creating it if needed.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl EventPublisher for JsonLinesPublisher {
    async fn publish(&self, deadline: Instant, key: &str, document: &Value) -> Result<()> {
        if Instant::now() >= deadline {
            return Err(PipelineError::DeadlineExceeded);
        }
        let mut line = serde_json::to_vec(&json!({ "key": key, "value": document }))?;
        line.push(b'\n');

        timeout_at(deadline, async {
            let mut file = self.file.lock().await;
            file.write_all(&line).await?;
            file.flush().await
        })
        .await
        .map_err(|_| PipelineError::DeadlineExceeded)??;

        Ok(())
    }
}
