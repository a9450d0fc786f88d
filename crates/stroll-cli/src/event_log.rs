use anyhow::{Context, Result};
use stroll_proto::events::NavEvent;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Newline-delimited JSON log of navigation events. A log without a file
/// only stamps events.
pub struct EventLog {
    file: Option<File>,
}

impl EventLog {
    pub async fn open(path: Option<&str>) -> Result<Self> {
        let file = match path {
            Some(p) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(p)
                    .await
                    .with_context(|| format!("open event log {}", p))?,
            ),
            None => None,
        };
        Ok(Self { file })
    }

    pub async fn write(&mut self, ev: NavEvent) -> Result<NavEvent> {
        let ev = ev.stamped(now_unix_ms());
        if let Some(f) = self.file.as_mut() {
            let mut line = serde_json::to_vec(&ev)?;
            line.push(b'\n');
            f.write_all(&line).await.context("write event log")?;
        }
        Ok(ev)
    }

    pub async fn flush(&mut self) -> Result<()> {
        if let Some(f) = self.file.as_mut() {
            f.flush().await?;
        }
        Ok(())
    }
}

fn now_unix_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
