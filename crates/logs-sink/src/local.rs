use crate::{Sink, SinkFuture};
use anyhow::{Context, Result};
use logs_core::{CallType, LogEntry, LogsError};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// JSON Lines files laid out as `<dir>/<call_type>/<YYYY-MM-DD>.jsonl`.
pub struct LocalFileSink {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalFileSink {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn partition_dir(&self, call_type: &CallType) -> PathBuf {
        self.root.join(call_type.as_str())
    }

    fn file_for(&self, entry: &LogEntry) -> PathBuf {
        let day = entry.timestamp().format("%Y-%m-%d");
        self.partition_dir(&entry.partition())
            .join(format!("{}.jsonl", day))
    }

    pub async fn append(&self, entry: &LogEntry) -> Result<()> {
        let path = self.file_for(entry);
        let mut line = serde_json::to_string(entry).map_err(LogsError::from)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| sink_error("create", parent, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| sink_error("open", &path, e))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| sink_error("append to", &path, e))?;
        file.flush()
            .await
            .map_err(|e| sink_error("flush", &path, e))?;

        debug!(path = %path.display(), "appended log entry");
        Ok(())
    }

    /// Every entry stored under one call type, oldest file first.
    /// Malformed lines are skipped.
    pub async fn read_partition(&self, call_type: &CallType) -> Result<Vec<LogEntry>> {
        let dir = self.partition_dir(call_type);
        if fs::metadata(&dir).await.is_err() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut listing = fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to list {}", dir.display()))?;
        while let Some(item) = listing.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("jsonl") {
                files.push(path);
            }
        }
        files.sort();

        let mut entries = Vec::new();
        for path in files {
            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            for line in content.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str(line) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping malformed log line"),
                }
            }
        }

        Ok(entries)
    }

    /// Entries from every partition under the root directory
    pub async fn load_all(&self) -> Result<Vec<LogEntry>> {
        if fs::metadata(&self.root).await.is_err() {
            return Ok(Vec::new());
        }

        let mut partitions = Vec::new();
        let mut listing = fs::read_dir(&self.root).await?;
        while let Some(item) = listing.next_entry().await? {
            if !item.file_type().await?.is_dir() {
                continue;
            }
            let name = item.file_name().to_string_lossy().to_string();
            match CallType::new(name) {
                Ok(call_type) => partitions.push(call_type),
                Err(e) => warn!(error = %e, "ignoring directory that is not a partition"),
            }
        }

        let mut entries = Vec::new();
        for call_type in partitions {
            entries.extend(self.read_partition(&call_type).await?);
        }
        entries.sort_by_key(|entry| entry.timestamp());
        Ok(entries)
    }
}

fn sink_error(action: &str, path: &Path, error: std::io::Error) -> LogsError {
    LogsError::Sink(format!("Failed to {} {}: {}", action, path.display(), error))
}

impl Sink for LocalFileSink {
    fn write<'a>(&'a self, entry: &'a LogEntry) -> SinkFuture<'a> {
        Box::pin(self.append(entry))
    }

    fn name(&self) -> &str {
        "local"
    }
}
