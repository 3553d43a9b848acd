use crate::{Sink, SinkFuture};
use logs_core::{CallType, LogEntry, LogsError};
use std::sync::{Arc, Mutex};

/// Keeps entries in process. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn partition(&self, call_type: &CallType) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| &entry.partition() == call_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for InMemorySink {
    fn write<'a>(&'a self, entry: &'a LogEntry) -> SinkFuture<'a> {
        Box::pin(async move {
            self.entries
                .lock()
                .map_err(|_| LogsError::Sink("in-memory sink lock poisoned".to_string()))?
                .push(entry.clone());
            Ok::<(), anyhow::Error>(())
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}
