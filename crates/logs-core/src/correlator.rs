use crate::ids::RunId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct RunEntry {
    run_id: RunId,
    last_accessed: Instant,
}

/// Keeps one run id per logical session so every call in the session can be
/// joined on the same key.
#[derive(Debug, Default)]
pub struct RunCorrelator {
    sessions: HashMap<String, RunEntry>,
}

impl RunCorrelator {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Run id for a session, minted on first use
    pub fn run_for(&mut self, session_key: &str) -> RunId {
        let now = Instant::now();

        match self.sessions.get_mut(session_key) {
            Some(entry) => {
                entry.last_accessed = now;
                entry.run_id
            }
            None => {
                let run_id = RunId::new();
                self.sessions.insert(
                    session_key.to_string(),
                    RunEntry {
                        run_id,
                        last_accessed: now,
                    },
                );
                run_id
            }
        }
    }

    /// Run id for a call that belongs to no session
    pub fn fresh_run(&self) -> RunId {
        RunId::new()
    }

    pub fn current(&self, session_key: &str) -> Option<RunId> {
        self.sessions.get(session_key).map(|entry| entry.run_id)
    }

    pub fn end_session(&mut self, session_key: &str) -> Option<RunId> {
        self.sessions.remove(session_key).map(|entry| entry.run_id)
    }

    pub fn gc(&mut self, ttl: Duration) {
        let now = Instant::now();
        self.sessions
            .retain(|_, entry| now.duration_since(entry.last_accessed) < ttl);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
