use crate::error::LogsError;
use crate::ids::{ObservationId, RunId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category label for a wrapped call. Doubles as the sink partition key,
/// so only path-safe characters are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CallType(String);

impl CallType {
    pub const AGENT: &'static str = "Agent";
    pub const RETRIEVE_AND_GENERATE: &'static str = "Retrieve-and-Generate";
    pub const FEEDBACK: &'static str = "Feedback";

    pub fn new(label: impl Into<String>) -> Result<Self, LogsError> {
        let label = label.into();
        let valid = !label.is_empty()
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !valid {
            return Err(LogsError::InvalidCallType(label));
        }
        Ok(Self(label))
    }

    pub fn agent() -> Self {
        Self(Self::AGENT.to_string())
    }

    pub fn retrieve_and_generate() -> Self {
        Self(Self::RETRIEVE_AND_GENERATE.to_string())
    }

    pub fn feedback() -> Self {
        Self(Self::FEEDBACK.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CallType {
    type Error = LogsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CallType> for String {
    fn from(call_type: CallType) -> Self {
        call_type.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRecord {
    pub run_id: RunId,
    pub observation_id: ObservationId,
    pub call_type: CallType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// First argument of the wrapped call, `null` when input capture is off
    pub input: serde_json::Value,
    /// Full return value, `null` when output capture is off
    pub output: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedbackPayload {
    Text(String),
    Rating {
        category: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<i64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Identifies the feedback entry itself
    pub feedback_observation_id: ObservationId,
    pub user_id: String,
    pub run_id: RunId,
    /// Call the feedback is about, absent for run-level feedback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_id: Option<ObservationId>,
    pub feedback: FeedbackPayload,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(user_id: impl Into<String>, run_id: RunId, feedback: FeedbackPayload) -> Self {
        Self {
            feedback_observation_id: ObservationId::new(),
            user_id: user_id.into(),
            run_id,
            observation_id: None,
            feedback,
            timestamp: Utc::now(),
        }
    }

    pub fn for_observation(mut self, observation_id: ObservationId) -> Self {
        self.observation_id = Some(observation_id);
        self
    }

    /// Whether this feedback targets the given call. Run-level feedback
    /// (no observation id) applies to every call in the run.
    pub fn targets(&self, record: &InvocationRecord) -> bool {
        self.run_id == record.run_id
            && self
                .observation_id
                .map_or(true, |id| id == record.observation_id)
    }
}

/// Everything a sink accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEntry {
    Invocation(InvocationRecord),
    Feedback(FeedbackRecord),
}

impl LogEntry {
    /// Partition the entry is written under
    pub fn partition(&self) -> CallType {
        match self {
            LogEntry::Invocation(record) => record.call_type.clone(),
            LogEntry::Feedback(_) => CallType::feedback(),
        }
    }

    pub fn run_id(&self) -> RunId {
        match self {
            LogEntry::Invocation(record) => record.run_id,
            LogEntry::Feedback(record) => record.run_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LogEntry::Invocation(record) => record.timestamp,
            LogEntry::Feedback(record) => record.timestamp,
        }
    }
}
