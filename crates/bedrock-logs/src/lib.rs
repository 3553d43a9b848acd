//! Observability wrapper for Bedrock calls.
//!
//! [`BedrockLogs::watch`] wraps any async callable. Each call through the
//! wrapper gets a [`RunId`](logs_core::RunId) and an
//! [`ObservationId`](logs_core::ObservationId), an invocation record is
//! appended to the configured sink, and the identifiers come back to the
//! caller so feedback submitted later can be joined to the call.

pub mod logs;
pub mod watched;

pub use logs::{BedrockLogs, LogsOptions};
pub use watched::{Traced, Watched};

pub use logs_core::{CallType, FeedbackPayload, FeedbackRecord, ObservationId, RunId};
