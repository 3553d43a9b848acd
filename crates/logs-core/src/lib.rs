pub mod config;
pub mod correlator;
pub mod error;
pub mod ids;
pub mod record;

pub use correlator::RunCorrelator;
pub use error::LogsError;
pub use ids::{ObservationId, RunId};
pub use record::{CallType, FeedbackPayload, FeedbackRecord, InvocationRecord, LogEntry};
