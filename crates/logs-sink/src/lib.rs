pub mod firehose;
pub mod local;
pub mod memory;
pub mod query;

pub use firehose::FirehoseSink;
pub use local::LocalFileSink;
pub use memory::InMemorySink;
pub use query::{join_feedback, orphan_feedback, split_entries, AnnotatedInvocation};

use anyhow::Result;
use logs_core::config::{LoggingConfig, SinkKind};
use logs_core::{LogEntry, LogsError};

pub type SinkFuture<'a> =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>>;

/// Append-only destination for log entries.
pub trait Sink: Send + Sync {
    fn write<'a>(&'a self, entry: &'a LogEntry) -> SinkFuture<'a>;
    fn name(&self) -> &str;
}

pub async fn create_sink(cfg: &LoggingConfig, aws_region: &str) -> Result<Box<dyn Sink>> {
    match cfg.sink {
        SinkKind::Local => Ok(Box::new(LocalFileSink::new(&cfg.local_dir))),
        SinkKind::Firehose => {
            let stream = cfg.delivery_stream_name.clone().ok_or_else(|| {
                LogsError::Config(
                    "logging.delivery_stream_name is required for the firehose sink".to_string(),
                )
            })?;
            Ok(Box::new(FirehoseSink::new(stream, aws_region).await?))
        }
        SinkKind::Memory => Ok(Box::new(InMemorySink::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logging_config(sink: SinkKind) -> LoggingConfig {
        LoggingConfig {
            sink,
            local_dir: "./bedrock_logs".to_string(),
            delivery_stream_name: None,
            experiment_id: None,
            capture_input: true,
            capture_output: true,
            session_ttl_seconds: 3600,
        }
    }

    #[tokio::test]
    async fn should_create_local_sink() {
        let sink = create_sink(&logging_config(SinkKind::Local), "us-east-1")
            .await
            .unwrap();
        assert_eq!(sink.name(), "local");
    }

    #[tokio::test]
    async fn should_create_memory_sink() {
        let sink = create_sink(&logging_config(SinkKind::Memory), "us-east-1")
            .await
            .unwrap();
        assert_eq!(sink.name(), "memory");
    }

    #[tokio::test]
    async fn should_require_stream_name_for_firehose() {
        let error = match create_sink(&logging_config(SinkKind::Firehose), "us-east-1").await {
            Ok(_) => panic!("expected missing stream name to fail"),
            Err(e) => e,
        };
        assert!(matches!(
            error.downcast_ref::<LogsError>(),
            Some(LogsError::Config(_))
        ));
    }
}
