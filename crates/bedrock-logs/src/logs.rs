use crate::watched::{Traced, Watched};
use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use logs_core::config::{Config, LoggingConfig};
use logs_core::{
    CallType, FeedbackRecord, InvocationRecord, LogEntry, LogsError, ObservationId, RunCorrelator,
    RunId,
};
use logs_sink::{create_sink, Sink};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct LogsOptions {
    pub experiment_id: Option<String>,
    pub capture_input: bool,
    pub capture_output: bool,
    pub session_ttl: Duration,
}

impl Default for LogsOptions {
    fn default() -> Self {
        Self {
            experiment_id: None,
            capture_input: true,
            capture_output: true,
            session_ttl: Duration::from_secs(3600),
        }
    }
}

impl From<&LoggingConfig> for LogsOptions {
    fn from(cfg: &LoggingConfig) -> Self {
        Self {
            experiment_id: cfg.experiment_id.clone(),
            capture_input: cfg.capture_input,
            capture_output: cfg.capture_output,
            session_ttl: Duration::from_secs(cfg.session_ttl_seconds),
        }
    }
}

/// Entry point of the correlation layer: wraps calls, mints identifiers and
/// forwards records to the configured sink.
pub struct BedrockLogs {
    sink: Arc<dyn Sink>,
    options: LogsOptions,
    correlator: Mutex<RunCorrelator>,
}

impl std::fmt::Debug for BedrockLogs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockLogs")
            .field("sink", &self.sink.name())
            .field("options", &self.options)
            .finish()
    }
}

impl BedrockLogs {
    pub fn new(sink: Arc<dyn Sink>, options: LogsOptions) -> Self {
        Self {
            sink,
            options,
            correlator: Mutex::new(RunCorrelator::new()),
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let logging = config.logging.with_env_overrides();
        let region = config.aws.with_env_overrides().region;
        let sink = create_sink(&logging, &region)
            .await
            .context("Failed to create log sink")?;

        info!("BedrockLogs writing to '{}' sink", sink.name());
        Ok(Self::new(Arc::from(sink), LogsOptions::from(&logging)))
    }

    pub fn options(&self) -> &LogsOptions {
        &self.options
    }

    /// Wraps `func` so every call through the returned handle is logged
    /// under `call_type` and returns its identifiers.
    pub fn watch<F>(self: &Arc<Self>, call_type: &str, func: F) -> Result<Watched<F>, LogsError> {
        let call_type = CallType::new(call_type)?;
        Ok(Watched::new(Arc::clone(self), call_type, func))
    }

    /// Writes feedback under the `Feedback` partition. The referenced run is
    /// not checked.
    pub async fn submit_feedback(&self, feedback: FeedbackRecord) -> Result<Traced<()>> {
        let run_id = feedback.run_id;
        let observation_id = feedback.feedback_observation_id;

        self.sink
            .write(&LogEntry::Feedback(feedback))
            .await
            .context("Failed to write feedback")?;

        Ok(Traced {
            output: (),
            run_id,
            observation_id,
        })
    }

    pub fn end_session(&self, session_key: &str) -> Option<RunId> {
        self.correlator
            .lock()
            .ok()
            .and_then(|mut correlator| correlator.end_session(session_key))
    }

    /// Sessions that currently hold a run id
    pub fn active_sessions(&self) -> usize {
        self.correlator
            .lock()
            .map(|correlator| correlator.len())
            .unwrap_or(0)
    }

    pub fn gc_sessions(&self) {
        if let Ok(mut correlator) = self.correlator.lock() {
            correlator.gc(self.options.session_ttl);
        }
    }

    pub(crate) fn run_for(&self, session_key: Option<&str>) -> RunId {
        match (session_key, self.correlator.lock()) {
            (Some(key), Ok(mut correlator)) => correlator.run_for(key),
            (None, Ok(correlator)) => correlator.fresh_run(),
            (_, Err(_)) => {
                warn!("run correlator lock poisoned, starting a fresh run");
                RunId::new()
            }
        }
    }

    pub(crate) fn capture(&self, enabled: bool, value: &impl serde::Serialize) -> serde_json::Value {
        if !enabled {
            return serde_json::Value::Null;
        }
        serde_json::to_value(value).unwrap_or_else(|e| {
            warn!("Could not capture value for logging: {}", e);
            serde_json::Value::Null
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn record_invocation(
        &self,
        call_type: &CallType,
        run_id: RunId,
        observation_id: ObservationId,
        session_key: Option<&str>,
        input: serde_json::Value,
        output: serde_json::Value,
        latency: Duration,
    ) {
        let record = InvocationRecord {
            run_id,
            observation_id,
            call_type: call_type.clone(),
            experiment_id: self.options.experiment_id.clone(),
            session_id: session_key.map(str::to_string),
            input,
            output,
            timestamp: Utc::now(),
            latency_ms: latency.as_millis() as u64,
        };

        if let Err(e) = self.sink.write(&LogEntry::Invocation(record)).await {
            let retryable = e
                .downcast_ref::<LogsError>()
                .map_or(false, LogsError::is_retryable);
            warn!(
                "Failed to log {} call (run {}, observation {}, retryable: {}): {:#}",
                call_type, run_id, observation_id, retryable, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logs_core::config::SinkKind;
    use logs_core::FeedbackPayload;
    use logs_sink::InMemorySink;

    fn logs_with_memory_sink() -> (Arc<BedrockLogs>, InMemorySink) {
        let sink = InMemorySink::new();
        let logs = BedrockLogs::new(Arc::new(sink.clone()), LogsOptions::default());
        (Arc::new(logs), sink)
    }

    #[test]
    fn should_build_options_from_logging_config() {
        let cfg = LoggingConfig {
            sink: SinkKind::Memory,
            local_dir: "./logs".to_string(),
            delivery_stream_name: None,
            experiment_id: Some("exp-1".to_string()),
            capture_input: false,
            capture_output: true,
            session_ttl_seconds: 60,
        };

        let options = LogsOptions::from(&cfg);

        assert_eq!(options.experiment_id.as_deref(), Some("exp-1"));
        assert!(!options.capture_input);
        assert_eq!(options.session_ttl, Duration::from_secs(60));
    }

    #[test]
    fn should_reject_invalid_call_type_when_watching() {
        let (logs, _) = logs_with_memory_sink();
        let result = logs.watch("not valid", |q: String, _: ()| async move {
            Ok::<_, std::io::Error>(q)
        });
        assert!(matches!(result, Err(LogsError::InvalidCallType(_))));
    }

    #[tokio::test]
    async fn should_write_feedback_without_checking_run() {
        let (logs, sink) = logs_with_memory_sink();
        let unknown_run = RunId::new();
        let feedback = FeedbackRecord::new(
            "user-7",
            unknown_run,
            FeedbackPayload::Rating {
                category: "thumbs_down".to_string(),
                score: None,
            },
        );

        let traced = logs.submit_feedback(feedback.clone()).await.unwrap();

        assert_eq!(traced.run_id, unknown_run);
        assert_eq!(traced.observation_id, feedback.feedback_observation_id);
        assert_eq!(sink.entries(), vec![LogEntry::Feedback(feedback)]);

        let written = serde_json::to_string(&sink.entries()).unwrap();
        assert!(written.contains(&traced.observation_id.to_string()));
    }

    #[test]
    fn should_drop_idle_sessions_on_gc() {
        let sink = InMemorySink::new();
        let options = LogsOptions {
            session_ttl: Duration::ZERO,
            ..LogsOptions::default()
        };
        let logs = BedrockLogs::new(Arc::new(sink), options);
        let first = logs.run_for(Some("session-1"));
        logs.run_for(Some("session-2"));
        assert_eq!(logs.active_sessions(), 2);

        logs.gc_sessions();

        assert_eq!(logs.active_sessions(), 0);
        assert_ne!(logs.run_for(Some("session-1")), first);
    }

    #[test]
    fn should_keep_fresh_sessions_on_gc() {
        let (logs, _) = logs_with_memory_sink();
        let run = logs.run_for(Some("session-1"));

        logs.gc_sessions();

        assert_eq!(logs.run_for(Some("session-1")), run);
    }

    #[test]
    fn should_end_session_and_forget_run() {
        let (logs, _) = logs_with_memory_sink();
        let run = logs.run_for(Some("session-1"));

        assert_eq!(logs.end_session("session-1"), Some(run));
        assert_eq!(logs.end_session("session-1"), None);
    }

    #[test]
    fn should_skip_capture_when_disabled() {
        let (logs, _) = logs_with_memory_sink();
        assert_eq!(logs.capture(false, &"secret"), serde_json::Value::Null);
        assert_eq!(logs.capture(true, &"question"), serde_json::json!("question"));
    }

    #[tokio::test]
    async fn should_create_from_config_with_memory_sink() {
        let config: Config = toml::from_str(
            r#"
[logging]
sink = "memory"
experiment_id = "baseline"

[agent]
agent_id = "A"
agent_alias_id = "B"

[knowledge_base]
knowledge_base_id = "KB"
model_arn = "arn"
"#,
        )
        .unwrap();

        let logs = BedrockLogs::from_config(&config).await.unwrap();

        assert_eq!(logs.options().experiment_id.as_deref(), Some("baseline"));
    }
}
