use agent_runtime::AgentRuntimeError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use logs_core::LogsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Agent service error: {0}")]
    AgentError(String),

    #[error("Knowledge base service error: {0}")]
    KnowledgeBaseError(String),

    #[error("Unexpected response from Bedrock: {0}")]
    ProtocolError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    pub fn from_agent(error: AgentRuntimeError) -> Self {
        match error {
            AgentRuntimeError::InvalidRequest(msg) => ServiceError::ValidationError(msg),
            e if e.is_protocol_error() => ServiceError::ProtocolError(e.to_string()),
            e => ServiceError::AgentError(e.to_string()),
        }
    }

    pub fn from_knowledge_base(error: AgentRuntimeError) -> Self {
        match error {
            AgentRuntimeError::InvalidRequest(msg) => ServiceError::ValidationError(msg),
            e => ServiceError::KnowledgeBaseError(e.to_string()),
        }
    }

    /// Sink failures keep their retryable classification when the
    /// underlying error is a `LogsError`.
    pub fn from_logging(error: anyhow::Error) -> Self {
        match error.downcast::<LogsError>() {
            Ok(logs_error) => logs_error.into(),
            Err(other) => ServiceError::LoggingError(format!("{:#}", other)),
        }
    }

    /// Returns the appropriate HTTP status code for this error
    pub fn http_status_code(&self) -> u16 {
        match self {
            ServiceError::AgentError(_) => 503,         // Service Unavailable (can retry)
            ServiceError::KnowledgeBaseError(_) => 503, // Service Unavailable (can retry)
            ServiceError::ProtocolError(_) => 502,      // Bad Gateway
            ServiceError::LoggingError(_) => 500,       // Internal Server Error
            ServiceError::ConfigError(_) => 500,        // Internal Server Error
            ServiceError::ValidationError(_) => 400,    // Bad Request
            ServiceError::InternalError(_) => 500,      // Internal Server Error
        }
    }

    /// Returns true if the error is potentially recoverable with a retry
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::AgentError(_) => true,
            ServiceError::KnowledgeBaseError(_) => true,
            ServiceError::ProtocolError(_) => false,
            ServiceError::LoggingError(_) => true,
            ServiceError::ConfigError(_) => false,
            ServiceError::ValidationError(_) => false,
            ServiceError::InternalError(_) => false,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.to_string(),
            "retryable": self.is_retryable(),
            "http_status": self.http_status_code()
        })
    }
}

impl From<LogsError> for ServiceError {
    fn from(error: LogsError) -> Self {
        match error {
            LogsError::InvalidCallType(_) | LogsError::Config(_) => {
                ServiceError::ConfigError(error.to_string())
            }
            e if e.is_retryable() => ServiceError::LoggingError(e.to_string()),
            e => ServiceError::InternalError(e.to_string()),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_correct_http_status_codes() {
        assert_eq!(
            ServiceError::AgentError("test".to_string()).http_status_code(),
            503
        );
        assert_eq!(
            ServiceError::KnowledgeBaseError("test".to_string()).http_status_code(),
            503
        );
        assert_eq!(
            ServiceError::ProtocolError("test".to_string()).http_status_code(),
            502
        );
        assert_eq!(
            ServiceError::LoggingError("test".to_string()).http_status_code(),
            500
        );
        assert_eq!(
            ServiceError::ConfigError("test".to_string()).http_status_code(),
            500
        );
        assert_eq!(
            ServiceError::ValidationError("test".to_string()).http_status_code(),
            400
        );
    }

    #[test]
    fn should_return_correct_retryable_flags() {
        assert!(ServiceError::AgentError("test".to_string()).is_retryable());
        assert!(ServiceError::KnowledgeBaseError("test".to_string()).is_retryable());
        assert!(!ServiceError::ProtocolError("test".to_string()).is_retryable());
        assert!(ServiceError::LoggingError("test".to_string()).is_retryable());
        assert!(!ServiceError::ConfigError("test".to_string()).is_retryable());
        assert!(!ServiceError::ValidationError("test".to_string()).is_retryable());
    }

    #[test]
    fn should_map_agent_runtime_errors() {
        assert!(matches!(
            ServiceError::from_agent(AgentRuntimeError::EndOfResponseMissing),
            ServiceError::ProtocolError(_)
        ));
        assert!(matches!(
            ServiceError::from_agent(AgentRuntimeError::Api("throttled".to_string())),
            ServiceError::AgentError(_)
        ));
        assert!(matches!(
            ServiceError::from_knowledge_base(AgentRuntimeError::InvalidRequest(
                "empty".to_string()
            )),
            ServiceError::ValidationError(_)
        ));
    }

    #[test]
    fn should_keep_sink_retry_classification() {
        let sink = ServiceError::from_logging(
            anyhow::Error::from(LogsError::Sink("throttled".to_string()))
                .context("Failed to write feedback"),
        );
        assert!(matches!(sink, ServiceError::LoggingError(_)));
        assert!(sink.is_retryable());

        let encoding = serde_json::from_str::<serde_json::Value>("{")
            .map(|_| ())
            .unwrap_err();
        let serialization = ServiceError::from(LogsError::Serialization(encoding));
        assert!(matches!(serialization, ServiceError::InternalError(_)));
        assert!(!serialization.is_retryable());

        let other = ServiceError::from_logging(anyhow::anyhow!("disk gone"));
        assert!(matches!(other, ServiceError::LoggingError(_)));
    }

    #[test]
    fn should_format_error_json() {
        let error = ServiceError::ProtocolError("End of response not received".to_string());
        let json = error.to_json();

        assert!(json["error"]
            .as_str()
            .unwrap()
            .contains("End of response not received"));
        assert_eq!(json["retryable"], false);
        assert_eq!(json["http_status"], 502);
    }
}
