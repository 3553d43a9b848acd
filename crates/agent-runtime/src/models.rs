use crate::error::AgentRuntimeError;
use logs_core::config::{AgentConfig, KnowledgeBaseConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInvocation {
    pub input_text: String,
    pub agent_id: String,
    pub agent_alias_id: String,
    pub session_id: String,
    pub enable_trace: bool,
    pub end_session: bool,
}

impl AgentInvocation {
    pub fn new(input_text: String, session_id: String, agent: &AgentConfig) -> Self {
        Self {
            input_text,
            agent_id: agent.agent_id.clone(),
            agent_alias_id: agent.agent_alias_id.clone(),
            session_id,
            enable_trace: agent.enable_trace,
            end_session: false,
        }
    }

    pub fn ending_session(mut self) -> Self {
        self.end_session = true;
        self
    }

    pub fn validate(&self) -> Result<(), AgentRuntimeError> {
        if self.input_text.trim().is_empty() {
            return Err(AgentRuntimeError::InvalidRequest(
                "input_text must not be empty".to_string(),
            ));
        }
        if self.agent_id.is_empty() || self.agent_alias_id.is_empty() {
            return Err(AgentRuntimeError::InvalidRequest(
                "agent_id and agent_alias_id are required".to_string(),
            ));
        }
        if self.session_id.is_empty() {
            return Err(AgentRuntimeError::InvalidRequest(
                "session_id is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Event of an agent's response stream, detached from SDK types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentStreamEvent {
    Chunk { text: String },
    Trace { trace: serde_json::Value },
    Other { kind: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAnswer {
    pub answer: String,
    pub traces: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveAndGenerateRequest {
    pub query: String,
    pub knowledge_base_id: String,
    pub model_arn: String,
    pub number_of_results: i32,
    pub prompt_template: Option<String>,
    pub session_id: Option<String>,
}

impl RetrieveAndGenerateRequest {
    pub fn new(query: String, kb: &KnowledgeBaseConfig) -> Self {
        Self {
            query,
            knowledge_base_id: kb.knowledge_base_id.clone(),
            model_arn: kb.model_arn.clone(),
            number_of_results: kb.number_of_results,
            prompt_template: kb.prompt_template.clone(),
            session_id: None,
        }
    }

    pub fn with_number_of_results(mut self, number_of_results: i32) -> Self {
        self.number_of_results = number_of_results;
        self
    }

    pub fn validate(&self) -> Result<(), AgentRuntimeError> {
        if self.query.trim().is_empty() {
            return Err(AgentRuntimeError::InvalidRequest(
                "query must not be empty".to_string(),
            ));
        }
        if self.number_of_results < 1 {
            return Err(AgentRuntimeError::InvalidRequest(format!(
                "number_of_results must be positive, got {}",
                self.number_of_results
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub text: String,
    pub source_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub text: String,
    pub citations: Vec<Citation>,
    pub session_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_config() -> AgentConfig {
        AgentConfig {
            agent_id: "AGENT123".to_string(),
            agent_alias_id: "ALIAS456".to_string(),
            enable_trace: true,
        }
    }

    fn kb_config() -> KnowledgeBaseConfig {
        KnowledgeBaseConfig {
            knowledge_base_id: "KB789".to_string(),
            model_arn: "arn:model".to_string(),
            number_of_results: 5,
            prompt_template: None,
        }
    }

    #[test]
    fn should_build_agent_invocation_from_config() {
        let invocation = AgentInvocation::new(
            "What is the refund policy?".to_string(),
            "session-1".to_string(),
            &agent_config(),
        );

        assert_eq!(invocation.agent_id, "AGENT123");
        assert_eq!(invocation.agent_alias_id, "ALIAS456");
        assert!(invocation.enable_trace);
        assert!(!invocation.end_session);
        assert!(invocation.validate().is_ok());
        assert!(invocation.ending_session().end_session);
    }

    #[test]
    fn should_reject_blank_agent_input() {
        let invocation = AgentInvocation::new("  ".to_string(), "s".to_string(), &agent_config());
        assert!(matches!(
            invocation.validate(),
            Err(AgentRuntimeError::InvalidRequest(_))
        ));
    }

    #[test]
    fn should_reject_missing_session_id() {
        let invocation = AgentInvocation::new("hi".to_string(), String::new(), &agent_config());
        assert!(invocation.validate().is_err());
    }

    #[test]
    fn should_build_retrieve_request_from_config() {
        let request = RetrieveAndGenerateRequest::new("policy".to_string(), &kb_config())
            .with_number_of_results(3);

        assert_eq!(request.knowledge_base_id, "KB789");
        assert_eq!(request.number_of_results, 3);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn should_reject_non_positive_result_count() {
        let request = RetrieveAndGenerateRequest::new("policy".to_string(), &kb_config())
            .with_number_of_results(0);

        let error = request.validate().unwrap_err();
        assert!(error.to_string().contains("number_of_results"));
    }

    #[test]
    fn should_serialize_generated_answer() {
        let answer = GeneratedAnswer {
            text: "Twenty days".to_string(),
            citations: vec![Citation {
                text: "Employees receive 20 days".to_string(),
                source_uri: Some("s3://docs/handbook.pdf".to_string()),
            }],
            session_id: None,
        };

        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["citations"][0]["source_uri"], "s3://docs/handbook.pdf");
    }
}
