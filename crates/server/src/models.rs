use agent_runtime::Citation;
use logs_core::{FeedbackPayload, ObservationId, RunId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeAgentRequest {
    pub query: String,
    pub session_id: Option<String>,
    #[serde(default)]
    pub end_session: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeAgentResponse {
    pub answer: String,
    pub traces: Vec<serde_json::Value>,
    pub session_id: String,
    pub run_id: RunId,
    pub observation_id: ObservationId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveAndGenerateBody {
    pub query: String,
    pub number_of_results: Option<i32>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveAndGenerateResponse {
    pub text: String,
    pub citations: Vec<Citation>,
    /// Knowledge base session to pass back for follow-up queries
    pub session_id: Option<String>,
    pub run_id: RunId,
    pub observation_id: ObservationId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub user_id: String,
    pub run_id: RunId,
    pub observation_id: Option<ObservationId>,
    pub feedback: FeedbackPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub run_id: RunId,
    pub observation_id: ObservationId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndSessionResponse {
    pub session_id: String,
    pub run_id: Option<RunId>,
}
