use crate::errors::ServiceError;
use crate::models::{
    EndSessionResponse, FeedbackRequest, FeedbackResponse, InvokeAgentRequest,
    InvokeAgentResponse, RetrieveAndGenerateBody, RetrieveAndGenerateResponse,
};
use agent_runtime::{
    AgentInvocation, AgentRuntime, KnowledgeBaseRuntime, RetrieveAndGenerateRequest,
};
use axum::{
    extract::{Json as ExtractJson, Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use bedrock_logs::BedrockLogs;
use log::info;
use logs_core::config::Config;
use logs_core::{CallType, FeedbackRecord};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

pub struct AppState {
    pub config: Config,
    pub logs: Arc<BedrockLogs>,
    pub agent: Arc<dyn AgentRuntime>,
    pub knowledge_base: Arc<dyn KnowledgeBaseRuntime>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("logs", &self.logs)
            .field("agent", &"AgentRuntime<...>")
            .field("knowledge_base", &"KnowledgeBaseRuntime<...>")
            .finish()
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/invoke_agent", post(invoke_agent))
        .route("/retrieve_and_generate", post(retrieve_and_generate))
        .route("/feedback", post(submit_feedback))
        .route("/sessions/:session_id/end", post(end_session))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn invoke_agent(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<InvokeAgentRequest>,
) -> Result<Json<InvokeAgentResponse>, ServiceError> {
    let session_id = request
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let end_session = request.end_session;

    let agent = Arc::clone(&state.agent);
    let agent_config = state.config.agent.clone();
    let watched = state.logs.watch(CallType::AGENT, move |query: String, session: String| {
        let agent = Arc::clone(&agent);
        let mut invocation = AgentInvocation::new(query, session, &agent_config);
        if end_session {
            invocation = invocation.ending_session();
        }
        async move { agent.invoke_agent(invocation).await }
    })?;

    let result = watched
        .call_in_session(&session_id, request.query, session_id.clone())
        .await;

    // Bedrock closes the session even when the call fails
    if end_session {
        state.logs.end_session(&session_id);
    }
    let traced = result.map_err(ServiceError::from_agent)?;

    info!(
        "Agent answered in session {} (run {}, observation {})",
        session_id, traced.run_id, traced.observation_id
    );

    Ok(Json(InvokeAgentResponse {
        answer: traced.output.answer,
        traces: traced.output.traces,
        session_id,
        run_id: traced.run_id,
        observation_id: traced.observation_id,
    }))
}

async fn retrieve_and_generate(
    State(state): State<Arc<AppState>>,
    ExtractJson(body): ExtractJson<RetrieveAndGenerateBody>,
) -> Result<Json<RetrieveAndGenerateResponse>, ServiceError> {
    let knowledge_base = Arc::clone(&state.knowledge_base);
    let kb_config = state.config.knowledge_base.clone();
    let watched = state.logs.watch(
        CallType::RETRIEVE_AND_GENERATE,
        move |query: String, body: RetrieveAndGenerateBody| {
            let knowledge_base = Arc::clone(&knowledge_base);
            let mut request = RetrieveAndGenerateRequest::new(query, &kb_config);
            if let Some(count) = body.number_of_results {
                request = request.with_number_of_results(count);
            }
            request.session_id = body.session_id;
            async move { knowledge_base.retrieve_and_generate(request).await }
        },
    )?;

    let query = body.query.clone();
    let traced = match body.session_id.clone() {
        Some(session_id) => watched.call_in_session(&session_id, query, body).await,
        None => watched.call(query, body).await,
    }
    .map_err(ServiceError::from_knowledge_base)?;

    Ok(Json(RetrieveAndGenerateResponse {
        text: traced.output.text,
        citations: traced.output.citations,
        session_id: traced.output.session_id,
        run_id: traced.run_id,
        observation_id: traced.observation_id,
    }))
}

async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ServiceError> {
    if request.user_id.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "user_id must not be empty".to_string(),
        ));
    }

    let mut record = FeedbackRecord::new(request.user_id, request.run_id, request.feedback);
    if let Some(observation_id) = request.observation_id {
        record = record.for_observation(observation_id);
    }

    let traced = state
        .logs
        .submit_feedback(record)
        .await
        .map_err(ServiceError::from_logging)?;

    Ok(Json(FeedbackResponse {
        run_id: traced.run_id,
        observation_id: traced.observation_id,
    }))
}

async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Json<EndSessionResponse> {
    let run_id = state.logs.end_session(&session_id);
    Json(EndSessionResponse { session_id, run_id })
}
