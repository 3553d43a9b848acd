use crate::error::AgentRuntimeError;
use crate::models::{AgentAnswer, AgentInvocation, AgentStreamEvent};
use crate::stream::collect_agent_response;
use crate::AgentRuntime;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_bedrockagentruntime::error::DisplayErrorContext;
use aws_sdk_bedrockagentruntime::operation::invoke_agent::InvokeAgentOutput;
use aws_sdk_bedrockagentruntime::types::{ResponseStream, Trace, TracePart};
use aws_sdk_bedrockagentruntime::Client;
use futures::stream::Stream;
use log::{error, info};

pub struct BedrockAgentClient {
    client: Client,
}

impl BedrockAgentClient {
    pub async fn new() -> Self {
        info!("Initializing BedrockAgentClient");
        let aws_config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        Self {
            client: Client::new(&aws_config),
        }
    }

    pub async fn new_with_region(region: &str) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: Client::new(&aws_config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn process_agent_stream(
        response: InvokeAgentOutput,
    ) -> impl Stream<Item = Result<AgentStreamEvent, AgentRuntimeError>> + Send {
        let mut receiver = response.completion;

        async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(Some(event)) => {
                        yield convert_event(event);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(AgentRuntimeError::Stream(DisplayErrorContext(&e).to_string()));
                        break;
                    }
                }
            }
        }
    }
}

fn convert_event(event: ResponseStream) -> Result<AgentStreamEvent, AgentRuntimeError> {
    match event {
        ResponseStream::Chunk(part) => {
            let bytes = part
                .bytes()
                .map(|blob| blob.as_ref().to_vec())
                .unwrap_or_default();
            Ok(AgentStreamEvent::Chunk {
                text: String::from_utf8(bytes)?,
            })
        }
        ResponseStream::Trace(part) => Ok(AgentStreamEvent::Trace {
            trace: trace_to_json(&part),
        }),
        other => Ok(AgentStreamEvent::Other {
            kind: event_kind(&format!("{:?}", other)),
        }),
    }
}

/// Trace parts are redacted in their debug output, so only the routing
/// fields and the step kind are kept.
fn trace_to_json(part: &TracePart) -> serde_json::Value {
    serde_json::json!({
        "agent_id": part.agent_id(),
        "agent_alias_id": part.agent_alias_id(),
        "agent_version": part.agent_version(),
        "session_id": part.session_id(),
        "step": part.trace().map(trace_step),
    })
}

fn trace_step(trace: &Trace) -> &'static str {
    if trace.is_pre_processing_trace() {
        "pre_processing"
    } else if trace.is_orchestration_trace() {
        "orchestration"
    } else if trace.is_post_processing_trace() {
        "post_processing"
    } else if trace.is_failure_trace() {
        "failure"
    } else {
        "other"
    }
}

/// Variant name from an SDK event's debug output, e.g. `ReturnControl(..)`
fn event_kind(debug: &str) -> String {
    debug
        .split(|c: char| c == '(' || c == ' ' || c == '{')
        .next()
        .unwrap_or(debug)
        .to_string()
}

#[async_trait]
impl AgentRuntime for BedrockAgentClient {
    async fn invoke_agent(
        &self,
        request: AgentInvocation,
    ) -> Result<AgentAnswer, AgentRuntimeError> {
        request.validate()?;

        info!(
            "Invoking agent {} (alias {}) in session {}",
            request.agent_id, request.agent_alias_id, request.session_id
        );
        let response = self
            .client
            .invoke_agent()
            .agent_id(&request.agent_id)
            .agent_alias_id(&request.agent_alias_id)
            .session_id(&request.session_id)
            .input_text(&request.input_text)
            .enable_trace(request.enable_trace)
            .end_session(request.end_session)
            .send()
            .await
            .map_err(|e| {
                error!("Bedrock invoke_agent error: {:?}", e);
                AgentRuntimeError::Api(DisplayErrorContext(&e).to_string())
            })?;

        collect_agent_response(Self::process_agent_stream(response)).await
    }
}
