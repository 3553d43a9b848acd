use crate::error::AgentRuntimeError;
use crate::models::{AgentAnswer, AgentStreamEvent};
use futures::stream::{Stream, StreamExt};
use log::debug;

/// Drains an agent response stream.
///
/// Traces accumulate until the first chunk, which carries the final answer
/// and ends the response. Any other event kind is an error, as is a stream
/// that ends before a chunk arrives.
pub async fn collect_agent_response<S>(stream: S) -> Result<AgentAnswer, AgentRuntimeError>
where
    S: Stream<Item = Result<AgentStreamEvent, AgentRuntimeError>>,
{
    futures::pin_mut!(stream);
    let mut traces = Vec::new();

    while let Some(event) = stream.next().await {
        match event? {
            AgentStreamEvent::Chunk { text } => {
                debug!("agent answered after {} trace events", traces.len());
                return Ok(AgentAnswer {
                    answer: text,
                    traces,
                });
            }
            AgentStreamEvent::Trace { trace } => traces.push(trace),
            AgentStreamEvent::Other { kind } => {
                return Err(AgentRuntimeError::UnexpectedEvent(kind));
            }
        }
    }

    Err(AgentRuntimeError::EndOfResponseMissing)
}
