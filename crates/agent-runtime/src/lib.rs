pub mod bedrock_agent;
pub mod error;
pub mod knowledge_base;
pub mod models;
pub mod stream;

pub use bedrock_agent::BedrockAgentClient;
pub use error::AgentRuntimeError;
pub use knowledge_base::BedrockKnowledgeBaseClient;
pub use models::{
    AgentAnswer, AgentInvocation, AgentStreamEvent, Citation, GeneratedAnswer,
    RetrieveAndGenerateRequest,
};
pub use stream::collect_agent_response;

use async_trait::async_trait;

/// Sends a query to an agent and waits for its final answer.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn invoke_agent(&self, request: AgentInvocation)
        -> Result<AgentAnswer, AgentRuntimeError>;
}

/// Answers a query from a knowledge base with citations.
#[async_trait]
pub trait KnowledgeBaseRuntime: Send + Sync {
    async fn retrieve_and_generate(
        &self,
        request: RetrieveAndGenerateRequest,
    ) -> Result<GeneratedAnswer, AgentRuntimeError>;
}
