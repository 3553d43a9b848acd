use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentRuntimeError {
    #[error("End of response not received")]
    EndOfResponseMissing,

    #[error("Unexpected event: {0}")]
    UnexpectedEvent(String),

    #[error("Agent response chunk is not valid UTF-8")]
    InvalidChunk(#[from] std::string::FromUtf8Error),

    #[error("Response stream error: {0}")]
    Stream(String),

    #[error("Bedrock API error: {0}")]
    Api(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AgentRuntimeError {
    /// Errors raised while reading the response rather than sending the request
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            AgentRuntimeError::EndOfResponseMissing
                | AgentRuntimeError::UnexpectedEvent(_)
                | AgentRuntimeError::InvalidChunk(_)
        )
    }
}
