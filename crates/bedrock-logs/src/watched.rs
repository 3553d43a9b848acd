use crate::logs::BedrockLogs;
use logs_core::{CallType, ObservationId, RunId};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Result of a watched call together with the identifiers feedback can be
/// joined on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Traced<T> {
    pub output: T,
    pub run_id: RunId,
    pub observation_id: ObservationId,
}

impl<T> Traced<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Traced<U> {
        Traced {
            output: f(self.output),
            run_id: self.run_id,
            observation_id: self.observation_id,
        }
    }
}

/// A callable wrapped by [`BedrockLogs::watch`].
///
/// The callable takes its loggable first argument separately from the rest
/// of its arguments; only the first one is ever written to the sink.
pub struct Watched<F> {
    logs: Arc<BedrockLogs>,
    call_type: CallType,
    func: F,
}

impl<F> Watched<F> {
    pub(crate) fn new(logs: Arc<BedrockLogs>, call_type: CallType, func: F) -> Self {
        Self {
            logs,
            call_type,
            func,
        }
    }

    pub fn call_type(&self) -> &CallType {
        &self.call_type
    }

    /// Calls the wrapped function under a fresh run
    pub async fn call<I, A, Fut, O, E>(&self, input: I, rest: A) -> Result<Traced<O>, E>
    where
        F: Fn(I, A) -> Fut,
        Fut: Future<Output = Result<O, E>>,
        I: Serialize,
        O: Serialize,
    {
        self.invoke(None, input, rest).await
    }

    /// Calls the wrapped function under the run bound to `session_key`, so
    /// every call of the session shares one run id.
    pub async fn call_in_session<I, A, Fut, O, E>(
        &self,
        session_key: &str,
        input: I,
        rest: A,
    ) -> Result<Traced<O>, E>
    where
        F: Fn(I, A) -> Fut,
        Fut: Future<Output = Result<O, E>>,
        I: Serialize,
        O: Serialize,
    {
        self.invoke(Some(session_key), input, rest).await
    }

    async fn invoke<I, A, Fut, O, E>(
        &self,
        session_key: Option<&str>,
        input: I,
        rest: A,
    ) -> Result<Traced<O>, E>
    where
        F: Fn(I, A) -> Fut,
        Fut: Future<Output = Result<O, E>>,
        I: Serialize,
        O: Serialize,
    {
        let options = self.logs.options();
        let captured_input = self.logs.capture(options.capture_input, &input);

        let started = Instant::now();
        let output = (self.func)(input, rest).await?;
        let latency = started.elapsed();

        let run_id = self.logs.run_for(session_key);
        let observation_id = ObservationId::new();
        let captured_output = self.logs.capture(options.capture_output, &output);

        self.logs
            .record_invocation(
                &self.call_type,
                run_id,
                observation_id,
                session_key,
                captured_input,
                captured_output,
                latency,
            )
            .await;

        Ok(Traced {
            output,
            run_id,
            observation_id,
        })
    }
}
