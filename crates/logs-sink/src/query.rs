use logs_core::{FeedbackRecord, InvocationRecord, LogEntry, RunId};
use serde::Serialize;
use std::collections::HashSet;

/// An invocation together with the feedback that targets it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedInvocation {
    pub invocation: InvocationRecord,
    pub feedback: Vec<FeedbackRecord>,
}

/// Splits mixed sink entries into invocations and feedback
pub fn split_entries(entries: Vec<LogEntry>) -> (Vec<InvocationRecord>, Vec<FeedbackRecord>) {
    let mut invocations = Vec::new();
    let mut feedback = Vec::new();
    for entry in entries {
        match entry {
            LogEntry::Invocation(record) => invocations.push(record),
            LogEntry::Feedback(record) => feedback.push(record),
        }
    }
    (invocations, feedback)
}

/// Query-time join on run id, narrowed by observation id when the feedback
/// names one.
pub fn join_feedback(
    invocations: &[InvocationRecord],
    feedback: &[FeedbackRecord],
) -> Vec<AnnotatedInvocation> {
    invocations
        .iter()
        .map(|invocation| AnnotatedInvocation {
            invocation: invocation.clone(),
            feedback: feedback
                .iter()
                .filter(|record| record.targets(invocation))
                .cloned()
                .collect(),
        })
        .collect()
}

/// Feedback whose run has no logged invocation
pub fn orphan_feedback(
    invocations: &[InvocationRecord],
    feedback: &[FeedbackRecord],
) -> Vec<FeedbackRecord> {
    let known_runs: HashSet<RunId> = invocations.iter().map(|record| record.run_id).collect();
    feedback
        .iter()
        .filter(|record| !known_runs.contains(&record.run_id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use logs_core::{CallType, FeedbackPayload, ObservationId};
    use serde_json::json;

    fn invocation(run_id: RunId) -> InvocationRecord {
        InvocationRecord {
            run_id,
            observation_id: ObservationId::new(),
            call_type: CallType::agent(),
            experiment_id: None,
            session_id: None,
            input: json!("question"),
            output: json!("answer"),
            timestamp: Utc::now(),
            latency_ms: 1,
        }
    }

    fn text_feedback(run_id: RunId, text: &str) -> FeedbackRecord {
        FeedbackRecord::new("user-1", run_id, FeedbackPayload::Text(text.to_string()))
    }

    #[test]
    fn should_join_feedback_to_matching_observation_only() {
        let run_id = RunId::new();
        let first = invocation(run_id);
        let second = invocation(run_id);
        let feedback =
            vec![text_feedback(run_id, "wrong answer").for_observation(second.observation_id)];

        let joined = join_feedback(&[first, second], &feedback);

        assert!(joined[0].feedback.is_empty());
        assert_eq!(joined[1].feedback, feedback);
    }

    #[test]
    fn should_join_run_level_feedback_to_every_call() {
        let run_id = RunId::new();
        let calls = vec![invocation(run_id), invocation(run_id), invocation(RunId::new())];
        let feedback = vec![text_feedback(run_id, "good session")];

        let joined = join_feedback(&calls, &feedback);

        assert_eq!(joined[0].feedback.len(), 1);
        assert_eq!(joined[1].feedback.len(), 1);
        assert!(joined[2].feedback.is_empty());
    }

    #[test]
    fn should_report_feedback_for_unknown_runs() {
        let known = invocation(RunId::new());
        let stray = text_feedback(RunId::new(), "who am I rating?");
        let matched = text_feedback(known.run_id, "ok");

        let orphans = orphan_feedback(&[known], &[stray.clone(), matched]);

        assert_eq!(orphans, vec![stray]);
    }

    #[test]
    fn should_split_mixed_entries() {
        let run_id = RunId::new();
        let entries = vec![
            LogEntry::Invocation(invocation(run_id)),
            LogEntry::Feedback(text_feedback(run_id, "ok")),
            LogEntry::Invocation(invocation(run_id)),
        ];

        let (invocations, feedback) = split_entries(entries);

        assert_eq!(invocations.len(), 2);
        assert_eq!(feedback.len(), 1);
    }
}
