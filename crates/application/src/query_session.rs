use std::sync::Arc;

use dishpatch_domain::{QueryError, QueryErrorKind, QueryResult, Role};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::admin_query_service::AdminQueryService;


/// Whether a session is waiting on a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No submission in flight.
    Idle,
    /// The latest submission has not completed yet.
    Pending,
}

/// User-facing failure remembered until it is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryFailure {
    /// Failure classification.
    pub kind: QueryErrorKind,
    /// Message shown to the caller.
    pub message: String,
}

impl From<&QueryError> for QueryFailure {
    fn from(value: &QueryError) -> Self {
        Self {
            kind: value.kind(),
            message: value.user_message(),
        }
    }
}

/// What happened to one submission's completion.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// The result became the session's current result.
    Applied(QueryResult),
    /// A newer submission or a clear started first; the completion was dropped.
    Superseded,
}

/// Point-in-time copy of a session's state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Current status.
    pub status: SessionStatus,
    /// Sequence number of the latest submission.
    pub sequence: u64,
    /// Text of the latest submission.
    pub last_submitted: Option<String>,
    /// Current result; may answer an older submission while pending.
    pub result: Option<QueryResult>,
    /// Failure of the latest completed submission, not yet taken.
    pub error: Option<QueryFailure>,
}

#[derive(Debug)]
struct SessionState {
    status: SessionStatus,
    sequence: u64,
    last_submitted: Option<String>,
    result: Option<QueryResult>,
    error: Option<QueryFailure>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Idle,
            sequence: 0,
            last_submitted: None,
            result: None,
            error: None,
        }
    }
}

/// Per-caller query state with last-submission-wins semantics.
///
/// Each submission takes the next sequence number. A completion is stored only
/// if its number is still the latest one, so a slow earlier submission never
/// overwrites a newer answer. The lock is never held across an await.
pub struct QuerySession {
    service: Arc<AdminQueryService>,
    state: Arc<RwLock<SessionState>>,
}

impl QuerySession {
    /// Creates an idle session with no result.
    #[must_use]
    pub fn new(service: Arc<AdminQueryService>) -> Self {
        Self {
            service,
            state: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    /// Submits query text on behalf of a role.
    ///
    /// A failure of the latest submission is returned and remembered for
    /// display; failures and results of superseded submissions are dropped.
    ///
    /// The query runs on its own task, so dropping the returned future does
    /// not strand the session in `Pending`: the submission still completes
    /// and its result or failure is stored.
    pub async fn submit(
        &self,
        role: Option<Role>,
        text: &str,
    ) -> Result<SubmissionOutcome, QueryError> {
        let sequence = self.begin(text).await;

        let service = self.service.clone();
        let state = self.state.clone();
        let text = text.to_owned();
        let task = tokio::spawn(async move {
            let outcome = service.submit_query(role, text.as_str()).await;
            complete(&state, sequence, outcome).await
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                warn!(sequence, error = %join_error, "query task failed");
                let error = QueryError::ResolverUnavailable(format!(
                    "query task ended before completing: {join_error}"
                ));
                complete(&self.state, sequence, Err(error)).await
            }
        }
    }

    /// Resets to idle with no result, no remembered text and no error.
    ///
    /// Submissions still in flight are discarded when they complete.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        let sequence = state.sequence.saturating_add(1);
        *state = SessionState {
            sequence,
            ..SessionState::default()
        };
        debug!(sequence, "query session cleared");
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            status: state.status,
            sequence: state.sequence,
            last_submitted: state.last_submitted.clone(),
            result: state.result.clone(),
            error: state.error.clone(),
        }
    }

    /// Returns and forgets the pending user-facing error.
    pub async fn take_error(&self) -> Option<QueryFailure> {
        self.state.write().await.error.take()
    }

    async fn begin(&self, text: &str) -> u64 {
        let mut state = self.state.write().await;
        state.sequence = state.sequence.saturating_add(1);
        state.status = SessionStatus::Pending;
        state.last_submitted = Some(text.trim().to_owned());
        state.error = None;
        state.sequence
    }
}

/// Stores a completion if its submission is still the latest one.
async fn complete(
    state: &RwLock<SessionState>,
    sequence: u64,
    outcome: Result<QueryResult, QueryError>,
) -> Result<SubmissionOutcome, QueryError> {
    let mut state = state.write().await;
    if state.sequence != sequence {
        debug!(
            sequence,
            current_sequence = state.sequence,
            succeeded = outcome.is_ok(),
            "dropping superseded query completion"
        );
        return Ok(SubmissionOutcome::Superseded);
    }

    state.status = SessionStatus::Idle;
    match outcome {
        Ok(result) => {
            state.result = Some(result.clone());
            Ok(SubmissionOutcome::Applied(result))
        }
        Err(error) => {
            debug!(
                sequence,
                kind = error.kind().as_str(),
                "query session remembered failure"
            );
            state.error = Some(QueryFailure::from(&error));
            Err(error)
        }
    }
}
