use std::sync::Arc;

use dishpatch_application::{
    CapabilityBinding, QueryFailure, SessionSnapshot, SessionStatus, SubmissionOutcome,
};
use dishpatch_domain::{AdminIdentity, QueryResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming natural-language admin query.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/admin-query-request.ts"
)]
pub struct AdminQueryRequest {
    pub text: String,
}

/// API representation of a normalized query result.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/query-result-response.ts"
)]
pub struct QueryResultResponse {
    pub query_id: String,
    pub query_text: String,
    pub capability: Option<String>,
    #[ts(type = "Array<unknown>")]
    pub records: Vec<Value>,
    pub completed_at: String,
}

impl From<QueryResult> for QueryResultResponse {
    fn from(value: QueryResult) -> Self {
        Self {
            query_id: value.query_id().to_string(),
            query_text: value.query_text().to_owned(),
            capability: value.capability().map(ToOwned::to_owned),
            records: value.records().to_vec(),
            completed_at: value.completed_at().to_rfc3339(),
        }
    }
}

/// Outcome of one submission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/submit-query-response.ts"
)]
pub struct SubmitQueryResponse {
    /// `applied` or `superseded`.
    pub outcome: String,
    pub result: Option<QueryResultResponse>,
}

impl From<SubmissionOutcome> for SubmitQueryResponse {
    fn from(value: SubmissionOutcome) -> Self {
        match value {
            SubmissionOutcome::Applied(result) => Self {
                outcome: "applied".to_owned(),
                result: Some(QueryResultResponse::from(result)),
            },
            SubmissionOutcome::Superseded => Self {
                outcome: "superseded".to_owned(),
                result: None,
            },
        }
    }
}

/// User-facing failure of the latest submission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/query-failure-response.ts"
)]
pub struct QueryFailureResponse {
    pub kind: String,
    pub message: String,
}

impl From<QueryFailure> for QueryFailureResponse {
    fn from(value: QueryFailure) -> Self {
        Self {
            kind: value.kind.as_str().to_owned(),
            message: value.message,
        }
    }
}

/// API representation of the caller's query session.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/query-session-response.ts"
)]
pub struct QuerySessionResponse {
    /// `idle` or `pending`.
    pub status: String,
    #[ts(type = "number")]
    pub sequence: u64,
    pub last_submitted: Option<String>,
    pub result: Option<QueryResultResponse>,
    pub error: Option<QueryFailureResponse>,
}

impl QuerySessionResponse {
    /// Builds the response from a snapshot and the error taken for display.
    #[must_use]
    pub fn from_snapshot(snapshot: SessionSnapshot, error: Option<QueryFailure>) -> Self {
        let status = match snapshot.status {
            SessionStatus::Idle => "idle",
            SessionStatus::Pending => "pending",
        };

        Self {
            status: status.to_owned(),
            sequence: snapshot.sequence,
            last_submitted: snapshot.last_submitted,
            result: snapshot.result.map(QueryResultResponse::from),
            error: error.or(snapshot.error).map(QueryFailureResponse::from),
        }
    }
}

/// Capability the caller's role may query.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/capability-response.ts"
)]
pub struct CapabilityResponse {
    pub name: String,
    pub description: String,
    pub required_permission: String,
    pub keywords: Vec<String>,
}

impl From<Arc<CapabilityBinding>> for CapabilityResponse {
    fn from(value: Arc<CapabilityBinding>) -> Self {
        Self {
            name: value.name().to_owned(),
            description: value.description().to_owned(),
            required_permission: value.required_permission().as_str().to_owned(),
            keywords: value.keywords().to_vec(),
        }
    }
}

/// API representation of the forwarded admin identity.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/admin-identity-response.ts"
)]
pub struct AdminIdentityResponse {
    pub subject: String,
    pub role: Option<String>,
    pub permissions: Vec<String>,
}

impl AdminIdentityResponse {
    /// Creates a response from the identity and the permissions its role holds.
    #[must_use]
    pub fn from_identity(identity: &AdminIdentity, permissions: Vec<String>) -> Self {
        Self {
            subject: identity.subject().to_owned(),
            role: identity.role().map(|role| role.as_str().to_owned()),
            permissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use dishpatch_application::{SessionSnapshot, SessionStatus, SubmissionOutcome};
    use dishpatch_domain::QueryResult;
    use serde_json::json;

    use super::{
        AdminIdentityResponse, AdminQueryRequest, CapabilityResponse, HealthResponse,
        QueryFailureResponse, QueryResultResponse, QuerySessionResponse, SubmitQueryResponse,
    };

    use crate::error::ErrorResponse;
    use ts_rs::Config;
    use ts_rs::TS;

    #[test]
    fn export_ts_bindings() -> Result<(), ts_rs::ExportError> {
        let config = Config::default();

        AdminQueryRequest::export(&config)?;
        AdminIdentityResponse::export(&config)?;
        CapabilityResponse::export(&config)?;
        ErrorResponse::export(&config)?;
        HealthResponse::export(&config)?;
        QueryFailureResponse::export(&config)?;
        QueryResultResponse::export(&config)?;
        QuerySessionResponse::export(&config)?;
        SubmitQueryResponse::export(&config)?;

        Ok(())
    }

    #[test]
    fn superseded_submission_has_no_result() {
        let response = SubmitQueryResponse::from(SubmissionOutcome::Superseded);

        assert_eq!(response.outcome, "superseded");
        assert!(response.result.is_none());
    }

    #[test]
    fn pending_snapshot_keeps_previous_result_tagged_with_its_text() {
        let previous = QueryResult::answered("pending orders", "orders", vec![json!({"id": 1})]);
        let snapshot = SessionSnapshot {
            status: SessionStatus::Pending,
            sequence: 2,
            last_submitted: Some("open tickets".to_owned()),
            result: Some(previous),
            error: None,
        };

        let response = QuerySessionResponse::from_snapshot(snapshot, None);

        assert_eq!(response.status, "pending");
        assert_eq!(response.last_submitted.as_deref(), Some("open tickets"));
        assert!(matches!(
            response.result,
            Some(ref result) if result.query_text == "pending orders" && result.records.len() == 1
        ));
    }
}
