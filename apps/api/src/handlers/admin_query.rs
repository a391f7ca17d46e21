use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use dishpatch_domain::AdminIdentity;
use tracing::debug;

use crate::dto::{
    AdminIdentityResponse, AdminQueryRequest, CapabilityResponse, QuerySessionResponse,
    SubmitQueryResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn submit_query_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Json(payload): Json<AdminQueryRequest>,
) -> ApiResult<Json<SubmitQueryResponse>> {
    let session = state.session_for(identity.subject()).await;
    let outcome = session
        .submit(identity.role(), payload.text.as_str())
        .await?;

    Ok(Json(SubmitQueryResponse::from(outcome)))
}

pub async fn query_session_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
) -> Json<QuerySessionResponse> {
    let session = state.session_for(identity.subject()).await;
    let error = session.take_error().await;
    let snapshot = session.snapshot().await;

    Json(QuerySessionResponse::from_snapshot(snapshot, error))
}

pub async fn clear_query_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
) -> StatusCode {
    state.remove_session(identity.subject()).await;
    debug!(subject = identity.subject(), "admin query session removed");

    StatusCode::NO_CONTENT
}

pub async fn list_capabilities_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
) -> Json<Vec<CapabilityResponse>> {
    let capabilities = state
        .query_service
        .gate()
        .allowed_capabilities(identity.role())
        .into_iter()
        .map(CapabilityResponse::from)
        .collect();

    Json(capabilities)
}

pub async fn admin_identity_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
) -> Json<AdminIdentityResponse> {
    let permissions = state
        .permissions
        .permissions_of(identity.role())
        .into_iter()
        .map(|permission| permission.as_str().to_owned())
        .collect();

    Json(AdminIdentityResponse::from_identity(&identity, permissions))
}
