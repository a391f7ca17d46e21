use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dishpatch_core::AppError;
use dishpatch_domain::{QueryError, QueryErrorKind};
use serde::Serialize;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    kind: String,
    message: String,
}

/// HTTP API error wrapper around application and query errors.
#[derive(Debug)]
pub enum ApiError {
    App(AppError),
    Query(QueryError),
}

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self::App(value)
    }
}

impl From<QueryError> for ApiError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::App(AppError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::App(AppError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::App(AppError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
            Self::App(AppError::Forbidden(_)) => StatusCode::FORBIDDEN,
            Self::App(AppError::Upstream(_)) => StatusCode::BAD_GATEWAY,
            Self::App(AppError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Query(error) => match error.kind() {
                QueryErrorKind::Unauthorized => StatusCode::FORBIDDEN,
                QueryErrorKind::Unroutable | QueryErrorKind::ResolverAmbiguous => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                QueryErrorKind::ResolverUnavailable | QueryErrorKind::UpstreamUnavailable => {
                    StatusCode::BAD_GATEWAY
                }
            },
        }
    }

    fn payload(&self) -> ErrorResponse {
        match self {
            Self::App(error) => ErrorResponse {
                kind: app_error_kind(error).to_owned(),
                message: error.to_string(),
            },
            Self::Query(error) => ErrorResponse {
                kind: error.kind().as_str().to_owned(),
                message: error.user_message(),
            },
        }
    }
}

fn app_error_kind(error: &AppError) -> &'static str {
    match error {
        AppError::Validation(_) => "validation",
        AppError::NotFound(_) => "not-found",
        AppError::Unauthorized(_) => "unauthenticated",
        AppError::Forbidden(_) => "forbidden",
        AppError::Upstream(_) => "upstream",
        AppError::Internal(_) => "internal",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.payload())).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
