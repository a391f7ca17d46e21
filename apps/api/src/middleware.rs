use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use dishpatch_core::AppError;
use dishpatch_domain::{AdminIdentity, Role};

use crate::error::ApiResult;
use crate::state::AppState;

/// Header carrying the authenticated admin subject.
pub const SUBJECT_HEADER: &str = "x-dishpatch-subject";
/// Header carrying the authenticated admin role.
pub const ROLE_HEADER: &str = "x-dishpatch-role";

pub async fn require_admin_identity(mut request: Request, next: Next) -> ApiResult<Response> {
    let identity = admin_identity_from_headers(request.headers())?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Reads the identity forwarded by the authentication proxy.
///
/// A missing role header yields an identity without a role, which every
/// capability denies.
fn admin_identity_from_headers(headers: &HeaderMap) -> Result<AdminIdentity, AppError> {
    let subject = headers
        .get(SUBJECT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let role = headers
        .get(ROLE_HEADER)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| AppError::Validation(format!("{ROLE_HEADER} must be ASCII")))
        })
        .transpose()?
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::parse::<Role>)
        .transpose()?;

    Ok(AdminIdentity::new(subject, role))
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if let Some(fetch_site) = headers.get("sec-fetch-site")
            && fetch_site == HeaderValue::from_static("cross-site")
        {
            return Err(AppError::Unauthorized("cross-site request blocked".to_owned()).into());
        }

        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let referer = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        let allowed_origin = state.frontend_url;
        let origin_is_allowed = origin.is_empty() || origin == allowed_origin;
        let referer_is_allowed = referer.is_empty() || referer.starts_with(&allowed_origin);

        if !origin_is_allowed || !referer_is_allowed {
            return Err(AppError::Unauthorized("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};
    use dishpatch_core::AppError;
    use dishpatch_domain::Role;

    use super::{ROLE_HEADER, SUBJECT_HEADER, admin_identity_from_headers};

    fn headers(entries: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in entries {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn subject_and_role_become_identity() {
        let identity = admin_identity_from_headers(&headers(&[
            (SUBJECT_HEADER, "ops-17"),
            (ROLE_HEADER, "support"),
        ]));

        assert!(matches!(
            identity,
            Ok(ref identity) if identity.subject() == "ops-17" && identity.role() == Some(Role::Support)
        ));
    }

    #[test]
    fn missing_role_is_an_identity_without_role() {
        let identity = admin_identity_from_headers(&headers(&[(SUBJECT_HEADER, "ops-17")]));
        assert!(matches!(identity, Ok(ref identity) if identity.role().is_none()));
    }

    #[test]
    fn missing_subject_is_unauthenticated() {
        assert!(matches!(
            admin_identity_from_headers(&headers(&[(ROLE_HEADER, "admin")])),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            admin_identity_from_headers(&headers(&[(SUBJECT_HEADER, "  ")])),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(matches!(
            admin_identity_from_headers(&headers(&[
                (SUBJECT_HEADER, "ops-17"),
                (ROLE_HEADER, "owner"),
            ])),
            Err(AppError::Validation(_))
        ));
    }
}
