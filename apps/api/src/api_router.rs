mod cors;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use dishpatch_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

use self::cors::build_cors_layer;

pub fn build_router(app_state: AppState) -> Result<Router, AppError> {
    let cors_layer = build_cors_layer(app_state.frontend_url.as_str())?;

    let admin_routes = Router::new()
        .route(
            "/api/admin/query",
            get(handlers::admin_query::query_session_handler)
                .post(handlers::admin_query::submit_query_handler)
                .delete(handlers::admin_query::clear_query_handler),
        )
        .route(
            "/api/admin/capabilities",
            get(handlers::admin_query::list_capabilities_handler),
        )
        .route(
            "/api/admin/me",
            get(handlers::admin_query::admin_identity_handler),
        )
        .route_layer(from_fn(middleware::require_admin_identity));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(admin_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state))
}
