use std::sync::Arc;
use std::time::Duration;

use dishpatch_application::{
    AdminQueryService, AuthorizationGate, CapabilityRegistry, CapabilityRouter, IntentResolver,
    PLATFORM_CAPABILITIES, ReadOperation,
};
use dishpatch_core::{AppError, AppResult};
use dishpatch_domain::PermissionTable;
use dishpatch_infrastructure::{FixtureReadOperation, HttpIntentResolver, HttpReadOperation};
use tracing::info;

use crate::api_config::{ApiConfig, ReadOperationsConfig};
use crate::state::AppState;

pub fn build_app_state(config: &ApiConfig) -> AppResult<AppState> {
    let http_client = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let resolver: Arc<dyn IntentResolver> = Arc::new(
        HttpIntentResolver::new(
            http_client.clone(),
            &config.intent_resolver_url,
            config.intent_resolver_api_key.clone(),
            config.intent_min_confidence,
        )
        .map_err(|error| {
            AppError::Validation(format!("invalid INTENT_RESOLVER_URL: {error}"))
        })?,
    );
    let registry = build_capability_registry(&config.read_operations, &http_client)?;
    let permissions = Arc::new(PermissionTable::platform_default());
    let query_service = build_query_service(
        resolver,
        permissions.clone(),
        registry,
        config.upstream_timeout,
    );

    Ok(AppState::new(
        Arc::new(query_service),
        permissions,
        config.session_idle_timeout,
        config.frontend_url.clone(),
    ))
}

pub fn build_capability_registry(
    read_operations: &ReadOperationsConfig,
    http_client: &reqwest::Client,
) -> AppResult<Arc<CapabilityRegistry>> {
    let registry = CapabilityRegistry::from_table(PLATFORM_CAPABILITIES, |definition| {
        let operation: Arc<dyn ReadOperation> = match read_operations {
            ReadOperationsConfig::Http {
                base_url,
                service_token,
            } => Arc::new(HttpReadOperation::new(
                http_client.clone(),
                base_url,
                definition.endpoint,
                service_token.clone(),
            )?),
            ReadOperationsConfig::Fixture => Arc::new(FixtureReadOperation::seeded(definition)),
        };
        Ok(operation)
    })?;

    info!(
        capabilities = registry.bindings().len(),
        routes = registry.match_routes().len(),
        fixture = matches!(read_operations, ReadOperationsConfig::Fixture),
        "capability registry built"
    );

    Ok(Arc::new(registry))
}

pub fn build_query_service(
    resolver: Arc<dyn IntentResolver>,
    permissions: Arc<PermissionTable>,
    registry: Arc<CapabilityRegistry>,
    upstream_timeout: Duration,
) -> AdminQueryService {
    AdminQueryService::new(
        resolver,
        AuthorizationGate::new(permissions, registry),
        CapabilityRouter::new(upstream_timeout),
    )
    .with_resolver_timeout(upstream_timeout)
}
