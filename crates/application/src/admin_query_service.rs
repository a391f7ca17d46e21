use std::sync::Arc;
use std::time::Duration;

use dishpatch_domain::{QueryError, QueryResult, ResolvedIntent, Role};
use tracing::{debug, info, warn};

use crate::authorization_gate::AuthorizationGate;
use crate::capability_router::CapabilityRouter;
use crate::query_ports::{IntentResolver, ResolverError};
use crate::result_normalizer::normalize_result;


/// Application service running one admin query end to end.
///
/// Text is resolved to an intent, checked by the gate, routed to one read
/// operation and normalized. It keeps no state between calls.
#[derive(Clone)]
pub struct AdminQueryService {
    resolver: Arc<dyn IntentResolver>,
    gate: AuthorizationGate,
    router: CapabilityRouter,
    resolver_timeout: Duration,
}

impl AdminQueryService {
    /// Creates a query service from its collaborators.
    #[must_use]
    pub fn new(
        resolver: Arc<dyn IntentResolver>,
        gate: AuthorizationGate,
        router: CapabilityRouter,
    ) -> Self {
        Self {
            resolver,
            gate,
            router,
            resolver_timeout: Duration::from_secs(10),
        }
    }

    /// Overrides how long a resolver call may take before it counts as unavailable.
    #[must_use]
    pub fn with_resolver_timeout(mut self, resolver_timeout: Duration) -> Self {
        self.resolver_timeout = resolver_timeout;
        self
    }

    /// Returns the authorization gate shared with callers that list capabilities.
    #[must_use]
    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    /// Runs one query for a role.
    ///
    /// Blank text yields an empty result without calling the resolver.
    pub async fn submit_query(
        &self,
        role: Option<Role>,
        text: &str,
    ) -> Result<QueryResult, QueryError> {
        let text = text.trim();
        if text.is_empty() {
            debug!("blank admin query ignored");
            return Ok(QueryResult::empty(text));
        }

        let role_label = role.map(|role| role.as_str()).unwrap_or("anonymous");
        let intent = self.resolve(text).await?;
        debug!(
            role = role_label,
            capability = intent.capability(),
            parameter_count = intent.parameters().len(),
            "admin query resolved"
        );

        let authorized = self.gate.admit(role, intent).map_err(|reason| {
            let error = QueryError::from(reason);
            warn!(
                role = role_label,
                kind = error.kind().as_str(),
                error = %error,
                "admin query denied by authorization gate"
            );
            error
        })?;

        let raw = self.router.route(authorized).await?;
        let capability = raw.capability.clone();
        let records = normalize_result(raw);

        info!(
            role = role_label,
            capability = %capability,
            record_count = records.len(),
            "admin query answered"
        );

        Ok(QueryResult::answered(text, capability, records))
    }

    async fn resolve(&self, text: &str) -> Result<ResolvedIntent, QueryError> {
        let resolved = tokio::time::timeout(self.resolver_timeout, self.resolver.resolve(text))
            .await
            .unwrap_or_else(|_| {
                Err(ResolverError::Unavailable(format!(
                    "no response within {} ms",
                    self.resolver_timeout.as_millis()
                )))
            });

        resolved.map_err(|error| {
            let error = match error {
                ResolverError::Unavailable(detail) => QueryError::ResolverUnavailable(detail),
                ResolverError::Ambiguous(detail) => QueryError::ResolverAmbiguous(detail),
            };
            warn!(kind = error.kind().as_str(), error = %error, "intent resolution failed");
            error
        })
    }
}
