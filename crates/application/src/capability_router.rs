use std::time::{Duration, Instant};

use dishpatch_domain::{QueryError, QueryErrorKind};
use serde_json::Value;
use tracing::{debug, warn};

use crate::authorization_gate::AuthorizedIntent;

/// Payload returned by a routed read operation, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    /// Canonical capability that produced the payload.
    pub capability: String,
    /// Object field wrapping the records, if the binding declares one.
    pub envelope_field: Option<String>,
    /// Payload exactly as the read operation returned it.
    pub payload: Value,
}

/// Invokes the read operation bound to an authorized intent.
#[derive(Debug, Clone)]
pub struct CapabilityRouter {
    operation_timeout: Duration,
}

impl CapabilityRouter {
    /// Creates a router that abandons read operations after `operation_timeout`.
    #[must_use]
    pub fn new(operation_timeout: Duration) -> Self {
        Self { operation_timeout }
    }

    /// Invokes exactly one read operation with the intent parameters forwarded verbatim.
    pub async fn route(&self, authorized: AuthorizedIntent) -> Result<RawResult, QueryError> {
        let binding = authorized.binding();
        let capability = binding.name().to_owned();
        let started_at = Instant::now();

        let fetched = tokio::time::timeout(
            self.operation_timeout,
            binding.operation().fetch(authorized.intent().parameters()),
        )
        .await;

        let payload = match fetched {
            Ok(Ok(payload)) => payload,
            Ok(Err(error)) => {
                warn!(
                    capability = %capability,
                    kind = QueryErrorKind::UpstreamUnavailable.as_str(),
                    error = %error,
                    "read operation failed"
                );
                return Err(QueryError::UpstreamUnavailable {
                    capability,
                    detail: error.to_string(),
                });
            }
            Err(_) => {
                warn!(
                    capability = %capability,
                    kind = QueryErrorKind::UpstreamUnavailable.as_str(),
                    timeout_ms = self.operation_timeout.as_millis(),
                    "read operation timed out"
                );
                return Err(QueryError::UpstreamUnavailable {
                    capability,
                    detail: format!(
                        "no response within {} ms",
                        self.operation_timeout.as_millis()
                    ),
                });
            }
        };

        debug!(
            capability = %capability,
            elapsed_ms = started_at.elapsed().as_millis(),
            "read operation completed"
        );

        Ok(RawResult {
            envelope_field: binding.envelope_field().map(ToOwned::to_owned),
            capability,
            payload,
        })
    }
}

impl Default for CapabilityRouter {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}
