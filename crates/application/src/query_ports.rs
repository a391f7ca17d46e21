use async_trait::async_trait;
use dishpatch_core::AppResult;
use dishpatch_domain::{IntentParameters, ResolvedIntent};
use serde_json::Value;
use thiserror::Error;

/// Failure reported by the external intent resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    /// Resolver could not be reached or answered with an infrastructure failure.
    #[error("resolver unavailable: {0}")]
    Unavailable(String),
    /// Resolver could not map the text to any capability with confidence.
    #[error("resolver ambiguous: {0}")]
    Ambiguous(String),
}

/// Port for the external language-understanding service.
#[async_trait]
pub trait IntentResolver: Send + Sync {
    /// Resolves non-blank query text into a structured intent.
    async fn resolve(&self, text: &str) -> Result<ResolvedIntent, ResolverError>;
}

/// Port for one read-only platform API bound to a capability.
///
/// Implementations return either a single record or a sequence of records.
#[async_trait]
pub trait ReadOperation: Send + Sync {
    /// Fetches the payload for the forwarded intent parameters.
    async fn fetch(&self, parameters: &IntentParameters) -> AppResult<Value>;
}
