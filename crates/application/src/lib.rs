//! Application services and ports for the admin query engine.

#![forbid(unsafe_code)]

mod admin_query_service;
mod authorization_gate;
mod capability_registry;
mod capability_router;
mod query_ports;
mod query_session;
mod result_normalizer;

#[cfg(test)]
mod test_fakes;

pub use admin_query_service::AdminQueryService;
pub use authorization_gate::{
    AuthorizationDecision, AuthorizationGate, AuthorizedIntent, DenialReason,
};
pub use capability_registry::{
    CapabilityAlias, CapabilityBinding, CapabilityDefinition, CapabilityRegistry,
    CapabilityRegistryBuilder, CapabilityTableEntry, MatchRoute, PLATFORM_CAPABILITIES,
};
pub use capability_router::{CapabilityRouter, RawResult};
pub use query_ports::{IntentResolver, ReadOperation, ResolverError};
pub use query_session::{
    QueryFailure, QuerySession, SessionSnapshot, SessionStatus, SubmissionOutcome,
};
pub use result_normalizer::{normalize, normalize_result, unwrap_envelope};
