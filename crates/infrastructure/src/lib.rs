//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod fixture_read_operation;
mod http_intent_resolver;
mod http_read_operation;

pub use fixture_read_operation::FixtureReadOperation;
pub use http_intent_resolver::HttpIntentResolver;
pub use http_read_operation::HttpReadOperation;
