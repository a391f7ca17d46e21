//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod intent;
mod permission_table;
mod query;
mod security;

pub use intent::{IntentParameters, ResolvedIntent};
pub use permission_table::{PermissionTable, PermissionTableBuilder};
pub use query::{QueryError, QueryErrorKind, QueryResult};
pub use security::{AdminIdentity, Permission, Role};
