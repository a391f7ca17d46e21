use chrono::{DateTime, Utc};
use dishpatch_core::QueryId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::security::Permission;

/// Normalized outcome of one admin query.
///
/// A result always carries the text it answered, so a stale result shown
/// while a newer query is pending is never mistaken for the newer answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    query_id: QueryId,
    query_text: String,
    capability: Option<String>,
    records: Vec<Value>,
    completed_at: DateTime<Utc>,
}

impl QueryResult {
    /// Creates a result answered by a capability.
    #[must_use]
    pub fn answered(
        query_text: impl Into<String>,
        capability: impl Into<String>,
        records: Vec<Value>,
    ) -> Self {
        Self {
            query_id: QueryId::new(),
            query_text: query_text.into(),
            capability: Some(capability.into()),
            records,
            completed_at: Utc::now(),
        }
    }

    /// Creates an empty result that no capability answered.
    #[must_use]
    pub fn empty(query_text: impl Into<String>) -> Self {
        Self {
            query_id: QueryId::new(),
            query_text: query_text.into(),
            capability: None,
            records: Vec::new(),
            completed_at: Utc::now(),
        }
    }

    /// Returns the result identifier.
    #[must_use]
    pub fn query_id(&self) -> QueryId {
        self.query_id
    }

    /// Returns the submitted text this result answers.
    #[must_use]
    pub fn query_text(&self) -> &str {
        self.query_text.as_str()
    }

    /// Returns the capability that produced the records.
    #[must_use]
    pub fn capability(&self) -> Option<&str> {
        self.capability.as_deref()
    }

    /// Returns the ordered records.
    #[must_use]
    pub fn records(&self) -> &[Value] {
        self.records.as_slice()
    }

    /// Returns when the result was completed.
    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Returns whether the result holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Stable classification of admin query failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryErrorKind {
    /// Role lacks the permission bound to the capability.
    Unauthorized,
    /// No capability binding matches the resolved intent.
    Unroutable,
    /// Intent resolver could not be reached.
    ResolverUnavailable,
    /// Intent resolver could not map the text to a capability.
    ResolverAmbiguous,
    /// Read operation behind the capability failed.
    UpstreamUnavailable,
}

impl QueryErrorKind {
    /// Returns a stable transport value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Unroutable => "unroutable",
            Self::ResolverUnavailable => "resolver-unavailable",
            Self::ResolverAmbiguous => "resolver-ambiguous",
            Self::UpstreamUnavailable => "upstream-unavailable",
        }
    }
}

/// Terminal failure of one admin query submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Authorization gate denied the capability for the role.
    #[error("capability '{capability}' requires permission '{required}'")]
    Unauthorized {
        /// Canonical capability name.
        capability: String,
        /// Permission the role is missing.
        required: Permission,
    },

    /// Resolved capability has no binding.
    #[error("no capability binding matches '{capability}'")]
    Unroutable {
        /// Capability identifier reported by the resolver.
        capability: String,
    },

    /// Intent resolver infrastructure failure.
    #[error("intent resolver unavailable: {0}")]
    ResolverUnavailable(String),

    /// Intent resolver could not interpret the text.
    #[error("intent resolver could not interpret the query: {0}")]
    ResolverAmbiguous(String),

    /// Routed read operation failed.
    #[error("read operation for '{capability}' failed: {detail}")]
    UpstreamUnavailable {
        /// Canonical capability name.
        capability: String,
        /// Failure detail from the read operation.
        detail: String,
    },
}

impl QueryError {
    /// Returns the failure classification.
    #[must_use]
    pub fn kind(&self) -> QueryErrorKind {
        match self {
            Self::Unauthorized { .. } => QueryErrorKind::Unauthorized,
            Self::Unroutable { .. } => QueryErrorKind::Unroutable,
            Self::ResolverUnavailable(_) => QueryErrorKind::ResolverUnavailable,
            Self::ResolverAmbiguous(_) => QueryErrorKind::ResolverAmbiguous,
            Self::UpstreamUnavailable { .. } => QueryErrorKind::UpstreamUnavailable,
        }
    }

    /// Returns the single message shown to the person who submitted the query.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { capability, .. } => format!(
                "You do not have access to {capability}. Contact an administrator if you need it."
            ),
            Self::Unroutable { .. } => {
                "That request does not match anything the admin assistant can look up. Try rephrasing it."
                    .to_owned()
            }
            Self::ResolverUnavailable(_) => {
                "The query assistant is unavailable right now. Please try again shortly.".to_owned()
            }
            Self::ResolverAmbiguous(_) => {
                "The query could not be understood. Try rephrasing it with more detail.".to_owned()
            }
            Self::UpstreamUnavailable { capability, .. } => {
                format!("Could not load {capability} right now. Please try again shortly.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{QueryError, QueryErrorKind, QueryResult};
    use crate::security::Permission;

    #[test]
    fn empty_result_has_no_capability() {
        let result = QueryResult::empty("   ");
        assert!(result.is_empty());
        assert_eq!(result.capability(), None);
        assert_eq!(result.query_text(), "   ");
    }

    #[test]
    fn answered_result_keeps_record_order() {
        let result = QueryResult::answered(
            "latest orders",
            "orders",
            vec![json!({"id": 2}), json!({"id": 1})],
        );
        assert_eq!(result.capability(), Some("orders"));
        assert_eq!(result.records()[0], json!({"id": 2}));
    }

    #[test]
    fn authorization_and_routing_messages_differ() {
        let unauthorized = QueryError::Unauthorized {
            capability: "orders".to_owned(),
            required: Permission::ManageOrders,
        };
        let unroutable = QueryError::Unroutable {
            capability: "weather".to_owned(),
        };

        assert_eq!(unauthorized.kind(), QueryErrorKind::Unauthorized);
        assert_eq!(unroutable.kind(), QueryErrorKind::Unroutable);
        assert!(unauthorized.user_message().contains("administrator"));
        assert!(unroutable.user_message().contains("rephrasing"));
    }

    #[test]
    fn kinds_serialize_as_kebab_case() {
        let serialized = serde_json::to_string(&QueryErrorKind::ResolverAmbiguous);
        assert!(matches!(serialized.as_deref(), Ok("\"resolver-ambiguous\"")));
        assert_eq!(
            QueryErrorKind::UpstreamUnavailable.as_str(),
            "upstream-unavailable"
        );
    }
}
