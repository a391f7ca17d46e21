use std::sync::Arc;

use dishpatch_domain::{Permission, PermissionTable, QueryError, ResolvedIntent, Role};

use crate::capability_registry::{CapabilityBinding, CapabilityRegistry};

/// Reason the gate refused a capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// No binding serves the capability identifier.
    UnknownCapability {
        /// Identifier reported by the resolver.
        capability: String,
    },
    /// The role lacks the permission bound to the capability.
    InsufficientPermission {
        /// Canonical capability name.
        capability: String,
        /// Permission the role is missing.
        required: Permission,
    },
}

impl DenialReason {
    /// Returns the diagnostic label for the denial.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownCapability { .. } => "unknown capability",
            Self::InsufficientPermission { .. } => "insufficient permission",
        }
    }
}

impl From<DenialReason> for QueryError {
    fn from(value: DenialReason) -> Self {
        match value {
            DenialReason::UnknownCapability { capability } => Self::Unroutable { capability },
            DenialReason::InsufficientPermission {
                capability,
                required,
            } => Self::Unauthorized {
                capability,
                required,
            },
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone)]
pub enum AuthorizationDecision {
    /// The role may invoke the bound capability.
    Allowed(Arc<CapabilityBinding>),
    /// The capability is refused.
    Denied(DenialReason),
}

/// Intent that passed the gate for one role.
///
/// Only [`AuthorizationGate::admit`] constructs this value, and the router
/// accepts nothing else.
#[derive(Debug, Clone)]
pub struct AuthorizedIntent {
    binding: Arc<CapabilityBinding>,
    intent: ResolvedIntent,
}

impl AuthorizedIntent {
    /// Returns the binding selected for the intent.
    #[must_use]
    pub fn binding(&self) -> &CapabilityBinding {
        self.binding.as_ref()
    }

    /// Returns the resolved intent.
    #[must_use]
    pub fn intent(&self) -> &ResolvedIntent {
        &self.intent
    }
}

/// Pure role check performed before any read operation is invoked.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    permissions: Arc<PermissionTable>,
    registry: Arc<CapabilityRegistry>,
}

impl AuthorizationGate {
    /// Creates a gate over a permission policy and the shared binding set.
    #[must_use]
    pub fn new(permissions: Arc<PermissionTable>, registry: Arc<CapabilityRegistry>) -> Self {
        Self {
            permissions,
            registry,
        }
    }

    /// Decides whether the role may invoke the capability.
    #[must_use]
    pub fn authorize(&self, role: Option<Role>, capability: &str) -> AuthorizationDecision {
        let Some(binding) = self.registry.match_capability(capability) else {
            return AuthorizationDecision::Denied(DenialReason::UnknownCapability {
                capability: capability.to_owned(),
            });
        };

        if self
            .permissions
            .has_permission(role, binding.required_permission())
        {
            AuthorizationDecision::Allowed(binding)
        } else {
            AuthorizationDecision::Denied(DenialReason::InsufficientPermission {
                capability: binding.name().to_owned(),
                required: binding.required_permission(),
            })
        }
    }

    /// Checks a resolved intent and wraps it for routing when allowed.
    pub fn admit(
        &self,
        role: Option<Role>,
        intent: ResolvedIntent,
    ) -> Result<AuthorizedIntent, DenialReason> {
        match self.authorize(role, intent.capability()) {
            AuthorizationDecision::Allowed(binding) => Ok(AuthorizedIntent { binding, intent }),
            AuthorizationDecision::Denied(reason) => Err(reason),
        }
    }

    /// Lists the bindings a role may invoke, in match priority order.
    #[must_use]
    pub fn allowed_capabilities(&self, role: Option<Role>) -> Vec<Arc<CapabilityBinding>> {
        self.registry
            .bindings()
            .iter()
            .filter(|binding| {
                self.permissions
                    .has_permission(role, binding.required_permission())
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use dishpatch_core::AppResult;
    use dishpatch_domain::{
        IntentParameters, Permission, PermissionTable, QueryError, ResolvedIntent, Role,
    };
    use serde_json::{Map, Value};

    use super::{AuthorizationDecision, AuthorizationGate, DenialReason};
    use crate::capability_registry::{CapabilityRegistry, PLATFORM_CAPABILITIES};
    use crate::query_ports::ReadOperation;

    struct NullReadOperation;

    #[async_trait]
    impl ReadOperation for NullReadOperation {
        async fn fetch(&self, _parameters: &IntentParameters) -> AppResult<Value> {
            Ok(Value::Null)
        }
    }

    fn platform_gate() -> AppResult<AuthorizationGate> {
        let registry = CapabilityRegistry::from_table(PLATFORM_CAPABILITIES, |_| {
            Ok(Arc::new(NullReadOperation) as Arc<dyn ReadOperation>)
        })?;
        Ok(AuthorizationGate::new(
            Arc::new(PermissionTable::platform_default()),
            Arc::new(registry),
        ))
    }

    fn all_roles() -> Vec<Option<Role>> {
        std::iter::once(None)
            .chain(Role::all().iter().copied().map(Some))
            .collect()
    }

    #[test]
    fn unknown_capability_is_denied_for_every_role() -> AppResult<()> {
        let gate = platform_gate()?;
        for role in all_roles() {
            let decision = gate.authorize(role, "weather-forecast");
            assert!(matches!(
                decision,
                AuthorizationDecision::Denied(DenialReason::UnknownCapability { ref capability })
                    if capability == "weather-forecast"
            ));
        }
        Ok(())
    }

    #[test]
    fn role_with_permission_is_allowed() -> AppResult<()> {
        let gate = platform_gate()?;
        let decision = gate.authorize(Some(Role::Support), "orders");
        assert!(matches!(
            decision,
            AuthorizationDecision::Allowed(ref binding) if binding.name() == "orders"
        ));
        Ok(())
    }

    #[test]
    fn role_without_permission_is_denied() -> AppResult<()> {
        let gate = platform_gate()?;
        let decision = gate.authorize(Some(Role::Moderator), "orders");
        assert!(matches!(
            decision,
            AuthorizationDecision::Denied(DenialReason::InsufficientPermission {
                required: Permission::ManageOrders,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn absent_role_is_denied_known_capabilities() -> AppResult<()> {
        let gate = platform_gate()?;
        let decision = gate.authorize(None, "support-tickets");
        assert!(matches!(
            decision,
            AuthorizationDecision::Denied(ref reason) if reason.as_str() == "insufficient permission"
        ));
        Ok(())
    }

    #[test]
    fn denial_reasons_map_to_distinct_query_errors() {
        let unknown: QueryError = DenialReason::UnknownCapability {
            capability: "weather".to_owned(),
        }
        .into();
        let insufficient: QueryError = DenialReason::InsufficientPermission {
            capability: "orders".to_owned(),
            required: Permission::ManageOrders,
        }
        .into();

        assert!(matches!(unknown, QueryError::Unroutable { .. }));
        assert!(matches!(insufficient, QueryError::Unauthorized { .. }));
    }

    #[test]
    fn admit_wraps_allowed_intent() -> AppResult<()> {
        let gate = platform_gate()?;
        let intent = ResolvedIntent::new("open tickets", Map::new())?;
        let admitted = gate.admit(Some(Role::Support), intent);
        assert!(matches!(
            admitted,
            Ok(ref authorized) if authorized.binding().name() == "support-tickets"
                && authorized.intent().capability() == "open tickets"
        ));
        Ok(())
    }

    #[test]
    fn allowed_capabilities_follow_policy() -> AppResult<()> {
        let gate = platform_gate()?;
        let names: Vec<String> = gate
            .allowed_capabilities(Some(Role::Support))
            .iter()
            .map(|binding| binding.name().to_owned())
            .collect();
        assert_eq!(names, vec!["support-tickets", "customers", "orders"]);
        assert!(gate.allowed_capabilities(None).is_empty());
        assert_eq!(
            gate.allowed_capabilities(Some(Role::SuperAdmin)).len(),
            gate.allowed_capabilities(Some(Role::Admin)).len()
        );
        Ok(())
    }
}
