use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use dishpatch_core::{AppError, AppResult};
use dishpatch_domain::Permission;

use crate::query_ports::ReadOperation;

/// Static description of a platform capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityDefinition {
    /// Canonical capability name used to tag results.
    pub name: &'static str,
    /// Keywords matched against resolved capability identifiers, in priority order.
    pub keywords: &'static [&'static str],
    /// Permission a role must hold to invoke the capability.
    pub required_permission: Permission,
    /// Read API path relative to the platform API base URL.
    pub endpoint: &'static str,
    /// Object field wrapping the records in the API response.
    pub envelope_field: Option<&'static str>,
    /// Short human-readable description.
    pub description: &'static str,
}

/// Generic keyword that routes to an existing capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityAlias {
    /// Keyword matched against resolved capability identifiers.
    pub keyword: &'static str,
    /// Canonical name of the capability it routes to.
    pub capability: &'static str,
}

/// One entry of the platform match table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityTableEntry {
    /// Registers a capability and its keywords.
    Capability(CapabilityDefinition),
    /// Registers an alias for an already registered capability.
    Alias(CapabilityAlias),
}

/// Admin read capabilities in match priority order.
///
/// Category-specific capabilities come before catch-all ones, and the generic
/// `partner` alias comes after both partner-typed capabilities.
pub const PLATFORM_CAPABILITIES: &[CapabilityTableEntry] = &[
    CapabilityTableEntry::Capability(CapabilityDefinition {
        name: "support-tickets",
        keywords: &["support-ticket", "ticket", "complaint", "dispute"],
        required_permission: Permission::ManageSupportTickets,
        endpoint: "/admin/support/tickets",
        envelope_field: Some("tickets"),
        description: "Customer and partner support tickets",
    }),
    CapabilityTableEntry::Capability(CapabilityDefinition {
        name: "delivery-partners",
        keywords: &[
            "delivery-partner",
            "delivery partner",
            "driver",
            "rider",
            "courier",
        ],
        required_permission: Permission::ManageDeliveryPartners,
        endpoint: "/admin/delivery-partners",
        envelope_field: Some("partners"),
        description: "Delivery partner accounts and availability",
    }),
    CapabilityTableEntry::Capability(CapabilityDefinition {
        name: "restaurants",
        keywords: &["restaurant", "merchant", "menu", "kitchen"],
        required_permission: Permission::ManageRestaurants,
        endpoint: "/admin/restaurants",
        envelope_field: Some("restaurants"),
        description: "Restaurant listings and onboarding status",
    }),
    CapabilityTableEntry::Alias(CapabilityAlias {
        keyword: "partner",
        capability: "delivery-partners",
    }),
    CapabilityTableEntry::Capability(CapabilityDefinition {
        name: "analytics",
        keywords: &[
            "analytic",
            "revenue",
            "metric",
            "statistic",
            "report",
            "dashboard",
        ],
        required_permission: Permission::ViewAnalytics,
        endpoint: "/admin/analytics/overview",
        envelope_field: None,
        description: "Platform revenue and order analytics",
    }),
    CapabilityTableEntry::Capability(CapabilityDefinition {
        name: "payments",
        keywords: &["payment", "payout", "refund", "transaction", "settlement"],
        required_permission: Permission::ManagePayments,
        endpoint: "/admin/payments",
        envelope_field: Some("payments"),
        description: "Payments, refunds and partner payouts",
    }),
    CapabilityTableEntry::Capability(CapabilityDefinition {
        name: "reviews",
        keywords: &["review", "rating", "feedback"],
        required_permission: Permission::ManageReviews,
        endpoint: "/admin/reviews",
        envelope_field: Some("reviews"),
        description: "Customer reviews and ratings",
    }),
    CapabilityTableEntry::Capability(CapabilityDefinition {
        name: "customers",
        keywords: &["customer", "user", "account"],
        required_permission: Permission::ManageCustomers,
        endpoint: "/admin/customers",
        envelope_field: Some("customers"),
        description: "Customer accounts",
    }),
    CapabilityTableEntry::Capability(CapabilityDefinition {
        name: "orders",
        keywords: &["order", "deliver"],
        required_permission: Permission::ManageOrders,
        endpoint: "/admin/orders",
        envelope_field: Some("orders"),
        description: "Customer orders across all restaurants",
    }),
];

/// Registered pairing of a capability with its read operation and permission.
pub struct CapabilityBinding {
    name: String,
    keywords: Vec<String>,
    required_permission: Permission,
    envelope_field: Option<String>,
    description: String,
    operation: Arc<dyn ReadOperation>,
}

impl CapabilityBinding {
    /// Creates a binding with no keywords besides its own name.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        required_permission: Permission,
        operation: Arc<dyn ReadOperation>,
    ) -> Self {
        Self {
            name: name.into(),
            keywords: Vec::new(),
            required_permission,
            envelope_field: None,
            description: String::new(),
            operation,
        }
    }

    /// Creates a binding from a static definition.
    #[must_use]
    pub fn from_definition(
        definition: &CapabilityDefinition,
        operation: Arc<dyn ReadOperation>,
    ) -> Self {
        let binding = Self::new(definition.name, definition.required_permission, operation)
            .with_keywords(definition.keywords.iter().copied())
            .with_description(definition.description);

        match definition.envelope_field {
            Some(field) => binding.with_envelope_field(field),
            None => binding,
        }
    }

    /// Adds match keywords after the existing ones.
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    /// Sets the object field that wraps records in the read API response.
    #[must_use]
    pub fn with_envelope_field(mut self, field: impl Into<String>) -> Self {
        self.envelope_field = Some(field.into());
        self
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns the canonical capability name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the match keywords.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        self.keywords.as_slice()
    }

    /// Returns the permission required to invoke the capability.
    #[must_use]
    pub fn required_permission(&self) -> Permission {
        self.required_permission
    }

    /// Returns the response envelope field, if any.
    #[must_use]
    pub fn envelope_field(&self) -> Option<&str> {
        self.envelope_field.as_deref()
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    pub(crate) fn operation(&self) -> &Arc<dyn ReadOperation> {
        &self.operation
    }
}

impl Debug for CapabilityBinding {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CapabilityBinding")
            .field("name", &self.name)
            .field("keywords", &self.keywords)
            .field("required_permission", &self.required_permission)
            .field("envelope_field", &self.envelope_field)
            .finish_non_exhaustive()
    }
}

/// One row of the ordered match table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRoute {
    /// Lowercased keyword searched for in capability identifiers.
    pub keyword: String,
    /// Canonical capability the keyword routes to.
    pub capability: String,
}

/// Process-wide, read-only set of capability bindings.
///
/// The match table is scanned in registration order and the first keyword
/// contained in the identifier wins.
#[derive(Debug)]
pub struct CapabilityRegistry {
    bindings: Vec<Arc<CapabilityBinding>>,
    routes: Vec<(String, usize)>,
}

impl CapabilityRegistry {
    /// Starts an empty registry.
    #[must_use]
    pub fn builder() -> CapabilityRegistryBuilder {
        CapabilityRegistryBuilder::default()
    }

    /// Builds a registry from a static table, asking `operation_for` for the
    /// read operation behind each capability.
    pub fn from_table<F>(table: &[CapabilityTableEntry], mut operation_for: F) -> AppResult<Self>
    where
        F: FnMut(&CapabilityDefinition) -> AppResult<Arc<dyn ReadOperation>>,
    {
        let mut builder = Self::builder();
        for entry in table {
            builder = match entry {
                CapabilityTableEntry::Capability(definition) => builder.bind(
                    CapabilityBinding::from_definition(definition, operation_for(definition)?),
                ),
                CapabilityTableEntry::Alias(alias) => builder.alias(alias.keyword, alias.capability),
            };
        }

        builder.build()
    }

    /// Finds the binding serving a capability identifier.
    #[must_use]
    pub fn match_capability(&self, capability: &str) -> Option<Arc<CapabilityBinding>> {
        let capability = capability.trim().to_lowercase();
        if capability.is_empty() {
            return None;
        }

        self.routes
            .iter()
            .find(|(keyword, _)| capability.contains(keyword.as_str()))
            .and_then(|(_, index)| self.bindings.get(*index))
            .cloned()
    }

    /// Returns the bindings in registration order.
    #[must_use]
    pub fn bindings(&self) -> &[Arc<CapabilityBinding>] {
        self.bindings.as_slice()
    }

    /// Returns the ordered match table.
    #[must_use]
    pub fn match_routes(&self) -> Vec<MatchRoute> {
        self.routes
            .iter()
            .filter_map(|(keyword, index)| {
                self.bindings.get(*index).map(|binding| MatchRoute {
                    keyword: keyword.clone(),
                    capability: binding.name().to_owned(),
                })
            })
            .collect()
    }
}

enum PendingRoute {
    Binding(CapabilityBinding),
    Alias { keyword: String, capability: String },
}

/// Builder that fixes match priority by call order.
#[derive(Default)]
pub struct CapabilityRegistryBuilder {
    pending: Vec<PendingRoute>,
}

impl CapabilityRegistryBuilder {
    /// Registers a binding; its name and keywords are matched in this position.
    #[must_use]
    pub fn bind(mut self, binding: CapabilityBinding) -> Self {
        self.pending.push(PendingRoute::Binding(binding));
        self
    }

    /// Registers a keyword for a capability bound earlier.
    #[must_use]
    pub fn alias(mut self, keyword: impl Into<String>, capability: impl Into<String>) -> Self {
        self.pending.push(PendingRoute::Alias {
            keyword: keyword.into(),
            capability: capability.into(),
        });
        self
    }

    /// Validates and freezes the registry.
    pub fn build(self) -> AppResult<CapabilityRegistry> {
        let mut bindings: Vec<Arc<CapabilityBinding>> = Vec::new();
        let mut routes = Vec::new();
        let mut names = HashSet::new();

        for pending in self.pending {
            match pending {
                PendingRoute::Binding(binding) => {
                    let name = binding.name().trim().to_lowercase();
                    if name.is_empty() {
                        return Err(AppError::Validation(
                            "capability name must not be empty".to_owned(),
                        ));
                    }
                    if !names.insert(name.clone()) {
                        return Err(AppError::Validation(format!(
                            "capability '{name}' is registered more than once"
                        )));
                    }

                    let index = bindings.len();
                    routes.push((name, index));
                    for keyword in binding.keywords() {
                        push_route(&mut routes, keyword, index)?;
                    }
                    bindings.push(Arc::new(binding));
                }
                PendingRoute::Alias {
                    keyword,
                    capability,
                } => {
                    let index = bindings
                        .iter()
                        .position(|binding| binding.name().eq_ignore_ascii_case(capability.trim()))
                        .ok_or_else(|| {
                            AppError::Validation(format!(
                                "alias '{keyword}' refers to unregistered capability '{capability}'"
                            ))
                        })?;
                    push_route(&mut routes, keyword.as_str(), index)?;
                }
            }
        }

        Ok(CapabilityRegistry { bindings, routes })
    }
}

fn push_route(routes: &mut Vec<(String, usize)>, keyword: &str, index: usize) -> AppResult<()> {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return Err(AppError::Validation(
            "capability keyword must not be empty".to_owned(),
        ));
    }

    routes.push((keyword, index));
    Ok(())
}
