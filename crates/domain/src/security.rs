use std::fmt::{Display, Formatter};
use std::str::FromStr;

use dishpatch_core::AppError;
use serde::{Deserialize, Serialize};

/// Identity classes assigned to platform administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Unrestricted platform operator.
    SuperAdmin,
    /// Day-to-day platform administrator.
    Admin,
    /// Customer support agent.
    Support,
    /// Content and listing moderator.
    Moderator,
}

impl Role {
    /// Returns a stable transport value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Support => "support",
            Self::Moderator => "moderator",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[Role::SuperAdmin, Role::Admin, Role::Support, Role::Moderator];

        ALL
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "support" => Ok(Self::Support),
            "moderator" => Ok(Self::Moderator),
            _ => Err(AppError::Validation(format!("unknown role value '{value}'"))),
        }
    }
}

/// Permissions enforced before an admin query reaches a read API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows inspecting customer orders.
    ManageOrders,
    /// Allows inspecting restaurant listings.
    ManageRestaurants,
    /// Allows inspecting delivery partner accounts.
    ManageDeliveryPartners,
    /// Allows inspecting customer accounts.
    ManageCustomers,
    /// Allows inspecting support tickets.
    ManageSupportTickets,
    /// Allows inspecting reviews and ratings.
    ManageReviews,
    /// Allows inspecting payments, refunds and payouts.
    ManagePayments,
    /// Allows reading platform analytics.
    ViewAnalytics,
    /// Allows managing administrator accounts.
    ManageAdmins,
    /// Allows managing platform settings.
    ManageSettings,
}

impl Permission {
    /// Returns a stable transport value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManageOrders => "manage_orders",
            Self::ManageRestaurants => "manage_restaurants",
            Self::ManageDeliveryPartners => "manage_delivery_partners",
            Self::ManageCustomers => "manage_customers",
            Self::ManageSupportTickets => "manage_support_tickets",
            Self::ManageReviews => "manage_reviews",
            Self::ManagePayments => "manage_payments",
            Self::ViewAnalytics => "view_analytics",
            Self::ManageAdmins => "manage_admins",
            Self::ManageSettings => "manage_settings",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::ManageOrders,
            Permission::ManageRestaurants,
            Permission::ManageDeliveryPartners,
            Permission::ManageCustomers,
            Permission::ManageSupportTickets,
            Permission::ManageReviews,
            Permission::ManagePayments,
            Permission::ViewAnalytics,
            Permission::ManageAdmins,
            Permission::ManageSettings,
        ];

        ALL
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

/// Caller identity handed over by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    subject: String,
    role: Option<Role>,
}

impl AdminIdentity {
    /// Creates an identity for a subject with an optional role.
    #[must_use]
    pub fn new(subject: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }

    /// Returns the stable subject claim.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the assigned role, absent for unauthenticated callers.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role
    }
}
