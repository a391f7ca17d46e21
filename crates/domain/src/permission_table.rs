use std::collections::{BTreeMap, BTreeSet};

use crate::security::{Permission, Role};

/// Immutable role to permission policy.
///
/// Every known role has an entry, possibly empty. An absent role resolves to
/// no permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTable {
    grants: BTreeMap<Role, BTreeSet<Permission>>,
}

impl PermissionTable {
    /// Starts a table in which every role holds no permissions.
    #[must_use]
    pub fn builder() -> PermissionTableBuilder {
        PermissionTableBuilder {
            grants: Role::all()
                .iter()
                .map(|role| (*role, BTreeSet::new()))
                .collect(),
        }
    }

    /// Returns the platform's default admin policy.
    #[must_use]
    pub fn platform_default() -> Self {
        let admin_permissions = Permission::all().iter().copied().filter(|permission| {
            !matches!(
                permission,
                Permission::ManageAdmins | Permission::ManageSettings
            )
        });

        Self::builder()
            .grant(Role::SuperAdmin, Permission::all().iter().copied())
            .grant(Role::Admin, admin_permissions)
            .grant(
                Role::Support,
                [
                    Permission::ManageOrders,
                    Permission::ManageSupportTickets,
                    Permission::ManageCustomers,
                ],
            )
            .grant(
                Role::Moderator,
                [
                    Permission::ManageReviews,
                    Permission::ManageSupportTickets,
                    Permission::ManageRestaurants,
                ],
            )
            .build()
    }

    /// Returns the permissions held by a role.
    #[must_use]
    pub fn permissions_of(&self, role: Option<Role>) -> BTreeSet<Permission> {
        role.and_then(|role| self.grants.get(&role))
            .cloned()
            .unwrap_or_default()
    }

    /// Returns whether the role holds the permission.
    #[must_use]
    pub fn has_permission(&self, role: Option<Role>, permission: Permission) -> bool {
        role.and_then(|role| self.grants.get(&role))
            .is_some_and(|permissions| permissions.contains(&permission))
    }

    /// Returns whether the role holds at least one of the permissions.
    #[must_use]
    pub fn has_any(&self, role: Option<Role>, permissions: &[Permission]) -> bool {
        permissions
            .iter()
            .any(|permission| self.has_permission(role, *permission))
    }

    /// Returns whether the role holds every one of the permissions.
    #[must_use]
    pub fn has_all(&self, role: Option<Role>, permissions: &[Permission]) -> bool {
        permissions
            .iter()
            .all(|permission| self.has_permission(role, *permission))
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Builder for custom permission policies.
#[derive(Debug, Clone)]
pub struct PermissionTableBuilder {
    grants: BTreeMap<Role, BTreeSet<Permission>>,
}

impl PermissionTableBuilder {
    /// Adds permissions to a role.
    #[must_use]
    pub fn grant(
        mut self,
        role: Role,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        self.grants.entry(role).or_default().extend(permissions);
        self
    }

    /// Freezes the policy.
    #[must_use]
    pub fn build(self) -> PermissionTable {
        PermissionTable {
            grants: self.grants,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::PermissionTable;
    use crate::security::{Permission, Role};

    fn any_role() -> impl Strategy<Value = Option<Role>> {
        prop_oneof![
            Just(None),
            proptest::sample::select(Role::all()).prop_map(Some),
        ]
    }

    fn any_permission() -> impl Strategy<Value = Permission> {
        proptest::sample::select(Permission::all())
    }

    proptest! {
        #[test]
        fn has_permission_matches_set_membership(
            role in any_role(),
            permission in any_permission(),
        ) {
            let table = PermissionTable::platform_default();
            prop_assert_eq!(
                table.has_permission(role, permission),
                table.permissions_of(role).contains(&permission)
            );
        }

        #[test]
        fn absent_role_holds_nothing(permission in any_permission()) {
            let table = PermissionTable::platform_default();
            prop_assert!(!table.has_permission(None, permission));
            prop_assert!(!table.has_any(None, &[permission]));
        }

        #[test]
        fn combinators_agree_with_membership(
            role in any_role(),
            permissions in proptest::collection::vec(any_permission(), 0..5),
        ) {
            let table = PermissionTable::platform_default();
            let held = table.permissions_of(role);
            prop_assert_eq!(
                table.has_any(role, &permissions),
                permissions.iter().any(|permission| held.contains(permission))
            );
            prop_assert_eq!(
                table.has_all(role, &permissions),
                permissions.iter().all(|permission| held.contains(permission))
            );
        }
    }

    #[test]
    fn every_role_has_an_entry() {
        let table = PermissionTable::builder().build();
        for role in Role::all() {
            assert!(table.permissions_of(Some(*role)).is_empty());
        }
    }

    #[test]
    fn super_admin_holds_every_permission() {
        let table = PermissionTable::platform_default();
        assert!(table.has_all(Some(Role::SuperAdmin), Permission::all()));
    }

    #[test]
    fn admin_cannot_manage_admins_or_settings() {
        let table = PermissionTable::platform_default();
        assert!(table.has_permission(Some(Role::Admin), Permission::ManageOrders));
        assert!(!table.has_any(
            Some(Role::Admin),
            &[Permission::ManageAdmins, Permission::ManageSettings]
        ));
    }

    #[test]
    fn support_and_moderator_scopes() {
        let table = PermissionTable::platform_default();
        assert!(table.has_permission(Some(Role::Support), Permission::ManageSupportTickets));
        assert!(table.has_permission(Some(Role::Support), Permission::ManageOrders));
        assert!(!table.has_permission(Some(Role::Moderator), Permission::ManageOrders));
        assert!(table.has_permission(Some(Role::Moderator), Permission::ManageReviews));
    }

    #[test]
    fn empty_combinator_inputs() {
        let table = PermissionTable::platform_default();
        assert!(!table.has_any(Some(Role::SuperAdmin), &[]));
        assert!(table.has_all(None, &[]));
    }

    #[test]
    fn custom_table_can_be_injected() {
        let table = PermissionTable::builder()
            .grant(Role::Moderator, [Permission::ViewAnalytics])
            .build();
        assert!(table.has_permission(Some(Role::Moderator), Permission::ViewAnalytics));
        assert!(!table.has_permission(Some(Role::SuperAdmin), Permission::ViewAnalytics));
    }
}
