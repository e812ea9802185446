//! Role registry: validation and persistence of role definitions.

use std::collections::HashMap;
use std::sync::Arc;

use authgrid_core::models::role::{CreateRole, Role, RoleType, UpdateRole};
use authgrid_core::permissions::PermissionSet;
use authgrid_core::repository::{AuthUserRepository, RoleRepository, TenantRepository};
use authgrid_core::status::{ErrorKind, Status};

use crate::support::system_status;

/// Resolve role names against the registry, reporting every missing
/// name instead of failing fast. Returned roles keep the input order,
/// with duplicates collapsed. Shared by the tenant and user admin
/// flows.
pub(crate) async fn resolve_roles<R: RoleRepository>(
    repo: &R,
    names: &[String],
) -> Status<Vec<Role>> {
    let mut status = Status::new();

    let found = match repo.find_many(names).await {
        Ok(found) => found,
        Err(err) => return system_status("resolve_roles", &err),
    };
    let by_name: HashMap<&str, &Role> = found.iter().map(|r| (r.name.as_str(), r)).collect();

    let mut roles = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            continue;
        }
        match by_name.get(name.as_str()) {
            Some(role) => roles.push((*role).clone()),
            None => {
                status.add_field_error(
                    ErrorKind::NotFound,
                    "roles",
                    format!("role '{name}' was not found"),
                );
            }
        }
    }

    status.set_result(roles);
    status
}

/// Validates and persists role definitions.
///
/// Generic over repository implementations so that the admin layer has
/// no dependency on the database crate.
pub struct RoleAdminService<R, U, T> {
    permissions: Arc<PermissionSet>,
    role_repo: R,
    user_repo: U,
    tenant_repo: T,
}

impl<R, U, T> RoleAdminService<R, U, T>
where
    R: RoleRepository,
    U: AuthUserRepository,
    T: TenantRepository,
{
    pub fn new(permissions: Arc<PermissionSet>, role_repo: R, user_repo: U, tenant_repo: T) -> Self {
        Self {
            permissions,
            role_repo,
            user_repo,
            tenant_repo,
        }
    }

    /// Pack permission names, reporting every unresolved name on the
    /// status.
    fn pack_permissions(&self, status: &mut Status<Role>, permission_names: &[String]) -> String {
        self.permissions.pack_with_validation(
            permission_names,
            |name| {
                status.add_field_error(
                    ErrorKind::NotFound,
                    "permissions",
                    format!("permission '{name}' is not part of the permission enumeration"),
                );
            },
            |_| {},
        )
    }

    pub async fn create_role(
        &self,
        name: &str,
        permission_names: &[String],
        description: &str,
        role_type: RoleType,
    ) -> Status<Role> {
        let mut status = Status::new();

        // 1. Shape checks.
        if name.trim().is_empty() {
            status.add_field_error(ErrorKind::Validation, "name", "role name cannot be empty");
            return status;
        }

        // 2. Duplicate name check.
        match self.role_repo.find_by_name(name).await {
            Ok(Some(_)) => {
                status.add_field_error(
                    ErrorKind::Conflict,
                    "name",
                    format!("a role called '{name}' already exists"),
                );
            }
            Ok(None) => {}
            Err(err) => return system_status("create_role", &err),
        }

        // 3. Resolve the permission names.
        let packed_permissions = self.pack_permissions(&mut status, permission_names);

        if !status.is_valid() {
            return status;
        }

        // 4. Persist.
        match self
            .role_repo
            .create(CreateRole {
                name: name.to_string(),
                description: description.to_string(),
                role_type,
                packed_permissions,
            })
            .await
        {
            Ok(role) => {
                status.set_message(format!("Role '{name}' created"));
                status.set_result(role);
            }
            Err(err) => return system_status("create_role", &err),
        }

        status
    }

    /// Replace a role's description, type and permission set.
    ///
    /// Changing the role type re-validates every current holder: the
    /// new type must remain legal for every user and tenant that
    /// already carries the role.
    pub async fn update_role(
        &self,
        name: &str,
        permission_names: &[String],
        description: &str,
        role_type: RoleType,
    ) -> Status<Role> {
        let mut status = Status::new();

        // 1. The role must exist.
        match self.role_repo.find_by_name(name).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                status.add_error(ErrorKind::NotFound, format!("role '{name}' was not found"));
                return status;
            }
            Err(err) => return system_status("update_role", &err),
        }

        // 2. Resolve the permission names.
        let packed_permissions = self.pack_permissions(&mut status, permission_names);

        // 3. Re-validate current holders under the new type.
        let holders = match self.user_repo.users_with_role(name).await {
            Ok(users) => users,
            Err(err) => return system_status("update_role", &err),
        };
        match role_type {
            RoleType::TenantAutoAdd | RoleType::TenantAdminAdd => {
                for user in holders.iter().filter(|u| u.tenant_id.is_none()) {
                    status.add_error(
                        ErrorKind::Conflict,
                        format!(
                            "cannot change role '{name}' to {}: user {} holds it but has no tenant",
                            role_type.as_str(),
                            user.display_name(),
                        ),
                    );
                }
            }
            RoleType::HiddenFromTenant => {
                for user in holders.iter().filter(|u| u.tenant_id.is_some()) {
                    status.add_error(
                        ErrorKind::Conflict,
                        format!(
                            "cannot change role '{name}' to HiddenFromTenant: \
                             tenant user {} holds it",
                            user.display_name(),
                        ),
                    );
                }
            }
            RoleType::Normal => {}
        }
        if !role_type.is_tenant_role() {
            let tenants = match self.tenant_repo.tenants_with_role(name).await {
                Ok(tenants) => tenants,
                Err(err) => return system_status("update_role", &err),
            };
            for tenant in &tenants {
                status.add_error(
                    ErrorKind::Conflict,
                    format!(
                        "cannot change role '{name}' to {}: tenant '{}' carries it",
                        role_type.as_str(),
                        tenant.full_name,
                    ),
                );
            }
        }

        if !status.is_valid() {
            return status;
        }

        // 4. Persist the new definition wholesale.
        match self
            .role_repo
            .update(
                name,
                UpdateRole {
                    description: description.to_string(),
                    role_type,
                    packed_permissions,
                },
            )
            .await
        {
            Ok(role) => {
                status.set_message(format!("Role '{name}' updated"));
                status.set_result(role);
            }
            Err(err) => return system_status("update_role", &err),
        }

        status
    }

    /// Delete a role. Unless `force_remove_from_holders` is set, the
    /// deletion is blocked while any user or tenant still carries the
    /// role, and every holder is named in the errors.
    pub async fn delete_role(&self, name: &str, force_remove_from_holders: bool) -> Status<()> {
        let mut status = Status::new();

        match self.role_repo.find_by_name(name).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                status.add_error(ErrorKind::NotFound, format!("role '{name}' was not found"));
                return status;
            }
            Err(err) => return system_status("delete_role", &err),
        }

        let users = match self.user_repo.users_with_role(name).await {
            Ok(users) => users,
            Err(err) => return system_status("delete_role", &err),
        };
        let tenants = match self.tenant_repo.tenants_with_role(name).await {
            Ok(tenants) => tenants,
            Err(err) => return system_status("delete_role", &err),
        };

        if !force_remove_from_holders {
            for user in &users {
                status.add_error(
                    ErrorKind::InUse,
                    format!("role '{name}' is assigned to user {}", user.display_name()),
                );
            }
            for tenant in &tenants {
                status.add_error(
                    ErrorKind::InUse,
                    format!("role '{name}' is used by tenant '{}'", tenant.full_name),
                );
            }
            if !status.is_valid() {
                return status;
            }
        }

        let result = if users.is_empty() && tenants.is_empty() {
            self.role_repo.delete(name).await
        } else {
            // Strip from all holders and delete in one transaction.
            self.role_repo.delete_and_detach(name).await
        };

        match result {
            Ok(()) => status.set_message(format!("Role '{name}' deleted")),
            Err(err) => return system_status("delete_role", &err),
        }

        status
    }

    /// Resolve role names, reporting every missing name (aggregate,
    /// not fail-fast).
    pub async fn resolve_roles(&self, names: &[String]) -> Status<Vec<Role>> {
        resolve_roles(&self.role_repo, names).await
    }

    pub async fn find_role(&self, name: &str) -> authgrid_core::error::AuthGridResult<Option<Role>> {
        self.role_repo.find_by_name(name).await
    }

    pub async fn list_roles(&self) -> authgrid_core::error::AuthGridResult<Vec<Role>> {
        self.role_repo.list().await
    }
}
