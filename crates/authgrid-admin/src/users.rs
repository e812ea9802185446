//! User admin service: role and tenant assignments of AuthUsers.
//!
//! Every mutation re-validates role applicability against the user's
//! tenant context, not just creation. Validation problems accumulate
//! on the status so a caller sees them all at once.

use std::collections::HashMap;
use std::sync::LazyLock;

use authgrid_core::models::role::{Role, RoleType};
use authgrid_core::models::tenant::Tenant;
use authgrid_core::models::user::{AuthUser, CreateAuthUser, NO_TENANT_NAME, UpdateAuthUser};
use authgrid_core::repository::{AuthUserRepository, RoleRepository, TenantRepository};
use authgrid_core::status::{ErrorKind, Status};
use regex::Regex;

use crate::config::AdminConfig;
use crate::roles::resolve_roles;
use crate::support::system_status;
use crate::sync::{
    AuthenticationUserSource, SyncAuthUserData, SyncChange, SyncChangeType, SyncSummary,
};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid"));

/// Input for [`UserAdminService::add_user`].
#[derive(Debug, Clone, Default)]
pub struct AddUserInput {
    pub user_id: String,
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub role_names: Vec<String>,
    /// `None` or [`NO_TENANT_NAME`] assigns no tenant.
    pub tenant_name: Option<String>,
}

/// Input for [`UserAdminService::update_user`]. Omitted (`None`)
/// fields keep their current value; the tenant is cleared only by the
/// explicit [`NO_TENANT_NAME`] sentinel, and a role list of exactly
/// `[NO_TENANT_NAME]` clears all roles.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub user_id: String,
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub role_names: Option<Vec<String>>,
    pub tenant_name: Option<String>,
}

/// What `update_user`/`add_user` decided about the tenant link.
enum TenantTarget {
    Keep,
    Clear,
    Set(Tenant),
}

/// CRUD over users' role and tenant assignments.
pub struct UserAdminService<U, R, T> {
    config: AdminConfig,
    user_repo: U,
    role_repo: R,
    tenant_repo: T,
}

impl<U, R, T> UserAdminService<U, R, T>
where
    U: AuthUserRepository,
    R: RoleRepository,
    T: TenantRepository,
{
    pub fn new(config: AdminConfig, user_repo: U, role_repo: R, tenant_repo: T) -> Self {
        Self {
            config,
            user_repo,
            role_repo,
            tenant_repo,
        }
    }

    fn validate_email<X>(status: &mut Status<X>, email: &str) {
        if !EMAIL_RE.is_match(email) {
            status.add_field_error(
                ErrorKind::Validation,
                "email",
                format!("'{email}' is not a valid email address"),
            );
        }
    }

    /// Check each role against the user's tenant context:
    /// hidden roles never go to tenant users, tenant-type roles only
    /// go to tenant users, and then only when the tenant carries the
    /// role in its own role set.
    fn check_role_compatibility<X>(status: &mut Status<X>, roles: &[Role], tenant: Option<&Tenant>) {
        for role in roles {
            match role.role_type {
                RoleType::HiddenFromTenant => {
                    if let Some(tenant) = tenant {
                        status.add_field_error(
                            ErrorKind::Conflict,
                            "roles",
                            format!(
                                "role '{}' is hidden from tenant users and cannot be \
                                 assigned to a user of tenant '{}'",
                                role.name, tenant.full_name,
                            ),
                        );
                    }
                }
                RoleType::TenantAutoAdd | RoleType::TenantAdminAdd => match tenant {
                    None => {
                        status.add_field_error(
                            ErrorKind::Conflict,
                            "roles",
                            format!(
                                "role '{}' has type {} and can only be assigned to \
                                 a user with a tenant",
                                role.name,
                                role.role_type.as_str(),
                            ),
                        );
                    }
                    Some(tenant) => {
                        if !tenant.roles.contains(&role.name) {
                            status.add_field_error(
                                ErrorKind::Conflict,
                                "roles",
                                format!(
                                    "role '{}' is not in the role list of tenant '{}'",
                                    role.name, tenant.full_name,
                                ),
                            );
                        }
                    }
                },
                RoleType::Normal => {}
            }
        }
    }

    /// Resolve a tenant-name parameter into a target tenant link.
    async fn resolve_tenant_target<X>(
        &self,
        status: &mut Status<X>,
        tenant_name: Option<&str>,
    ) -> TenantTarget {
        let Some(name) = tenant_name else {
            return TenantTarget::Keep;
        };
        if name == NO_TENANT_NAME {
            return TenantTarget::Clear;
        }
        if name.trim().is_empty() {
            status.add_field_error(
                ErrorKind::Validation,
                "tenant_name",
                format!("tenant name cannot be empty; use '{NO_TENANT_NAME}' to clear the tenant"),
            );
            return TenantTarget::Keep;
        }
        if !self.config.tenant_mode.tenants_active() {
            status.add_field_error(
                ErrorKind::Configuration,
                "tenant_name",
                "a tenant was supplied, but multi-tenancy is not enabled",
            );
            return TenantTarget::Keep;
        }
        match self.tenant_repo.find_by_full_name(name).await {
            Ok(Some(tenant)) => TenantTarget::Set(tenant),
            Ok(None) => {
                status.add_field_error(
                    ErrorKind::NotFound,
                    "tenant_name",
                    format!("tenant '{name}' was not found"),
                );
                TenantTarget::Keep
            }
            Err(err) => {
                status.combine::<()>(system_status("resolve_tenant", &err));
                TenantTarget::Keep
            }
        }
    }

    pub async fn add_user(&self, input: AddUserInput) -> Status<AuthUser> {
        let mut status = Status::new();

        // 1. Shape checks.
        if input.user_id.trim().is_empty() {
            status.add_field_error(ErrorKind::Validation, "user_id", "user id cannot be empty");
            return status;
        }
        let email = input.email.map(|e| e.to_lowercase());
        if let Some(email) = &email {
            Self::validate_email(&mut status, email);
        }

        // 2. Duplicate check.
        match self.user_repo.find_by_user_id(&input.user_id).await {
            Ok(Some(_)) => {
                status.add_field_error(
                    ErrorKind::Conflict,
                    "user_id",
                    format!("a user with id '{}' already exists", input.user_id),
                );
            }
            Ok(None) => {}
            Err(err) => return system_status("add_user", &err),
        }

        // 3. Tenant resolution.
        let tenant = match self
            .resolve_tenant_target(&mut status, input.tenant_name.as_deref())
            .await
        {
            TenantTarget::Set(tenant) => Some(tenant),
            TenantTarget::Keep | TenantTarget::Clear => None,
        };

        // 4. Roles, checked against the tenant context.
        let roles = status
            .combine(resolve_roles(&self.role_repo, &input.role_names).await)
            .unwrap_or_default();
        Self::check_role_compatibility(&mut status, &roles, tenant.as_ref());

        if !status.is_valid() {
            return status;
        }

        match self
            .user_repo
            .create(CreateAuthUser {
                user_id: input.user_id.clone(),
                email,
                user_name: input.user_name,
                tenant_id: tenant.map(|t| t.id),
                roles: roles.into_iter().map(|r| r.name).collect(),
            })
            .await
        {
            Ok(user) => {
                status.set_message(format!("User '{}' added", user.display_name()));
                status.set_result(user);
            }
            Err(err) => return system_status("add_user", &err),
        }
        status
    }

    /// Partial update. The new role set (given or kept) is re-checked
    /// against the new tenant context (given, kept or cleared); any
    /// incompatibility aborts the whole update.
    pub async fn update_user(&self, input: UpdateUserInput) -> Status<AuthUser> {
        let mut status = Status::new();

        let user = match self.user_repo.find_by_user_id(&input.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                status.add_error(
                    ErrorKind::NotFound,
                    format!("user '{}' was not found", input.user_id),
                );
                return status;
            }
            Err(err) => return system_status("update_user", &err),
        };

        let email = input.email.map(|e| e.to_lowercase());
        if let Some(email) = &email {
            Self::validate_email(&mut status, email);
        }

        // Tenant target: keep, clear, or set.
        let target = self
            .resolve_tenant_target(&mut status, input.tenant_name.as_deref())
            .await;
        let effective_tenant = match &target {
            TenantTarget::Keep => match user.tenant_id {
                Some(id) => match self.tenant_repo.find_by_id(id).await {
                    Ok(tenant) => tenant,
                    Err(err) => return system_status("update_user", &err),
                },
                None => None,
            },
            TenantTarget::Clear => None,
            TenantTarget::Set(tenant) => Some(tenant.clone()),
        };

        // Role target: keep, clear (sentinel), or replace.
        let role_names: Vec<String> = match &input.role_names {
            None => user.roles.clone(),
            Some(names) if names.len() == 1 && names[0] == NO_TENANT_NAME => Vec::new(),
            Some(names) => names.clone(),
        };
        let roles = status
            .combine(resolve_roles(&self.role_repo, &role_names).await)
            .unwrap_or_default();
        Self::check_role_compatibility(&mut status, &roles, effective_tenant.as_ref());

        if !status.is_valid() {
            return status;
        }

        let tenant_id = match target {
            TenantTarget::Keep => None,
            TenantTarget::Clear => Some(None),
            TenantTarget::Set(tenant) => Some(Some(tenant.id)),
        };
        match self
            .user_repo
            .update(
                &input.user_id,
                UpdateAuthUser {
                    email,
                    user_name: input.user_name,
                    disabled: None,
                    tenant_id,
                    roles: Some(roles.into_iter().map(|r| r.name).collect()),
                },
            )
            .await
        {
            Ok(user) => {
                status.set_message(format!("User '{}' updated", user.display_name()));
                status.set_result(user);
            }
            Err(err) => return system_status("update_user", &err),
        }
        status
    }

    /// Disabled users yield no authorization claims.
    pub async fn set_user_disabled(&self, user_id: &str, disabled: bool) -> Status<AuthUser> {
        let mut status = Status::new();

        match self.user_repo.find_by_user_id(user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                status.add_error(ErrorKind::NotFound, format!("user '{user_id}' was not found"));
                return status;
            }
            Err(err) => return system_status("set_user_disabled", &err),
        }

        match self
            .user_repo
            .update(
                user_id,
                UpdateAuthUser {
                    disabled: Some(disabled),
                    ..Default::default()
                },
            )
            .await
        {
            Ok(user) => {
                status.set_message(if disabled {
                    format!("User '{}' disabled", user.display_name())
                } else {
                    format!("User '{}' enabled", user.display_name())
                });
                status.set_result(user);
            }
            Err(err) => return system_status("set_user_disabled", &err),
        }
        status
    }

    pub async fn delete_user(&self, user_id: &str) -> Status<()> {
        let mut status = Status::new();

        match self.user_repo.find_by_user_id(user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                status.add_error(ErrorKind::NotFound, format!("user '{user_id}' was not found"));
                return status;
            }
            Err(err) => return system_status("delete_user", &err),
        }

        match self.user_repo.delete(user_id).await {
            Ok(()) => status.set_message(format!("User '{user_id}' deleted")),
            Err(err) => return system_status("delete_user", &err),
        }
        status
    }

    pub async fn find_user(&self, user_id: &str) -> authgrid_core::error::AuthGridResult<Option<AuthUser>> {
        self.user_repo.find_by_user_id(user_id).await
    }

    pub async fn list_users(&self) -> authgrid_core::error::AuthGridResult<Vec<AuthUser>> {
        self.user_repo.list().await
    }

    // -------------------------------------------------------------------
    // Sync with the external authentication provider
    // -------------------------------------------------------------------

    /// Diff the provider's active users against the stored AuthUsers.
    /// Returns the classified changes for review; nothing is applied.
    pub async fn sync_with_authentication_provider<S: AuthenticationUserSource>(
        &self,
        source: &S,
    ) -> Status<Vec<SyncChange>> {
        let mut status = Status::new();

        let provider_users = match source.get_active_users().await {
            Ok(users) => users,
            Err(err) => return system_status("sync_users", &err),
        };
        let stored = match self.user_repo.list().await {
            Ok(users) => users,
            Err(err) => return system_status("sync_users", &err),
        };
        let mut stored_by_id: HashMap<&str, &AuthUser> =
            stored.iter().map(|u| (u.user_id.as_str(), u)).collect();

        let mut changes = Vec::new();
        for SyncAuthUserData {
            user_id,
            email,
            user_name,
        } in provider_users
        {
            let email = email.map(|e| e.to_lowercase());
            match stored_by_id.remove(user_id.as_str()) {
                None => changes.push(SyncChange {
                    change_type: SyncChangeType::Create,
                    user_id,
                    email,
                    user_name,
                }),
                Some(existing) => {
                    let change_type = if existing.email != email || existing.user_name != user_name
                    {
                        SyncChangeType::Update
                    } else {
                        SyncChangeType::NoChange
                    };
                    changes.push(SyncChange {
                        change_type,
                        user_id,
                        email,
                        user_name,
                    });
                }
            }
        }
        // Whatever the provider no longer reports is gone.
        for user in stored_by_id.into_values() {
            changes.push(SyncChange {
                change_type: SyncChangeType::Delete,
                user_id: user.user_id.clone(),
                email: user.email.clone(),
                user_name: user.user_name.clone(),
            });
        }

        status.set_message(format!("{} change(s) found", changes.len()));
        status.set_result(changes);
        status
    }

    /// Apply reviewed sync decisions. Create/Update problems
    /// accumulate and the batch continues; a Delete of a user that no
    /// longer exists stops the batch early with the partial summary.
    pub async fn apply_sync_changes(&self, changes: Vec<SyncChange>) -> Status<SyncSummary> {
        let mut status = Status::new();
        let mut summary = SyncSummary::default();

        for change in changes {
            match change.change_type {
                SyncChangeType::NoChange => summary.unchanged += 1,
                SyncChangeType::Create => {
                    let sub = self
                        .add_user(AddUserInput {
                            user_id: change.user_id,
                            email: change.email,
                            user_name: change.user_name,
                            role_names: Vec::new(),
                            tenant_name: None,
                        })
                        .await;
                    if sub.is_valid() {
                        summary.created += 1;
                    }
                    status.combine(sub);
                }
                SyncChangeType::Update => {
                    let sub = self
                        .update_user(UpdateUserInput {
                            user_id: change.user_id,
                            email: change.email,
                            user_name: change.user_name,
                            role_names: None,
                            tenant_name: None,
                        })
                        .await;
                    if sub.is_valid() {
                        summary.updated += 1;
                    }
                    status.combine(sub);
                }
                SyncChangeType::Delete => {
                    match self.user_repo.find_by_user_id(&change.user_id).await {
                        Ok(Some(_)) => {}
                        Ok(None) => {
                            // Stop early; the review is stale.
                            status.add_error(
                                ErrorKind::NotFound,
                                format!(
                                    "sync stopped: user '{}' scheduled for deletion \
                                     was not found",
                                    change.user_id,
                                ),
                            );
                            status.set_result(summary);
                            return status;
                        }
                        Err(err) => return system_status("apply_sync_changes", &err),
                    }
                    match self.user_repo.delete(&change.user_id).await {
                        Ok(()) => summary.deleted += 1,
                        Err(err) => return system_status("apply_sync_changes", &err),
                    }
                }
            }
        }

        status.set_message(format!(
            "Sync applied: {} created, {} updated, {} deleted, {} unchanged",
            summary.created, summary.updated, summary.deleted, summary.unchanged,
        ));
        status.set_result(summary);
        status
    }
}
