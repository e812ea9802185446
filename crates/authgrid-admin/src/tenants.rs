//! Tenant hierarchy manager.
//!
//! Creates, renames, moves and deletes tenants while keeping full
//! names and data keys consistent across whole subtrees, and
//! coordinates every lifecycle event with the application-supplied
//! [`TenantChangeHandler`].
//!
//! Ordering inside every mutation: validate and recompute in memory,
//! invoke the change handler, then issue one atomic repository write.
//! A handler error therefore aborts with nothing persisted; tenant
//! creation is the one compensated flow (the row is created first so
//! the handler sees the allocated id, and deleted again on handler
//! failure).

use std::collections::HashMap;

use authgrid_core::error::{AuthGridError, AuthGridResult};
use authgrid_core::models::role::Role;
use authgrid_core::models::tenant::{
    CreateTenant, TENANT_PATH_DELIMITER, Tenant, TenantPathUpdate, combine_full_name,
};
use authgrid_core::repository::{AuthUserRepository, RoleRepository, TenantRepository};
use authgrid_core::status::{ErrorKind, Status};
use authgrid_core::tenant_change::{TenantChangeHandler, TenantDataMove};

use crate::config::{AdminConfig, TenantMode};
use crate::roles::resolve_roles;
use crate::support::system_status;

/// Input for creating a single-level tenant.
#[derive(Debug, Clone, Default)]
pub struct CreateSingleTenantInput {
    pub name: String,
    pub role_names: Vec<String>,
    pub has_own_db: Option<bool>,
    pub database_info_name: Option<String>,
}

/// Input for creating a hierarchical tenant. `parent_id = None`
/// creates a top-level tenant.
#[derive(Debug, Clone, Default)]
pub struct CreateHierarchicalTenantInput {
    pub name: String,
    pub parent_id: Option<i64>,
    pub role_names: Vec<String>,
    pub has_own_db: Option<bool>,
    pub database_info_name: Option<String>,
}

/// Recompute full names and parent data keys for a subtree after its
/// root changed. `subtree` must be ordered parents before children
/// (the repository's full-name ordering guarantees this) and
/// `new_root` is the root with its new path already applied.
fn recompute_subtree(subtree: &[Tenant], new_root: Tenant) -> AuthGridResult<Vec<Tenant>> {
    let root_id = new_root.id;
    let mut updated: HashMap<i64, Tenant> = HashMap::new();
    let mut order = Vec::with_capacity(subtree.len());

    for node in subtree {
        let new_node = if node.id == root_id {
            new_root.clone()
        } else {
            let parent_id = node.parent_id.ok_or_else(|| AuthGridError::Internal(
                format!("tenant {} is inside a subtree but has no parent", node.id),
            ))?;
            let parent = updated.get(&parent_id).ok_or_else(|| AuthGridError::Internal(
                format!("tenant {} appeared before its parent {parent_id}", node.id),
            ))?;
            let mut child = node.clone();
            child.full_name = combine_full_name(Some(&parent.full_name), node.short_name());
            child.parent_data_key = Some(parent.data_key());
            child
        };
        order.push(node.id);
        updated.insert(node.id, new_node);
    }

    Ok(order
        .into_iter()
        .map(|id| updated.remove(&id).expect("every id was inserted above"))
        .collect())
}

fn path_updates(tenants: &[Tenant]) -> Vec<TenantPathUpdate> {
    tenants
        .iter()
        .map(|t| TenantPathUpdate {
            id: t.id,
            full_name: t.full_name.clone(),
            parent_id: t.parent_id,
            parent_data_key: t.parent_data_key.clone(),
        })
        .collect()
}

/// Depth of a tenant in the tree, from its full name.
fn depth(tenant: &Tenant) -> usize {
    tenant.full_name.matches(TENANT_PATH_DELIMITER).count()
}

/// Manages the tenant tree and coordinates lifecycle events with the
/// application data store.
pub struct TenantAdminService<T, U, R, H> {
    config: AdminConfig,
    tenant_repo: T,
    user_repo: U,
    role_repo: R,
    change_handler: H,
}

impl<T, U, R, H> TenantAdminService<T, U, R, H>
where
    T: TenantRepository,
    U: AuthUserRepository,
    R: RoleRepository,
    H: TenantChangeHandler,
{
    /// Panics if the configuration has no active tenant mode; wiring
    /// this service into a non-tenant application is a programming
    /// error, not a user input problem.
    pub fn new(
        config: AdminConfig,
        tenant_repo: T,
        user_repo: U,
        role_repo: R,
        change_handler: H,
    ) -> Self {
        assert!(
            config.tenant_mode.tenants_active(),
            "TenantAdminService requires TenantMode::SingleLevel or TenantMode::Hierarchical",
        );
        Self {
            config,
            tenant_repo,
            user_repo,
            role_repo,
            change_handler,
        }
    }

    fn wrong_mode<X>(&self, required: TenantMode) -> Status<X> {
        Status::from_error(
            ErrorKind::Configuration,
            format!(
                "this operation requires {required:?} tenant mode, \
                 but the service is configured for {:?}",
                self.config.tenant_mode,
            ),
        )
    }

    fn validate_tenant_name<X>(status: &mut Status<X>, name: &str) {
        if name.trim().is_empty() {
            status.add_field_error(ErrorKind::Validation, "name", "tenant name cannot be empty");
        } else if name.contains(TENANT_PATH_DELIMITER) {
            status.add_field_error(
                ErrorKind::Validation,
                "name",
                format!("tenant name cannot contain '{TENANT_PATH_DELIMITER}'"),
            );
        }
    }

    /// Resolve role names for a tenant's role set; only tenant-type
    /// roles are accepted.
    async fn resolve_tenant_roles<X>(
        &self,
        status: &mut Status<X>,
        role_names: &[String],
    ) -> Vec<String> {
        let roles: Vec<Role> = match status.combine(resolve_roles(&self.role_repo, role_names).await)
        {
            Some(roles) => roles,
            None => return Vec::new(),
        };
        for role in &roles {
            if !role.role_type.is_tenant_role() {
                status.add_field_error(
                    ErrorKind::Conflict,
                    "roles",
                    format!(
                        "role '{}' has type {} and cannot be part of a tenant's role list",
                        role.name,
                        role.role_type.as_str(),
                    ),
                );
            }
        }
        roles.into_iter().map(|r| r.name).collect()
    }

    /// Sharding checks for a tenant that starts its own subtree.
    async fn validate_top_level_sharding<X>(
        &self,
        status: &mut Status<X>,
        has_own_db: Option<bool>,
        database_info_name: Option<&str>,
    ) {
        if !self.config.sharding {
            if has_own_db.is_some() || database_info_name.is_some() {
                status.add_error(
                    ErrorKind::Configuration,
                    "sharding attributes were supplied, but sharding is not enabled",
                );
            }
            return;
        }

        match has_own_db {
            None => {
                status.add_field_error(
                    ErrorKind::Validation,
                    "has_own_db",
                    "has_own_db must be supplied when sharding is enabled",
                );
            }
            Some(true) => match database_info_name {
                None => {
                    status.add_field_error(
                        ErrorKind::Validation,
                        "database_info_name",
                        "a tenant owning its database must name that database",
                    );
                }
                Some(db_name) => match self.tenant_repo.any_other_with_own_db(db_name, &[]).await {
                    Ok(true) => {
                        status.add_error(
                            ErrorKind::Conflict,
                            format!(
                                "database '{db_name}' is already exclusively \
                                 owned by another tenant"
                            ),
                        );
                    }
                    Ok(false) => {}
                    Err(err) => {
                        status.combine::<()>(system_status("validate_sharding", &err));
                    }
                },
            },
            Some(false) => {}
        }
    }

    /// Create the tenant row, then let the application create its side;
    /// a handler error deletes the row again.
    async fn create_with_handler(&self, mut status: Status<Tenant>, input: CreateTenant) -> Status<Tenant> {
        let tenant = match self.tenant_repo.create(input).await {
            Ok(tenant) => tenant,
            Err(err) => return system_status("create_tenant", &err),
        };

        if let Err(hook_err) = self.change_handler.create_new_tenant(&tenant).await {
            if let Err(db_err) = self.tenant_repo.delete_many(&[tenant.id]).await {
                return system_status("create_tenant_rollback", &db_err);
            }
            status.add_error(ErrorKind::Conflict, hook_err);
            return status;
        }

        status.set_message(format!("Tenant '{}' created", tenant.full_name));
        status.set_result(tenant);
        status
    }

    pub async fn create_single_tenant(&self, input: CreateSingleTenantInput) -> Status<Tenant> {
        if self.config.tenant_mode != TenantMode::SingleLevel {
            return self.wrong_mode(TenantMode::SingleLevel);
        }
        let mut status = Status::new();

        // 1. Name shape and uniqueness.
        Self::validate_tenant_name(&mut status, &input.name);
        match self.tenant_repo.find_by_full_name(&input.name).await {
            Ok(Some(_)) => {
                status.add_field_error(
                    ErrorKind::Conflict,
                    "name",
                    format!("a tenant called '{}' already exists", input.name),
                );
            }
            Ok(None) => {}
            Err(err) => return system_status("create_single_tenant", &err),
        }

        // 2. Roles must exist and be tenant-assignable.
        let roles = self.resolve_tenant_roles(&mut status, &input.role_names).await;

        // 3. Sharding attributes.
        self.validate_top_level_sharding(
            &mut status,
            input.has_own_db,
            input.database_info_name.as_deref(),
        )
        .await;

        if !status.is_valid() {
            return status;
        }

        self.create_with_handler(
            status,
            CreateTenant {
                full_name: input.name,
                parent_id: None,
                parent_data_key: None,
                is_hierarchical: false,
                has_own_db: input.has_own_db,
                database_info_name: input.database_info_name,
                roles,
            },
        )
        .await
    }

    pub async fn create_hierarchical_tenant(
        &self,
        input: CreateHierarchicalTenantInput,
    ) -> Status<Tenant> {
        if self.config.tenant_mode != TenantMode::Hierarchical {
            return self.wrong_mode(TenantMode::Hierarchical);
        }
        let mut status = Status::new();

        // 1. Name shape.
        Self::validate_tenant_name(&mut status, &input.name);

        // 2. Parent lookup and full-name derivation.
        let parent = match input.parent_id {
            Some(parent_id) => match self.tenant_repo.find_by_id(parent_id).await {
                Ok(Some(parent)) => Some(parent),
                Ok(None) => {
                    status.add_field_error(
                        ErrorKind::NotFound,
                        "parent_id",
                        format!("parent tenant {parent_id} was not found"),
                    );
                    return status;
                }
                Err(err) => return system_status("create_hierarchical_tenant", &err),
            },
            None => None,
        };
        let full_name = combine_full_name(parent.as_ref().map(|p| p.full_name.as_str()), &input.name);

        match self.tenant_repo.find_by_full_name(&full_name).await {
            Ok(Some(_)) => {
                status.add_field_error(
                    ErrorKind::Conflict,
                    "name",
                    format!("a tenant called '{full_name}' already exists"),
                );
            }
            Ok(None) => {}
            Err(err) => return system_status("create_hierarchical_tenant", &err),
        }

        // 3. Roles.
        let roles = self.resolve_tenant_roles(&mut status, &input.role_names).await;

        // 4. Sharding: a child inherits its parent's attributes and
        //    may not contradict them; a new top-level tenant follows
        //    the top-level rules.
        let (has_own_db, database_info_name) = match &parent {
            Some(parent) => {
                if !self.config.sharding {
                    if input.has_own_db.is_some() || input.database_info_name.is_some() {
                        status.add_error(
                            ErrorKind::Configuration,
                            "sharding attributes were supplied, but sharding is not enabled",
                        );
                    }
                } else {
                    if input.has_own_db.is_some() && input.has_own_db != parent.has_own_db {
                        status.add_field_error(
                            ErrorKind::Conflict,
                            "has_own_db",
                            "sharding mismatch: a child tenant inherits has_own_db \
                             from its parent",
                        );
                    }
                    if input.database_info_name.is_some()
                        && input.database_info_name != parent.database_info_name
                    {
                        status.add_field_error(
                            ErrorKind::Conflict,
                            "database_info_name",
                            "sharding mismatch: a child tenant inherits its parent's \
                             database",
                        );
                    }
                }
                (parent.has_own_db, parent.database_info_name.clone())
            }
            None => {
                self.validate_top_level_sharding(
                    &mut status,
                    input.has_own_db,
                    input.database_info_name.as_deref(),
                )
                .await;
                (input.has_own_db, input.database_info_name.clone())
            }
        };

        if !status.is_valid() {
            return status;
        }

        let parent_data_key = parent.as_ref().map(|p| p.data_key());
        self.create_with_handler(
            status,
            CreateTenant {
                full_name,
                parent_id: parent.map(|p| p.id),
                parent_data_key,
                is_hierarchical: true,
                has_own_db,
                database_info_name,
                roles,
            },
        )
        .await
    }

    /// Replace the tenant's role set wholesale. A tenant-type role
    /// still directly held by a user of this tenant cannot be removed
    /// from the set (it would break the user's assignment invariant).
    pub async fn update_tenant_roles(&self, tenant_id: i64, role_names: &[String]) -> Status<Tenant> {
        let mut status = Status::new();

        let tenant = match self.tenant_repo.find_by_id(tenant_id).await {
            Ok(Some(tenant)) => tenant,
            Ok(None) => {
                status.add_error(
                    ErrorKind::NotFound,
                    format!("tenant {tenant_id} was not found"),
                );
                return status;
            }
            Err(err) => return system_status("update_tenant_roles", &err),
        };

        let new_roles = self.resolve_tenant_roles(&mut status, role_names).await;

        let removed: Vec<&String> = tenant
            .roles
            .iter()
            .filter(|name| !new_roles.contains(name))
            .collect();
        if !removed.is_empty() {
            let users = match self.user_repo.users_in_tenants(&[tenant_id]).await {
                Ok(users) => users,
                Err(err) => return system_status("update_tenant_roles", &err),
            };
            for name in removed {
                for user in users.iter().filter(|u| u.roles.contains(name)) {
                    status.add_error(
                        ErrorKind::Conflict,
                        format!(
                            "cannot remove role '{name}' from tenant '{}': \
                             user {} still holds it directly",
                            tenant.full_name,
                            user.display_name(),
                        ),
                    );
                }
            }
        }

        if !status.is_valid() {
            return status;
        }

        match self.tenant_repo.update_roles(tenant_id, new_roles).await {
            Ok(tenant) => {
                status.set_message(format!("Roles of tenant '{}' updated", tenant.full_name));
                status.set_result(tenant);
            }
            Err(err) => return system_status("update_tenant_roles", &err),
        }
        status
    }

    /// Rename a tenant, updating the full name of every descendant in
    /// the same transaction.
    pub async fn rename_tenant(&self, tenant_id: i64, new_name: &str) -> Status<Tenant> {
        let mut status = Status::new();
        Self::validate_tenant_name(&mut status, new_name);
        if !status.is_valid() {
            return status;
        }

        let tenant = match self.tenant_repo.find_by_id(tenant_id).await {
            Ok(Some(tenant)) => tenant,
            Ok(None) => {
                status.add_error(
                    ErrorKind::NotFound,
                    format!("tenant {tenant_id} was not found"),
                );
                return status;
            }
            Err(err) => return system_status("rename_tenant", &err),
        };

        // New full name keeps the parent path, swaps the last segment.
        let parent_prefix = tenant
            .full_name
            .rfind(TENANT_PATH_DELIMITER)
            .map(|pos| tenant.full_name[..pos].to_string());
        let new_full_name = combine_full_name(parent_prefix.as_deref(), new_name);

        if new_full_name == tenant.full_name {
            status.add_field_error(
                ErrorKind::Validation,
                "name",
                format!("tenant is already called '{new_name}'"),
            );
            return status;
        }
        match self.tenant_repo.find_by_full_name(&new_full_name).await {
            Ok(Some(existing)) if existing.id != tenant.id => {
                status.add_field_error(
                    ErrorKind::Conflict,
                    "name",
                    format!("a tenant called '{new_full_name}' already exists"),
                );
                return status;
            }
            Ok(_) => {}
            Err(err) => return system_status("rename_tenant", &err),
        }

        if !tenant.is_hierarchical {
            let mut updated = tenant.clone();
            updated.full_name = new_full_name;

            if let Err(hook_err) = self.change_handler.single_tenant_update_name(&updated).await {
                status.add_error(ErrorKind::Conflict, hook_err);
                return status;
            }
            if let Err(err) = self.tenant_repo.update_paths(&path_updates(&[updated.clone()])).await
            {
                return system_status("rename_tenant", &err);
            }

            status.set_message(format!("Tenant renamed to '{}'", updated.full_name));
            status.set_result(updated);
            return status;
        }

        // Hierarchical: recompute the whole subtree, hook, then one
        // atomic batch write.
        let subtree = match self.tenant_repo.load_subtree(&tenant.full_name).await {
            Ok(subtree) => subtree,
            Err(err) => return system_status("rename_tenant", &err),
        };
        let mut new_root = tenant.clone();
        new_root.full_name = new_full_name;
        let updated = match recompute_subtree(&subtree, new_root) {
            Ok(updated) => updated,
            Err(err) => return system_status("rename_tenant", &err),
        };

        if let Err(hook_err) = self
            .change_handler
            .hierarchical_tenant_update_name(&updated)
            .await
        {
            status.add_error(ErrorKind::Conflict, hook_err);
            return status;
        }
        if let Err(err) = self.tenant_repo.update_paths(&path_updates(&updated)).await {
            return system_status("rename_tenant", &err);
        }

        let root = updated
            .into_iter()
            .find(|t| t.id == tenant_id)
            .expect("the renamed tenant is part of its own subtree");
        status.set_message(format!("Tenant renamed to '{}'", root.full_name));
        status.set_result(root);
        status
    }

    /// Move a tenant (and its subtree) under a new parent, or to the
    /// top level with `new_parent_id = None`.
    pub async fn move_tenant(&self, tenant_id: i64, new_parent_id: Option<i64>) -> Status<Tenant> {
        if self.config.tenant_mode != TenantMode::Hierarchical {
            return self.wrong_mode(TenantMode::Hierarchical);
        }
        let mut status = Status::new();

        let tenant = match self.tenant_repo.find_by_id(tenant_id).await {
            Ok(Some(tenant)) => tenant,
            Ok(None) => {
                status.add_error(
                    ErrorKind::NotFound,
                    format!("tenant {tenant_id} was not found"),
                );
                return status;
            }
            Err(err) => return system_status("move_tenant", &err),
        };

        if new_parent_id == Some(tenant.id) {
            status.add_error(ErrorKind::Conflict, "a tenant cannot be moved under itself");
            return status;
        }
        if new_parent_id == tenant.parent_id {
            status.add_error(
                ErrorKind::Validation,
                format!("tenant '{}' is already under that parent", tenant.full_name),
            );
            return status;
        }

        let new_parent = match new_parent_id {
            Some(parent_id) => match self.tenant_repo.find_by_id(parent_id).await {
                Ok(Some(parent)) => Some(parent),
                Ok(None) => {
                    status.add_field_error(
                        ErrorKind::NotFound,
                        "new_parent_id",
                        format!("parent tenant {parent_id} was not found"),
                    );
                    return status;
                }
                Err(err) => return system_status("move_tenant", &err),
            },
            None => None,
        };

        if let Some(parent) = &new_parent {
            // Moving under a descendant would create a cycle.
            let descendant_prefix = format!("{}{TENANT_PATH_DELIMITER}", tenant.full_name);
            if parent.full_name.starts_with(&descendant_prefix) {
                status.add_error(
                    ErrorKind::Conflict,
                    format!(
                        "cannot move tenant '{}' under '{}': that is one of \
                         its own descendants",
                        tenant.full_name, parent.full_name,
                    ),
                );
                return status;
            }
            if self.config.sharding && parent.database_info_name != tenant.database_info_name {
                status.add_error(
                    ErrorKind::Conflict,
                    "the new parent lives in a different database; \
                     use move_to_different_database instead",
                );
                return status;
            }
        }

        let new_full_name = combine_full_name(
            new_parent.as_ref().map(|p| p.full_name.as_str()),
            tenant.short_name(),
        );
        match self.tenant_repo.find_by_full_name(&new_full_name).await {
            Ok(Some(existing)) if existing.id != tenant.id => {
                status.add_error(
                    ErrorKind::Conflict,
                    format!("a tenant called '{new_full_name}' already exists"),
                );
                return status;
            }
            Ok(_) => {}
            Err(err) => return system_status("move_tenant", &err),
        }

        // Recompute the subtree under its new root position.
        let subtree = match self.tenant_repo.load_subtree(&tenant.full_name).await {
            Ok(subtree) => subtree,
            Err(err) => return system_status("move_tenant", &err),
        };
        let old_data_keys: HashMap<i64, String> =
            subtree.iter().map(|t| (t.id, t.data_key())).collect();

        let mut new_root = tenant.clone();
        new_root.full_name = new_full_name;
        new_root.parent_id = new_parent.as_ref().map(|p| p.id);
        new_root.parent_data_key = new_parent.as_ref().map(|p| p.data_key());
        let updated = match recompute_subtree(&subtree, new_root) {
            Ok(updated) => updated,
            Err(err) => return system_status("move_tenant", &err),
        };

        // Tell the application to re-key its data before we commit.
        let moves: Vec<TenantDataMove> = updated
            .iter()
            .map(|t| TenantDataMove {
                old_data_key: old_data_keys[&t.id].clone(),
                tenant: t.clone(),
            })
            .collect();
        if let Err(hook_err) = self.change_handler.move_hierarchical_tenant_data(&moves).await {
            status.add_error(ErrorKind::Conflict, hook_err);
            return status;
        }

        if let Err(err) = self.tenant_repo.update_paths(&path_updates(&updated)).await {
            return system_status("move_tenant", &err);
        }

        let root = updated
            .into_iter()
            .find(|t| t.id == tenant_id)
            .expect("the moved tenant is part of its own subtree");
        status.set_message(format!("Tenant moved to '{}'", root.full_name));
        status.set_result(root);
        status
    }

    /// Delete a tenant and, for hierarchical tenants, every
    /// descendant. Blocked outright while any affected tenant still
    /// has a linked user; there is no force path.
    pub async fn delete_tenant(&self, tenant_id: i64) -> Status<()> {
        let mut status = Status::new();

        let tenant = match self.tenant_repo.find_by_id(tenant_id).await {
            Ok(Some(tenant)) => tenant,
            Ok(None) => {
                status.add_error(
                    ErrorKind::NotFound,
                    format!("tenant {tenant_id} was not found"),
                );
                return status;
            }
            Err(err) => return system_status("delete_tenant", &err),
        };

        let mut affected = if tenant.is_hierarchical {
            match self.tenant_repo.load_subtree(&tenant.full_name).await {
                Ok(subtree) => subtree,
                Err(err) => return system_status("delete_tenant", &err),
            }
        } else {
            vec![tenant.clone()]
        };

        // Hard safety gate: name every user still linked to any
        // affected tenant.
        let affected_ids: Vec<i64> = affected.iter().map(|t| t.id).collect();
        let linked_users = match self.user_repo.users_in_tenants(&affected_ids).await {
            Ok(users) => users,
            Err(err) => return system_status("delete_tenant", &err),
        };
        if !linked_users.is_empty() {
            let names_by_id: HashMap<i64, &str> = affected
                .iter()
                .map(|t| (t.id, t.full_name.as_str()))
                .collect();
            for user in &linked_users {
                let tenant_name = user
                    .tenant_id
                    .and_then(|id| names_by_id.get(&id).copied())
                    .unwrap_or("?");
                status.add_error(
                    ErrorKind::InUse,
                    format!(
                        "cannot delete tenant '{}': user {} is linked to \
                         tenant '{tenant_name}'",
                        tenant.full_name,
                        user.display_name(),
                    ),
                );
            }
            return status;
        }

        // Application data goes first, children before parents so the
        // external store never sees a dangling parent.
        if tenant.is_hierarchical {
            affected.sort_by(|a, b| depth(b).cmp(&depth(a)).then(a.full_name.cmp(&b.full_name)));
            if let Err(hook_err) = self.change_handler.hierarchical_tenant_delete(&affected).await {
                status.add_error(ErrorKind::Conflict, hook_err);
                return status;
            }
        } else if let Err(hook_err) = self.change_handler.single_tenant_delete(&tenant).await {
            status.add_error(ErrorKind::Conflict, hook_err);
            return status;
        }

        if let Err(err) = self.tenant_repo.delete_many(&affected_ids).await {
            return system_status("delete_tenant", &err);
        }

        if affected_ids.len() > 1 {
            status.set_message(format!(
                "Tenant '{}' and {} descendants deleted",
                tenant.full_name,
                affected_ids.len() - 1,
            ));
        } else {
            status.set_message(format!("Tenant '{}' deleted", tenant.full_name));
        }
        status
    }

    /// Move a top-most tenant (and its subtree) to a different
    /// database. The sharding metadata is updated first, then the
    /// handler copies and deletes the application data; a handler
    /// error restores the previous metadata.
    pub async fn move_to_different_database(
        &self,
        tenant_id: i64,
        has_own_db: bool,
        database_info_name: &str,
    ) -> Status<Tenant> {
        let mut status = Status::new();
        if !self.config.sharding {
            status.add_error(
                ErrorKind::Configuration,
                "sharding is not enabled; tenants cannot be moved between databases",
            );
            return status;
        }

        let tenant = match self.tenant_repo.find_by_id(tenant_id).await {
            Ok(Some(tenant)) => tenant,
            Ok(None) => {
                status.add_error(
                    ErrorKind::NotFound,
                    format!("tenant {tenant_id} was not found"),
                );
                return status;
            }
            Err(err) => return system_status("move_to_different_database", &err),
        };

        if tenant.parent_id.is_some() {
            status.add_error(
                ErrorKind::Conflict,
                "only the top-most tenant of a hierarchy can be moved to a \
                 different database",
            );
            return status;
        }
        if tenant.database_info_name.as_deref() == Some(database_info_name)
            && tenant.has_own_db == Some(has_own_db)
        {
            status.add_error(
                ErrorKind::Validation,
                format!("tenant '{}' already uses database '{database_info_name}'", tenant.full_name),
            );
            return status;
        }

        let affected_ids: Vec<i64> = if tenant.is_hierarchical {
            match self.tenant_repo.load_subtree(&tenant.full_name).await {
                Ok(subtree) => subtree.iter().map(|t| t.id).collect(),
                Err(err) => return system_status("move_to_different_database", &err),
            }
        } else {
            vec![tenant.id]
        };

        if has_own_db {
            match self
                .tenant_repo
                .any_other_with_own_db(database_info_name, &affected_ids)
                .await
            {
                Ok(true) => {
                    status.add_error(
                        ErrorKind::Conflict,
                        format!(
                            "database '{database_info_name}' is already exclusively \
                             owned by another tenant"
                        ),
                    );
                    return status;
                }
                Ok(false) => {}
                Err(err) => return system_status("move_to_different_database", &err),
            }
        }

        let old_database = tenant.database_info_name.clone().unwrap_or_default();
        let old_data_key = tenant.data_key();

        // Metadata first, then the data copy; restore on failure.
        if let Err(err) = self
            .tenant_repo
            .update_sharding(&affected_ids, Some(has_own_db), Some(database_info_name.to_string()))
            .await
        {
            return system_status("move_to_different_database", &err);
        }

        let mut updated = tenant.clone();
        updated.has_own_db = Some(has_own_db);
        updated.database_info_name = Some(database_info_name.to_string());

        if let Err(hook_err) = self
            .change_handler
            .move_to_different_database(&old_database, &old_data_key, &updated)
            .await
        {
            if let Err(err) = self
                .tenant_repo
                .update_sharding(&affected_ids, tenant.has_own_db, tenant.database_info_name.clone())
                .await
            {
                return system_status("move_to_different_database_rollback", &err);
            }
            status.add_error(ErrorKind::Conflict, hook_err);
            return status;
        }

        status.set_message(format!(
            "Tenant '{}' moved to database '{database_info_name}'",
            updated.full_name,
        ));
        status.set_result(updated);
        status
    }

    pub async fn get_tenant(&self, tenant_id: i64) -> AuthGridResult<Option<Tenant>> {
        self.tenant_repo.find_by_id(tenant_id).await
    }

    pub async fn find_tenant_by_name(&self, full_name: &str) -> AuthGridResult<Option<Tenant>> {
        self.tenant_repo.find_by_full_name(full_name).await
    }

    pub async fn list_tenants(&self) -> AuthGridResult<Vec<Tenant>> {
        self.tenant_repo.list().await
    }
}
