//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Operations that touch several
//! records at once (`update_paths`, `delete_many`, `delete_and_detach`,
//! `update_sharding`) must be executed atomically by the
//! implementation; the admin layer relies on this for its
//! all-or-nothing guarantees.

use crate::error::AuthGridResult;
use crate::models::{
    role::{CreateRole, Role, UpdateRole},
    tenant::{CreateTenant, Tenant, TenantPathUpdate},
    user::{AuthUser, CreateAuthUser, UpdateAuthUser},
};

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = AuthGridResult<Role>> + Send;

    fn find_by_name(&self, name: &str)
    -> impl Future<Output = AuthGridResult<Option<Role>>> + Send;

    /// Fetch the subset of `names` that exist; missing names are simply
    /// absent from the result (callers diff to report them).
    fn find_many(&self, names: &[String])
    -> impl Future<Output = AuthGridResult<Vec<Role>>> + Send;

    /// Wholesale update of description, type and permissions.
    fn update(
        &self,
        name: &str,
        input: UpdateRole,
    ) -> impl Future<Output = AuthGridResult<Role>> + Send;

    fn delete(&self, name: &str) -> impl Future<Output = AuthGridResult<()>> + Send;

    /// Strip the role from every user and tenant holding it, then
    /// delete it, in one atomic step.
    fn delete_and_detach(&self, name: &str) -> impl Future<Output = AuthGridResult<()>> + Send;

    fn list(&self) -> impl Future<Output = AuthGridResult<Vec<Role>>> + Send;
}

pub trait TenantRepository: Send + Sync {
    /// Create a tenant, allocating its numeric id.
    fn create(&self, input: CreateTenant) -> impl Future<Output = AuthGridResult<Tenant>> + Send;

    fn find_by_id(&self, id: i64) -> impl Future<Output = AuthGridResult<Option<Tenant>>> + Send;

    fn find_by_full_name(
        &self,
        full_name: &str,
    ) -> impl Future<Output = AuthGridResult<Option<Tenant>>> + Send;

    fn list(&self) -> impl Future<Output = AuthGridResult<Vec<Tenant>>> + Send;

    fn children_of(&self, id: i64) -> impl Future<Output = AuthGridResult<Vec<Tenant>>> + Send;

    /// The tenant with the given full name plus every descendant
    /// (full-name prefix match on the path delimiter).
    fn load_subtree(
        &self,
        full_name: &str,
    ) -> impl Future<Output = AuthGridResult<Vec<Tenant>>> + Send;

    fn tenants_with_role(
        &self,
        role_name: &str,
    ) -> impl Future<Output = AuthGridResult<Vec<Tenant>>> + Send;

    /// Replace the tenant's role set wholesale.
    fn update_roles(
        &self,
        id: i64,
        roles: Vec<String>,
    ) -> impl Future<Output = AuthGridResult<Tenant>> + Send;

    /// Apply a batch of full-name/parent/data-key rewrites atomically.
    fn update_paths(
        &self,
        updates: &[TenantPathUpdate],
    ) -> impl Future<Output = AuthGridResult<()>> + Send;

    /// Rewrite the sharding attributes of every listed tenant
    /// atomically.
    fn update_sharding(
        &self,
        ids: &[i64],
        has_own_db: Option<bool>,
        database_info_name: Option<String>,
    ) -> impl Future<Output = AuthGridResult<()>> + Send;

    /// Delete all listed tenants atomically.
    fn delete_many(&self, ids: &[i64]) -> impl Future<Output = AuthGridResult<()>> + Send;

    /// Whether any tenant outside `exclude_ids` already exclusively
    /// owns the named database.
    fn any_other_with_own_db(
        &self,
        database_info_name: &str,
        exclude_ids: &[i64],
    ) -> impl Future<Output = AuthGridResult<bool>> + Send;
}

pub trait AuthUserRepository: Send + Sync {
    fn create(&self, input: CreateAuthUser)
    -> impl Future<Output = AuthGridResult<AuthUser>> + Send;

    fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> impl Future<Output = AuthGridResult<Option<AuthUser>>> + Send;

    fn list(&self) -> impl Future<Output = AuthGridResult<Vec<AuthUser>>> + Send;

    fn update(
        &self,
        user_id: &str,
        input: UpdateAuthUser,
    ) -> impl Future<Output = AuthGridResult<AuthUser>> + Send;

    fn delete(&self, user_id: &str) -> impl Future<Output = AuthGridResult<()>> + Send;

    fn users_with_role(
        &self,
        role_name: &str,
    ) -> impl Future<Output = AuthGridResult<Vec<AuthUser>>> + Send;

    fn users_in_tenants(
        &self,
        tenant_ids: &[i64],
    ) -> impl Future<Output = AuthGridResult<Vec<AuthUser>>> + Send;
}
