//! The tenant change coordination boundary.
//!
//! Tenant lifecycle operations in the admin layer must propagate to
//! the application's own data store, which this crate never touches
//! directly. The embedding application supplies a
//! [`TenantChangeHandler`]; the admin layer invokes the matching hook
//! after recomputing names/data keys and commits its own writes only
//! when the hook reports success.

use crate::models::tenant::Tenant;

/// One entry of a subtree move: the data key the tenant's application
/// data is currently filed under, plus the tenant with its new path
/// already applied.
#[derive(Debug, Clone)]
pub struct TenantDataMove {
    pub old_data_key: String,
    pub tenant: Tenant,
}

/// Application-supplied hooks for tenant lifecycle events.
///
/// Every hook returns `Ok(())` on success or a human-readable error
/// string; an error aborts the surrounding operation and rolls back
/// the authorization-side changes, so the error is surfaced to the
/// caller verbatim. A handler must not commit irreversibly before
/// returning.
pub trait TenantChangeHandler: Send + Sync {
    /// A tenant was created; its id and data key are final.
    fn create_new_tenant(
        &self,
        tenant: &Tenant,
    ) -> impl Future<Output = Result<(), String>> + Send;

    /// A single-level tenant is being deleted; remove its data.
    fn single_tenant_delete(
        &self,
        tenant: &Tenant,
    ) -> impl Future<Output = Result<(), String>> + Send;

    /// A hierarchical tenant and its descendants are being deleted.
    /// The slice is ordered children before parents.
    fn hierarchical_tenant_delete(
        &self,
        tenants_children_first: &[Tenant],
    ) -> impl Future<Output = Result<(), String>> + Send;

    /// A single-level tenant was renamed.
    fn single_tenant_update_name(
        &self,
        tenant: &Tenant,
    ) -> impl Future<Output = Result<(), String>> + Send;

    /// A hierarchical tenant was renamed; the slice holds the tenant
    /// and every descendant with their new full names.
    fn hierarchical_tenant_update_name(
        &self,
        tenants: &[Tenant],
    ) -> impl Future<Output = Result<(), String>> + Send;

    /// A subtree moved; re-key each tenant's application data from
    /// `old_data_key` to the tenant's new data key.
    fn move_hierarchical_tenant_data(
        &self,
        moves: &[TenantDataMove],
    ) -> impl Future<Output = Result<(), String>> + Send;

    /// A tenant (with its subtree) moved to a different database.
    /// The handler must copy the data across and delete the source
    /// copy.
    fn move_to_different_database(
        &self,
        old_database_info_name: &str,
        old_data_key: &str,
        updated_tenant: &Tenant,
    ) -> impl Future<Output = Result<(), String>> + Send;
}
