//! AuthGrid Admin: role registry, tenant hierarchy management, user
//! administration and the claims calculator, generic over the
//! `authgrid-core` repository traits.

pub mod claims;
pub mod config;
pub mod roles;
mod support;
pub mod sync;
pub mod tenants;
pub mod users;

pub use claims::ClaimsCalcService;
pub use config::{AdminConfig, TenantMode};
pub use roles::RoleAdminService;
pub use sync::{AuthenticationUserSource, SyncAuthUserData, SyncChange, SyncChangeType, SyncSummary};
pub use tenants::{CreateHierarchicalTenantInput, CreateSingleTenantInput, TenantAdminService};
pub use users::{AddUserInput, UpdateUserInput, UserAdminService};
