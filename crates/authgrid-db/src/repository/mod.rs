//! SurrealDB repository implementations.

mod role;
mod tenant;
mod user;

pub use role::SurrealRoleRepository;
pub use tenant::SurrealTenantRepository;
pub use user::SurrealAuthUserRepository;
