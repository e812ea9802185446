//! Admin service configuration.

/// How the embedding application uses tenants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TenantMode {
    /// No multi-tenancy; tenant operations are unavailable and the
    /// claims calculator emits no tenant claims.
    #[default]
    NotUsed,
    /// Flat tenants; every tenant is top-level.
    SingleLevel,
    /// Tenants form a tree; names and data keys derive from the
    /// ancestor chain.
    Hierarchical,
}

impl TenantMode {
    pub fn tenants_active(self) -> bool {
        self != TenantMode::NotUsed
    }
}

/// Configuration shared by the admin services, passed at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminConfig {
    pub tenant_mode: TenantMode,
    /// Whether tenant data may be spread over several databases.
    pub sharding: bool,
}
