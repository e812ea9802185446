//! Role domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Governs who a role may be assigned to and how it reaches users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleType {
    /// Assignable to any user.
    Normal,
    /// Only app-level users; never visible to tenant users.
    HiddenFromTenant,
    /// Automatically granted to every user of a tenant carrying it.
    TenantAutoAdd,
    /// Assignable to tenant users; part of the tenant's role list.
    TenantAdminAdd,
}

impl RoleType {
    /// Whether this role type may appear in a tenant's role set.
    pub fn is_tenant_role(self) -> bool {
        matches!(self, RoleType::TenantAutoAdd | RoleType::TenantAdminAdd)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoleType::Normal => "Normal",
            RoleType::HiddenFromTenant => "HiddenFromTenant",
            RoleType::TenantAutoAdd => "TenantAutoAdd",
            RoleType::TenantAdminAdd => "TenantAdminAdd",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Normal" => Some(RoleType::Normal),
            "HiddenFromTenant" => Some(RoleType::HiddenFromTenant),
            "TenantAutoAdd" => Some(RoleType::TenantAutoAdd),
            "TenantAdminAdd" => Some(RoleType::TenantAdminAdd),
            _ => None,
        }
    }
}

/// A named set of permissions. The name is the primary key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub description: String,
    pub role_type: RoleType,
    /// Packed permission string (see `permissions`).
    pub packed_permissions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub description: String,
    pub role_type: RoleType,
    pub packed_permissions: String,
}

/// Wholesale replacement of a role's definition; the name is fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRole {
    pub description: String,
    pub role_type: RoleType,
    pub packed_permissions: String,
}
