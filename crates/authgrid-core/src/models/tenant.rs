//! Tenant domain model.
//!
//! Tenants provide data isolation within the application. A tenant is
//! either single-level or part of a hierarchy; the hierarchy is
//! encoded both in the `|`-delimited full name and in the numeric
//! *data key* that partitions tenant-owned application data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separates path segments in a hierarchical tenant's full name.
/// Forbidden inside tenant name input.
pub const TENANT_PATH_DELIMITER: char = '|';

/// Separates ancestor ids inside a hierarchical data key.
pub const DATA_KEY_DELIMITER: char = '.';

/// An isolated data partition, optionally part of a hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i64,
    /// For hierarchical tenants, the `|`-delimited path from the root;
    /// otherwise just the name.
    pub full_name: String,
    /// `None` for top-level tenants.
    pub parent_id: Option<i64>,
    /// The parent's data key, stored so that this tenant's own data
    /// key is derivable without walking the ancestor chain.
    pub parent_data_key: Option<String>,
    /// Fixed at creation; hierarchical tenants may have children.
    pub is_hierarchical: bool,
    /// With sharding: whether this tenant exclusively owns its
    /// database.
    pub has_own_db: Option<bool>,
    /// With sharding: the database this tenant's data lives in.
    pub database_info_name: Option<String>,
    /// Names of the roles granted through this tenant.
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// The derived partition key: ancestor ids root→leaf joined by
    /// [`DATA_KEY_DELIMITER`], ending in this tenant's own id.
    ///
    /// There is no trailing delimiter, so a descendants-only prefix
    /// filter must append the delimiter itself (`"1.2"` is extended by
    /// `"1.2.7"`, and plain `starts_with("1.2")` would also match
    /// `"1.25"`).
    pub fn data_key(&self) -> String {
        match &self.parent_data_key {
            Some(parent) => format!("{parent}{DATA_KEY_DELIMITER}{}", self.id),
            None => self.id.to_string(),
        }
    }

    /// The last segment of the full name.
    pub fn short_name(&self) -> &str {
        self.full_name
            .rsplit(TENANT_PATH_DELIMITER)
            .next()
            .unwrap_or(&self.full_name)
    }
}

/// Combine a parent full name with a child's own name.
pub fn combine_full_name(parent_full_name: Option<&str>, name: &str) -> String {
    match parent_full_name {
        Some(parent) => format!("{parent}{TENANT_PATH_DELIMITER}{name}"),
        None => name.to_string(),
    }
}

/// Fields required to create a new tenant. The numeric id is allocated
/// by the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub full_name: String,
    pub parent_id: Option<i64>,
    pub parent_data_key: Option<String>,
    pub is_hierarchical: bool,
    pub has_own_db: Option<bool>,
    pub database_info_name: Option<String>,
    pub roles: Vec<String>,
}

/// One row of a batch path rewrite (rename or move). Batches are
/// applied atomically by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantPathUpdate {
    pub id: i64,
    pub full_name: String,
    pub parent_id: Option<i64>,
    pub parent_data_key: Option<String>,
}
