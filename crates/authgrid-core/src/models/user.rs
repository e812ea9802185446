//! AuthUser domain model.
//!
//! An AuthUser links an externally-owned identity (the opaque
//! `user_id`) to its authorization data: directly assigned roles and
//! at most one tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel accepted wherever a tenant name (or role list entry) must
/// be *explicitly* cleared rather than left unchanged.
pub const NO_TENANT_NAME: &str = "<none>";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// External identity id; opaque to this system.
    pub user_id: String,
    pub email: Option<String>,
    pub user_name: Option<String>,
    /// A disabled user yields no authorization claims.
    pub disabled: bool,
    /// At most one tenant per user.
    pub tenant_id: Option<i64>,
    /// Names of directly assigned roles.
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuthUser {
    /// Best human-readable handle for error messages.
    pub fn display_name(&self) -> &str {
        self.email
            .as_deref()
            .or(self.user_name.as_deref())
            .unwrap_or(&self.user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuthUser {
    pub user_id: String,
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub tenant_id: Option<i64>,
    pub roles: Vec<String>,
}

/// Partial update of an AuthUser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAuthUser {
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub disabled: Option<bool>,
    /// `Some(Some(id))` = set, `Some(None)` = clear, `None` = no change.
    pub tenant_id: Option<Option<i64>>,
    pub roles: Option<Vec<String>>,
}
