//! Sync against an external authentication provider.
//!
//! The provider owns the identities; this module only diffs its active
//! user list against the stored AuthUsers and applies reviewed
//! decisions. The diff never mutates anything by itself.

use authgrid_core::error::AuthGridResult;
use serde::{Deserialize, Serialize};

/// One active user as reported by the external authentication
/// provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAuthUserData {
    pub user_id: String,
    pub email: Option<String>,
    pub user_name: Option<String>,
}

/// Lookup interface onto the external identity store.
pub trait AuthenticationUserSource: Send + Sync {
    fn get_active_users(&self) -> impl Future<Output = AuthGridResult<Vec<SyncAuthUserData>>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncChangeType {
    NoChange,
    Create,
    Update,
    Delete,
}

/// One reviewed (or to-be-reviewed) sync decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncChange {
    pub change_type: SyncChangeType,
    pub user_id: String,
    pub email: Option<String>,
    pub user_name: Option<String>,
}

/// Per-type counts of applied sync changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
}
