//! Claim types produced by the claims calculator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Claim type carrying the packed union of a user's effective
/// permissions.
pub const PERMISSIONS_CLAIM_TYPE: &str = "permissions";

/// Claim type carrying the user's tenant data key.
pub const DATA_KEY_CLAIM_TYPE: &str = "data_key";

/// Claim type carrying the name of the database holding the user's
/// tenant data (sharding only).
pub const DATABASE_INFO_CLAIM_TYPE: &str = "database_info_name";

/// A single authorization claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// Extension point: each registered adder may contribute one extra
/// claim per claims calculation.
///
/// Adders run in registration order and their claims are purely
/// additive; they are not deduplicated against the core claims or each
/// other.
#[async_trait]
pub trait ClaimsAdder: Send + Sync {
    async fn add_claim_to_user(&self, user_id: &str) -> Option<Claim>;
}
