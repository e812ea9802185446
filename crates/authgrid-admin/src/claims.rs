//! Claims calculator: builds the full claim set for a user at
//! login/refresh time.

use authgrid_core::claims::{
    Claim, ClaimsAdder, DATA_KEY_CLAIM_TYPE, DATABASE_INFO_CLAIM_TYPE, PERMISSIONS_CLAIM_TYPE,
};
use authgrid_core::error::AuthGridResult;
use authgrid_core::models::role::RoleType;
use authgrid_core::permissions::union_packed;
use authgrid_core::repository::{AuthUserRepository, RoleRepository, TenantRepository};

use crate::config::AdminConfig;

/// Produces the per-request claim set for a user.
///
/// A missing or disabled user is a no-op (empty claim set), not an
/// error.
pub struct ClaimsCalcService<U, R, T> {
    config: AdminConfig,
    user_repo: U,
    role_repo: R,
    tenant_repo: T,
    adders: Vec<Box<dyn ClaimsAdder>>,
}

impl<U, R, T> ClaimsCalcService<U, R, T>
where
    U: AuthUserRepository,
    R: RoleRepository,
    T: TenantRepository,
{
    pub fn new(config: AdminConfig, user_repo: U, role_repo: R, tenant_repo: T) -> Self {
        Self {
            config,
            user_repo,
            role_repo,
            tenant_repo,
            adders: Vec::new(),
        }
    }

    /// Register a claims extension. Adders run in registration order;
    /// their claims are additive and never deduplicated against the
    /// core claims or each other.
    pub fn register_adder(&mut self, adder: Box<dyn ClaimsAdder>) {
        self.adders.push(adder);
    }

    pub async fn get_claims(&self, user_id: &str) -> AuthGridResult<Vec<Claim>> {
        // 1. A missing or disabled user gets no claims.
        let Some(user) = self.user_repo.find_by_user_id(user_id).await? else {
            return Ok(Vec::new());
        };
        if user.disabled {
            return Ok(Vec::new());
        }

        let mut claims = Vec::new();

        // 2. Packed permissions of the directly assigned roles.
        let mut packed: Vec<String> = self
            .role_repo
            .find_many(&user.roles)
            .await?
            .into_iter()
            .map(|r| r.packed_permissions)
            .collect();

        // 3. Tenant context: auto-granted role permissions plus the
        //    multi-tenant metadata claims.
        let tenant = match user.tenant_id {
            Some(id) if self.config.tenant_mode.tenants_active() => {
                self.tenant_repo.find_by_id(id).await?
            }
            _ => None,
        };
        if let Some(tenant) = &tenant {
            let auto_packed = self
                .role_repo
                .find_many(&tenant.roles)
                .await?
                .into_iter()
                .filter(|r| r.role_type == RoleType::TenantAutoAdd)
                .map(|r| r.packed_permissions);
            packed.extend(auto_packed);
        }

        // 4. Union by character value; one effective-permissions claim.
        let effective = union_packed(packed);
        if !effective.is_empty() {
            claims.push(Claim::new(PERMISSIONS_CLAIM_TYPE, effective));
        }

        // 5. Multi-tenant metadata.
        if let Some(tenant) = &tenant {
            claims.push(Claim::new(DATA_KEY_CLAIM_TYPE, tenant.data_key()));
            if self.config.sharding {
                if let Some(database) = &tenant.database_info_name {
                    claims.push(Claim::new(DATABASE_INFO_CLAIM_TYPE, database.clone()));
                }
            }
        }

        // 6. Extension claims, in registration order.
        for adder in &self.adders {
            if let Some(claim) = adder.add_claim_to_user(user_id).await {
                claims.push(claim);
            }
        }

        Ok(claims)
    }
}
