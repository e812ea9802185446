//! Integration tests for the claims calculator, including the
//! end-to-end tenant → user → claims scenario.

use async_trait::async_trait;
use authgrid_admin::claims::ClaimsCalcService;
use authgrid_admin::config::{AdminConfig, TenantMode};
use authgrid_admin::tenants::{CreateSingleTenantInput, TenantAdminService};
use authgrid_admin::users::{AddUserInput, UserAdminService};
use authgrid_core::claims::{
    Claim, ClaimsAdder, DATA_KEY_CLAIM_TYPE, DATABASE_INFO_CLAIM_TYPE, PERMISSIONS_CLAIM_TYPE,
};
use authgrid_core::models::role::{CreateRole, RoleType};
use authgrid_core::models::tenant::{CreateTenant, Tenant};
use authgrid_core::models::user::CreateAuthUser;
use authgrid_core::repository::{AuthUserRepository, RoleRepository, TenantRepository};
use authgrid_core::tenant_change::{TenantChangeHandler, TenantDataMove};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

/// Change handler that accepts everything.
struct AcceptAll;

impl TenantChangeHandler for AcceptAll {
    async fn create_new_tenant(&self, _tenant: &Tenant) -> Result<(), String> {
        Ok(())
    }
    async fn single_tenant_delete(&self, _tenant: &Tenant) -> Result<(), String> {
        Ok(())
    }
    async fn hierarchical_tenant_delete(&self, _tenants: &[Tenant]) -> Result<(), String> {
        Ok(())
    }
    async fn single_tenant_update_name(&self, _tenant: &Tenant) -> Result<(), String> {
        Ok(())
    }
    async fn hierarchical_tenant_update_name(&self, _tenants: &[Tenant]) -> Result<(), String> {
        Ok(())
    }
    async fn move_hierarchical_tenant_data(&self, _moves: &[TenantDataMove]) -> Result<(), String> {
        Ok(())
    }
    async fn move_to_different_database(
        &self,
        _old_database_info_name: &str,
        _old_data_key: &str,
        _updated_tenant: &Tenant,
    ) -> Result<(), String> {
        Ok(())
    }
}

/// Adder returning a fixed claim.
struct FixedClaim(Claim);

#[async_trait]
impl ClaimsAdder for FixedClaim {
    async fn add_claim_to_user(&self, _user_id: &str) -> Option<Claim> {
        Some(self.0.clone())
    }
}

/// Adder that contributes nothing.
struct NoClaim;

#[async_trait]
impl ClaimsAdder for NoClaim {
    async fn add_claim_to_user(&self, _user_id: &str) -> Option<Claim> {
        None
    }
}

async fn setup_db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    authgrid_db::run_migrations(&db).await.unwrap();
    db
}

fn claims_service(
    db: &Surreal<Db>,
    config: AdminConfig,
) -> ClaimsCalcService<
    authgrid_db::repository::SurrealAuthUserRepository<Db>,
    authgrid_db::repository::SurrealRoleRepository<Db>,
    authgrid_db::repository::SurrealTenantRepository<Db>,
> {
    ClaimsCalcService::new(
        config,
        authgrid_db::repository::SurrealAuthUserRepository::new(db.clone()),
        authgrid_db::repository::SurrealRoleRepository::new(db.clone()),
        authgrid_db::repository::SurrealTenantRepository::new(db.clone()),
    )
}

fn single_config() -> AdminConfig {
    AdminConfig {
        tenant_mode: TenantMode::SingleLevel,
        sharding: false,
    }
}

async fn seed_role(db: &Surreal<Db>, name: &str, role_type: RoleType, packed: &str) {
    authgrid_db::repository::SurrealRoleRepository::new(db.clone())
        .create(CreateRole {
            name: name.into(),
            description: String::new(),
            role_type,
            packed_permissions: packed.into(),
        })
        .await
        .unwrap();
}

async fn seed_user(db: &Surreal<Db>, user_id: &str, tenant_id: Option<i64>, roles: Vec<String>) {
    authgrid_db::repository::SurrealAuthUserRepository::new(db.clone())
        .create(CreateAuthUser {
            user_id: user_id.into(),
            email: None,
            user_name: None,
            tenant_id,
            roles,
        })
        .await
        .unwrap();
}

// -----------------------------------------------------------------------
// Core behavior
// -----------------------------------------------------------------------

#[tokio::test]
async fn missing_or_disabled_user_gets_no_claims() {
    let db = setup_db().await;
    let svc = claims_service(&db, single_config());

    assert!(svc.get_claims("ghost").await.unwrap().is_empty());

    seed_user(&db, "ext-1", None, Vec::new()).await;
    authgrid_db::repository::SurrealAuthUserRepository::new(db.clone())
        .update(
            "ext-1",
            authgrid_core::models::user::UpdateAuthUser {
                disabled: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(svc.get_claims("ext-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn direct_role_permissions_union_by_character() {
    let db = setup_db().await;
    // Codes 10, 20 and 20, 30: the union must hold 10, 20, 30 once.
    seed_role(&db, "A", RoleType::Normal, "\u{a}\u{14}").await;
    seed_role(&db, "B", RoleType::Normal, "\u{14}\u{1e}").await;
    seed_user(&db, "ext-1", None, vec!["A".into(), "B".into()]).await;

    let svc = claims_service(&db, single_config());
    let claims = svc.get_claims("ext-1").await.unwrap();

    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].claim_type, PERMISSIONS_CLAIM_TYPE);
    let mut codes: Vec<u32> = claims[0].value.chars().map(u32::from).collect();
    codes.sort();
    assert_eq!(codes, vec![10, 20, 30]);
}

#[tokio::test]
async fn tenant_auto_add_roles_are_included() {
    let db = setup_db().await;
    seed_role(&db, "Direct", RoleType::Normal, "\u{a}").await;
    seed_role(&db, "Auto", RoleType::TenantAutoAdd, "\u{14}").await;
    seed_role(&db, "Admin Add", RoleType::TenantAdminAdd, "\u{1e}").await;

    let tenant = authgrid_db::repository::SurrealTenantRepository::new(db.clone())
        .create(CreateTenant {
            full_name: "Acme".into(),
            parent_id: None,
            parent_data_key: None,
            is_hierarchical: false,
            has_own_db: None,
            database_info_name: None,
            // Auto roles flow to every tenant user; admin-add roles
            // only when assigned directly.
            roles: vec!["Auto".into(), "Admin Add".into()],
        })
        .await
        .unwrap();
    seed_user(&db, "ext-1", Some(tenant.id), vec!["Direct".into()]).await;

    let svc = claims_service(&db, single_config());
    let claims = svc.get_claims("ext-1").await.unwrap();

    let permissions = claims
        .iter()
        .find(|c| c.claim_type == PERMISSIONS_CLAIM_TYPE)
        .unwrap();
    let mut codes: Vec<u32> = permissions.value.chars().map(u32::from).collect();
    codes.sort();
    assert_eq!(codes, vec![10, 20], "admin-add role must not auto-flow");

    let data_key = claims
        .iter()
        .find(|c| c.claim_type == DATA_KEY_CLAIM_TYPE)
        .unwrap();
    assert_eq!(data_key.value, tenant.id.to_string());
}

#[tokio::test]
async fn tenant_claims_respect_mode_and_sharding() {
    let db = setup_db().await;
    let tenant = authgrid_db::repository::SurrealTenantRepository::new(db.clone())
        .create(CreateTenant {
            full_name: "Acme".into(),
            parent_id: None,
            parent_data_key: None,
            is_hierarchical: false,
            has_own_db: Some(true),
            database_info_name: Some("shard-1".into()),
            roles: Vec::new(),
        })
        .await
        .unwrap();
    seed_user(&db, "ext-1", Some(tenant.id), Vec::new()).await;

    // Multi-tenancy off: no tenant claims at all.
    let svc = claims_service(&db, AdminConfig::default());
    assert!(svc.get_claims("ext-1").await.unwrap().is_empty());

    // Tenants on, sharding off: data key but no database claim.
    let svc = claims_service(&db, single_config());
    let claims = svc.get_claims("ext-1").await.unwrap();
    assert!(claims.iter().any(|c| c.claim_type == DATA_KEY_CLAIM_TYPE));
    assert!(!claims.iter().any(|c| c.claim_type == DATABASE_INFO_CLAIM_TYPE));

    // Sharding on: the database claim appears.
    let svc = claims_service(
        &db,
        AdminConfig {
            tenant_mode: TenantMode::SingleLevel,
            sharding: true,
        },
    );
    let claims = svc.get_claims("ext-1").await.unwrap();
    let database = claims
        .iter()
        .find(|c| c.claim_type == DATABASE_INFO_CLAIM_TYPE)
        .unwrap();
    assert_eq!(database.value, "shard-1");
}

// -----------------------------------------------------------------------
// Claims adders
// -----------------------------------------------------------------------

#[tokio::test]
async fn adders_run_in_registration_order_and_none_is_skipped() {
    let db = setup_db().await;
    seed_user(&db, "ext-1", None, Vec::new()).await;

    let mut svc = claims_service(&db, single_config());
    svc.register_adder(Box::new(FixedClaim(Claim::new("first", "1"))));
    svc.register_adder(Box::new(NoClaim));
    svc.register_adder(Box::new(FixedClaim(Claim::new("second", "2"))));

    let claims = svc.get_claims("ext-1").await.unwrap();
    assert_eq!(
        claims,
        vec![Claim::new("first", "1"), Claim::new("second", "2")]
    );
}

#[tokio::test]
async fn adder_claims_are_not_deduplicated() {
    // Inherited behavior, kept deliberately: two adders emitting the
    // same claim type both survive, even against a core claim type.
    let db = setup_db().await;
    seed_role(&db, "A", RoleType::Normal, "\u{a}").await;
    seed_user(&db, "ext-1", None, vec!["A".into()]).await;

    let mut svc = claims_service(&db, single_config());
    svc.register_adder(Box::new(FixedClaim(Claim::new(PERMISSIONS_CLAIM_TYPE, "x"))));
    svc.register_adder(Box::new(FixedClaim(Claim::new(PERMISSIONS_CLAIM_TYPE, "x"))));

    let claims = svc.get_claims("ext-1").await.unwrap();
    let permission_claims: Vec<&Claim> = claims
        .iter()
        .filter(|c| c.claim_type == PERMISSIONS_CLAIM_TYPE)
        .collect();
    assert_eq!(permission_claims.len(), 3);
}

// -----------------------------------------------------------------------
// End-to-end scenario
// -----------------------------------------------------------------------

#[tokio::test]
async fn tenant_user_claims_end_to_end() {
    let db = setup_db().await;
    let config = single_config();

    // Role with known permission codes.
    seed_role(&db, "Tenant Admin", RoleType::TenantAdminAdd, "\u{a}\u{14}\u{1e}").await;

    let tenant_svc = TenantAdminService::new(
        config,
        authgrid_db::repository::SurrealTenantRepository::new(db.clone()),
        authgrid_db::repository::SurrealAuthUserRepository::new(db.clone()),
        authgrid_db::repository::SurrealRoleRepository::new(db.clone()),
        AcceptAll,
    );
    let tenant = tenant_svc
        .create_single_tenant(CreateSingleTenantInput {
            name: "Acme".into(),
            role_names: vec!["Tenant Admin".into()],
            ..Default::default()
        })
        .await
        .into_result()
        .unwrap();

    let user_svc = UserAdminService::new(
        config,
        authgrid_db::repository::SurrealAuthUserRepository::new(db.clone()),
        authgrid_db::repository::SurrealRoleRepository::new(db.clone()),
        authgrid_db::repository::SurrealTenantRepository::new(db.clone()),
    );
    user_svc
        .add_user(AddUserInput {
            user_id: "u1".into(),
            email: Some("u1@acme.example".into()),
            user_name: None,
            role_names: vec!["Tenant Admin".into()],
            tenant_name: Some("Acme".into()),
        })
        .await
        .into_result()
        .unwrap();

    let claims_svc = claims_service(&db, config);
    let claims = claims_svc.get_claims("u1").await.unwrap();

    let data_key = claims
        .iter()
        .find(|c| c.claim_type == DATA_KEY_CLAIM_TYPE)
        .unwrap();
    assert_eq!(data_key.value, tenant.id.to_string());

    let permissions = claims
        .iter()
        .find(|c| c.claim_type == PERMISSIONS_CLAIM_TYPE)
        .unwrap();
    let mut codes: Vec<u32> = permissions.value.chars().map(u32::from).collect();
    codes.sort();
    assert_eq!(codes, vec![10, 20, 30]);
}
