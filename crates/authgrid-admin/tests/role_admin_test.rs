//! Integration tests for the role registry using in-memory SurrealDB.

use std::sync::Arc;

use authgrid_admin::roles::RoleAdminService;
use authgrid_core::models::role::RoleType;
use authgrid_core::models::tenant::CreateTenant;
use authgrid_core::models::user::CreateAuthUser;
use authgrid_core::permissions::PermissionSet;
use authgrid_core::repository::{AuthUserRepository, TenantRepository};
use authgrid_core::status::ErrorKind;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

type RoleService = RoleAdminService<
    authgrid_db::repository::SurrealRoleRepository<Db>,
    authgrid_db::repository::SurrealAuthUserRepository<Db>,
    authgrid_db::repository::SurrealTenantRepository<Db>,
>;

fn permissions() -> Arc<PermissionSet> {
    Arc::new(
        PermissionSet::builder()
            .permission("StockRead", 10)
            .permission("StockAddNew", 11)
            .permission("SalesSell", 20)
            .build()
            .unwrap(),
    )
}

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> (Surreal<Db>, RoleService) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    authgrid_db::run_migrations(&db).await.unwrap();

    let svc = RoleAdminService::new(
        permissions(),
        authgrid_db::repository::SurrealRoleRepository::new(db.clone()),
        authgrid_db::repository::SurrealAuthUserRepository::new(db.clone()),
        authgrid_db::repository::SurrealTenantRepository::new(db.clone()),
    );
    (db, svc)
}

async fn seed_user(db: &Surreal<Db>, user_id: &str, tenant_id: Option<i64>, roles: Vec<String>) {
    authgrid_db::repository::SurrealAuthUserRepository::new(db.clone())
        .create(CreateAuthUser {
            user_id: user_id.into(),
            email: Some(format!("{user_id}@example.com")),
            user_name: None,
            tenant_id,
            roles,
        })
        .await
        .unwrap();
}

// -----------------------------------------------------------------------
// create_role
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_role_packs_the_permissions() {
    let (_db, svc) = setup().await;

    let status = svc
        .create_role(
            "Stock Manager",
            &["StockRead".into(), "StockAddNew".into()],
            "Manages stock",
            RoleType::Normal,
        )
        .await;
    assert!(status.is_valid(), "errors: {:?}", status.errors());
    let role = status.into_result().unwrap();

    let codes: Vec<u32> = role.packed_permissions.chars().map(u32::from).collect();
    assert_eq!(codes, vec![10, 11]);
}

#[tokio::test]
async fn create_role_reports_every_unknown_permission() {
    let (_db, svc) = setup().await;

    let status = svc
        .create_role(
            "Broken",
            &["StockRead".into(), "Bogus1".into(), "Bogus2".into()],
            "",
            RoleType::Normal,
        )
        .await;

    assert!(!status.is_valid());
    assert_eq!(status.errors().len(), 2);
    assert!(status.errors().iter().all(|e| e.kind == ErrorKind::NotFound));
    assert!(svc.find_role("Broken").await.unwrap().is_none());
}

#[tokio::test]
async fn create_role_rejects_duplicates_and_empty_names() {
    let (_db, svc) = setup().await;

    let status = svc.create_role("", &[], "", RoleType::Normal).await;
    assert_eq!(status.errors()[0].kind, ErrorKind::Validation);

    svc.create_role("Support", &[], "", RoleType::Normal)
        .await
        .into_result()
        .unwrap();
    let status = svc.create_role("Support", &[], "", RoleType::Normal).await;
    assert_eq!(status.errors()[0].kind, ErrorKind::Conflict);
}

// -----------------------------------------------------------------------
// update_role
// -----------------------------------------------------------------------

#[tokio::test]
async fn update_role_replaces_the_definition() {
    let (_db, svc) = setup().await;

    svc.create_role("Support", &["StockRead".into()], "old", RoleType::Normal)
        .await
        .into_result()
        .unwrap();

    let updated = svc
        .update_role("Support", &["SalesSell".into()], "new", RoleType::Normal)
        .await
        .into_result()
        .unwrap();
    assert_eq!(updated.description, "new");
    let codes: Vec<u32> = updated.packed_permissions.chars().map(u32::from).collect();
    assert_eq!(codes, vec![20]);
}

#[tokio::test]
async fn update_to_tenant_type_fails_for_non_tenant_holders() {
    let (db, svc) = setup().await;

    svc.create_role("Support", &[], "", RoleType::Normal)
        .await
        .into_result()
        .unwrap();
    seed_user(&db, "appuser", None, vec!["Support".into()]).await;

    let status = svc
        .update_role("Support", &[], "", RoleType::TenantAdminAdd)
        .await;
    assert!(!status.is_valid());
    assert_eq!(status.errors()[0].kind, ErrorKind::Conflict);
    assert!(status.errors()[0].message.contains("appuser@example.com"));

    // Unchanged in the store.
    let role = svc.find_role("Support").await.unwrap().unwrap();
    assert_eq!(role.role_type, RoleType::Normal);
}

#[tokio::test]
async fn update_to_hidden_fails_for_tenant_holders() {
    let (db, svc) = setup().await;

    svc.create_role("Support", &[], "", RoleType::Normal)
        .await
        .into_result()
        .unwrap();
    seed_user(&db, "tenantuser", Some(1), vec!["Support".into()]).await;

    let status = svc
        .update_role("Support", &[], "", RoleType::HiddenFromTenant)
        .await;
    assert!(!status.is_valid());
    assert!(status.errors()[0].message.contains("tenantuser@example.com"));
}

#[tokio::test]
async fn update_away_from_tenant_type_fails_while_tenants_carry_it() {
    let (db, svc) = setup().await;

    svc.create_role("Auto", &[], "", RoleType::TenantAutoAdd)
        .await
        .into_result()
        .unwrap();
    authgrid_db::repository::SurrealTenantRepository::new(db.clone())
        .create(CreateTenant {
            full_name: "Acme".into(),
            parent_id: None,
            parent_data_key: None,
            is_hierarchical: false,
            has_own_db: None,
            database_info_name: None,
            roles: vec!["Auto".into()],
        })
        .await
        .unwrap();

    let status = svc.update_role("Auto", &[], "", RoleType::Normal).await;
    assert!(!status.is_valid());
    assert!(status.errors()[0].message.contains("Acme"));
}

#[tokio::test]
async fn update_missing_role_is_not_found() {
    let (_db, svc) = setup().await;

    let status = svc.update_role("Ghost", &[], "", RoleType::Normal).await;
    assert_eq!(status.errors()[0].kind, ErrorKind::NotFound);
}

// -----------------------------------------------------------------------
// delete_role
// -----------------------------------------------------------------------

#[tokio::test]
async fn delete_role_lists_every_holder_unless_forced() {
    let (db, svc) = setup().await;

    svc.create_role("Auto", &[], "", RoleType::TenantAutoAdd)
        .await
        .into_result()
        .unwrap();
    seed_user(&db, "holder", Some(1), vec!["Auto".into()]).await;
    let tenant_repo = authgrid_db::repository::SurrealTenantRepository::new(db.clone());
    tenant_repo
        .create(CreateTenant {
            full_name: "Acme".into(),
            parent_id: None,
            parent_data_key: None,
            is_hierarchical: false,
            has_own_db: None,
            database_info_name: None,
            roles: vec!["Auto".into()],
        })
        .await
        .unwrap();

    let status = svc.delete_role("Auto", false).await;
    assert!(!status.is_valid());
    assert_eq!(status.errors().len(), 2);
    assert!(status.errors().iter().all(|e| e.kind == ErrorKind::InUse));
    assert!(svc.find_role("Auto").await.unwrap().is_some());

    // Forced: stripped from all holders, then removed.
    let status = svc.delete_role("Auto", true).await;
    assert!(status.is_valid(), "errors: {:?}", status.errors());
    assert!(svc.find_role("Auto").await.unwrap().is_none());

    let user_repo = authgrid_db::repository::SurrealAuthUserRepository::new(db.clone());
    assert!(user_repo.find_by_user_id("holder").await.unwrap().unwrap().roles.is_empty());
    let tenants = tenant_repo.tenants_with_role("Auto").await.unwrap();
    assert!(tenants.is_empty());
}

#[tokio::test]
async fn delete_unused_role_needs_no_force() {
    let (_db, svc) = setup().await;

    svc.create_role("Support", &[], "", RoleType::Normal)
        .await
        .into_result()
        .unwrap();
    svc.delete_role("Support", false).await.into_result().unwrap();
    assert!(svc.find_role("Support").await.unwrap().is_none());
}

// -----------------------------------------------------------------------
// resolve_roles
// -----------------------------------------------------------------------

#[tokio::test]
async fn resolve_roles_reports_every_missing_name() {
    let (_db, svc) = setup().await;

    svc.create_role("Support", &[], "", RoleType::Normal)
        .await
        .into_result()
        .unwrap();

    let status = svc
        .resolve_roles(&["Support".into(), "Ghost1".into(), "Ghost2".into()])
        .await;

    assert_eq!(status.errors().len(), 2);
    assert!(status.errors().iter().all(|e| e.kind == ErrorKind::NotFound));
    // The found subset is still available alongside the errors.
    let found = status.result().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Support");
}
