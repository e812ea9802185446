//! Integration tests for the Role repository implementation using
//! in-memory SurrealDB.

use authgrid_core::models::role::{CreateRole, RoleType, UpdateRole};
use authgrid_core::models::tenant::CreateTenant;
use authgrid_core::models::user::CreateAuthUser;
use authgrid_core::repository::{AuthUserRepository, RoleRepository, TenantRepository};
use authgrid_db::repository::{
    SurrealAuthUserRepository, SurrealRoleRepository, SurrealTenantRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    authgrid_db::run_migrations(&db).await.unwrap();
    db
}

fn create_input(name: &str, role_type: RoleType) -> CreateRole {
    CreateRole {
        name: name.into(),
        description: format!("{name} role"),
        role_type,
        packed_permissions: "\u{a}\u{14}".into(),
    }
}

#[tokio::test]
async fn create_and_find_role() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);

    let role = repo
        .create(create_input("Stock Manager", RoleType::Normal))
        .await
        .unwrap();

    assert_eq!(role.name, "Stock Manager");
    assert_eq!(role.role_type, RoleType::Normal);
    assert_eq!(role.packed_permissions, "\u{a}\u{14}");

    let fetched = repo.find_by_name("Stock Manager").await.unwrap().unwrap();
    assert_eq!(fetched.name, role.name);
    assert_eq!(fetched.description, "Stock Manager role");

    assert!(repo.find_by_name("Nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn find_many_returns_only_existing_roles() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);

    repo.create(create_input("A", RoleType::Normal)).await.unwrap();
    repo.create(create_input("B", RoleType::TenantAutoAdd))
        .await
        .unwrap();

    let found = repo
        .find_many(&["A".into(), "Missing".into(), "B".into()])
        .await
        .unwrap();

    let mut names: Vec<_> = found.iter().map(|r| r.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
}

#[tokio::test]
async fn update_role_replaces_definition() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);

    let role = repo
        .create(create_input("Support", RoleType::Normal))
        .await
        .unwrap();

    let updated = repo
        .update(
            "Support",
            UpdateRole {
                description: "Support staff".into(),
                role_type: RoleType::TenantAdminAdd,
                packed_permissions: "\u{1e}".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.description, "Support staff");
    assert_eq!(updated.role_type, RoleType::TenantAdminAdd);
    assert_eq!(updated.packed_permissions, "\u{1e}");
    assert!(updated.updated_at >= role.updated_at);
}

#[tokio::test]
async fn delete_and_detach_strips_role_everywhere() {
    let db = setup().await;
    let role_repo = SurrealRoleRepository::new(db.clone());
    let tenant_repo = SurrealTenantRepository::new(db.clone());
    let user_repo = SurrealAuthUserRepository::new(db);

    role_repo
        .create(create_input("Tenant Admin", RoleType::TenantAdminAdd))
        .await
        .unwrap();

    let tenant = tenant_repo
        .create(CreateTenant {
            full_name: "Acme".into(),
            parent_id: None,
            parent_data_key: None,
            is_hierarchical: false,
            has_own_db: None,
            database_info_name: None,
            roles: vec!["Tenant Admin".into()],
        })
        .await
        .unwrap();

    user_repo
        .create(CreateAuthUser {
            user_id: "u1".into(),
            email: Some("u1@example.com".into()),
            user_name: None,
            tenant_id: Some(tenant.id),
            roles: vec!["Tenant Admin".into()],
        })
        .await
        .unwrap();

    role_repo.delete_and_detach("Tenant Admin").await.unwrap();

    assert!(role_repo.find_by_name("Tenant Admin").await.unwrap().is_none());
    let tenant = tenant_repo.find_by_id(tenant.id).await.unwrap().unwrap();
    assert!(tenant.roles.is_empty());
    let user = user_repo.find_by_user_id("u1").await.unwrap().unwrap();
    assert!(user.roles.is_empty());
}

#[tokio::test]
async fn list_roles() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);

    repo.create(create_input("First", RoleType::Normal)).await.unwrap();
    repo.create(create_input("Second", RoleType::HiddenFromTenant))
        .await
        .unwrap();

    let roles = repo.list().await.unwrap();
    assert_eq!(roles.len(), 2);
}
