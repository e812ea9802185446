//! SurrealDB implementation of [`AuthUserRepository`].
//!
//! The external user id doubles as the record id.

use authgrid_core::error::AuthGridResult;
use authgrid_core::models::user::{AuthUser, CreateAuthUser, UpdateAuthUser};
use authgrid_core::repository::AuthUserRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

/// DB-side row struct for queries where the user id is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    email: Option<String>,
    user_name: Option<String>,
    disabled: bool,
    tenant_id: Option<i64>,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, user_id: String) -> AuthUser {
        AuthUser {
            user_id,
            email: self.email,
            user_name: self.user_name,
            disabled: self.disabled,
            tenant_id: self.tenant_id,
            roles: self.roles,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    email: Option<String>,
    user_name: Option<String>,
    disabled: bool,
    tenant_id: Option<i64>,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRowWithId {
    fn into_user(self) -> AuthUser {
        AuthUser {
            user_id: self.record_id,
            email: self.email,
            user_name: self.user_name,
            disabled: self.disabled,
            tenant_id: self.tenant_id,
            roles: self.roles,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SELECT_WITH_ID: &str = "SELECT meta::id(id) AS record_id, * FROM authuser";

/// SurrealDB implementation of the AuthUser repository.
#[derive(Clone)]
pub struct SurrealAuthUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuthUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuthUserRepository for SurrealAuthUserRepository<C> {
    async fn create(&self, input: CreateAuthUser) -> AuthGridResult<AuthUser> {
        let result = self
            .db
            .query(
                "CREATE type::record('authuser', $user_id) SET \
                 email = $email, \
                 user_name = $user_name, \
                 disabled = false, \
                 tenant_id = $tenant_id, \
                 roles = $roles",
            )
            .bind(("user_id", input.user_id.clone()))
            .bind(("email", input.email))
            .bind(("user_name", input.user_name))
            .bind(("tenant_id", input.tenant_id))
            .bind(("roles", input.roles))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "authuser".into(),
            id: input.user_id.clone(),
        })?;

        Ok(row.into_user(input.user_id))
    }

    async fn find_by_user_id(&self, user_id: &str) -> AuthGridResult<Option<AuthUser>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('authuser', $user_id)")
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| row.into_user(user_id.to_string())))
    }

    async fn list(&self) -> AuthGridResult<Vec<AuthUser>> {
        let query = format!("{SELECT_WITH_ID} ORDER BY created_at ASC");
        let mut result = self.db.query(query).await.map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(UserRowWithId::into_user).collect())
    }

    async fn update(&self, user_id: &str, input: UpdateAuthUser) -> AuthGridResult<AuthUser> {
        let mut sets = Vec::new();
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.user_name.is_some() {
            sets.push("user_name = $user_name");
        }
        if input.disabled.is_some() {
            sets.push("disabled = $disabled");
        }
        if input.tenant_id.is_some() {
            sets.push("tenant_id = $tenant_id");
        }
        if input.roles.is_some() {
            sets.push("roles = $roles");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('authuser', $user_id) SET {}",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("user_id", user_id.to_string()));

        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(user_name) = input.user_name {
            builder = builder.bind(("user_name", user_name));
        }
        if let Some(disabled) = input.disabled {
            builder = builder.bind(("disabled", disabled));
        }
        if let Some(tenant_id) = input.tenant_id {
            // Inner None clears the tenant link.
            builder = builder.bind(("tenant_id", tenant_id));
        }
        if let Some(roles) = input.roles {
            builder = builder.bind(("roles", roles));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "authuser".into(),
            id: user_id.to_string(),
        })?;

        Ok(row.into_user(user_id.to_string()))
    }

    async fn delete(&self, user_id: &str) -> AuthGridResult<()> {
        self.db
            .query("DELETE type::record('authuser', $user_id)")
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn users_with_role(&self, role_name: &str) -> AuthGridResult<Vec<AuthUser>> {
        let query = format!("{SELECT_WITH_ID} WHERE roles CONTAINS $role_name ORDER BY created_at ASC");
        let mut result = self
            .db
            .query(query)
            .bind(("role_name", role_name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(UserRowWithId::into_user).collect())
    }

    async fn users_in_tenants(&self, tenant_ids: &[i64]) -> AuthGridResult<Vec<AuthUser>> {
        let query = format!("{SELECT_WITH_ID} WHERE tenant_id IN $tenant_ids ORDER BY created_at ASC");
        let mut result = self
            .db
            .query(query)
            .bind(("tenant_ids", tenant_ids.to_vec()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(UserRowWithId::into_user).collect())
    }
}
