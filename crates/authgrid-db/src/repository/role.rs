//! SurrealDB implementation of [`RoleRepository`].

use authgrid_core::error::AuthGridResult;
use authgrid_core::models::role::{CreateRole, Role, RoleType, UpdateRole};
use authgrid_core::repository::RoleRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

/// DB-side row struct for queries where the role name is already known.
#[derive(Debug, SurrealValue)]
struct RoleRow {
    description: String,
    role_type: String,
    packed_permissions: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self, name: String) -> Result<Role, DbError> {
        let role_type = RoleType::parse(&self.role_type)
            .ok_or_else(|| DbError::Decode(format!("invalid role type: {}", self.role_type)))?;
        Ok(Role {
            name,
            description: self.description,
            role_type,
            packed_permissions: self.packed_permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct RoleRowWithId {
    record_id: String,
    description: String,
    role_type: String,
    packed_permissions: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRowWithId {
    fn try_into_role(self) -> Result<Role, DbError> {
        let role_type = RoleType::parse(&self.role_type)
            .ok_or_else(|| DbError::Decode(format!("invalid role type: {}", self.role_type)))?;
        Ok(Role {
            name: self.record_id,
            description: self.description,
            role_type,
            packed_permissions: self.packed_permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> AuthGridResult<Role> {
        let result = self
            .db
            .query(
                "CREATE type::record('role', $name) SET \
                 description = $description, \
                 role_type = $role_type, \
                 packed_permissions = $packed_permissions",
            )
            .bind(("name", input.name.clone()))
            .bind(("description", input.description))
            .bind(("role_type", input.role_type.as_str().to_string()))
            .bind(("packed_permissions", input.packed_permissions))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: input.name.clone(),
        })?;

        Ok(row.into_role(input.name)?)
    }

    async fn find_by_name(&self, name: &str) -> AuthGridResult<Option<Role>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('role', $name)")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_role(name.to_string())?)),
            None => Ok(None),
        }
    }

    async fn find_many(&self, names: &[String]) -> AuthGridResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE meta::id(id) IN $names",
            )
            .bind(("names", names.to_vec()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        let roles = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(roles)
    }

    async fn update(&self, name: &str, input: UpdateRole) -> AuthGridResult<Role> {
        let result = self
            .db
            .query(
                "UPDATE type::record('role', $name) SET \
                 description = $description, \
                 role_type = $role_type, \
                 packed_permissions = $packed_permissions, \
                 updated_at = time::now()",
            )
            .bind(("name", name.to_string()))
            .bind(("description", input.description))
            .bind(("role_type", input.role_type.as_str().to_string()))
            .bind(("packed_permissions", input.packed_permissions))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: name.to_string(),
        })?;

        Ok(row.into_role(name.to_string())?)
    }

    async fn delete(&self, name: &str) -> AuthGridResult<()> {
        self.db
            .query("DELETE type::record('role', $name)")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn delete_and_detach(&self, name: &str) -> AuthGridResult<()> {
        // One multi-statement query so strip + delete commit atomically.
        self.db
            .query(
                "UPDATE authuser SET roles -= $name, \
                 updated_at = time::now() WHERE roles CONTAINS $name; \
                 UPDATE tenant SET roles -= $name, \
                 updated_at = time::now() WHERE roles CONTAINS $name; \
                 DELETE type::record('role', $name);",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self) -> AuthGridResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 ORDER BY created_at ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        let roles = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(roles)
    }
}
