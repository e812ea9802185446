//! SurrealDB implementation of [`TenantRepository`].
//!
//! Tenant record ids are numeric, allocated from the `sequence:tenant`
//! counter row. Batch mutations (`update_paths`, `update_sharding`,
//! `delete_many`) are issued as one multi-statement query each, which
//! SurrealDB executes as a single atomic transaction.

use authgrid_core::error::AuthGridResult;
use authgrid_core::models::tenant::{
    CreateTenant, TENANT_PATH_DELIMITER, Tenant, TenantPathUpdate,
};
use authgrid_core::repository::TenantRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

/// DB-side row struct for queries where the numeric id is already
/// known.
#[derive(Debug, SurrealValue)]
struct TenantRow {
    full_name: String,
    parent_id: Option<i64>,
    parent_data_key: Option<String>,
    is_hierarchical: bool,
    has_own_db: Option<bool>,
    database_info_name: Option<String>,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRow {
    fn into_tenant(self, id: i64) -> Tenant {
        Tenant {
            id,
            full_name: self.full_name,
            parent_id: self.parent_id,
            parent_data_key: self.parent_data_key,
            is_hierarchical: self.is_hierarchical,
            has_own_db: self.has_own_db,
            database_info_name: self.database_info_name,
            roles: self.roles,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
    record_id: i64,
    full_name: String,
    parent_id: Option<i64>,
    parent_data_key: Option<String>,
    is_hierarchical: bool,
    has_own_db: Option<bool>,
    database_info_name: Option<String>,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRowWithId {
    fn into_tenant(self) -> Tenant {
        Tenant {
            id: self.record_id,
            full_name: self.full_name,
            parent_id: self.parent_id,
            parent_data_key: self.parent_data_key,
            is_hierarchical: self.is_hierarchical,
            has_own_db: self.has_own_db,
            database_info_name: self.database_info_name,
            roles: self.roles,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Row struct for the id sequence.
#[derive(Debug, SurrealValue)]
struct SequenceRow {
    value: i64,
}

const SELECT_WITH_ID: &str = "SELECT meta::id(id) AS record_id, * FROM tenant";

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Allocate the next tenant id from the counter row. The increment
    /// is atomic; an id burned by a later create failure is harmless.
    async fn next_tenant_id(&self) -> Result<i64, DbError> {
        let mut result = self
            .db
            .query("UPDATE sequence:tenant SET value += 1 RETURN AFTER")
            .await?;
        let rows: Vec<SequenceRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|r| r.value)
            .ok_or_else(|| DbError::Migration("tenant id sequence row missing".into()))
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> AuthGridResult<Tenant> {
        let id = self.next_tenant_id().await?;

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 full_name = $full_name, \
                 parent_id = $parent_id, \
                 parent_data_key = $parent_data_key, \
                 is_hierarchical = $is_hierarchical, \
                 has_own_db = $has_own_db, \
                 database_info_name = $database_info_name, \
                 roles = $roles",
            )
            .bind(("id", id))
            .bind(("full_name", input.full_name))
            .bind(("parent_id", input.parent_id))
            .bind(("parent_data_key", input.parent_data_key))
            .bind(("is_hierarchical", input.is_hierarchical))
            .bind(("has_own_db", input.has_own_db))
            .bind(("database_info_name", input.database_info_name))
            .bind(("roles", input.roles))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_tenant(id))
    }

    async fn find_by_id(&self, id: i64) -> AuthGridResult<Option<Tenant>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('tenant', $id)")
            .bind(("id", id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(|row| row.into_tenant(id)))
    }

    async fn find_by_full_name(&self, full_name: &str) -> AuthGridResult<Option<Tenant>> {
        let query = format!("{SELECT_WITH_ID} WHERE full_name = $full_name");
        let mut result = self
            .db
            .query(query)
            .bind(("full_name", full_name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(TenantRowWithId::into_tenant))
    }

    async fn list(&self) -> AuthGridResult<Vec<Tenant>> {
        let query = format!("{SELECT_WITH_ID} ORDER BY full_name ASC");
        let mut result = self.db.query(query).await.map_err(DbError::from)?;
        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(TenantRowWithId::into_tenant).collect())
    }

    async fn children_of(&self, id: i64) -> AuthGridResult<Vec<Tenant>> {
        let query = format!("{SELECT_WITH_ID} WHERE parent_id = $parent_id ORDER BY full_name ASC");
        let mut result = self
            .db
            .query(query)
            .bind(("parent_id", id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(TenantRowWithId::into_tenant).collect())
    }

    async fn load_subtree(&self, full_name: &str) -> AuthGridResult<Vec<Tenant>> {
        // The tenant itself plus every descendant. The prefix includes
        // the path delimiter so "West" does not match "Western".
        let prefix = format!("{full_name}{TENANT_PATH_DELIMITER}");
        let query = format!(
            "{SELECT_WITH_ID} WHERE full_name = $full_name \
             OR string::starts_with(full_name, $prefix) \
             ORDER BY full_name ASC"
        );
        let mut result = self
            .db
            .query(query)
            .bind(("full_name", full_name.to_string()))
            .bind(("prefix", prefix))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(TenantRowWithId::into_tenant).collect())
    }

    async fn tenants_with_role(&self, role_name: &str) -> AuthGridResult<Vec<Tenant>> {
        let query = format!("{SELECT_WITH_ID} WHERE roles CONTAINS $role_name ORDER BY full_name ASC");
        let mut result = self
            .db
            .query(query)
            .bind(("role_name", role_name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(TenantRowWithId::into_tenant).collect())
    }

    async fn update_roles(&self, id: i64, roles: Vec<String>) -> AuthGridResult<Tenant> {
        let result = self
            .db
            .query(
                "UPDATE type::record('tenant', $id) SET \
                 roles = $roles, updated_at = time::now()",
            )
            .bind(("id", id))
            .bind(("roles", roles))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_tenant(id))
    }

    async fn update_paths(&self, updates: &[TenantPathUpdate]) -> AuthGridResult<()> {
        if updates.is_empty() {
            return Ok(());
        }

        // One statement per tenant, all in a single query so the whole
        // batch commits atomically.
        let mut statements = Vec::with_capacity(updates.len());
        for index in 0..updates.len() {
            statements.push(format!(
                "UPDATE type::record('tenant', $id_{index}) SET \
                 full_name = $full_name_{index}, \
                 parent_id = $parent_id_{index}, \
                 parent_data_key = $parent_data_key_{index}, \
                 updated_at = time::now();"
            ));
        }

        let mut builder = self.db.query(statements.join(" "));
        for (index, update) in updates.iter().enumerate() {
            builder = builder
                .bind((format!("id_{index}"), update.id))
                .bind((format!("full_name_{index}"), update.full_name.clone()))
                .bind((format!("parent_id_{index}"), update.parent_id))
                .bind((
                    format!("parent_data_key_{index}"),
                    update.parent_data_key.clone(),
                ));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn update_sharding(
        &self,
        ids: &[i64],
        has_own_db: Option<bool>,
        database_info_name: Option<String>,
    ) -> AuthGridResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        self.db
            .query(
                "UPDATE tenant SET \
                 has_own_db = $has_own_db, \
                 database_info_name = $database_info_name, \
                 updated_at = time::now() \
                 WHERE meta::id(id) IN $ids",
            )
            .bind(("has_own_db", has_own_db))
            .bind(("database_info_name", database_info_name))
            .bind(("ids", ids.to_vec()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn delete_many(&self, ids: &[i64]) -> AuthGridResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        self.db
            .query("DELETE tenant WHERE meta::id(id) IN $ids")
            .bind(("ids", ids.to_vec()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn any_other_with_own_db(
        &self,
        database_info_name: &str,
        exclude_ids: &[i64],
    ) -> AuthGridResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM tenant \
                 WHERE database_info_name = $database_info_name \
                 AND has_own_db = true \
                 AND meta::id(id) NOT IN $exclude_ids \
                 GROUP ALL",
            )
            .bind(("database_info_name", database_info_name.to_string()))
            .bind(("exclude_ids", exclude_ids.to_vec()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }
}
