//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! Role names and external user ids double as record ids; tenant
//! record ids are numeric, allocated from the `sequence` table. Enums
//! are stored as strings with ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Roles (record id = role name)
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD description ON TABLE role TYPE string;
DEFINE FIELD role_type ON TABLE role TYPE string \
    ASSERT $value IN ['Normal', 'HiddenFromTenant', 'TenantAutoAdd', \
    'TenantAdminAdd'];
DEFINE FIELD packed_permissions ON TABLE role TYPE string;
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Tenants (record id = numeric id from the sequence table)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD full_name ON TABLE tenant TYPE string;
DEFINE FIELD parent_id ON TABLE tenant TYPE option<int>;
DEFINE FIELD parent_data_key ON TABLE tenant TYPE option<string>;
DEFINE FIELD is_hierarchical ON TABLE tenant TYPE bool;
DEFINE FIELD has_own_db ON TABLE tenant TYPE option<bool>;
DEFINE FIELD database_info_name ON TABLE tenant TYPE option<string>;
DEFINE FIELD roles ON TABLE tenant TYPE array<string> DEFAULT [];
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_full_name ON TABLE tenant \
    COLUMNS full_name UNIQUE;

-- =======================================================================
-- AuthUsers (record id = external user id)
-- =======================================================================
DEFINE TABLE authuser SCHEMAFULL;
DEFINE FIELD email ON TABLE authuser TYPE option<string>;
DEFINE FIELD user_name ON TABLE authuser TYPE option<string>;
DEFINE FIELD disabled ON TABLE authuser TYPE bool DEFAULT false;
DEFINE FIELD tenant_id ON TABLE authuser TYPE option<int>;
DEFINE FIELD roles ON TABLE authuser TYPE array<string> DEFAULT [];
DEFINE FIELD created_at ON TABLE authuser TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE authuser TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Id sequences
-- =======================================================================
DEFINE TABLE sequence SCHEMAFULL;
DEFINE FIELD value ON TABLE sequence TYPE int;
CREATE sequence:tenant SET value = 0;
";

/// Apply all pending migrations.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
