//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. UUIDs are stored as strings and enums as
//! their SCREAMING_SNAKE names, guarded by ASSERT where the set is
//! closed. Polymorphic references are split into `*_type` / `*_id`
//! column pairs.

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
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants (global scope)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD slug ON TABLE tenant TYPE string;
DEFINE FIELD is_deleted ON TABLE tenant TYPE bool DEFAULT false;
DEFINE FIELD deleted_at ON TABLE tenant TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_slug ON TABLE tenant COLUMNS slug UNIQUE;

-- =======================================================================
-- Members (tenant scope, email unique system-wide)
-- =======================================================================
DEFINE TABLE member SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE member TYPE string;
DEFINE FIELD name ON TABLE member TYPE string;
DEFINE FIELD email ON TABLE member TYPE string;
DEFINE FIELD password_hash ON TABLE member TYPE string;
DEFINE FIELD role ON TABLE member TYPE string \
    ASSERT $value IN ['ADMIN', 'MANAGER', 'MEMBER'];
DEFINE FIELD is_deleted ON TABLE member TYPE bool DEFAULT false;
DEFINE FIELD deleted_at ON TABLE member TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE member TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE member TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_member_email ON TABLE member COLUMNS email UNIQUE;
DEFINE INDEX idx_member_tenant ON TABLE member COLUMNS tenant_id;

-- One record per tenant, keyed by tenant id. Whoever creates it is the
-- tenant's first member and becomes ADMIN.
DEFINE TABLE admin_seat SCHEMAFULL;
DEFINE FIELD member_id ON TABLE admin_seat TYPE string;
DEFINE FIELD claimed_at ON TABLE admin_seat TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Projects (tenant scope)
-- =======================================================================
DEFINE TABLE project SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE project TYPE string;
DEFINE FIELD name ON TABLE project TYPE string;
DEFINE FIELD description ON TABLE project TYPE string;
DEFINE FIELD creator_id ON TABLE project TYPE string;
DEFINE FIELD member_ids ON TABLE project TYPE array<string>;
DEFINE FIELD status ON TABLE project TYPE string \
    ASSERT $value IN ['ACTIVE', 'ARCHIVED', 'COMPLETED'];
DEFINE FIELD deadline ON TABLE project TYPE option<datetime>;
DEFINE FIELD is_deleted ON TABLE project TYPE bool DEFAULT false;
DEFINE FIELD deleted_at ON TABLE project TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE project TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE project TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_project_tenant ON TABLE project COLUMNS tenant_id;

-- =======================================================================
-- Tasks (tenant scope)
-- =======================================================================
DEFINE TABLE task SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE task TYPE string;
DEFINE FIELD project_id ON TABLE task TYPE string;
DEFINE FIELD title ON TABLE task TYPE string;
DEFINE FIELD description ON TABLE task TYPE string;
DEFINE FIELD assignee_id ON TABLE task TYPE option<string>;
DEFINE FIELD creator_id ON TABLE task TYPE string;
DEFINE FIELD status ON TABLE task TYPE string \
    ASSERT $value IN ['TODO', 'IN_PROGRESS', 'IN_REVIEW', 'DONE', \
    'BLOCKER'];
DEFINE FIELD priority ON TABLE task TYPE string \
    ASSERT $value IN ['LOW', 'MEDIUM', 'HIGH', 'URGENT'];
DEFINE FIELD due_date ON TABLE task TYPE option<datetime>;
DEFINE FIELD completed_at ON TABLE task TYPE option<datetime>;
DEFINE FIELD is_deleted ON TABLE task TYPE bool DEFAULT false;
DEFINE FIELD deleted_at ON TABLE task TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE task TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE task TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_task_tenant_project ON TABLE task \
    COLUMNS tenant_id, project_id;

-- =======================================================================
-- Comments (tenant scope)
-- =======================================================================
DEFINE TABLE comment SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE comment TYPE string;
DEFINE FIELD task_id ON TABLE comment TYPE string;
DEFINE FIELD author_id ON TABLE comment TYPE string;
DEFINE FIELD text ON TABLE comment TYPE string;
DEFINE FIELD mentions ON TABLE comment TYPE array<string>;
DEFINE FIELD is_deleted ON TABLE comment TYPE bool DEFAULT false;
DEFINE FIELD deleted_at ON TABLE comment TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE comment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_comment_tenant_task ON TABLE comment \
    COLUMNS tenant_id, task_id;

-- =======================================================================
-- Notifications (tenant scope, only `is_read` is ever updated)
-- =======================================================================
DEFINE TABLE notification SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update FULL
        FOR delete NONE;
DEFINE FIELD tenant_id ON TABLE notification TYPE string;
DEFINE FIELD recipient_id ON TABLE notification TYPE string;
DEFINE FIELD triggered_by ON TABLE notification TYPE string;
DEFINE FIELD notification_type ON TABLE notification TYPE string;
DEFINE FIELD message ON TABLE notification TYPE string;
DEFINE FIELD related_type ON TABLE notification TYPE option<string>;
DEFINE FIELD related_id ON TABLE notification TYPE option<string>;
DEFINE FIELD is_read ON TABLE notification TYPE bool DEFAULT false;
DEFINE FIELD read_at ON TABLE notification TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE notification TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_notification_recipient ON TABLE notification \
    COLUMNS tenant_id, recipient_id, created_at;

-- =======================================================================
-- Activity Log (tenant scope, append-only)
-- =======================================================================
DEFINE TABLE activity_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD tenant_id ON TABLE activity_log TYPE string;
DEFINE FIELD action ON TABLE activity_log TYPE string;
DEFINE FIELD description ON TABLE activity_log TYPE string;
DEFINE FIELD performed_by ON TABLE activity_log TYPE string;
DEFINE FIELD target_type ON TABLE activity_log TYPE option<string>;
DEFINE FIELD target_id ON TABLE activity_log TYPE option<string>;
DEFINE FIELD metadata ON TABLE activity_log TYPE option<object> \
    FLEXIBLE;
DEFINE FIELD created_at ON TABLE activity_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_activity_tenant_time ON TABLE activity_log \
    COLUMNS tenant_id, created_at;
DEFINE INDEX idx_activity_tenant_target ON TABLE activity_log \
    COLUMNS tenant_id, target_type, target_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Bring the schema up to date.
///
/// The `_migration` table records every applied version; only
/// migrations above the highest recorded version run. Safe to call on
/// every startup.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = current_version(db).await?;
    let pending = MIGRATIONS.iter().filter(|m| m.version > current);

    for migration in pending {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        apply(db, migration).await?;
    }

    Ok(())
}

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    db.query(migration.sql).await?.check().map_err(|e| {
        DbError::Migration(format!(
            "v{} '{}' failed: {e}",
            migration.version, migration.name
        ))
    })?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "could not record v{}: {e}",
                migration.version
            ))
        })?;

    info!(version = migration.version, "Migration applied");
    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
