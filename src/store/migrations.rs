//! Version-tracked database migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run_migrations()` checks
//! the current version and applies only the new ones sequentially.

use libsql::Connection;

use crate::error::DatabaseError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS clinical_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                skill TEXT NOT NULL,
                priority INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'Pending',
                assigned_owner_id INTEGER,
                assigned_resource_id INTEGER,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_clinical_requests_status ON clinical_requests(status);
            CREATE INDEX IF NOT EXISTS idx_clinical_requests_skill ON clinical_requests(skill);

            CREATE TABLE IF NOT EXISTS delivery_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item TEXT NOT NULL,
                priority TEXT NOT NULL DEFAULT 'Low',
                request_time TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Pending',
                assigned_owner_id INTEGER,
                assigned_resource_id INTEGER,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_delivery_requests_status ON delivery_requests(status);

            CREATE TABLE IF NOT EXISTS fleet (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                skill TEXT,
                vehicle_class TEXT,
                cost INTEGER NOT NULL DEFAULT 0,
                shift_start INTEGER,
                shift_end INTEGER,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_fleet_owner ON fleet(owner_id);
            CREATE INDEX IF NOT EXISTS idx_fleet_skill ON fleet(skill);

            CREATE TABLE IF NOT EXISTS inventory (
                item TEXT PRIMARY KEY,
                category TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 2,
        name: "busy_owner_indexes",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_clinical_requests_assigned_owner
                ON clinical_requests(assigned_owner_id, status);
            CREATE INDEX IF NOT EXISTS idx_delivery_requests_assigned_owner
                ON delivery_requests(assigned_owner_id, status);
        "#,
    },
];

/// Apply all pending migrations to the connection.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    // Create migrations tracking table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to create _migrations table: {e}")))?;

    let current_version = get_current_version(conn).await?;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            conn.execute_batch(migration.sql).await.map_err(|e| {
                DatabaseError::Migration(format!(
                    "Migration V{} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;
            seed_version(conn, migration.version, migration.name).await?;
        }
    }

    Ok(())
}

/// Current max applied version, 0 if none.
async fn get_current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to query migration version: {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to read migration version: {e}")))?;

    match row {
        Some(row) => row
            .get::<i64>(0)
            .map_err(|e| DatabaseError::Migration(format!("Bad migration version: {e}"))),
        None => Ok(0),
    }
}

/// Record an applied migration version.
async fn seed_version(conn: &Connection, version: i64, name: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
        libsql::params![version, name],
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to record migration V{version}: {e}")))?;
    Ok(())
}
