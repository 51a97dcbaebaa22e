//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. A single connection is
//! reused for all operations; `libsql::Connection` is `Send + Sync` and
//! safe for concurrent async use.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;

use crate::dispatch::classify::InventoryIndex;
use crate::dispatch::model::{
    Assignment, Capability, ClinicalRequest, DeliveryRequest, FleetSlot, RequestStatus,
    VehicleClass,
};
use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{Database, RequestState};

/// Statuses that make an owner "busy" — holding an active assignment on
/// either queue.
const BUSY_STATUSES: &str = "('Scheduling','Started')";

/// libSQL database backend.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Row mapping helpers ─────────────────────────────────────────────

/// Map a fleet row `(id, owner_id, cost, shift_start, shift_end)` plus a
/// pre-built capability into a FleetSlot.
fn fleet_slot(row: &libsql::Row, capability: Capability) -> Result<FleetSlot, libsql::Error> {
    Ok(FleetSlot {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        capability,
        cost: row.get(2)?,
        shift_start: row.get(3)?,
        shift_end: row.get(4)?,
    })
}

/// Read the raw vehicle_class column, tolerating both TEXT and INTEGER
/// storage. Normalization into `VehicleClass` happens in one place here,
/// never per scan.
fn raw_vehicle_class(row: &libsql::Row, idx: i32) -> String {
    match row.get::<String>(idx) {
        Ok(s) => s,
        Err(_) => row
            .get::<i64>(idx)
            .map(|code| code.to_string())
            .unwrap_or_default(),
    }
}

fn query_err(e: libsql::Error) -> DatabaseError {
    DatabaseError::Query(e.to_string())
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        let mut rows = self.conn().query("SELECT 1", ()).await.map_err(query_err)?;
        rows.next().await.map_err(query_err)?;
        Ok(())
    }

    // ── Snapshot reads ──────────────────────────────────────────────

    async fn pending_clinical_requests(&self) -> Result<Vec<ClinicalRequest>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, skill, priority
                 FROM clinical_requests
                 WHERE status = 'Pending'
                 ORDER BY id",
                (),
            )
            .await
            .map_err(query_err)?;

        let mut requests = Vec::new();
        while let Some(row) = rows.next().await.map_err(query_err)? {
            requests.push(ClinicalRequest {
                id: row.get(0).map_err(query_err)?,
                skill: row.get(1).map_err(query_err)?,
                priority: row.get(2).map_err(query_err)?,
            });
        }
        Ok(requests)
    }

    async fn eligible_clinical_fleet(
        &self,
        now_minute: i64,
    ) -> Result<Vec<FleetSlot>, DatabaseError> {
        let sql = format!(
            "SELECT f.id, f.owner_id, f.cost, f.shift_start, f.shift_end, f.skill
             FROM fleet f
             WHERE f.skill IS NOT NULL
               AND f.shift_start IS NOT NULL
               AND f.shift_end IS NOT NULL
               AND f.shift_start <= ?1
               AND ?1 <= f.shift_end
               AND EXISTS (
                    SELECT 1 FROM clinical_requests r
                    WHERE r.status = 'Pending' AND r.skill = f.skill
               )
               AND NOT EXISTS (
                    SELECT 1 FROM clinical_requests x
                    WHERE x.assigned_owner_id = f.owner_id
                      AND x.status IN {BUSY_STATUSES}
               )
               AND NOT EXISTS (
                    SELECT 1 FROM delivery_requests y
                    WHERE y.assigned_owner_id = f.owner_id
                      AND y.status IN {BUSY_STATUSES}
               )
             ORDER BY f.cost ASC, f.id ASC"
        );

        let mut rows = self
            .conn()
            .query(&sql, params![now_minute])
            .await
            .map_err(query_err)?;

        let mut slots = Vec::new();
        while let Some(row) = rows.next().await.map_err(query_err)? {
            let skill: String = row.get(5).map_err(query_err)?;
            slots.push(fleet_slot(&row, Capability::Skill(skill)).map_err(query_err)?);
        }
        Ok(slots)
    }

    async fn pending_delivery_requests(&self) -> Result<Vec<DeliveryRequest>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, item, priority, request_time
                 FROM delivery_requests
                 WHERE status = 'Pending'
                 ORDER BY id",
                (),
            )
            .await
            .map_err(query_err)?;

        let mut requests = Vec::new();
        while let Some(row) = rows.next().await.map_err(query_err)? {
            requests.push(DeliveryRequest {
                id: row.get(0).map_err(query_err)?,
                item: row.get(1).map_err(query_err)?,
                priority: row.get(2).map_err(query_err)?,
                request_time: row.get(3).map_err(query_err)?,
            });
        }
        Ok(requests)
    }

    async fn inventory_index(&self) -> Result<InventoryIndex, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT item, category FROM inventory", ())
            .await
            .map_err(query_err)?;

        let mut entries = HashMap::new();
        while let Some(row) = rows.next().await.map_err(query_err)? {
            let item: String = row.get(0).map_err(query_err)?;
            let category: String = row.get(1).map_err(query_err)?;
            entries.insert(item, category);
        }
        Ok(InventoryIndex::new(entries))
    }

    async fn eligible_delivery_fleet(
        &self,
        classes: &[VehicleClass],
    ) -> Result<Vec<FleetSlot>, DatabaseError> {
        if classes.is_empty() {
            return Ok(Vec::new());
        }

        // Window filtering is deliberately absent: each delivery carries
        // its own scheduled minute, checked by the matcher per task.
        let sql = format!(
            "SELECT f.id, f.owner_id, f.cost, f.shift_start, f.shift_end, f.vehicle_class
             FROM fleet f
             WHERE f.vehicle_class IS NOT NULL
               AND f.shift_start IS NOT NULL
               AND f.shift_end IS NOT NULL
               AND NOT EXISTS (
                    SELECT 1 FROM clinical_requests x
                    WHERE x.assigned_owner_id = f.owner_id
                      AND x.status IN {BUSY_STATUSES}
               )
               AND NOT EXISTS (
                    SELECT 1 FROM delivery_requests y
                    WHERE y.assigned_owner_id = f.owner_id
                      AND y.status IN {BUSY_STATUSES}
               )
             ORDER BY f.cost ASC, f.id ASC"
        );

        let mut rows = self.conn().query(&sql, ()).await.map_err(query_err)?;

        let mut slots = Vec::new();
        while let Some(row) = rows.next().await.map_err(query_err)? {
            let class = VehicleClass::from_wire(&raw_vehicle_class(&row, 5));
            if !classes.contains(&class) {
                continue;
            }
            slots.push(fleet_slot(&row, Capability::Vehicle(class)).map_err(query_err)?);
        }
        Ok(slots)
    }

    // ── Commits ─────────────────────────────────────────────────────

    async fn commit_clinical_assignments(
        &self,
        assignments: &[Assignment],
    ) -> Result<(), DatabaseError> {
        commit_batch(
            self.conn(),
            "UPDATE clinical_requests
                SET assigned_owner_id = ?1,
                    assigned_resource_id = ?2,
                    status = 'Scheduling',
                    updated_at = datetime('now')
              WHERE id = ?3 AND status = 'Pending'",
            assignments,
        )
        .await
    }

    async fn commit_delivery_assignments(
        &self,
        assignments: &[Assignment],
    ) -> Result<(), DatabaseError> {
        commit_batch(
            self.conn(),
            "UPDATE delivery_requests
                SET assigned_owner_id = ?1,
                    assigned_resource_id = ?2,
                    status = 'Scheduling',
                    updated_at = datetime('now')
              WHERE id = ?3 AND status = 'Pending'",
            assignments,
        )
        .await
    }

    // ── Request/fleet intake ────────────────────────────────────────

    async fn insert_clinical_request(
        &self,
        skill: &str,
        priority: i64,
    ) -> Result<i64, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO clinical_requests (skill, priority) VALUES (?1, ?2)",
                params![skill, priority],
            )
            .await
            .map_err(query_err)?;
        Ok(self.conn().last_insert_rowid())
    }

    async fn insert_delivery_request(
        &self,
        item: &str,
        priority: &str,
        request_time: &str,
    ) -> Result<i64, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO delivery_requests (item, priority, request_time) VALUES (?1, ?2, ?3)",
                params![item, priority, request_time],
            )
            .await
            .map_err(query_err)?;
        Ok(self.conn().last_insert_rowid())
    }

    async fn insert_fleet_slot(
        &self,
        owner_id: i64,
        skill: Option<&str>,
        vehicle_class: Option<&str>,
        cost: i64,
        shift_start: i64,
        shift_end: i64,
    ) -> Result<i64, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO fleet (owner_id, skill, vehicle_class, cost, shift_start, shift_end)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![owner_id, skill, vehicle_class, cost, shift_start, shift_end],
            )
            .await
            .map_err(query_err)?;
        Ok(self.conn().last_insert_rowid())
    }

    async fn upsert_inventory_item(
        &self,
        item: &str,
        category: &str,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO inventory (item, category) VALUES (?1, ?2)
                 ON CONFLICT(item) DO UPDATE SET category = excluded.category",
                params![item, category],
            )
            .await
            .map_err(query_err)?;
        Ok(())
    }

    // ── Status queries ──────────────────────────────────────────────

    async fn clinical_request_state(
        &self,
        id: i64,
    ) -> Result<Option<RequestState>, DatabaseError> {
        request_state(self.conn(), "clinical_requests", id).await
    }

    async fn delivery_request_state(
        &self,
        id: i64,
    ) -> Result<Option<RequestState>, DatabaseError> {
        request_state(self.conn(), "delivery_requests", id).await
    }
}

/// Apply an assignment batch inside a transaction: all rows update or the
/// whole batch rolls back.
async fn commit_batch(
    conn: &Connection,
    sql: &str,
    assignments: &[Assignment],
) -> Result<(), DatabaseError> {
    if assignments.is_empty() {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .await
        .map_err(|e| DatabaseError::Transaction(e.to_string()))?;

    let mut failed = None;
    for assignment in assignments {
        let result = tx
            .execute(
                sql,
                params![
                    assignment.owner_id,
                    assignment.resource_id,
                    assignment.task_id
                ],
            )
            .await;
        if let Err(e) = result {
            failed = Some(e);
            break;
        }
    }

    match failed {
        Some(e) => {
            let _ = tx.rollback().await;
            Err(DatabaseError::Transaction(e.to_string()))
        }
        None => tx
            .commit()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string())),
    }
}

/// Read a request's status and assignment stamps from either queue table.
async fn request_state(
    conn: &Connection,
    table: &str,
    id: i64,
) -> Result<Option<RequestState>, DatabaseError> {
    let sql = format!(
        "SELECT status, assigned_owner_id, assigned_resource_id FROM {table} WHERE id = ?1"
    );
    let mut rows = conn.query(&sql, params![id]).await.map_err(query_err)?;

    let Some(row) = rows.next().await.map_err(query_err)? else {
        return Ok(None);
    };

    let status: String = row.get(0).map_err(query_err)?;
    Ok(Some(RequestState {
        status: RequestStatus::parse(&status),
        assigned_owner_id: row.get::<i64>(1).ok(),
        assigned_resource_id: row.get::<i64>(2).ok(),
    }))
}
