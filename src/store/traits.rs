//! `Database` trait — single async interface for all persistence.
//!
//! The dispatch core consumes this as two halves: snapshot reads (pending
//! queues, eligible fleet, inventory index) and batched assignment commits.
//! Request/fleet creation lives here too — requests enter the system from
//! the outside, the dispatcher only reads them.

use async_trait::async_trait;

use crate::dispatch::classify::InventoryIndex;
use crate::dispatch::model::{
    Assignment, ClinicalRequest, DeliveryRequest, FleetSlot, RequestStatus, VehicleClass,
};
use crate::error::DatabaseError;

/// Assignment state of a stored request, for status queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestState {
    pub status: RequestStatus,
    pub assigned_owner_id: Option<i64>,
    pub assigned_resource_id: Option<i64>,
}

/// Backend-agnostic database trait covering requests, fleet, and commits.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    /// Cheap round-trip check (`SELECT 1`).
    async fn ping(&self) -> Result<(), DatabaseError>;

    // ── Snapshot reads ──────────────────────────────────────────────

    /// Pending clinical requests, id ascending.
    async fn pending_clinical_requests(&self) -> Result<Vec<ClinicalRequest>, DatabaseError>;

    /// Fleet slots eligible for the clinical queue right now: shift window
    /// covers `now_minute`, skill needed by some pending request, owner not
    /// busy on either queue. Cost ascending, id ascending on ties.
    async fn eligible_clinical_fleet(
        &self,
        now_minute: i64,
    ) -> Result<Vec<FleetSlot>, DatabaseError>;

    /// Pending delivery requests, id ascending.
    async fn pending_delivery_requests(&self) -> Result<Vec<DeliveryRequest>, DatabaseError>;

    /// The full item → category index.
    async fn inventory_index(&self) -> Result<InventoryIndex, DatabaseError>;

    /// Fleet slots eligible for the material queue: vehicle class in the
    /// needed set, owner not busy on either queue. NOT filtered by shift
    /// window — each delivery has its own scheduled minute, checked by the
    /// matcher. Cost ascending, id ascending on ties.
    async fn eligible_delivery_fleet(
        &self,
        classes: &[VehicleClass],
    ) -> Result<Vec<FleetSlot>, DatabaseError>;

    // ── Commits ─────────────────────────────────────────────────────

    /// Apply a clinical assignment batch as one unit: every request
    /// transitions Pending→Scheduling with owner/resource stamped, or none
    /// do.
    async fn commit_clinical_assignments(
        &self,
        assignments: &[Assignment],
    ) -> Result<(), DatabaseError>;

    /// Apply a delivery assignment batch as one unit.
    async fn commit_delivery_assignments(
        &self,
        assignments: &[Assignment],
    ) -> Result<(), DatabaseError>;

    // ── Request/fleet intake ────────────────────────────────────────

    /// Insert a pending clinical request. Returns the new id.
    async fn insert_clinical_request(
        &self,
        skill: &str,
        priority: i64,
    ) -> Result<i64, DatabaseError>;

    /// Insert a pending delivery request. Returns the new id.
    async fn insert_delivery_request(
        &self,
        item: &str,
        priority: &str,
        request_time: &str,
    ) -> Result<i64, DatabaseError>;

    /// Insert a fleet slot. `vehicle_class` takes the raw wire form
    /// (numeric code or class name); it is normalized at snapshot read.
    async fn insert_fleet_slot(
        &self,
        owner_id: i64,
        skill: Option<&str>,
        vehicle_class: Option<&str>,
        cost: i64,
        shift_start: i64,
        shift_end: i64,
    ) -> Result<i64, DatabaseError>;

    /// Insert or replace an inventory item's category.
    async fn upsert_inventory_item(&self, item: &str, category: &str)
    -> Result<(), DatabaseError>;

    // ── Status queries ──────────────────────────────────────────────

    /// Assignment state of a clinical request, if it exists.
    async fn clinical_request_state(&self, id: i64)
    -> Result<Option<RequestState>, DatabaseError>;

    /// Assignment state of a delivery request, if it exists.
    async fn delivery_request_state(&self, id: i64)
    -> Result<Option<RequestState>, DatabaseError>;
}
