//! Dispatch service — one matching run per queue, plus the combined run.
//!
//! A run is synchronous run-to-completion over an in-memory snapshot: all
//! I/O happens before (snapshot reads) and after (commit) the matching
//! scan. Two concurrent runs are NOT mutually excluded — each reads its
//! own busy-snapshot, so overlapping runs can pick the same owner. Callers
//! that need the global one-assignment-per-owner property must serialize
//! invocations.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dispatch::classify::{self, InventoryIndex};
use crate::dispatch::matcher;
use crate::dispatch::model::{Capability, DeliveryRequest, DispatchTask, QueueKind, VehicleClass};
use crate::dispatch::pool::ResourcePool;
use crate::dispatch::rank;
use crate::dispatch::schedule;
use crate::error::{DatabaseError, DispatchError};
use crate::store::Database;

/// A committed clinical assignment, joined back to its request.
#[derive(Debug, Clone, Serialize)]
pub struct ClinicalAssignmentView {
    pub task_id: i64,
    pub owner_id: i64,
    pub resource_id: i64,
    pub skill: String,
    pub priority: i64,
}

/// Result of one clinical queue run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClinicalOutcome {
    pub assignments: Vec<ClinicalAssignmentView>,
    pub count: usize,
}

/// A committed material assignment, joined back to its request.
#[derive(Debug, Clone, Serialize)]
pub struct MaterialAssignmentView {
    pub task_id: i64,
    pub owner_id: i64,
    pub resource_id: i64,
    pub item: String,
    pub category: Option<String>,
    pub scheduled_minute: i64,
}

/// Result of one material queue run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaterialOutcome {
    pub assignments: Vec<MaterialAssignmentView>,
    pub count: usize,
}

/// Result of a combined run: clinical then material, sharing one
/// used-owner set. Each side fails independently.
#[derive(Debug)]
pub struct CombinedOutcome {
    pub clinical: Result<ClinicalOutcome, DispatchError>,
    pub material: Result<MaterialOutcome, DispatchError>,
}

impl CombinedOutcome {
    /// Total assignments across the sides that succeeded.
    pub fn total_assigned(&self) -> usize {
        let clinical = self.clinical.as_ref().map(|o| o.count).unwrap_or(0);
        let material = self.material.as_ref().map(|o| o.count).unwrap_or(0);
        clinical + material
    }
}

/// Orchestrates dispatch runs against the store.
pub struct DispatchService {
    db: Arc<dyn Database>,
}

impl DispatchService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Run the clinical queue with a fresh used-owner set.
    pub async fn run_clinical(&self) -> Result<ClinicalOutcome, DispatchError> {
        let mut used_owners = HashSet::new();
        self.run_clinical_with(&mut used_owners).await
    }

    /// Run the material queue with a fresh used-owner set.
    pub async fn run_material(&self) -> Result<MaterialOutcome, DispatchError> {
        let mut used_owners = HashSet::new();
        self.run_material_with(&mut used_owners).await
    }

    /// Run clinical then material, threading one used-owner set across
    /// both queues so no owner is assigned twice in the combined run.
    pub async fn run_all(&self) -> CombinedOutcome {
        let mut used_owners = HashSet::new();
        let clinical = self.run_clinical_with(&mut used_owners).await;
        let material = self.run_material_with(&mut used_owners).await;
        CombinedOutcome { clinical, material }
    }

    async fn run_clinical_with(
        &self,
        used_owners: &mut HashSet<i64>,
    ) -> Result<ClinicalOutcome, DispatchError> {
        let run_id = Uuid::new_v4();

        let requests = self
            .db
            .pending_clinical_requests()
            .await
            .map_err(source_unavailable(QueueKind::Clinical))?;
        if requests.is_empty() {
            debug!(run_id = %run_id, "No pending clinical requests");
            return Ok(ClinicalOutcome::default());
        }

        let now_minute = schedule::current_minute();
        let fleet = self
            .db
            .eligible_clinical_fleet(now_minute)
            .await
            .map_err(source_unavailable(QueueKind::Clinical))?;
        if fleet.is_empty() {
            debug!(run_id = %run_id, now_minute, "No eligible clinical fleet");
            return Ok(ClinicalOutcome::default());
        }

        let mut tasks: Vec<DispatchTask> = requests
            .iter()
            .map(|request| DispatchTask {
                id: request.id,
                capability: classify::clinical_capability(&request.skill),
                rank: rank::clinical_rank(request.priority),
                scheduled_minute: None,
            })
            .collect();
        rank::order_tasks(&mut tasks);

        let mut pool = ResourcePool::build(fleet);
        let assignments = matcher::match_tasks(&tasks, &mut pool, used_owners);

        self.db
            .commit_clinical_assignments(&assignments)
            .await
            .map_err(commit_failed(QueueKind::Clinical))?;

        let by_id: HashMap<i64, _> = requests.iter().map(|r| (r.id, r)).collect();
        let views: Vec<ClinicalAssignmentView> = assignments
            .iter()
            .filter_map(|a| {
                by_id.get(&a.task_id).map(|request| ClinicalAssignmentView {
                    task_id: a.task_id,
                    owner_id: a.owner_id,
                    resource_id: a.resource_id,
                    skill: request.skill.clone(),
                    priority: request.priority,
                })
            })
            .collect();

        info!(
            run_id = %run_id,
            queue = "clinical",
            pending = requests.len(),
            assigned = views.len(),
            "Dispatch run committed"
        );
        Ok(ClinicalOutcome {
            count: views.len(),
            assignments: views,
        })
    }

    async fn run_material_with(
        &self,
        used_owners: &mut HashSet<i64>,
    ) -> Result<MaterialOutcome, DispatchError> {
        let run_id = Uuid::new_v4();

        let requests = self
            .db
            .pending_delivery_requests()
            .await
            .map_err(source_unavailable(QueueKind::Material))?;
        if requests.is_empty() {
            debug!(run_id = %run_id, "No pending delivery requests");
            return Ok(MaterialOutcome::default());
        }

        let index = self
            .db
            .inventory_index()
            .await
            .map_err(source_unavailable(QueueKind::Material))?;

        let prepared = prepare_deliveries(&requests, &index);
        if prepared.is_empty() {
            debug!(run_id = %run_id, "No parseable delivery requests");
            return Ok(MaterialOutcome::default());
        }

        // The class set is scoped over all pending requests, matching the
        // snapshot the store query contract expects.
        let classes = classify::required_classes(&requests, &index);
        let fleet = self
            .db
            .eligible_delivery_fleet(&classes)
            .await
            .map_err(source_unavailable(QueueKind::Material))?;
        if fleet.is_empty() {
            debug!(run_id = %run_id, "No eligible delivery fleet");
            return Ok(MaterialOutcome::default());
        }

        let mut tasks: Vec<DispatchTask> = prepared
            .iter()
            .map(|p| DispatchTask {
                id: p.request.id,
                capability: Capability::Vehicle(p.class),
                rank: rank::material_rank(&p.request.priority),
                scheduled_minute: Some(p.minute),
            })
            .collect();
        rank::order_tasks(&mut tasks);

        let mut pool = ResourcePool::build(fleet);
        let assignments = matcher::match_tasks(&tasks, &mut pool, used_owners);

        self.db
            .commit_delivery_assignments(&assignments)
            .await
            .map_err(commit_failed(QueueKind::Material))?;

        let by_id: HashMap<i64, _> = prepared.iter().map(|p| (p.request.id, p)).collect();
        let views: Vec<MaterialAssignmentView> = assignments
            .iter()
            .filter_map(|a| {
                by_id.get(&a.task_id).map(|p| MaterialAssignmentView {
                    task_id: a.task_id,
                    owner_id: a.owner_id,
                    resource_id: a.resource_id,
                    item: p.request.item.clone(),
                    category: index.category(&p.request.item).map(String::from),
                    scheduled_minute: p.minute,
                })
            })
            .collect();

        info!(
            run_id = %run_id,
            queue = "material",
            pending = requests.len(),
            assigned = views.len(),
            "Dispatch run committed"
        );
        Ok(MaterialOutcome {
            count: views.len(),
            assignments: views,
        })
    }
}

/// A delivery request with its derived class and scheduled minute.
struct PreparedDelivery<'a> {
    request: &'a DeliveryRequest,
    class: VehicleClass,
    minute: i64,
}

/// Parse and classify pending deliveries. A malformed timestamp skips that
/// one request — it stays Pending and the run continues.
fn prepare_deliveries<'a>(
    requests: &'a [DeliveryRequest],
    index: &InventoryIndex,
) -> Vec<PreparedDelivery<'a>> {
    let mut prepared = Vec::with_capacity(requests.len());
    for request in requests {
        match schedule::scheduled_minute(&request.request_time) {
            Ok(minute) => prepared.push(PreparedDelivery {
                request,
                class: index.class_for(&request.item),
                minute,
            }),
            Err(error) => warn!(
                task_id = request.id,
                request_time = %request.request_time,
                %error,
                "Malformed request timestamp, skipping task"
            ),
        }
    }
    prepared
}

fn source_unavailable(queue: QueueKind) -> impl FnOnce(DatabaseError) -> DispatchError {
    move |source| DispatchError::SourceUnavailable { queue, source }
}

fn commit_failed(queue: QueueKind) -> impl FnOnce(DatabaseError) -> DispatchError {
    move |source| DispatchError::CommitFailed { queue, source }
}
