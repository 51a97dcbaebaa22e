//! Greedy matcher — pairs ranked tasks with pool slots.
//!
//! Pure function of its inputs: no I/O, no ambient state. The used-owner
//! set is threaded through the call so a combined run can enforce the
//! one-assignment-per-owner rule across both queues.

use std::collections::HashSet;

use tracing::debug;

use crate::dispatch::model::{Assignment, DispatchTask};
use crate::dispatch::pool::ResourcePool;

/// Match tasks against the pool in ranked order.
///
/// Each task gets at most one assignment: the cheapest slot of its
/// capability group that is not owner-used and (for material tasks)
/// whose window covers the scheduled minute. Tasks with no eligible slot
/// are simply absent from the output and stay Pending upstream.
pub fn match_tasks(
    tasks: &[DispatchTask],
    pool: &mut ResourcePool,
    used_owners: &mut HashSet<i64>,
) -> Vec<Assignment> {
    let mut assignments = Vec::new();

    for task in tasks {
        let Some(slot) = pool.claim(&task.capability, task.scheduled_minute, used_owners) else {
            debug!(
                task_id = task.id,
                capability = %task.capability,
                "No eligible slot, task left pending"
            );
            continue;
        };

        used_owners.insert(slot.owner_id);
        debug!(
            task_id = task.id,
            owner_id = slot.owner_id,
            resource_id = slot.id,
            cost = slot.cost,
            "Task matched"
        );
        assignments.push(Assignment {
            task_id: task.id,
            owner_id: slot.owner_id,
            resource_id: slot.id,
        });
    }

    assignments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::model::{Capability, FleetSlot, VehicleClass};
    use crate::dispatch::rank;

    fn skill(name: &str) -> Capability {
        Capability::Skill(name.to_string())
    }

    fn task(id: i64, capability: Capability, rank: i64) -> DispatchTask {
        DispatchTask {
            id,
            capability,
            rank,
            scheduled_minute: None,
        }
    }

    fn timed_task(id: i64, class: VehicleClass, minute: i64) -> DispatchTask {
        DispatchTask {
            id,
            capability: Capability::Vehicle(class),
            rank: 0,
            scheduled_minute: Some(minute),
        }
    }

    fn slot(id: i64, owner_id: i64, capability: Capability, cost: i64) -> FleetSlot {
        FleetSlot {
            id,
            owner_id,
            capability,
            cost,
            shift_start: 0,
            shift_end: 1439,
        }
    }

    fn vehicle_slot(
        id: i64,
        owner_id: i64,
        class: VehicleClass,
        cost: i64,
        start: i64,
        end: i64,
    ) -> FleetSlot {
        FleetSlot {
            id,
            owner_id,
            capability: Capability::Vehicle(class),
            cost,
            shift_start: start,
            shift_end: end,
        }
    }

    #[test]
    fn higher_priority_task_takes_cheaper_slot() {
        // Tasks 1 and 2 both need a nurse; task 2 outranks task 1 and
        // must receive the cheaper owner 101.
        let mut tasks = vec![task(1, skill("nurse"), 1), task(2, skill("nurse"), 2)];
        rank::order_tasks(&mut tasks);

        let mut pool = ResourcePool::build(vec![
            slot(10, 100, skill("nurse"), 5),
            slot(11, 101, skill("nurse"), 3),
        ]);
        let mut used = HashSet::new();

        let assignments = match_tasks(&tasks, &mut pool, &mut used);
        assert_eq!(assignments.len(), 2);
        assert!(assignments.contains(&Assignment {
            task_id: 2,
            owner_id: 101,
            resource_id: 11,
        }));
        assert!(assignments.contains(&Assignment {
            task_id: 1,
            owner_id: 100,
            resource_id: 10,
        }));
    }

    #[test]
    fn one_slot_two_tasks_assigns_only_the_winner() {
        let mut tasks = vec![task(1, skill("nurse"), 0), task(2, skill("nurse"), 0)];
        rank::order_tasks(&mut tasks);

        let mut pool = ResourcePool::build(vec![slot(10, 100, skill("nurse"), 1)]);
        let mut used = HashSet::new();

        let assignments = match_tasks(&tasks, &mut pool, &mut used);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].task_id, 1);
    }

    #[test]
    fn no_owner_assigned_twice_even_across_capabilities() {
        // Owner 100 offers both skills; only one of its slots may be used.
        let tasks = vec![task(1, skill("nurse"), 0), task(2, skill("porter"), 0)];

        let mut pool = ResourcePool::build(vec![
            slot(10, 100, skill("nurse"), 1),
            slot(11, 100, skill("porter"), 1),
            slot(12, 101, skill("porter"), 5),
        ]);
        let mut used = HashSet::new();

        let assignments = match_tasks(&tasks, &mut pool, &mut used);
        assert_eq!(assignments.len(), 2);
        let owners: HashSet<i64> = assignments.iter().map(|a| a.owner_id).collect();
        assert_eq!(owners.len(), assignments.len());
    }

    #[test]
    fn used_owners_carry_across_queue_runs() {
        // First (clinical) run consumes owner 100; the second (material)
        // run shares the set and must not pick that owner again.
        let clinical = vec![task(1, skill("nurse"), 0)];
        let mut clinical_pool = ResourcePool::build(vec![slot(10, 100, skill("nurse"), 1)]);
        let mut used = HashSet::new();
        let first = match_tasks(&clinical, &mut clinical_pool, &mut used);
        assert_eq!(first.len(), 1);

        let material = vec![timed_task(2, VehicleClass::Standard, 600)];
        let mut material_pool = ResourcePool::build(vec![
            vehicle_slot(20, 100, VehicleClass::Standard, 1, 0, 1439),
            vehicle_slot(21, 200, VehicleClass::Standard, 9, 0, 1439),
        ]);
        let second = match_tasks(&material, &mut material_pool, &mut used);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].owner_id, 200);
    }

    #[test]
    fn window_mismatch_leaves_slot_for_later_task() {
        // Task 1 (evening) cannot use the cheap morning truck; task 2
        // (morning) still must get it.
        let tasks = vec![
            timed_task(1, VehicleClass::Standard, 1200),
            timed_task(2, VehicleClass::Standard, 500),
        ];
        let mut pool = ResourcePool::build(vec![
            vehicle_slot(20, 200, VehicleClass::Standard, 1, 480, 540),
            vehicle_slot(21, 201, VehicleClass::Standard, 3, 0, 1439),
        ]);
        let mut used = HashSet::new();

        let assignments = match_tasks(&tasks, &mut pool, &mut used);
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0], Assignment {
            task_id: 1,
            owner_id: 201,
            resource_id: 21,
        });
        assert_eq!(assignments[1], Assignment {
            task_id: 2,
            owner_id: 200,
            resource_id: 20,
        });
    }

    #[test]
    fn laundry_task_matched_inside_window() {
        // Sheets → Laundry class, 09:00 request = minute 540, window [480,600].
        let tasks = vec![timed_task(5, VehicleClass::Laundry, 540)];
        let mut pool = ResourcePool::build(vec![vehicle_slot(
            30,
            200,
            VehicleClass::Laundry,
            4,
            480,
            600,
        )]);
        let mut used = HashSet::new();

        let assignments = match_tasks(&tasks, &mut pool, &mut used);
        assert_eq!(assignments, vec![Assignment {
            task_id: 5,
            owner_id: 200,
            resource_id: 30,
        }]);
    }

    #[test]
    fn empty_pool_matches_nothing() {
        let tasks = vec![task(1, skill("nurse"), 3)];
        let mut pool = ResourcePool::build(Vec::new());
        let mut used = HashSet::new();
        assert!(match_tasks(&tasks, &mut pool, &mut used).is_empty());
    }
}
