//! Resource pool — per-capability fleet groups, consumed from the cheap end.
//!
//! Each group is kept sorted by ascending cost (stable, so equal-cost
//! entries stay in their incoming id order). Entries leave a group in
//! exactly two cases: their owner is already used this run, or they are
//! claimed. A shift-window mismatch is a per-task skip and must leave the
//! entry in place — a later task with a different scheduled minute may
//! still fit it.

use std::collections::{HashMap, HashSet};

use crate::dispatch::model::{Capability, FleetSlot};

/// In-memory grouping of available fleet slots for one matching run.
#[derive(Debug, Default)]
pub struct ResourcePool {
    groups: HashMap<Capability, Vec<FleetSlot>>,
}

impl ResourcePool {
    /// Group a fleet snapshot by capability, cheapest first.
    pub fn build(slots: Vec<FleetSlot>) -> Self {
        let mut groups: HashMap<Capability, Vec<FleetSlot>> = HashMap::new();
        for slot in slots {
            groups.entry(slot.capability.clone()).or_default().push(slot);
        }
        for group in groups.values_mut() {
            group.sort_by_key(|slot| slot.cost);
        }
        Self { groups }
    }

    /// Claim the cheapest eligible slot for a task.
    ///
    /// Scans the capability group front to back. Entries whose owner is in
    /// `used_owners` are evicted permanently as they are encountered. If
    /// `minute` is given (material tasks), entries whose window does not
    /// cover it are skipped but kept. The first entry passing both checks
    /// is removed, its owner's remaining entries are retired from every
    /// group, and it is returned. Clinical tasks pass `None` — their
    /// snapshot was pre-filtered to the current minute.
    pub fn claim(
        &mut self,
        capability: &Capability,
        minute: Option<i64>,
        used_owners: &HashSet<i64>,
    ) -> Option<FleetSlot> {
        let group = self.groups.get_mut(capability)?;

        let mut index = 0;
        let mut claimed = None;
        while index < group.len() {
            if used_owners.contains(&group[index].owner_id) {
                group.remove(index);
                continue;
            }
            if let Some(minute) = minute {
                if !group[index].covers(minute) {
                    index += 1;
                    continue;
                }
            }
            claimed = Some(group.remove(index));
            break;
        }

        let slot = claimed?;
        self.retire_owner(slot.owner_id);
        Some(slot)
    }

    /// Drop every remaining entry belonging to an owner, across all groups.
    fn retire_owner(&mut self, owner_id: i64) {
        for group in self.groups.values_mut() {
            group.retain(|slot| slot.owner_id != owner_id);
        }
    }

    /// Remaining entries across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::model::VehicleClass;

    fn skill(name: &str) -> Capability {
        Capability::Skill(name.to_string())
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

    fn windowed(id: i64, owner_id: i64, cost: i64, start: i64, end: i64) -> FleetSlot {
        FleetSlot {
            id,
            owner_id,
            capability: Capability::Vehicle(VehicleClass::Standard),
            cost,
            shift_start: start,
            shift_end: end,
        }
    }

    #[test]
    fn claims_cheapest_first() {
        let mut pool = ResourcePool::build(vec![
            slot(10, 100, skill("nurse"), 5),
            slot(11, 101, skill("nurse"), 3),
        ]);
        let used = HashSet::new();
        let claimed = pool.claim(&skill("nurse"), None, &used).unwrap();
        assert_eq!(claimed.id, 11);
    }

    #[test]
    fn equal_cost_ties_break_by_incoming_order() {
        let mut pool = ResourcePool::build(vec![
            slot(10, 100, skill("nurse"), 4),
            slot(11, 101, skill("nurse"), 4),
        ]);
        let used = HashSet::new();
        assert_eq!(pool.claim(&skill("nurse"), None, &used).unwrap().id, 10);
    }

    #[test]
    fn missing_group_claims_nothing() {
        let mut pool = ResourcePool::build(vec![slot(10, 100, skill("nurse"), 1)]);
        let used = HashSet::new();
        assert!(pool.claim(&skill("porter"), None, &used).is_none());
    }

    #[test]
    fn used_owner_is_evicted_permanently() {
        let mut pool = ResourcePool::build(vec![
            slot(10, 100, skill("nurse"), 1),
            slot(11, 101, skill("nurse"), 2),
        ]);
        let used: HashSet<i64> = [100].into();
        let claimed = pool.claim(&skill("nurse"), None, &used).unwrap();
        assert_eq!(claimed.owner_id, 101);
        // The used owner's entry was dropped during the scan, not just skipped.
        assert!(pool.is_empty());
    }

    #[test]
    fn window_mismatch_keeps_entry_for_later_tasks() {
        let mut pool = ResourcePool::build(vec![
            windowed(10, 100, 1, 480, 540), // cheap, morning only
            windowed(11, 101, 2, 0, 1439),
        ]);
        let used = HashSet::new();
        let cap = Capability::Vehicle(VehicleClass::Standard);

        // Evening task cannot use the cheap morning slot — but must not evict it.
        let evening = pool.claim(&cap, Some(1200), &used).unwrap();
        assert_eq!(evening.id, 11);
        assert_eq!(pool.len(), 1);

        // A later morning task still gets it.
        let morning = pool.claim(&cap, Some(500), &used).unwrap();
        assert_eq!(morning.id, 10);
    }

    #[test]
    fn claim_retires_owner_duplicates_in_every_group() {
        let mut pool = ResourcePool::build(vec![
            slot(10, 100, skill("nurse"), 1),
            slot(11, 100, skill("nurse"), 2),
            slot(12, 100, skill("porter"), 1),
            slot(13, 101, skill("porter"), 2),
        ]);
        let used = HashSet::new();
        let claimed = pool.claim(&skill("nurse"), None, &used).unwrap();
        assert_eq!(claimed.id, 10);
        // Both duplicates of owner 100 are gone; only owner 101 remains.
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.claim(&skill("porter"), None, &used).unwrap().id, 13);
    }

    #[test]
    fn exhausted_group_claims_nothing() {
        let mut pool = ResourcePool::build(vec![windowed(10, 100, 1, 480, 540)]);
        let used = HashSet::new();
        let cap = Capability::Vehicle(VehicleClass::Standard);
        assert!(pool.claim(&cap, Some(1200), &used).is_none());
        // The mismatching entry survives the failed scan.
        assert_eq!(pool.len(), 1);
    }
}
