//! Capability classifier — maps raw tasks to the compatibility key they need.
//!
//! Clinical tasks require their raw skill value, matched by exact equality.
//! Material tasks require a vehicle class derived from an item→category
//! lookup: category "Laundry" needs the Laundry class, everything else —
//! including items missing from the index — defaults to Standard.

use std::collections::HashMap;

use crate::dispatch::model::{Capability, DeliveryRequest, VehicleClass};

/// Inventory category that requires the Laundry vehicle class.
pub const LAUNDRY_CATEGORY: &str = "Laundry";

/// Item name → category lookup used to classify material tasks.
#[derive(Debug, Clone, Default)]
pub struct InventoryIndex {
    entries: HashMap<String, String>,
}

impl InventoryIndex {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Category for an item, if the item is known.
    pub fn category(&self, item: &str) -> Option<&str> {
        self.entries.get(item).map(String::as_str)
    }

    /// Vehicle class an item needs. Unknown items are an explicit
    /// Standard-class default, not an error.
    pub fn class_for(&self, item: &str) -> VehicleClass {
        match self.category(item) {
            Some(LAUNDRY_CATEGORY) => VehicleClass::Laundry,
            _ => VehicleClass::Standard,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Required capability for a clinical task: the raw skill value.
pub fn clinical_capability(skill: &str) -> Capability {
    Capability::Skill(skill.to_string())
}

/// Distinct vehicle classes the pending material queue needs, used to
/// scope the fleet snapshot. Order is stable: Standard before Laundry.
pub fn required_classes(requests: &[DeliveryRequest], index: &InventoryIndex) -> Vec<VehicleClass> {
    let mut standard = false;
    let mut laundry = false;
    for request in requests {
        match index.class_for(&request.item) {
            VehicleClass::Standard => standard = true,
            VehicleClass::Laundry => laundry = true,
        }
    }

    let mut classes = Vec::new();
    if standard {
        classes.push(VehicleClass::Standard);
    }
    if laundry {
        classes.push(VehicleClass::Laundry);
    }
    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(pairs: &[(&str, &str)]) -> InventoryIndex {
        InventoryIndex::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn delivery(id: i64, item: &str) -> DeliveryRequest {
        DeliveryRequest {
            id,
            item: item.to_string(),
            priority: "Low".to_string(),
            request_time: "01/01/2024, 09:00:00".to_string(),
        }
    }

    #[test]
    fn laundry_category_maps_to_laundry_class() {
        let index = index_of(&[("Sheets", "Laundry")]);
        assert_eq!(index.class_for("Sheets"), VehicleClass::Laundry);
    }

    #[test]
    fn other_categories_map_to_standard() {
        let index = index_of(&[("Gauze", "Medical")]);
        assert_eq!(index.class_for("Gauze"), VehicleClass::Standard);
    }

    #[test]
    fn unknown_item_defaults_to_standard() {
        let index = index_of(&[]);
        assert_eq!(index.class_for("Mystery"), VehicleClass::Standard);
    }

    #[test]
    fn clinical_capability_is_raw_skill() {
        assert_eq!(
            clinical_capability("nurse"),
            Capability::Skill("nurse".to_string())
        );
    }

    #[test]
    fn required_classes_are_distinct() {
        let index = index_of(&[("Sheets", "Laundry"), ("Towels", "Laundry")]);
        let requests = vec![
            delivery(1, "Sheets"),
            delivery(2, "Towels"),
            delivery(3, "Gauze"),
        ];
        assert_eq!(
            required_classes(&requests, &index),
            vec![VehicleClass::Standard, VehicleClass::Laundry]
        );
    }

    #[test]
    fn required_classes_empty_queue() {
        let index = index_of(&[]);
        assert!(required_classes(&[], &index).is_empty());
    }
}
