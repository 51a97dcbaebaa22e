//! Dispatch data model — queues, capabilities, tasks, fleet slots, assignments.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which work queue a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    Clinical,
    Material,
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueKind::Clinical => write!(f, "clinical"),
            QueueKind::Material => write!(f, "material"),
        }
    }
}

/// Vehicle class for material deliveries.
///
/// Wire/DB code 1 = Standard, 2 = Laundry. Anything unrecognized
/// normalizes to Standard at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Standard,
    Laundry,
}

impl VehicleClass {
    /// Numeric wire code used by the fleet table.
    pub fn code(self) -> i64 {
        match self {
            VehicleClass::Standard => 1,
            VehicleClass::Laundry => 2,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            2 => VehicleClass::Laundry,
            _ => VehicleClass::Standard,
        }
    }

    /// Parse a mixed wire representation: numeric code or class name.
    pub fn from_wire(raw: &str) -> Self {
        if let Ok(code) = raw.trim().parse::<i64>() {
            return Self::from_code(code);
        }
        match raw.trim().to_ascii_lowercase().as_str() {
            "laundry" => VehicleClass::Laundry,
            _ => VehicleClass::Standard,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleClass::Standard => "Standard",
            VehicleClass::Laundry => "Laundry",
        }
    }
}

/// Canonical compatibility key a task requires and a fleet slot offers.
///
/// Skill names and vehicle classes arrive in mixed text/numeric wire forms;
/// they are normalized into this one type when the pool is built and
/// compared by plain equality everywhere after that.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    Skill(String),
    Vehicle(VehicleClass),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Skill(skill) => write!(f, "skill:{skill}"),
            Capability::Vehicle(class) => write!(f, "vehicle:{}", class.as_str()),
        }
    }
}

/// Request lifecycle status.
///
/// `Scheduling` and `Started` both count as "busy" when computing owner
/// availability; there is no separate reservation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Scheduling,
    Started,
    Completed,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Scheduling => "Scheduling",
            RequestStatus::Started => "Started",
            RequestStatus::Completed => "Completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Scheduling" => RequestStatus::Scheduling,
            "Started" => RequestStatus::Started,
            "Completed" => RequestStatus::Completed,
            _ => RequestStatus::Pending,
        }
    }
}

/// A pending clinical service request, as read from the store.
#[derive(Debug, Clone)]
pub struct ClinicalRequest {
    pub id: i64,
    pub skill: String,
    /// Small non-negative ordinal; higher is more urgent.
    pub priority: i64,
}

/// A pending material delivery request, as read from the store.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub id: i64,
    pub item: String,
    /// High / Medium / Low, case-insensitive.
    pub priority: String,
    /// Literal `DD/MM/YYYY, HH:MM:SS` timestamp.
    pub request_time: String,
}

/// One offerable working slot belonging to an owner.
///
/// Several slots may share an `owner_id`; at most one of them may be
/// assigned per run. The shift window is inclusive on both ends, in
/// minutes-of-day.
#[derive(Debug, Clone)]
pub struct FleetSlot {
    pub id: i64,
    pub owner_id: i64,
    pub capability: Capability,
    /// Lower is preferred.
    pub cost: i64,
    pub shift_start: i64,
    pub shift_end: i64,
}

impl FleetSlot {
    /// Whether the shift window covers the given minute-of-day.
    pub fn covers(&self, minute: i64) -> bool {
        self.shift_start <= minute && minute <= self.shift_end
    }
}

/// A task prepared for matching: classified, ranked, and (for material
/// work) stamped with its scheduled minute. Clinical tasks carry `None` —
/// their fleet snapshot was already filtered to "covers the current minute".
#[derive(Debug, Clone)]
pub struct DispatchTask {
    pub id: i64,
    pub capability: Capability,
    pub rank: i64,
    pub scheduled_minute: Option<i64>,
}

/// The sole output artifact of the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub task_id: i64,
    pub owner_id: i64,
    pub resource_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_class_wire_forms_normalize() {
        assert_eq!(VehicleClass::from_wire("1"), VehicleClass::Standard);
        assert_eq!(VehicleClass::from_wire("2"), VehicleClass::Laundry);
        assert_eq!(VehicleClass::from_wire("Laundry"), VehicleClass::Laundry);
        assert_eq!(VehicleClass::from_wire("laundry"), VehicleClass::Laundry);
        assert_eq!(VehicleClass::from_wire("Standard"), VehicleClass::Standard);
        // Unknown codes and names fall back to Standard
        assert_eq!(VehicleClass::from_wire("7"), VehicleClass::Standard);
        assert_eq!(VehicleClass::from_wire("forklift"), VehicleClass::Standard);
    }

    #[test]
    fn shift_window_is_inclusive() {
        let slot = FleetSlot {
            id: 1,
            owner_id: 1,
            capability: Capability::Vehicle(VehicleClass::Standard),
            cost: 0,
            shift_start: 480,
            shift_end: 600,
        };
        assert!(slot.covers(480));
        assert!(slot.covers(600));
        assert!(!slot.covers(479));
        assert!(!slot.covers(601));
    }

    #[test]
    fn busy_statuses_round_trip() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Scheduling,
            RequestStatus::Started,
            RequestStatus::Completed,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()), status);
        }
        assert_eq!(RequestStatus::parse("garbage"), RequestStatus::Pending);
    }
}
