//! Priority ranker — deterministic processing order for a queue's tasks.
//!
//! Clinical priorities are small non-negative ordinals; material priorities
//! are High/Medium/Low text, case-insensitive. Both map onto one ordinal
//! rank, and anything unrecognized ranks lowest rather than failing.
//! Final order: rank descending, task id ascending.

use std::cmp::Ordering;

use crate::dispatch::model::DispatchTask;

/// Rank for a clinical ordinal priority. Negative values are unmapped and
/// rank lowest.
pub fn clinical_rank(priority: i64) -> i64 {
    priority.max(0)
}

/// Rank for a material text priority. Unrecognized text ranks lowest.
pub fn material_rank(priority: &str) -> i64 {
    match priority.trim().to_ascii_lowercase().as_str() {
        "high" => 2,
        "medium" => 1,
        _ => 0,
    }
}

/// Sort tasks into processing order: rank descending, id ascending.
pub fn order_tasks(tasks: &mut [DispatchTask]) {
    tasks.sort_by(|a, b| match b.rank.cmp(&a.rank) {
        Ordering::Equal => a.id.cmp(&b.id),
        other => other,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::model::Capability;

    fn task(id: i64, rank: i64) -> DispatchTask {
        DispatchTask {
            id,
            capability: Capability::Skill("nurse".to_string()),
            rank,
            scheduled_minute: None,
        }
    }

    #[test]
    fn material_ranks_are_case_insensitive() {
        assert_eq!(material_rank("High"), 2);
        assert_eq!(material_rank("HIGH"), 2);
        assert_eq!(material_rank("medium"), 1);
        assert_eq!(material_rank(" Low "), 0);
    }

    #[test]
    fn unrecognized_material_priority_ranks_lowest() {
        assert_eq!(material_rank("urgent!!"), 0);
        assert_eq!(material_rank(""), 0);
    }

    #[test]
    fn negative_clinical_priority_ranks_lowest() {
        assert_eq!(clinical_rank(-5), 0);
        assert_eq!(clinical_rank(0), 0);
        assert_eq!(clinical_rank(3), 3);
    }

    #[test]
    fn higher_rank_comes_first() {
        let mut tasks = vec![task(1, 0), task(2, 2), task(3, 1)];
        order_tasks(&mut tasks);
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn equal_rank_breaks_ties_by_id() {
        let mut tasks = vec![task(9, 1), task(2, 1), task(5, 1)];
        order_tasks(&mut tasks);
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }
}
