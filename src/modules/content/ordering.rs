//! Dense per-section ordering.
//!
//! Items of a section always carry `sort_order` values `0..n`. These helpers
//! compute the assignments the repository writes inside its transactions.

use std::collections::HashSet;
use uuid::Uuid;

use super::error::ContentError;

/// Order value for an item appended to a section holding `existing` items.
pub fn next_sort_order(existing: i64) -> i32 {
    i32::try_from(existing).unwrap_or(i32::MAX)
}

/// Assignments that renumber `ids` densely in the given order.
pub fn dense_assignments(ids: &[Uuid]) -> Vec<(Uuid, i32)> {
    ids.iter()
        .enumerate()
        .map(|(index, id)| (*id, index as i32))
        .collect()
}

/// Validate that `requested` is a permutation of `current` and return the
/// assignments that make it the section's order.
pub fn plan_reorder(current: &[Uuid], requested: &[Uuid]) -> Result<Vec<(Uuid, i32)>, ContentError> {
    let mut seen = HashSet::with_capacity(requested.len());
    if let Some(dup) = requested.iter().find(|id| !seen.insert(**id)) {
        return Err(ContentError::InvalidOrder(format!("item {} listed more than once", dup)));
    }

    let known: HashSet<&Uuid> = current.iter().collect();
    if let Some(stranger) = requested.iter().find(|id| !known.contains(id)) {
        return Err(ContentError::InvalidOrder(format!(
            "item {} does not belong to this section",
            stranger
        )));
    }

    if requested.len() != current.len() {
        return Err(ContentError::InvalidOrder(format!(
            "expected {} items, got {}",
            current.len(),
            requested.len()
        )));
    }

    Ok(dense_assignments(requested))
}
