//! Detection of discontinuities in the ranges of confirmed rollup blocks.
//!
//! Confirmation transactions may skip or merge block ranges arbitrarily, so
//! each group of blocks confirmed by one transaction is compared against the
//! group immediately preceding it in block order. The most recent break in
//! contiguity bounds the L1 range a re-indexer has to backfill.

use crate::types::{ConfirmationGap, ConfirmationGroup, Inconsistency, Lookup};

/// A group paired with the group preceding it in block order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary<'a> {
    pub previous: Option<&'a ConfirmationGroup>,
    pub current: &'a ConfirmationGroup,
}

impl Boundary<'_> {
    /// Whether the current group does not start right after the previous one ends.
    /// The leading group has no predecessor and always counts as a boundary.
    pub fn is_discontinuous(&self) -> bool {
        match self.previous {
            None => true,
            Some(previous) => self.current.min_block.checked_sub(1) != Some(previous.max_block),
        }
    }
}

/// Orders groups by their lowest block and pairs each with its predecessor.
pub fn ordered_boundaries(groups: &[ConfirmationGroup]) -> Vec<Boundary<'_>> {
    let mut ordered: Vec<&ConfirmationGroup> = groups.iter().collect();
    ordered.sort_by_key(|g| (g.min_block, g.confirmation_id));

    let mut previous = None;
    ordered
        .into_iter()
        .map(|current| {
            let boundary = Boundary { previous, current };
            previous = Some(current);
            boundary
        })
        .collect()
}

/// Finds the most recent gap between confirmation groups.
///
/// Returns `NotFound` when the groups form a single contiguous run, including
/// the case of zero or one group.
pub fn most_recent_gap(groups: &[ConfirmationGroup]) -> Lookup<ConfirmationGap> {
    let boundary = ordered_boundaries(groups)
        .into_iter()
        .filter(Boundary::is_discontinuous)
        .max_by_key(|b| b.current.min_block);

    let Some(Boundary {
        previous: Some(previous),
        current,
    }) = boundary
    else {
        return Lookup::NotFound;
    };

    match (previous.l1_block_number, current.l1_block_number) {
        (Some(previous_l1_block), Some(l1_block)) => Lookup::Found(ConfirmationGap {
            previous_l1_block,
            l1_block,
        }),
        (None, _) => Lookup::Inconsistent(Inconsistency::UnresolvedConfirmation {
            confirmation_id: previous.confirmation_id,
        }),
        (_, None) => Lookup::Inconsistent(Inconsistency::UnresolvedConfirmation {
            confirmation_id: current.confirmation_id,
        }),
    }
}
