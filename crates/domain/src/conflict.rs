// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Allocation conflict detection.
//!
//! A slot is `(subject_key, academic_year_id, semester, group)`. For a
//! groupable subject the group number is part of the slot; for any other
//! subject every group collapses into one slot. A slot held by more than one
//! distinct assignee is a conflict.

use crate::error::DomainError;
use crate::ids::{AcademicYearId, AllocationId, InstanceId};
use crate::types::{Allocation, Semester};
use std::collections::{BTreeMap, HashMap, HashSet};

/// The uniqueness key of an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub subject_key: String,
    pub academic_year_id: AcademicYearId,
    pub semester: Semester,
    /// `None` when the subject is not groupable.
    pub group: Option<u16>,
}

impl Allocation {
    /// Returns the slot this allocation occupies.
    #[must_use]
    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            subject_key: self.subject_key.clone(),
            academic_year_id: self.academic_year_id.clone(),
            semester: self.semester,
            group: self.groupable.then_some(self.group_number),
        }
    }
}

/// A slot held by more than one assignee, with every member in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictGroup {
    pub key: SlotKey,
    pub members: Vec<Allocation>,
}

impl ConflictGroup {
    /// Ids of every allocation in the group.
    #[must_use]
    pub fn allocation_ids(&self) -> Vec<AllocationId> {
        self.members.iter().map(|a| a.id.clone()).collect()
    }
}

/// Groups allocations by slot and reports every slot with more than one
/// distinct assignee.
///
/// Callers pass only live allocations; soft-deleted records are filtered by
/// the store's default view. Output is ordered by subject key, then
/// semester, then the input position of the group's first member.
#[must_use]
pub fn detect_conflicts(allocations: &[Allocation]) -> Vec<ConflictGroup> {
    let mut first_seen: Vec<SlotKey> = Vec::new();
    let mut positions: HashMap<SlotKey, usize> = HashMap::new();
    let mut slots: BTreeMap<usize, Vec<&Allocation>> = BTreeMap::new();

    for allocation in allocations {
        let key: SlotKey = allocation.slot_key();
        let position: usize = *positions.entry(key.clone()).or_insert_with(|| {
            first_seen.push(key);
            first_seen.len() - 1
        });
        slots.entry(position).or_default().push(allocation);
    }

    let mut groups: Vec<(usize, ConflictGroup)> = slots
        .into_iter()
        .filter(|(_, members)| distinct_assignees(members) > 1)
        .map(|(position, members)| {
            (
                position,
                ConflictGroup {
                    key: first_seen[position].clone(),
                    members: members.into_iter().cloned().collect(),
                },
            )
        })
        .collect();

    groups.sort_by(|(pa, a), (pb, b)| {
        a.key
            .subject_key
            .cmp(&b.key.subject_key)
            .then(a.key.semester.cmp(&b.key.semester))
            .then(pa.cmp(pb))
    });

    groups.into_iter().map(|(_, group)| group).collect()
}

/// Rejects `candidate` if its slot is already held by a different assignee.
///
/// When `candidate` edits an existing allocation, the stored copy with the
/// same id is excluded from the comparison.
///
/// # Errors
///
/// Returns `DomainError::AllocationConflict` naming every existing
/// allocation that holds the slot for another assignee.
pub fn check_before_commit(
    candidate: &Allocation,
    existing: &[Allocation],
) -> Result<(), DomainError> {
    let key: SlotKey = candidate.slot_key();
    let conflicting: Vec<AllocationId> = existing
        .iter()
        .filter(|other| other.id != candidate.id)
        .filter(|other| other.assignee_instance_id != candidate.assignee_instance_id)
        .filter(|other| other.slot_key() == key)
        .map(|other| other.id.clone())
        .collect();

    if conflicting.is_empty() {
        return Ok(());
    }

    Err(DomainError::AllocationConflict {
        subject_key: key.subject_key,
        semester: key.semester,
        group: key.group,
        conflicting,
    })
}

fn distinct_assignees(members: &[&Allocation]) -> usize {
    members
        .iter()
        .map(|a| &a.assignee_instance_id)
        .collect::<HashSet<&InstanceId>>()
        .len()
}
