// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::ids::{AcademicYearId, AllocationId, ProfileId};
use crate::types::Semester;
use time::Date;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A start date falls after its end date.
    InvalidDateRange {
        /// The kind of entity carrying the range.
        entity: &'static str,
        /// The start date supplied.
        start_date: Date,
        /// The end date supplied.
        end_date: Date,
    },
    /// Academic year value is invalid.
    InvalidAcademicYear(String),
    /// A required field is missing or empty.
    MissingField {
        /// The kind of entity being validated.
        entity: &'static str,
        /// The missing field.
        field: &'static str,
    },
    /// An hours value is negative or not a finite number.
    InvalidHours {
        /// The hours field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// Full-time equivalent is outside `(0, 1]`.
    InvalidFte(String),
    /// Lecturer email is malformed.
    InvalidEmail(String),
    /// Allocation group number is invalid.
    InvalidGroupNumber(u16),
    /// An allocation's assignee cannot hold it.
    InvalidAssignee(String),
    /// Semester string could not be parsed.
    InvalidSemester(String),
    /// Capacity status string could not be parsed.
    InvalidCapacityStatus(String),
    /// Migration status string could not be parsed.
    InvalidMigrationStatus(String),
    /// A migration status transition is not permitted.
    InvalidMigrationTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },
    /// A module code is already used within the organisation.
    DuplicateModuleCode(String),
    /// An instance already exists for the profile and academic year.
    DuplicateInstance {
        /// The profile.
        profile_id: ProfileId,
        /// The academic year.
        academic_year_id: AcademicYearId,
    },
    /// Another academic year is already active.
    MultipleActiveYears {
        /// The currently active year.
        current_active: AcademicYearId,
        /// The year attempting to become active.
        requested_active: AcademicYearId,
    },
    /// An allocation slot is already held by a different assignee.
    AllocationConflict {
        /// The subject of the contested slot.
        subject_key: String,
        /// The semester of the contested slot.
        semester: Semester,
        /// The group of the contested slot (`None` when not groupable).
        group: Option<u16>,
        /// The existing allocations occupying the slot.
        conflicting: Vec<AllocationId>,
    },
}

impl DomainError {
    /// Returns whether this error is a uniqueness violation.
    ///
    /// Uniqueness violations are surfaced to callers as conflicts rather than
    /// as malformed input.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateModuleCode(_)
                | Self::DuplicateInstance { .. }
                | Self::AllocationConflict { .. }
        )
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDateRange {
                entity,
                start_date,
                end_date,
            } => {
                write!(
                    f,
                    "Invalid {entity} dates: start date {start_date} is after end date {end_date}"
                )
            }
            Self::InvalidAcademicYear(msg) => write!(f, "Invalid academic year: {msg}"),
            Self::MissingField { entity, field } => {
                write!(f, "Missing required field '{field}' on {entity}")
            }
            Self::InvalidHours { field, reason } => {
                write!(f, "Invalid hours for '{field}': {reason}")
            }
            Self::InvalidFte(msg) => write!(f, "Invalid FTE: {msg}"),
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {msg}"),
            Self::InvalidGroupNumber(group) => {
                write!(f, "Invalid group number: {group}. Must be at least 1")
            }
            Self::InvalidAssignee(msg) => write!(f, "Invalid assignee: {msg}"),
            Self::InvalidSemester(value) => write!(f, "Invalid semester: {value}"),
            Self::InvalidCapacityStatus(value) => write!(f, "Invalid capacity status: {value}"),
            Self::InvalidMigrationStatus(value) => {
                write!(f, "Invalid migration status: {value}")
            }
            Self::InvalidMigrationTransition { from, to } => {
                write!(f, "Invalid migration status transition from {from} to {to}")
            }
            Self::DuplicateModuleCode(code) => {
                write!(f, "Module with code '{code}' already exists")
            }
            Self::DuplicateInstance {
                profile_id,
                academic_year_id,
            } => {
                write!(
                    f,
                    "Profile {profile_id} already has an instance in academic year {academic_year_id}"
                )
            }
            Self::MultipleActiveYears {
                current_active,
                requested_active,
            } => {
                write!(
                    f,
                    "Cannot create academic year {requested_active} as active: academic year {current_active} is already active"
                )
            }
            Self::AllocationConflict {
                subject_key,
                semester,
                group,
                conflicting,
            } => {
                let ids: Vec<&str> = conflicting.iter().map(AllocationId::as_str).collect();
                match group {
                    Some(group) => write!(
                        f,
                        "Slot {subject_key}/{semester}/group {group} is already allocated by {}",
                        ids.join(", ")
                    ),
                    None => write!(
                        f,
                        "Slot {subject_key}/{semester} is already allocated by {}",
                        ids.join(", ")
                    ),
                }
            }
        }
    }
}

impl std::error::Error for DomainError {}
