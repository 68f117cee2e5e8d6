// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod capacity;
mod conflict;
mod error;
mod ids;
mod migration;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use capacity::{
    Capacity, CapacityStatus, HOURS_EPSILON, NEAR_CAPACITY_THRESHOLD_PCT, StatusChange,
    capacity_for, recalculate,
};
pub use conflict::{ConflictGroup, SlotKey, check_before_commit, detect_conflicts};

// Re-export public types
pub use error::DomainError;
pub use ids::{AcademicYearId, AllocationId, CohortId, InstanceId, OrganisationId, ProfileId};
pub use migration::{MigrationDetails, MigrationRecord, MigrationStatus, MigrationStepError};
pub use types::{
    AcademicYear, Allocation, AllocationKind, CategoryHours, Cohort, Instance, LecturerProfile,
    ModuleProfile, Organisation, ProfileKind, Semester,
};
pub use validation::{
    validate_academic_year, validate_allocation, validate_category_hours, validate_cohort,
    validate_hours, validate_lecturer_profile, validate_module_code_unique,
    validate_module_profile, validate_single_active_year,
};
