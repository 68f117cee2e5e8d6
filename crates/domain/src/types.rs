// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::capacity::{Capacity, recalculate};
use crate::error::DomainError;
use crate::ids::{AcademicYearId, AllocationId, CohortId, InstanceId, OrganisationId, ProfileId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::Date;

/// A tenant organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
    /// The organisation identifier.
    pub id: OrganisationId,
    /// Display name.
    pub name: String,
    /// Inactive organisations cannot be migrated or written to.
    pub is_active: bool,
}

/// An academic year within an organisation.
///
/// At most one academic year per organisation is active at a time.
/// A staging year is visible to planners but not yet published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicYear {
    pub id: AcademicYearId,
    pub organisation_id: OrganisationId,
    /// Display name, e.g. `2025/26`.
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub is_active: bool,
    pub is_staging: bool,
}

/// A student cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    pub id: CohortId,
    pub organisation_id: OrganisationId,
    pub name: String,
    pub academic_year_id: Option<AcademicYearId>,
    pub start_date: Date,
    pub end_date: Date,
}

/// A teaching period within an academic year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Semester {
    Autumn,
    Spring,
    Summer,
}

impl Semester {
    /// Every semester, in calendar order.
    pub const ALL: [Self; 3] = [Self::Autumn, Self::Spring, Self::Summer];

    /// Returns the string representation of the semester.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Autumn => "autumn",
            Self::Spring => "spring",
            Self::Summer => "summer",
        }
    }
}

impl FromStr for Semester {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "autumn" => Ok(Self::Autumn),
            "spring" => Ok(Self::Spring),
            "summer" => Ok(Self::Summer),
            _ => Err(DomainError::InvalidSemester(s.to_string())),
        }
    }
}

impl std::fmt::Display for Semester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of durable profile an instance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Lecturer,
    Module,
}

impl ProfileKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lecturer => "lecturer",
            Self::Module => "module",
        }
    }
}

/// Durable lecturer identity, independent of academic year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LecturerProfile {
    pub id: ProfileId,
    pub organisation_id: OrganisationId,
    pub name: String,
    pub email: String,
    /// Full-time equivalent, in `(0, 1]`.
    pub fte: f64,
    /// Contractual annual hours copied into each new year's instance.
    pub contract_hours: f64,
    /// Semesters the lecturer is available to teach by default.
    pub available_semesters: Vec<Semester>,
    pub is_active: bool,
}

impl LecturerProfile {
    /// Normalizes an email address for comparison.
    #[must_use]
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

/// Durable module identity, independent of academic year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleProfile {
    pub id: ProfileId,
    pub organisation_id: OrganisationId,
    /// Module code, unique within the organisation. Stored uppercase.
    pub code: String,
    pub title: String,
    pub credits: u16,
    /// Teaching hours a module instance requires each year.
    pub delivery_hours: f64,
    /// Groupable modules run several parallel groups, each allocated separately.
    pub groupable: bool,
    pub is_active: bool,
}

impl ModuleProfile {
    /// Normalizes a module code for storage and comparison.
    #[must_use]
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }
}

/// Allocated hours by workload category.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryHours {
    pub teaching: f64,
    pub admin: f64,
    pub research: f64,
    pub other: f64,
}

impl CategoryHours {
    /// Sum of every category.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.teaching + self.admin + self.research + self.other
    }
}

/// A profile's allocation record for one academic year.
///
/// `capacity` is derived from `hours` and `contract_hours` and is only ever
/// produced by [`recalculate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub organisation_id: OrganisationId,
    pub profile_id: ProfileId,
    pub profile_kind: ProfileKind,
    pub academic_year_id: AcademicYearId,
    pub contract_hours: f64,
    pub available_semesters: Vec<Semester>,
    pub hours: CategoryHours,
    pub capacity: Capacity,
}

impl Instance {
    /// Creates an instance with every allocated-hour field set to zero.
    #[must_use]
    pub fn zeroed(
        organisation_id: OrganisationId,
        profile_id: ProfileId,
        profile_kind: ProfileKind,
        academic_year_id: AcademicYearId,
        contract_hours: f64,
        available_semesters: Vec<Semester>,
    ) -> Self {
        let mut instance: Self = Self {
            id: InstanceId::generate(),
            organisation_id,
            profile_id,
            profile_kind,
            academic_year_id,
            contract_hours,
            available_semesters,
            hours: CategoryHours::default(),
            capacity: Capacity::default(),
        };
        instance.refresh_capacity();
        instance
    }

    /// Recomputes the derived capacity block from the current hours.
    pub fn refresh_capacity(&mut self) {
        self.capacity = recalculate(self);
    }
}

/// What an allocation assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationKind {
    /// Teaching on a module; the subject key is the module code.
    Module,
    /// An administrative role; the subject key is the admin category.
    Admin,
}

/// Assignment of hours on a subject slot to a lecturer instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub organisation_id: OrganisationId,
    pub kind: AllocationKind,
    /// Module code or admin category.
    pub subject_key: String,
    pub academic_year_id: AcademicYearId,
    pub semester: Semester,
    pub group_number: u16,
    /// Copied from the module profile when the allocation is written.
    pub groupable: bool,
    pub assignee_instance_id: InstanceId,
    pub hours: f64,
}
