// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Typed requests accepted by the workload operations.
//!
//! Requests carry intent as data only. Each is validated before any read or
//! write is attempted.

use serde::{Deserialize, Serialize};
use time::Date;
use workload_domain::{AcademicYearId, AllocationId, AllocationKind, InstanceId, Semester};

/// A lecturer to create. Also the row type of a lecturer bulk import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLecturer {
    pub name: String,
    pub email: String,
    pub fte: f64,
    pub contract_hours: f64,
    pub available_semesters: Vec<Semester>,
}

/// A module to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewModule {
    pub code: String,
    pub title: String,
    pub credits: u16,
    pub delivery_hours: f64,
    pub groupable: bool,
}

/// An academic year to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAcademicYear {
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub is_active: bool,
    pub is_staging: bool,
}

/// A cohort to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCohort {
    pub name: String,
    pub academic_year_id: Option<AcademicYearId>,
    pub start_date: Date,
    pub end_date: Date,
}

/// Overrides for a new instance. Absent fields come from the profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceDefaults {
    pub contract_hours: Option<f64>,
    pub available_semesters: Option<Vec<Semester>>,
}

/// An allocation to create, or to replace when `id` names an existing one.
///
/// For module allocations `subject_key` is the module code; groupability is
/// taken from the module, never from the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub id: Option<AllocationId>,
    pub kind: AllocationKind,
    pub subject_key: String,
    pub academic_year_id: AcademicYearId,
    pub semester: Semester,
    pub group_number: u16,
    pub assignee_instance_id: InstanceId,
    pub hours: f64,
}
