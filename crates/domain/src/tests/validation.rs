// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    AcademicYear, AcademicYearId, Allocation, AllocationId, AllocationKind, CategoryHours, Cohort,
    CohortId, DomainError, InstanceId, LecturerProfile, ModuleProfile, OrganisationId, ProfileId,
    Semester, validate_academic_year, validate_allocation, validate_category_hours,
    validate_cohort, validate_hours, validate_lecturer_profile, validate_module_code_unique,
    validate_module_profile, validate_single_active_year,
};
use time::macros::date;

fn create_test_year(id: &str, is_active: bool) -> AcademicYear {
    AcademicYear {
        id: AcademicYearId::new(id),
        organisation_id: OrganisationId::new("org-1"),
        name: String::from("2025/26"),
        start_date: date!(2025 - 09 - 01),
        end_date: date!(2026 - 08 - 31),
        is_active,
        is_staging: false,
    }
}

fn create_test_lecturer() -> LecturerProfile {
    LecturerProfile {
        id: ProfileId::new("lec-1"),
        organisation_id: OrganisationId::new("org-1"),
        name: String::from("Ada Lovelace"),
        email: String::from("ada@example.ac.uk"),
        fte: 1.0,
        contract_hours: 550.0,
        available_semesters: vec![Semester::Autumn, Semester::Spring],
        is_active: true,
    }
}

fn create_test_module(id: &str, code: &str) -> ModuleProfile {
    ModuleProfile {
        id: ProfileId::new(id),
        organisation_id: OrganisationId::new("org-1"),
        code: code.to_string(),
        title: String::from("Programming"),
        credits: 20,
        delivery_hours: 48.0,
        groupable: false,
        is_active: true,
    }
}

fn create_test_allocation() -> Allocation {
    Allocation {
        id: AllocationId::new("a1"),
        organisation_id: OrganisationId::new("org-1"),
        kind: AllocationKind::Module,
        subject_key: String::from("CS101"),
        academic_year_id: AcademicYearId::new("ay-2025"),
        semester: Semester::Autumn,
        group_number: 1,
        groupable: false,
        assignee_instance_id: InstanceId::new("inst-1"),
        hours: 24.0,
    }
}

#[test]
fn test_cohort_start_after_end_is_rejected() {
    let cohort: Cohort = Cohort {
        id: CohortId::new("c1"),
        organisation_id: OrganisationId::new("org-1"),
        name: String::from("BSc 2025"),
        academic_year_id: None,
        start_date: date!(2025 - 09 - 01),
        end_date: date!(2025 - 08 - 01),
    };
    let result: Result<(), DomainError> = validate_cohort(&cohort);
    assert!(matches!(
        result,
        Err(DomainError::InvalidDateRange {
            entity: "cohort",
            ..
        })
    ));
}

#[test]
fn test_cohort_single_day_is_accepted() {
    let cohort: Cohort = Cohort {
        id: CohortId::new("c1"),
        organisation_id: OrganisationId::new("org-1"),
        name: String::from("Induction"),
        academic_year_id: Some(AcademicYearId::new("ay-2025")),
        start_date: date!(2025 - 09 - 01),
        end_date: date!(2025 - 09 - 01),
    };
    assert!(validate_cohort(&cohort).is_ok());
}

#[test]
fn test_academic_year_accepts_valid_range() {
    assert!(validate_academic_year(&create_test_year("ay-2025", true)).is_ok());
}

#[test]
fn test_academic_year_rejects_equal_dates() {
    let mut year: AcademicYear = create_test_year("ay-2025", false);
    year.end_date = year.start_date;
    assert!(matches!(
        validate_academic_year(&year),
        Err(DomainError::InvalidDateRange { .. })
    ));
}

#[test]
fn test_academic_year_rejects_out_of_bounds_dates() {
    let mut year: AcademicYear = create_test_year("ay-1800", false);
    year.start_date = date!(1899 - 09 - 01);
    assert!(matches!(
        validate_academic_year(&year),
        Err(DomainError::InvalidAcademicYear(_))
    ));
}

#[test]
fn test_academic_year_rejects_empty_name() {
    let mut year: AcademicYear = create_test_year("ay-2025", false);
    year.name = String::from("  ");
    assert!(matches!(
        validate_academic_year(&year),
        Err(DomainError::MissingField { field: "name", .. })
    ));
}

#[test]
fn test_second_active_year_is_rejected() {
    let existing: Vec<AcademicYear> = vec![create_test_year("ay-2024", true)];
    let candidate: AcademicYear = create_test_year("ay-2025", true);
    let result: Result<(), DomainError> = validate_single_active_year(&candidate, &existing);
    match result {
        Err(DomainError::MultipleActiveYears {
            current_active,
            requested_active,
        }) => {
            assert_eq!(current_active, AcademicYearId::new("ay-2024"));
            assert_eq!(requested_active, AcademicYearId::new("ay-2025"));
        }
        other => panic!("expected MultipleActiveYears, got {other:?}"),
    }
}

#[test]
fn test_inactive_year_passes_single_active_check() {
    let existing: Vec<AcademicYear> = vec![create_test_year("ay-2024", true)];
    let candidate: AcademicYear = create_test_year("ay-2025", false);
    assert!(validate_single_active_year(&candidate, &existing).is_ok());
}

#[test]
fn test_active_year_revalidates_against_itself() {
    let year: AcademicYear = create_test_year("ay-2025", true);
    assert!(validate_single_active_year(&year, std::slice::from_ref(&year)).is_ok());
}

#[test]
fn test_hours_reject_negative_and_non_finite() {
    assert!(validate_hours("teaching", 0.0).is_ok());
    assert!(validate_hours("teaching", 7.5).is_ok());
    assert!(matches!(
        validate_hours("teaching", -1.0),
        Err(DomainError::InvalidHours {
            field: "teaching",
            ..
        })
    ));
    assert!(validate_hours("teaching", f64::NAN).is_err());
    assert!(validate_hours("teaching", f64::INFINITY).is_err());
}

#[test]
fn test_category_hours_reports_offending_field() {
    let hours: CategoryHours = CategoryHours {
        research: -2.0,
        ..CategoryHours::default()
    };
    assert!(matches!(
        validate_category_hours(&hours),
        Err(DomainError::InvalidHours {
            field: "research",
            ..
        })
    ));
}

#[test]
fn test_lecturer_accepts_valid_profile() {
    assert!(validate_lecturer_profile(&create_test_lecturer()).is_ok());
}

#[test]
fn test_lecturer_rejects_bad_fte() {
    for fte in [0.0, -0.5, 1.5, f64::NAN] {
        let mut lecturer: LecturerProfile = create_test_lecturer();
        lecturer.fte = fte;
        assert!(matches!(
            validate_lecturer_profile(&lecturer),
            Err(DomainError::InvalidFte(_))
        ));
    }
}

#[test]
fn test_lecturer_rejects_bad_email() {
    for email in ["", "ada", "@example.ac.uk", "ada@", "ada@x@y"] {
        let mut lecturer: LecturerProfile = create_test_lecturer();
        lecturer.email = email.to_string();
        assert!(matches!(
            validate_lecturer_profile(&lecturer),
            Err(DomainError::InvalidEmail(_))
        ));
    }
}

#[test]
fn test_lecturer_rejects_empty_name() {
    let mut lecturer: LecturerProfile = create_test_lecturer();
    lecturer.name = String::new();
    assert!(matches!(
        validate_lecturer_profile(&lecturer),
        Err(DomainError::MissingField { field: "name", .. })
    ));
}

#[test]
fn test_module_requires_code_and_title() {
    let module: ModuleProfile = create_test_module("mod-1", "");
    assert!(matches!(
        validate_module_profile(&module),
        Err(DomainError::MissingField { field: "code", .. })
    ));

    let mut module: ModuleProfile = create_test_module("mod-1", "CS101");
    module.title = String::new();
    assert!(matches!(
        validate_module_profile(&module),
        Err(DomainError::MissingField { field: "title", .. })
    ));
}

#[test]
fn test_module_code_uniqueness_is_case_insensitive() {
    let existing: Vec<ModuleProfile> = vec![create_test_module("mod-1", "CS101")];
    let candidate: ModuleProfile = create_test_module("mod-2", "cs101");
    let result: Result<(), DomainError> = validate_module_code_unique(&candidate, &existing);
    assert_eq!(
        result,
        Err(DomainError::DuplicateModuleCode(String::from("CS101")))
    );
}

#[test]
fn test_module_code_uniqueness_ignores_self() {
    let existing: Vec<ModuleProfile> = vec![create_test_module("mod-1", "CS101")];
    assert!(validate_module_code_unique(&existing[0], &existing).is_ok());
}

#[test]
fn test_allocation_rejects_group_zero() {
    let mut allocation: Allocation = create_test_allocation();
    allocation.group_number = 0;
    assert_eq!(
        validate_allocation(&allocation),
        Err(DomainError::InvalidGroupNumber(0))
    );
}

#[test]
fn test_allocation_rejects_empty_subject_and_negative_hours() {
    let mut allocation: Allocation = create_test_allocation();
    allocation.subject_key = String::new();
    assert!(validate_allocation(&allocation).is_err());

    let mut allocation: Allocation = create_test_allocation();
    allocation.hours = -3.0;
    assert!(matches!(
        validate_allocation(&allocation),
        Err(DomainError::InvalidHours { field: "hours", .. })
    ));
}
