// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{
    AcademicYear, Allocation, CategoryHours, Cohort, LecturerProfile, ModuleProfile,
};

/// Validates that an hours value is finite and non-negative.
///
/// # Errors
///
/// Returns `DomainError::InvalidHours` if the value is negative, NaN, or
/// infinite.
pub fn validate_hours(field: &'static str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() {
        return Err(DomainError::InvalidHours {
            field,
            reason: format!("{value} is not a finite number"),
        });
    }
    if value < 0.0 {
        return Err(DomainError::InvalidHours {
            field,
            reason: format!("{value} is negative"),
        });
    }
    Ok(())
}

/// Validates every category of an instance's hours.
///
/// # Errors
///
/// Returns the first `DomainError::InvalidHours` encountered.
pub fn validate_category_hours(hours: &CategoryHours) -> Result<(), DomainError> {
    validate_hours("teaching", hours.teaching)?;
    validate_hours("admin", hours.admin)?;
    validate_hours("research", hours.research)?;
    validate_hours("other", hours.other)
}

/// Validates an academic year.
///
/// # Errors
///
/// Returns an error if:
/// - The name is empty
/// - The start date is not strictly before the end date
/// - Either date falls outside the years 1900 to 2200
pub fn validate_academic_year(year: &AcademicYear) -> Result<(), DomainError> {
    if year.name.trim().is_empty() {
        return Err(DomainError::MissingField {
            entity: "academic year",
            field: "name",
        });
    }

    if year.start_date >= year.end_date {
        return Err(DomainError::InvalidDateRange {
            entity: "academic year",
            start_date: year.start_date,
            end_date: year.end_date,
        });
    }

    for date in [year.start_date, year.end_date] {
        if !(1900..=2200).contains(&date.year()) {
            return Err(DomainError::InvalidAcademicYear(format!(
                "Academic year dates must fall between 1900 and 2200, got {date}"
            )));
        }
    }

    Ok(())
}

/// Validates that activating `candidate` would leave one active year.
///
/// `existing` is every live academic year of the organisation. A year that
/// is already active may be re-validated against itself.
///
/// # Errors
///
/// Returns `DomainError::MultipleActiveYears` if a different year is active.
pub fn validate_single_active_year(
    candidate: &AcademicYear,
    existing: &[AcademicYear],
) -> Result<(), DomainError> {
    if !candidate.is_active {
        return Ok(());
    }

    match existing
        .iter()
        .find(|year| year.is_active && year.id != candidate.id)
    {
        Some(active) => Err(DomainError::MultipleActiveYears {
            current_active: active.id.clone(),
            requested_active: candidate.id.clone(),
        }),
        None => Ok(()),
    }
}

/// Validates a cohort.
///
/// A cohort may start and end on the same day.
///
/// # Errors
///
/// Returns an error if the name is empty or the start date is after the end
/// date.
pub fn validate_cohort(cohort: &Cohort) -> Result<(), DomainError> {
    if cohort.name.trim().is_empty() {
        return Err(DomainError::MissingField {
            entity: "cohort",
            field: "name",
        });
    }

    if cohort.start_date > cohort.end_date {
        return Err(DomainError::InvalidDateRange {
            entity: "cohort",
            start_date: cohort.start_date,
            end_date: cohort.end_date,
        });
    }

    Ok(())
}

/// Validates the field constraints of a lecturer profile.
///
/// # Errors
///
/// Returns an error if:
/// - The name is empty
/// - The email is not of the form `local@domain`
/// - The FTE is not in `(0, 1]`
/// - The contract hours are negative or not finite
pub fn validate_lecturer_profile(profile: &LecturerProfile) -> Result<(), DomainError> {
    if profile.name.trim().is_empty() {
        return Err(DomainError::MissingField {
            entity: "lecturer",
            field: "name",
        });
    }

    validate_email(&profile.email)?;

    if !profile.fte.is_finite() || profile.fte <= 0.0 || profile.fte > 1.0 {
        return Err(DomainError::InvalidFte(format!(
            "FTE must be greater than 0 and at most 1, got {}",
            profile.fte
        )));
    }

    validate_hours("contract_hours", profile.contract_hours)
}

/// Validates the field constraints of a module profile.
///
/// Uniqueness of the code is checked separately by
/// [`validate_module_code_unique`].
///
/// # Errors
///
/// Returns an error if the code or title is empty, or the delivery hours are
/// invalid.
pub fn validate_module_profile(profile: &ModuleProfile) -> Result<(), DomainError> {
    if profile.code.trim().is_empty() {
        return Err(DomainError::MissingField {
            entity: "module",
            field: "code",
        });
    }

    if profile.title.trim().is_empty() {
        return Err(DomainError::MissingField {
            entity: "module",
            field: "title",
        });
    }

    validate_hours("delivery_hours", profile.delivery_hours)
}

/// Validates that a module code is unique within an organisation.
///
/// Codes are compared after normalization. `existing` holds the
/// organisation's live modules; the candidate itself is skipped by id.
///
/// # Errors
///
/// Returns `DomainError::DuplicateModuleCode` if another module uses the code.
pub fn validate_module_code_unique(
    candidate: &ModuleProfile,
    existing: &[ModuleProfile],
) -> Result<(), DomainError> {
    let code: String = ModuleProfile::normalize_code(&candidate.code);

    if existing
        .iter()
        .filter(|module| module.id != candidate.id)
        .any(|module| ModuleProfile::normalize_code(&module.code) == code)
    {
        return Err(DomainError::DuplicateModuleCode(code));
    }

    Ok(())
}

/// Validates the field constraints of an allocation.
///
/// # Errors
///
/// Returns an error if:
/// - The subject key is empty
/// - The group number is zero
/// - The hours are negative or not finite
pub fn validate_allocation(allocation: &Allocation) -> Result<(), DomainError> {
    if allocation.subject_key.trim().is_empty() {
        return Err(DomainError::MissingField {
            entity: "allocation",
            field: "subject_key",
        });
    }

    if allocation.group_number == 0 {
        return Err(DomainError::InvalidGroupNumber(allocation.group_number));
    }

    validate_hours("hours", allocation.hours)
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return Err(DomainError::InvalidEmail(format!("'{email}' has no '@'")));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(DomainError::InvalidEmail(format!(
            "'{email}' is not of the form local@domain"
        )));
    }

    Ok(())
}
