// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Splits combined lecturer and module records into a durable profile and a
//! year-scoped instance.
//!
//! Legacy records for the same lecturer (by email) or the same module (by
//! code) in different years share one profile; a profile is created only
//! for the first of them. The instance keeps the legacy record's id, so
//! allocations that referenced the legacy record now reference its
//! instance. The legacy record is stamped with its `profile_id` in the same
//! commit. Instances are written without a capacity block and, when the
//! legacy record named none, without an academic year; later steps fill
//! both in.

use crate::step::{MigrationStep, key_of, missing_field, parse, with_field};
use serde::{Deserialize, Serialize};
use workload::{
    Collection, CoreError, Document, DocumentKey, Entity, EntityStore, Visibility, WriteBatch,
    load_all, to_body,
};
use workload_domain::{
    AcademicYearId, CategoryHours, DomainError, InstanceId, LecturerProfile, ModuleProfile,
    OrganisationId, ProfileId, ProfileKind, Semester, validate_category_hours,
    validate_lecturer_profile, validate_module_profile,
};

const STAMP_FIELD: &str = "profile_id";

/// Key and body of a profile to insert.
type NewProfile = (DocumentKey, serde_json::Value);

const fn full_time() -> f64 {
    1.0
}

const fn active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct LegacyLecturer {
    name: String,
    email: String,
    #[serde(default = "full_time")]
    fte: f64,
    contract_hours: f64,
    #[serde(default)]
    available_semesters: Vec<Semester>,
    academic_year_id: Option<AcademicYearId>,
    #[serde(default)]
    teaching_hours: f64,
    #[serde(default)]
    admin_hours: f64,
    #[serde(default)]
    research_hours: f64,
    #[serde(default)]
    other_hours: f64,
    #[serde(default = "active")]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct LegacyModule {
    code: String,
    title: String,
    #[serde(default)]
    credits: u16,
    delivery_hours: f64,
    #[serde(default)]
    groupable: bool,
    academic_year_id: Option<AcademicYearId>,
    #[serde(default)]
    teaching_hours: f64,
    #[serde(default = "active")]
    is_active: bool,
}

/// An instance as this step writes it, before later steps complete it.
#[derive(Debug, Serialize)]
struct SplitInstance<'a> {
    id: InstanceId,
    organisation_id: &'a OrganisationId,
    profile_id: &'a ProfileId,
    profile_kind: ProfileKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    academic_year_id: Option<AcademicYearId>,
    contract_hours: f64,
    available_semesters: Vec<Semester>,
    hours: CategoryHours,
}

impl SplitInstance<'_> {
    fn key(&self) -> DocumentKey {
        DocumentKey::new(
            Collection::Instances,
            self.organisation_id,
            self.id.as_str(),
        )
    }

    /// Fails if the profile already has a live instance in this instance's
    /// year.
    ///
    /// Instances without a year are checked when a year is assigned.
    fn ensure_unique(&self, store: &mut dyn EntityStore) -> Result<(), CoreError> {
        let Some(year_id) = &self.academic_year_id else {
            return Ok(());
        };
        let taken: bool = store
            .scan(self.organisation_id, Collection::Instances, Visibility::Active)?
            .iter()
            .any(|other| {
                other.str_field("profile_id") == Some(self.profile_id.as_str())
                    && other.str_field("academic_year_id") == Some(year_id.as_str())
            });
        if taken {
            return Err(DomainError::DuplicateInstance {
                profile_id: self.profile_id.clone(),
                academic_year_id: year_id.clone(),
            }
            .into());
        }
        Ok(())
    }
}

/// Writes the instance, the profile when it is new, and the legacy stamp.
fn split_batch(
    document: &Document,
    profile: Option<NewProfile>,
    instance: &SplitInstance<'_>,
) -> Result<WriteBatch, CoreError> {
    let mut batch: WriteBatch = WriteBatch::new();
    if let Some((key, body)) = profile {
        batch.insert(key, body);
    }
    batch
        .insert(instance.key(), serde_json::to_value(instance)?)
        .update(
            key_of(document),
            with_field(document, STAMP_FIELD, instance.profile_id.as_str().into())?,
        );
    Ok(batch)
}

/// Splits `legacy_lecturers` and `legacy_modules` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileStructure;

impl ProfileStructure {
    pub const NAME: &'static str = "profile_structure";

    fn split_lecturer(
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
        document: &Document,
    ) -> Result<WriteBatch, CoreError> {
        let legacy: LegacyLecturer = parse(document)?;

        let mut available_semesters: Vec<Semester> = legacy.available_semesters;
        available_semesters.sort_unstable();
        available_semesters.dedup();

        let email: String = LecturerProfile::normalize_email(&legacy.email);
        let existing: Option<LecturerProfile> =
            load_all::<LecturerProfile, _>(store, organisation_id)?
                .into_iter()
                .find(|profile| LecturerProfile::normalize_email(&profile.email) == email);
        let (profile_id, new_profile): (ProfileId, Option<NewProfile>) = match existing {
            Some(profile) => (profile.id, None),
            None => {
                let profile: LecturerProfile = LecturerProfile {
                    id: ProfileId::generate(),
                    organisation_id: organisation_id.clone(),
                    name: legacy.name.trim().to_string(),
                    email: legacy.email.trim().to_string(),
                    fte: legacy.fte,
                    contract_hours: legacy.contract_hours,
                    available_semesters: available_semesters.clone(),
                    is_active: legacy.is_active,
                };
                validate_lecturer_profile(&profile)?;
                let body: serde_json::Value = to_body(&profile)?;
                (profile.id.clone(), Some((profile.key(), body)))
            }
        };

        let instance: SplitInstance<'_> = SplitInstance {
            id: InstanceId::new(&document.id),
            organisation_id,
            profile_id: &profile_id,
            profile_kind: ProfileKind::Lecturer,
            academic_year_id: legacy.academic_year_id,
            contract_hours: legacy.contract_hours,
            available_semesters,
            hours: CategoryHours {
                teaching: legacy.teaching_hours,
                admin: legacy.admin_hours,
                research: legacy.research_hours,
                other: legacy.other_hours,
            },
        };
        validate_category_hours(&instance.hours)?;
        instance.ensure_unique(store)?;

        split_batch(document, new_profile, &instance)
    }

    fn split_module(
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
        document: &Document,
    ) -> Result<WriteBatch, CoreError> {
        let legacy: LegacyModule = parse(document)?;

        let code: String = ModuleProfile::normalize_code(&legacy.code);
        let existing: Option<ModuleProfile> =
            load_all::<ModuleProfile, _>(store, organisation_id)?
                .into_iter()
                .find(|profile| ModuleProfile::normalize_code(&profile.code) == code);
        let (profile_id, new_profile): (ProfileId, Option<NewProfile>) = match existing {
            Some(profile) => (profile.id, None),
            None => {
                let profile: ModuleProfile = ModuleProfile {
                    id: ProfileId::generate(),
                    organisation_id: organisation_id.clone(),
                    code,
                    title: legacy.title.trim().to_string(),
                    credits: legacy.credits,
                    delivery_hours: legacy.delivery_hours,
                    groupable: legacy.groupable,
                    is_active: legacy.is_active,
                };
                validate_module_profile(&profile)?;
                let body: serde_json::Value = to_body(&profile)?;
                (profile.id.clone(), Some((profile.key(), body)))
            }
        };

        let instance: SplitInstance<'_> = SplitInstance {
            id: InstanceId::new(&document.id),
            organisation_id,
            profile_id: &profile_id,
            profile_kind: ProfileKind::Module,
            academic_year_id: legacy.academic_year_id,
            contract_hours: legacy.delivery_hours,
            available_semesters: Vec::new(),
            hours: CategoryHours {
                teaching: legacy.teaching_hours,
                ..CategoryHours::default()
            },
        };
        validate_category_hours(&instance.hours)?;
        instance.ensure_unique(store)?;

        split_batch(document, new_profile, &instance)
    }
}

impl MigrationStep for ProfileStructure {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Split combined lecturer and module records into profiles and instances"
    }

    fn candidates(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<Document>, CoreError> {
        let mut candidates: Vec<Document> = missing_field(
            store,
            organisation_id,
            Collection::LegacyLecturers,
            STAMP_FIELD,
        )?;
        candidates.extend(missing_field(
            store,
            organisation_id,
            Collection::LegacyModules,
            STAMP_FIELD,
        )?);
        Ok(candidates)
    }

    fn migrate(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
        document: &Document,
    ) -> Result<WriteBatch, CoreError> {
        match document.collection {
            Collection::LegacyLecturers => Self::split_lecturer(store, organisation_id, document),
            Collection::LegacyModules => Self::split_module(store, organisation_id, document),
            other => Err(CoreError::Integrity(format!(
                "{other} documents are not split by {}",
                Self::NAME
            ))),
        }
    }
}
