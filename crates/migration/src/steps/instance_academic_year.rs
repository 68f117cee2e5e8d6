// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::step::{MigrationStep, key_of, missing_field, required_str, with_field};
use workload::{Collection, CoreError, Document, EntityStore, Visibility, WriteBatch, load_all};
use workload_domain::{AcademicYear, DomainError, OrganisationId, ProfileId};

const FIELD: &str = "academic_year_id";

/// Assigns instances without an academic year to the organisation's active
/// year.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceAcademicYear;

impl InstanceAcademicYear {
    pub const NAME: &'static str = "instance_academic_year";
}

fn active_year(
    store: &mut dyn EntityStore,
    organisation_id: &OrganisationId,
) -> Result<AcademicYear, CoreError> {
    load_all::<AcademicYear, _>(store, organisation_id)?
        .into_iter()
        .find(|year| year.is_active)
        .ok_or_else(|| {
            CoreError::Integrity(format!(
                "organisation '{organisation_id}' has no active academic year"
            ))
        })
}

impl MigrationStep for InstanceAcademicYear {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Assign instances without an academic year to the active year"
    }

    fn check_preconditions(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
    ) -> Result<(), CoreError> {
        active_year(store, organisation_id).map(|_| ())
    }

    fn candidates(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<Document>, CoreError> {
        missing_field(store, organisation_id, Collection::Instances, FIELD)
    }

    fn migrate(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
        document: &Document,
    ) -> Result<WriteBatch, CoreError> {
        let year: AcademicYear = active_year(store, organisation_id)?;
        let profile_id: &str = required_str(document, "profile_id")?;

        let already_placed: bool = store
            .scan(organisation_id, Collection::Instances, Visibility::Active)?
            .iter()
            .any(|other| {
                other.id != document.id
                    && other.str_field("profile_id") == Some(profile_id)
                    && other.str_field(FIELD) == Some(year.id.as_str())
            });
        if already_placed {
            return Err(DomainError::DuplicateInstance {
                profile_id: ProfileId::new(profile_id),
                academic_year_id: year.id,
            }
            .into());
        }

        let mut batch: WriteBatch = WriteBatch::new();
        batch.update(
            key_of(document),
            with_field(document, FIELD, year.id.as_str().into())?,
        );
        Ok(batch)
    }
}
