// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::step::{MigrationStep, key_of, missing_field, with_field};
use workload::{Collection, CoreError, Document, EntityStore, Visibility, WriteBatch};
use workload_domain::OrganisationId;

const FIELD: &str = "academic_year_id";

/// Gives allocations without an academic year the year of their assignee
/// instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationAcademicYear;

impl AllocationAcademicYear {
    pub const NAME: &'static str = "allocation_academic_year";
}

impl MigrationStep for AllocationAcademicYear {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Copy each allocation's academic year from its assignee instance"
    }

    fn candidates(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<Document>, CoreError> {
        missing_field(store, organisation_id, Collection::Allocations, FIELD)
    }

    fn migrate(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
        document: &Document,
    ) -> Result<WriteBatch, CoreError> {
        let Some(assignee) = document.str_field("assignee_instance_id") else {
            return Err(CoreError::Integrity(format!(
                "allocation '{}' has no assignee instance",
                document.id
            )));
        };

        let instance: Document = store
            .get(
                organisation_id,
                Collection::Instances,
                assignee,
                Visibility::Active,
            )?
            .ok_or_else(|| CoreError::NotFound {
                entity: Collection::Instances.entity_name(),
                id: assignee.to_string(),
            })?;
        let Some(year) = instance.str_field(FIELD) else {
            return Err(CoreError::Integrity(format!(
                "assignee instance '{assignee}' has no academic year"
            )));
        };

        let mut batch: WriteBatch = WriteBatch::new();
        batch.update(key_of(document), with_field(document, FIELD, year.into())?);
        Ok(batch)
    }
}
