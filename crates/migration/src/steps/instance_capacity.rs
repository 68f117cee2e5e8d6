// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::step::{MigrationStep, key_of, missing_field, parse, with_field};
use serde::Deserialize;
use workload::{Collection, CoreError, Document, EntityStore, WriteBatch};
use workload_domain::{
    Capacity, CategoryHours, OrganisationId, capacity_for, validate_category_hours,
    validate_hours,
};

const FIELD: &str = "capacity";

/// The inputs capacity is derived from.
#[derive(Debug, Deserialize)]
struct Figures {
    contract_hours: f64,
    hours: CategoryHours,
}

/// Computes the capacity block for instances that lack one.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceCapacity;

impl InstanceCapacity {
    pub const NAME: &'static str = "instance_capacity";
}

impl MigrationStep for InstanceCapacity {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Compute the capacity block for instances without one"
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
        _store: &mut dyn EntityStore,
        _organisation_id: &OrganisationId,
        document: &Document,
    ) -> Result<WriteBatch, CoreError> {
        let figures: Figures = parse(document)?;
        validate_hours("contract_hours", figures.contract_hours)?;
        validate_category_hours(&figures.hours)?;

        let capacity: Capacity = capacity_for(figures.hours.total(), figures.contract_hours);

        let mut batch: WriteBatch = WriteBatch::new();
        batch.update(
            key_of(document),
            with_field(document, FIELD, serde_json::to_value(capacity)?)?,
        );
        Ok(batch)
    }
}
