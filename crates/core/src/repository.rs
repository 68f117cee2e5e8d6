// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Typed access to documents.

use crate::error::CoreError;
use crate::store::{Collection, Document, DocumentKey, EntityStore, StoreError, Visibility};
use serde::Serialize;
use serde::de::DeserializeOwned;
use workload_domain::{
    AcademicYear, Allocation, Cohort, Instance, LecturerProfile, ModuleProfile, Organisation,
    OrganisationId,
};

/// A domain type stored as a document in a fixed collection.
pub trait Entity: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn entity_id(&self) -> &str;

    fn organisation_id(&self) -> &OrganisationId;

    /// The key addressing this entity's document.
    fn key(&self) -> DocumentKey {
        DocumentKey::new(Self::COLLECTION, self.organisation_id(), self.entity_id())
    }
}

macro_rules! impl_entity {
    ($type:ty, $collection:expr) => {
        impl Entity for $type {
            const COLLECTION: Collection = $collection;

            fn entity_id(&self) -> &str {
                self.id.as_str()
            }

            fn organisation_id(&self) -> &OrganisationId {
                &self.organisation_id
            }
        }
    };
}

impl_entity!(AcademicYear, Collection::AcademicYears);
impl_entity!(Cohort, Collection::Cohorts);
impl_entity!(LecturerProfile, Collection::LecturerProfiles);
impl_entity!(ModuleProfile, Collection::ModuleProfiles);
impl_entity!(Instance, Collection::Instances);
impl_entity!(Allocation, Collection::Allocations);

impl Entity for Organisation {
    const COLLECTION: Collection = Collection::Organisations;

    fn entity_id(&self) -> &str {
        self.id.as_str()
    }

    // An organisation is its own tenant.
    fn organisation_id(&self) -> &OrganisationId {
        &self.id
    }
}

/// Serializes an entity into a document body.
///
/// # Errors
///
/// Returns an error if the entity cannot be represented as JSON.
pub fn to_body<T: Entity>(entity: &T) -> Result<serde_json::Value, StoreError> {
    Ok(serde_json::to_value(entity)?)
}

/// Deserializes a document into an entity.
///
/// # Errors
///
/// Returns `StoreError::Malformed` if the document is not in the entity's
/// current shape.
pub fn from_document<T: Entity>(doc: &Document) -> Result<T, StoreError> {
    serde_json::from_value(doc.body.clone()).map_err(|err| StoreError::Malformed {
        collection: doc.collection,
        id: doc.id.clone(),
        message: err.to_string(),
    })
}

/// Loads a live entity by id.
///
/// # Errors
///
/// Returns an error if the store fails or the document is malformed.
pub fn find<T: Entity, S: EntityStore + ?Sized>(
    store: &mut S,
    organisation_id: &OrganisationId,
    id: &str,
) -> Result<Option<T>, CoreError> {
    store
        .get(organisation_id, T::COLLECTION, id, Visibility::Active)?
        .map(|doc| from_document(&doc))
        .transpose()
        .map_err(CoreError::from)
}

/// Loads a live entity by id, failing if it is absent.
///
/// # Errors
///
/// Returns `CoreError::NotFound` if the entity is absent, deleted, or
/// belongs to another organisation.
pub fn require<T: Entity, S: EntityStore + ?Sized>(
    store: &mut S,
    organisation_id: &OrganisationId,
    id: &str,
) -> Result<T, CoreError> {
    find(store, organisation_id, id)?
        .ok_or_else(|| CoreError::not_found(T::COLLECTION.entity_name(), id))
}

/// Loads every live entity of a collection in insertion order.
///
/// # Errors
///
/// Returns an error if the store fails or any document is malformed.
pub fn load_all<T: Entity, S: EntityStore + ?Sized>(
    store: &mut S,
    organisation_id: &OrganisationId,
) -> Result<Vec<T>, CoreError> {
    store
        .scan(organisation_id, T::COLLECTION, Visibility::Active)?
        .iter()
        .map(from_document)
        .collect::<Result<Vec<T>, StoreError>>()
        .map_err(CoreError::from)
}

/// Loads the organisation and checks that it accepts writes.
///
/// # Errors
///
/// Returns `CoreError::NotFound` if the organisation does not exist and
/// `CoreError::Integrity` if it is inactive.
pub fn require_active_organisation<S: EntityStore + ?Sized>(
    store: &mut S,
    organisation_id: &OrganisationId,
) -> Result<Organisation, CoreError> {
    let organisation: Organisation = require(store, organisation_id, organisation_id.as_str())?;
    if !organisation.is_active {
        return Err(CoreError::Integrity(format!(
            "organisation '{organisation_id}' is inactive"
        )));
    }
    Ok(organisation)
}
