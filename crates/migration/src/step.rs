// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::de::DeserializeOwned;
use workload::{
    Collection, CoreError, Document, DocumentKey, EntityStore, StoreError, Visibility, WriteBatch,
};
use workload_domain::OrganisationId;

/// One migration in the fixed sequence.
///
/// A document is a candidate while it lacks the field the step adds, which
/// is what makes re-running a step a no-op.
pub trait MigrationStep {
    /// Stable name recorded in migration records.
    fn name(&self) -> &'static str;

    fn version(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str;

    /// Checks conditions the whole run depends on.
    ///
    /// # Errors
    ///
    /// Returns an error if the step cannot run for this organisation.
    fn check_preconditions(
        &self,
        _store: &mut dyn EntityStore,
        _organisation_id: &OrganisationId,
    ) -> Result<(), CoreError> {
        Ok(())
    }

    /// Lists live documents still in the source shape, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn candidates(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<Document>, CoreError>;

    /// Builds the batch that migrates one candidate.
    ///
    /// # Errors
    ///
    /// Returns an error if this record cannot be migrated.
    fn migrate(
        &self,
        store: &mut dyn EntityStore,
        organisation_id: &OrganisationId,
        document: &Document,
    ) -> Result<WriteBatch, CoreError>;
}

/// Live documents of a collection that lack `field`.
pub(crate) fn missing_field(
    store: &mut dyn EntityStore,
    organisation_id: &OrganisationId,
    collection: Collection,
    field: &str,
) -> Result<Vec<Document>, CoreError> {
    Ok(store
        .scan(organisation_id, collection, Visibility::Active)?
        .into_iter()
        .filter(|document| !document.has_field(field))
        .collect())
}

pub(crate) fn key_of(document: &Document) -> DocumentKey {
    DocumentKey::new(document.collection, &document.organisation_id, &document.id)
}

/// The document's body with one top-level field set.
pub(crate) fn with_field(
    document: &Document,
    field: &str,
    value: serde_json::Value,
) -> Result<serde_json::Value, CoreError> {
    let mut body: serde_json::Value = document.body.clone();
    let Some(object) = body.as_object_mut() else {
        return Err(malformed(document, "body is not an object").into());
    };
    object.insert(field.to_string(), value);
    Ok(body)
}

/// Reads a required top-level string field.
pub(crate) fn required_str<'a>(document: &'a Document, field: &str) -> Result<&'a str, CoreError> {
    document
        .str_field(field)
        .ok_or_else(|| malformed(document, &format!("missing field '{field}'")).into())
}

/// Deserializes a document body into a source-shape type.
pub(crate) fn parse<T: DeserializeOwned>(document: &Document) -> Result<T, CoreError> {
    serde_json::from_value(document.body.clone())
        .map_err(|err| malformed(document, &err.to_string()).into())
}

fn malformed(document: &Document, message: &str) -> StoreError {
    StoreError::Malformed {
        collection: document.collection,
        id: document.id.clone(),
        message: message.to_string(),
    }
}
