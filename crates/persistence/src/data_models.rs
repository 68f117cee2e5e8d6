// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and their conversion to store types.
//!
//! Timestamps are stored as RFC 3339 text.

use diesel::prelude::*;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use workload::{Collection, Document, StoreError};
use workload_audit::AuditEvent;
use workload_domain::{MigrationRecord, OrganisationId};

use crate::diesel_schema::{audit_events, documents, migration_records};
use crate::error::PersistenceError;

/// A full row of the `documents` table.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = documents)]
pub struct DocumentRow {
    pub row_id: i64,
    pub collection: String,
    pub id: String,
    pub organisation_id: String,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl DocumentRow {
    /// Decodes the row into a store document.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection, body, or a timestamp cannot be
    /// decoded.
    pub fn into_document(self) -> Result<Document, PersistenceError> {
        let collection: Collection = self.collection.parse()?;
        let body: serde_json::Value =
            serde_json::from_str(&self.body).map_err(|err| StoreError::Malformed {
                collection,
                id: self.id.clone(),
                message: err.to_string(),
            })?;
        Ok(Document {
            id: self.id,
            collection,
            organisation_id: OrganisationId::new(&self.organisation_id),
            body,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            deleted_at: self
                .deleted_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = documents)]
pub struct NewDocumentRow<'a> {
    pub collection: &'a str,
    pub id: &'a str,
    pub organisation_id: &'a str,
    pub body: String,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = audit_events)]
pub struct AuditEventRow {
    pub event_id: i64,
    pub event_json: String,
}

impl AuditEventRow {
    /// Decodes the stored event and stamps it with its row id.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored JSON is not an audit event.
    pub fn into_event(self) -> Result<AuditEvent, PersistenceError> {
        let event: AuditEvent = serde_json::from_str(&self.event_json)?;
        Ok(event.with_event_id(self.event_id))
    }
}

#[derive(Insertable)]
#[diesel(table_name = audit_events)]
pub struct NewAuditEventRow<'a> {
    pub organisation_id: &'a str,
    pub action_name: &'a str,
    pub event_json: String,
    pub created_at: String,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = migration_records)]
pub struct MigrationRecordRow {
    pub record_json: String,
}

impl MigrationRecordRow {
    /// # Errors
    ///
    /// Returns an error if the stored JSON is not a migration record.
    pub fn into_record(self) -> Result<MigrationRecord, PersistenceError> {
        Ok(serde_json::from_str(&self.record_json)?)
    }
}

#[derive(Insertable)]
#[diesel(table_name = migration_records)]
pub struct NewMigrationRecordRow<'a> {
    pub organisation_id: &'a str,
    pub name: &'a str,
    pub status: &'a str,
    pub record_json: String,
}

/// Formats a timestamp for storage.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be represented in RFC 3339.
pub fn format_timestamp(value: OffsetDateTime) -> Result<String, PersistenceError> {
    value
        .format(&Rfc3339)
        .map_err(|err| PersistenceError::SerializationError(err.to_string()))
}

fn parse_timestamp(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|err| {
        PersistenceError::SerializationError(format!("bad timestamp '{value}': {err}"))
    })
}
