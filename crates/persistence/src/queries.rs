// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read queries.

use diesel::prelude::*;
use diesel::SqliteConnection;
use workload::{Collection, Document, DocumentKey, Visibility};
use workload_audit::AuditEvent;
use workload_domain::{MigrationRecord, OrganisationId};

use crate::data_models::{AuditEventRow, DocumentRow, MigrationRecordRow};
use crate::diesel_schema::{audit_events, documents, migration_records};
use crate::error::PersistenceError;

/// Looks up the row a key addresses, deleted or not.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_row(
    conn: &mut SqliteConnection,
    key: &DocumentKey,
) -> Result<Option<DocumentRow>, PersistenceError> {
    Ok(documents::table
        .filter(documents::organisation_id.eq(key.organisation_id.as_str()))
        .filter(documents::collection.eq(key.collection.as_str()))
        .filter(documents::id.eq(&key.id))
        .select(DocumentRow::as_select())
        .first::<DocumentRow>(conn)
        .optional()?)
}

/// # Errors
///
/// Returns an error if the query fails or the row cannot be decoded.
pub fn get_document(
    conn: &mut SqliteConnection,
    organisation_id: &OrganisationId,
    collection: Collection,
    id: &str,
    visibility: Visibility,
) -> Result<Option<Document>, PersistenceError> {
    let mut query = documents::table
        .filter(documents::organisation_id.eq(organisation_id.as_str()))
        .filter(documents::collection.eq(collection.as_str()))
        .filter(documents::id.eq(id))
        .select(DocumentRow::as_select())
        .into_boxed();
    if matches!(visibility, Visibility::Active) {
        query = query.filter(documents::deleted_at.is_null());
    }

    query
        .first::<DocumentRow>(conn)
        .optional()?
        .map(DocumentRow::into_document)
        .transpose()
}

/// Lists a collection in insertion order.
///
/// # Errors
///
/// Returns an error if the query fails or any row cannot be decoded.
pub fn scan_documents(
    conn: &mut SqliteConnection,
    organisation_id: &OrganisationId,
    collection: Collection,
    visibility: Visibility,
) -> Result<Vec<Document>, PersistenceError> {
    let mut query = documents::table
        .filter(documents::organisation_id.eq(organisation_id.as_str()))
        .filter(documents::collection.eq(collection.as_str()))
        .order(documents::row_id.asc())
        .select(DocumentRow::as_select())
        .into_boxed();
    if matches!(visibility, Visibility::Active) {
        query = query.filter(documents::deleted_at.is_null());
    }

    query
        .load::<DocumentRow>(conn)?
        .into_iter()
        .map(DocumentRow::into_document)
        .collect()
}

/// # Errors
///
/// Returns an error if the query fails or an event cannot be decoded.
pub fn list_audit_events(
    conn: &mut SqliteConnection,
    organisation_id: &OrganisationId,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    audit_events::table
        .filter(audit_events::organisation_id.eq(organisation_id.as_str()))
        .order(audit_events::event_id.asc())
        .select(AuditEventRow::as_select())
        .load::<AuditEventRow>(conn)?
        .into_iter()
        .map(AuditEventRow::into_event)
        .collect()
}

/// # Errors
///
/// Returns an error if the query fails or a record cannot be decoded.
pub fn list_migration_records(
    conn: &mut SqliteConnection,
    organisation_id: &OrganisationId,
) -> Result<Vec<MigrationRecord>, PersistenceError> {
    migration_records::table
        .filter(migration_records::organisation_id.eq(organisation_id.as_str()))
        .order(migration_records::record_id.asc())
        .select(MigrationRecordRow::as_select())
        .load::<MigrationRecordRow>(conn)?
        .into_iter()
        .map(MigrationRecordRow::into_record)
        .collect()
}
