// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write operations applied inside a commit transaction.
//!
//! Each function checks the same rules as the in-memory store and returns
//! `PersistenceError::Rejected` when one is violated, which rolls back the
//! enclosing transaction.

use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;
use workload::{DocumentKey, StoreError, WriteOp};
use workload_audit::AuditEvent;
use workload_domain::MigrationRecord;

use crate::data_models::{
    DocumentRow, NewAuditEventRow, NewDocumentRow, NewMigrationRecordRow, format_timestamp,
};
use crate::diesel_schema::{audit_events, documents, migration_records};
use crate::error::PersistenceError;
use crate::queries::find_row;

/// Applies one batch operation stamped with `now`.
///
/// # Errors
///
/// Returns an error if the operation is invalid or the write fails.
pub fn apply_op(
    conn: &mut SqliteConnection,
    op: &WriteOp,
    now: &str,
) -> Result<(), PersistenceError> {
    match op {
        WriteOp::Insert { key, body } => insert_document(conn, key, body, now),
        WriteOp::Update { key, body } => update_document(conn, key, body, now),
        WriteOp::SoftDelete { key } => soft_delete_document(conn, key, now),
        WriteOp::AppendAudit(event) => append_audit_event(conn, event),
        WriteOp::RecordMigration(record) => record_migration(conn, record),
    }
}

fn insert_document(
    conn: &mut SqliteConnection,
    key: &DocumentKey,
    body: &serde_json::Value,
    now: &str,
) -> Result<(), PersistenceError> {
    let body_json: String = encode_body(key, body)?;
    if find_row(conn, key)?.is_some() {
        return Err(PersistenceError::Rejected(StoreError::DuplicateId {
            collection: key.collection,
            id: key.id.clone(),
        }));
    }

    diesel::insert_into(documents::table)
        .values(&NewDocumentRow {
            collection: key.collection.as_str(),
            id: &key.id,
            organisation_id: key.organisation_id.as_str(),
            body: body_json,
            created_at: now,
            updated_at: now,
        })
        .execute(conn)?;
    Ok(())
}

fn update_document(
    conn: &mut SqliteConnection,
    key: &DocumentKey,
    body: &serde_json::Value,
    now: &str,
) -> Result<(), PersistenceError> {
    let body_json: String = encode_body(key, body)?;
    let row: DocumentRow = existing_row(conn, key)?;

    diesel::update(documents::table.find(row.row_id))
        .set((
            documents::body.eq(body_json),
            documents::updated_at.eq(now),
        ))
        .execute(conn)?;
    Ok(())
}

fn soft_delete_document(
    conn: &mut SqliteConnection,
    key: &DocumentKey,
    now: &str,
) -> Result<(), PersistenceError> {
    let row: DocumentRow = existing_row(conn, key)?;
    // The first deletion time is kept.
    let deleted_at: String = row.deleted_at.unwrap_or_else(|| now.to_string());

    diesel::update(documents::table.find(row.row_id))
        .set((
            documents::deleted_at.eq(Some(deleted_at)),
            documents::updated_at.eq(now),
        ))
        .execute(conn)?;
    Ok(())
}

fn append_audit_event(
    conn: &mut SqliteConnection,
    event: &AuditEvent,
) -> Result<(), PersistenceError> {
    let event_id: i64 = diesel::insert_into(audit_events::table)
        .values(&NewAuditEventRow {
            organisation_id: event.organisation_id().as_str(),
            action_name: &event.action.name,
            event_json: serde_json::to_string(event)?,
            created_at: format_timestamp(event.created_at)?,
        })
        .returning(audit_events::event_id)
        .get_result::<i64>(conn)?;

    debug!(event_id, action = %event.action.name, "Appended audit event");
    Ok(())
}

fn record_migration(
    conn: &mut SqliteConnection,
    record: &MigrationRecord,
) -> Result<(), PersistenceError> {
    diesel::insert_into(migration_records::table)
        .values(&NewMigrationRecordRow {
            organisation_id: record.organisation_id.as_str(),
            name: &record.name,
            status: record.status.as_str(),
            record_json: serde_json::to_string(record)?,
        })
        .execute(conn)?;
    Ok(())
}

/// Loads the row a key addresses. Deleted rows still count as existing.
fn existing_row(
    conn: &mut SqliteConnection,
    key: &DocumentKey,
) -> Result<DocumentRow, PersistenceError> {
    find_row(conn, key)?.ok_or_else(|| {
        PersistenceError::Rejected(StoreError::MissingDocument {
            collection: key.collection,
            id: key.id.clone(),
        })
    })
}

fn encode_body(key: &DocumentKey, body: &serde_json::Value) -> Result<String, PersistenceError> {
    if !body.is_object() {
        return Err(PersistenceError::Rejected(StoreError::Malformed {
            collection: key.collection,
            id: key.id.clone(),
            message: String::from("document body must be a JSON object"),
        }));
    }
    Ok(serde_json::to_string(body)?)
}
