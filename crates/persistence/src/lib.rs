// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `SQLite` entity store for academic workload planning.
//!
//! Documents, audit events, and migration records live in three tables.
//! Document bodies are stored as JSON text; every read is filtered by
//! organisation. A commit runs in a single transaction, so a rejected
//! operation rolls back the whole batch.
//!
//! The schema is embedded and applied on open via `diesel_migrations`.
//!
//! ## Testing
//!
//! Tests run against isolated shared-cache in-memory databases created with
//! [`SqliteStore::new_in_memory`].

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::{Connection, SqliteConnection};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;
use tracing::debug;
use workload::{Collection, Document, EntityStore, StoreError, Visibility, WriteBatch};
use workload_audit::AuditEvent;
use workload_domain::{MigrationRecord, OrganisationId};

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use error::PersistenceError;

use data_models::format_timestamp;

static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// An [`EntityStore`] backed by a `SQLite` database.
pub struct SqliteStore {
    conn: SqliteConnection,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Creates a store over a fresh in-memory database.
    ///
    /// Every call gets its own database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let url: String = format!("file:workload_memdb_{db_id}?mode=memory&cache=shared");

        let conn: SqliteConnection = backend::initialize_database(&url)?;
        Ok(Self { conn })
    }

    /// Opens, creating if needed, a file-backed database.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not valid UTF-8 or the database
    /// cannot be opened or initialized.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::initialize_database(path_str)?;
        backend::enable_wal_mode(&mut conn)?;
        Ok(Self { conn })
    }
}

impl EntityStore for SqliteStore {
    fn get(
        &mut self,
        organisation_id: &OrganisationId,
        collection: Collection,
        id: &str,
        visibility: Visibility,
    ) -> Result<Option<Document>, StoreError> {
        Ok(queries::get_document(
            &mut self.conn,
            organisation_id,
            collection,
            id,
            visibility,
        )?)
    }

    fn scan(
        &mut self,
        organisation_id: &OrganisationId,
        collection: Collection,
        visibility: Visibility,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(queries::scan_documents(
            &mut self.conn,
            organisation_id,
            collection,
            visibility,
        )?)
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        let now: String = format_timestamp(OffsetDateTime::now_utc())?;
        let op_count: usize = batch.len();

        self.conn
            .transaction::<(), PersistenceError, _>(|conn| {
                for op in batch.ops() {
                    mutations::apply_op(conn, op, &now)?;
                }
                Ok(())
            })?;

        debug!(op_count, "Committed batch to SQLite store");
        Ok(())
    }

    fn audit_events(
        &mut self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<AuditEvent>, StoreError> {
        Ok(queries::list_audit_events(&mut self.conn, organisation_id)?)
    }

    fn migration_records(
        &mut self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<MigrationRecord>, StoreError> {
        Ok(queries::list_migration_records(
            &mut self.conn,
            organisation_id,
        )?)
    }
}
