// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The entity store contract.
//!
//! Entities are persisted as JSON documents grouped into collections. Every
//! document belongs to exactly one organisation and every read is scoped to
//! one; a document in another organisation is indistinguishable from a
//! missing one.
//!
//! Writes are expressed as a [`WriteBatch`] and applied by a single
//! [`EntityStore::commit`] call. A commit applies every operation in the
//! batch or none of them. There are no transactions spanning commits.

use std::str::FromStr;
use thiserror::Error;
use time::OffsetDateTime;
use workload_audit::AuditEvent;
use workload_domain::{MigrationRecord, OrganisationId};

/// A named group of documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Organisations,
    AcademicYears,
    Cohorts,
    LecturerProfiles,
    ModuleProfiles,
    Instances,
    Allocations,
    /// Combined lecturer records from before the profile/instance split.
    LegacyLecturers,
    /// Combined module records from before the profile/instance split.
    LegacyModules,
}

impl Collection {
    pub const ALL: [Self; 9] = [
        Self::Organisations,
        Self::AcademicYears,
        Self::Cohorts,
        Self::LecturerProfiles,
        Self::ModuleProfiles,
        Self::Instances,
        Self::Allocations,
        Self::LegacyLecturers,
        Self::LegacyModules,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Organisations => "organisations",
            Self::AcademicYears => "academic_years",
            Self::Cohorts => "cohorts",
            Self::LecturerProfiles => "lecturer_profiles",
            Self::ModuleProfiles => "module_profiles",
            Self::Instances => "instances",
            Self::Allocations => "allocations",
            Self::LegacyLecturers => "legacy_lecturers",
            Self::LegacyModules => "legacy_modules",
        }
    }

    /// Singular, human-readable entity name used in error messages.
    #[must_use]
    pub const fn entity_name(&self) -> &'static str {
        match self {
            Self::Organisations => "organisation",
            Self::AcademicYears => "academic year",
            Self::Cohorts => "cohort",
            Self::LecturerProfiles => "lecturer",
            Self::ModuleProfiles => "module",
            Self::Instances => "instance",
            Self::Allocations => "allocation",
            Self::LegacyLecturers => "legacy lecturer",
            Self::LegacyModules => "legacy module",
        }
    }
}

impl FromStr for Collection {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|collection| collection.as_str() == s)
            .ok_or_else(|| StoreError::UnknownCollection(s.to_string()))
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which documents a read returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Only documents that have not been soft-deleted.
    #[default]
    Active,
    /// Every document, soft-deleted or not.
    IncludeDeleted,
}

/// A persisted document as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub collection: Collection,
    pub organisation_id: OrganisationId,
    pub body: serde_json::Value,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

impl Document {
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    #[must_use]
    pub const fn is_visible(&self, visibility: Visibility) -> bool {
        match visibility {
            Visibility::Active => !self.is_deleted(),
            Visibility::IncludeDeleted => true,
        }
    }

    /// Returns a top-level string field of the body.
    #[must_use]
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.body.get(field).and_then(serde_json::Value::as_str)
    }

    /// Returns whether the body has a non-null top-level field.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.body.get(field).is_some_and(|value| !value.is_null())
    }
}

/// Addresses a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub collection: Collection,
    pub organisation_id: OrganisationId,
    pub id: String,
}

impl DocumentKey {
    #[must_use]
    pub fn new(collection: Collection, organisation_id: &OrganisationId, id: &str) -> Self {
        Self {
            collection,
            organisation_id: organisation_id.clone(),
            id: id.to_string(),
        }
    }
}

/// A single operation within a [`WriteBatch`].
///
/// Timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Creates a document. Fails if the id is already taken in the collection.
    Insert {
        key: DocumentKey,
        body: serde_json::Value,
    },
    /// Replaces the body of an existing document in the same organisation.
    Update {
        key: DocumentKey,
        body: serde_json::Value,
    },
    /// Marks an existing document as deleted.
    SoftDelete { key: DocumentKey },
    /// Appends an audit event.
    AppendAudit(Box<AuditEvent>),
    /// Appends a migration run record.
    RecordMigration(MigrationRecord),
}

/// An ordered set of operations committed atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    #[must_use]
    pub const fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn insert(&mut self, key: DocumentKey, body: serde_json::Value) -> &mut Self {
        self.ops.push(WriteOp::Insert { key, body });
        self
    }

    pub fn update(&mut self, key: DocumentKey, body: serde_json::Value) -> &mut Self {
        self.ops.push(WriteOp::Update { key, body });
        self
    }

    pub fn soft_delete(&mut self, key: DocumentKey) -> &mut Self {
        self.ops.push(WriteOp::SoftDelete { key });
        self
    }

    pub fn audit(&mut self, event: AuditEvent) -> &mut Self {
        self.ops.push(WriteOp::AppendAudit(Box::new(event)));
        self
    }

    pub fn migration_record(&mut self, record: MigrationRecord) -> &mut Self {
        self.ops.push(WriteOp::RecordMigration(record));
        self
    }

    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether this batch soft-deletes `key`.
    #[must_use]
    pub fn deletes(&self, key: &DocumentKey) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, WriteOp::SoftDelete { key: deleted } if deleted == key))
    }
}

/// Errors raised by an entity store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{collection} document '{id}' already exists")]
    DuplicateId { collection: Collection, id: String },
    #[error("{collection} document '{id}' does not exist")]
    MissingDocument { collection: Collection, id: String },
    #[error("unknown collection '{0}'")]
    UnknownCollection(String),
    #[error("{collection} document '{id}' is malformed: {message}")]
    Malformed {
        collection: Collection,
        id: String,
        message: String,
    },
    #[error("serialization failed: {0}")]
    Serialization(String),
    #[error("storage backend failed: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Persistent storage for workload documents, audit events, and migration
/// records.
///
/// Every method is scoped to one organisation. Reads of another
/// organisation's documents return nothing.
pub trait EntityStore {
    /// Fetches a single document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get(
        &mut self,
        organisation_id: &OrganisationId,
        collection: Collection,
        id: &str,
        visibility: Visibility,
    ) -> Result<Option<Document>, StoreError>;

    /// Lists a collection in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn scan(
        &mut self,
        organisation_id: &OrganisationId,
        collection: Collection,
        visibility: Visibility,
    ) -> Result<Vec<Document>, StoreError>;

    /// Applies every operation in the batch, or none.
    ///
    /// # Errors
    ///
    /// Returns an error if any operation is invalid or the backend fails. No
    /// operation is applied when an error is returned.
    fn commit(&mut self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Lists audit events for an organisation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn audit_events(
        &mut self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<AuditEvent>, StoreError>;

    /// Lists migration records for an organisation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn migration_records(
        &mut self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<MigrationRecord>, StoreError>;
}
